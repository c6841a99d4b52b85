//! Struct registry and type resolution
//!
//! Holds every user-defined `struct` seen so far in a run. Definitions must
//! precede their use in file order, so a token resolves only against the
//! structs registered before the line that mentions it.

use hashbrown::HashMap;

use crate::declaration::{ParseContext, Uniform};
use crate::error::{GlueError, Result};
use crate::types::{Primitive, TypeName};

/// A user-defined aggregate type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub members: Vec<Uniform>,
}

impl StructDef {
    pub fn new(name: impl Into<String>, members: Vec<Uniform>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// Outcome of registering a struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// An identical definition was already present
    AlreadyKnown,
}

/// Append-only table of struct definitions, in definition order
#[derive(Debug, Default)]
pub struct StructRegistry {
    defs: Vec<StructDef>,
    index: HashMap<String, usize>,
}

impl StructRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a type token to a [`TypeName`]
    ///
    /// Primitive aliases are looked up first; anything else must name a
    /// registered struct.
    pub fn resolve(&self, token: &str, ctx: &ParseContext) -> Result<TypeName> {
        if let Some(primitive) = Primitive::from_glsl(token) {
            return Ok(TypeName::Primitive(primitive));
        }
        if self.index.contains_key(token) {
            return Ok(TypeName::Struct(token.to_string()));
        }
        Err(GlueError::UnrecognizedType {
            file: ctx.current_file.clone(),
            line: ctx.current_line,
            token: token.to_string(),
        })
    }

    /// Register a struct definition
    ///
    /// Re-registering an identical definition is accepted, since the same
    /// header may be scanned for several targets. A different definition
    /// under an existing name is an error.
    pub fn define(&mut self, def: StructDef, ctx: &ParseContext) -> Result<Registration> {
        if let Some(&slot) = self.index.get(&def.name) {
            if self.defs[slot] == def {
                return Ok(Registration::AlreadyKnown);
            }
            return Err(GlueError::DuplicateStruct {
                name: def.name,
                file: ctx.current_file.clone(),
                line: ctx.current_line,
            });
        }

        self.index.insert(def.name.clone(), self.defs.len());
        self.defs.push(def);
        Ok(Registration::Added)
    }

    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.index.get(name).map(|&slot| &self.defs[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}
