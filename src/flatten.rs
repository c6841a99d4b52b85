//! Uniform flattening
//!
//! A uniform of struct type cannot be set directly; each primitive leaf has
//! its own location (`light.pos`, `light.intensity`, ...). [`Flatten`] walks
//! a uniform depth-first and yields those leaves in declaration order.
//!
//! Every emission pass that works on leaves goes through this iterator, so
//! the location fields, the location queries and the setters always line up.

use smallvec::SmallVec;

use crate::declaration::Uniform;
use crate::error::{GlueError, Result};
use crate::registry::{StructDef, StructRegistry};
use crate::types::TypeName;

/// Deepest struct nesting accepted before giving up
pub const MAX_NESTING_DEPTH: usize = 16;

struct Frame<'a> {
    parent: Uniform,
    def: &'a StructDef,
    next: usize,
}

/// Depth-first iterator over the primitive leaves of a uniform
///
/// Yields the uniform itself when it is already primitive. After the first
/// error the iterator is fused.
pub struct Flatten<'a> {
    registry: &'a StructRegistry,
    root: Option<Uniform>,
    stack: SmallVec<[Frame<'a>; 4]>,
    failed: bool,
}

impl<'a> Flatten<'a> {
    pub fn new(uniform: Uniform, registry: &'a StructRegistry) -> Self {
        Self {
            registry,
            root: Some(uniform),
            stack: SmallVec::new(),
            failed: false,
        }
    }

    /// Yield `uniform` if primitive, otherwise descend into its struct
    fn visit(&mut self, uniform: Uniform) -> Option<Result<Uniform>> {
        let name = match &uniform.ty {
            TypeName::Primitive(_) => return Some(Ok(uniform)),
            TypeName::Struct(name) => name,
        };

        let registry = self.registry;
        let Some(def) = registry.get(name) else {
            return Some(Err(GlueError::UnknownStruct {
                uniform: uniform.name.clone(),
                name: name.clone(),
            }));
        };

        if self.stack.iter().any(|frame| frame.def.name == def.name) {
            return Some(Err(GlueError::CyclicStruct {
                name: def.name.clone(),
                path: uniform.name,
            }));
        }
        if self.stack.len() >= MAX_NESTING_DEPTH {
            return Some(Err(GlueError::NestingTooDeep {
                path: uniform.name,
                limit: MAX_NESTING_DEPTH,
            }));
        }

        self.stack.push(Frame {
            parent: uniform,
            def,
            next: 0,
        });
        None
    }

    fn emit(&mut self, item: Result<Uniform>) -> Option<Result<Uniform>> {
        if item.is_err() {
            self.failed = true;
            self.stack.clear();
        }
        Some(item)
    }
}

impl Iterator for Flatten<'_> {
    type Item = Result<Uniform>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Some(root) = self.root.take() {
            if let Some(item) = self.visit(root) {
                return self.emit(item);
            }
        }

        loop {
            let frame = self.stack.last_mut()?;
            let def = frame.def;
            let Some(member) = def.members.get(frame.next) else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            let child = frame.parent.child(member);
            if let Some(item) = self.visit(child) {
                return self.emit(item);
            }
        }
    }
}

/// Collect the primitive leaves of `uniform`
pub fn flatten(uniform: &Uniform, registry: &StructRegistry) -> Result<Vec<Uniform>> {
    Flatten::new(uniform.clone(), registry).collect()
}

/// Collect the leaves of every uniform in `uniforms`, in order
pub fn flatten_all(uniforms: &[Uniform], registry: &StructRegistry) -> Result<Vec<Uniform>> {
    let mut leaves = Vec::with_capacity(uniforms.len());
    for uniform in uniforms {
        for leaf in Flatten::new(uniform.clone(), registry) {
            leaves.push(leaf?);
        }
    }
    Ok(leaves)
}
