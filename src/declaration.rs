//! Declaration parsing
//!
//! Turns a single `<type> <name>;` declaration into a [`Uniform`]. The same
//! parser handles top-level `uniform` lines (with the keyword already
//! stripped) and the member lines of struct and block bodies.

use crate::error::{GlueError, Result};
use crate::registry::StructRegistry;
use crate::types::TypeName;

/// Suffix appended to an accessor to name its cached location field
pub const LOCATION_SUFFIX: &str = "_location";

/// Where in the input a declaration came from
///
/// Only used to make error messages actionable; parsing never depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    pub current_file: String,
    pub current_line: u32,
}

impl ParseContext {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            current_file: file.into(),
            current_line: 0,
        }
    }

    /// Same file, different line
    pub fn at(&self, line: u32) -> Self {
        Self {
            current_file: self.current_file.clone(),
            current_line: line,
        }
    }

    pub(crate) fn malformed(&self, text: &str, reason: &str) -> GlueError {
        GlueError::MalformedDeclaration {
            file: self.current_file.clone(),
            line: self.current_line,
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A typed, named shader input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uniform {
    pub ty: TypeName,
    /// Source-level path, dotted for flattened struct members
    pub name: String,
    /// Name of the generated field caching this uniform's location
    pub cache_id: String,
}

impl Uniform {
    pub fn new(ty: TypeName, name: impl Into<String>) -> Self {
        let name = name.into();
        let cache_id = format!("{}{}", accessor_for(&name), LOCATION_SUFFIX);
        Self { ty, name, cache_id }
    }

    /// Identifier of the generated setter: the path with `.` replaced by `_`
    pub fn accessor(&self) -> String {
        accessor_for(&self.name)
    }

    /// Build the uniform for `member` nested inside `self`
    pub fn child(&self, member: &Uniform) -> Self {
        Uniform::new(member.ty.clone(), format!("{}.{}", self.name, member.name))
    }
}

fn accessor_for(path: &str) -> String {
    path.replace('.', "_")
}

/// Parse `<type> <name>;`, resolving the type against `registry`
///
/// Any run of spaces or tabs separates the type from the name. The
/// separator and the terminating `;` are both required.
pub fn parse_declaration(
    text: &str,
    registry: &StructRegistry,
    ctx: &ParseContext,
) -> Result<Uniform> {
    let text = text.trim();

    let semi = text
        .find(';')
        .ok_or_else(|| ctx.malformed(text, "missing terminating ';'"))?;
    if !text[semi + 1..].trim().is_empty() {
        return Err(ctx.malformed(text, "unexpected text after ';'"));
    }

    let decl = &text[..semi];
    let (type_token, name) = decl
        .split_once(|c: char| c == ' ' || c == '\t')
        .ok_or_else(|| ctx.malformed(text, "missing space between type and name"))?;
    let name = name.trim();

    if !is_identifier(name) {
        return Err(ctx.malformed(text, "name is not a plain identifier"));
    }

    let ty = registry.resolve(type_token, ctx)?;
    Ok(Uniform::new(ty, name))
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
