//! Error types for the uniform glue generator
//!
//! Every error is fatal for the current run. Errors that originate from a
//! source line carry the file name and line number so the user can jump
//! straight to the offending declaration.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, GlueError>;

/// Main error type for the generator
#[derive(Error, Debug)]
pub enum GlueError {
    // === Declaration errors ===
    #[error("{file}:{line}: malformed declaration '{text}': {reason}")]
    MalformedDeclaration {
        file: String,
        line: u32,
        text: String,
        reason: String,
    },

    #[error("{file}:{line}: unrecognized type '{token}'")]
    UnrecognizedType {
        file: String,
        line: u32,
        token: String,
    },

    #[error("{file}:{line}: line is {length} bytes long, the limit is {limit}")]
    LineTooLong {
        file: String,
        line: u32,
        length: usize,
        limit: usize,
    },

    // === Struct / block body errors ===
    #[error("{file}:{line}: {kind} '{name}' is never closed with '}};'")]
    UnterminatedBody {
        kind: BodyKind,
        name: String,
        file: String,
        line: u32,
    },

    #[error("{file}:{line}: struct '{name}' redefined with different members")]
    DuplicateStruct {
        name: String,
        file: String,
        line: u32,
    },

    #[error("{file}:{line}: {kind} '{name}' redeclared with a different type or layout")]
    ConflictingDeclaration {
        kind: &'static str,
        name: String,
        file: String,
        line: u32,
    },

    #[error("block '{block}' member '{member}' has aggregate type '{ty}': block members must be primitive")]
    NonPrimitiveBlockMember {
        block: String,
        member: String,
        ty: String,
    },

    // === Flattening errors ===
    #[error("struct '{name}' contains itself through '{path}'")]
    CyclicStruct { name: String, path: String },

    #[error("uniform '{path}' nests structs deeper than {limit} levels")]
    NestingTooDeep { path: String, limit: usize },

    #[error("uniform '{uniform}' refers to struct '{name}' which is not registered")]
    UnknownStruct { uniform: String, name: String },

    #[error("uniform '{uniform}' has struct type '{ty}' where a primitive leaf is required")]
    NonPrimitiveLeaf { uniform: String, ty: String },

    #[error("generated item '{name}' for '{item}' collides with another generated item")]
    NameCollision { name: String, item: String },

    #[error("'{name}' in '{item}' is reserved in Rust and cannot be used as a generated name")]
    ReservedIdentifier { name: String, item: String },

    // === Driver errors ===
    #[error("Invalid argument: {parameter}: {reason}")]
    InvalidArgument { parameter: String, reason: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What kind of brace-delimited body a scanner error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Struct,
    Block,
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyKind::Struct => f.write_str("struct"),
            BodyKind::Block => f.write_str("uniform block"),
        }
    }
}

// Helper constructors for common error patterns
impl GlueError {
    /// Create an invalid argument error
    pub fn invalid_argument(parameter: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::InvalidArgument {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a read error for `path`
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a write error for `path`
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the shader sources rather than the environment
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedDeclaration { .. }
                | Self::UnrecognizedType { .. }
                | Self::LineTooLong { .. }
                | Self::UnterminatedBody { .. }
                | Self::DuplicateStruct { .. }
                | Self::ConflictingDeclaration { .. }
                | Self::NonPrimitiveBlockMember { .. }
                | Self::CyclicStruct { .. }
                | Self::NestingTooDeep { .. }
                | Self::UnknownStruct { .. }
                | Self::NonPrimitiveLeaf { .. }
                | Self::NameCollision { .. }
                | Self::ReservedIdentifier { .. }
        )
    }
}
