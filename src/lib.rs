//! Build-time glue generator for GLSL uniforms
//!
//! Scans GLSL sources for `uniform` declarations, `struct` definitions and
//! std140 uniform blocks, then emits a Rust module with one accessor type
//! per target: cached uniform locations, typed setters and `#[repr(C)]`
//! block mirrors laid out to match std140.
//!
//! The pipeline runs in four stages:
//! - [`scanner`] classifies source lines and records declarations
//! - [`flatten`] expands struct-typed uniforms into primitive leaves
//! - [`layout`] computes std140 offsets and padding for blocks
//! - [`codegen`] renders the accessor module through [`writer::Writer`]
//!
//! [`generator::Generator`] ties these together for a whole run.

pub mod codegen;
pub mod config;
pub mod declaration;
pub mod error;
pub mod flatten;
pub mod generator;
pub mod layout;
pub mod registry;
pub mod scanner;
pub mod types;
pub mod writer;

use log::LevelFilter;

pub use codegen::CodeGenerator;
pub use config::GeneratorConfig;
pub use declaration::{parse_declaration, ParseContext, Uniform};
pub use error::{GlueError, Result};
pub use flatten::{flatten, Flatten};
pub use generator::{type_name_for, Generator, Target};
pub use layout::{compute_layout, BlockLayout};
pub use registry::{StructDef, StructRegistry};
pub use scanner::{ScanSession, ShaderInterface};
pub use types::{Primitive, TypeName};

/// Initialize logging once per process
///
/// `SHADER_GLUE_DEBUG` raises the level to debug; `RUST_LOG` filters apply on top.
pub fn init_logging(verbose: bool) {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let log_level = if verbose || std::env::var("SHADER_GLUE_DEBUG").is_ok() {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };

        env_logger::Builder::new()
            .filter_level(log_level)
            .parse_default_env()
            .format_timestamp(None)
            .init();
    });
}
