//! Run driver
//!
//! A run turns an ordered list of targets into generated files. All targets
//! share one [`ScanSession`], so a struct defined in a common header is
//! known to every later target. Output is generated for every target before
//! any file is written, and every file is staged next to its destination
//! before the first one is renamed into place. Replaced outputs are kept as
//! backups until the whole set is in place, so a failed rename rolls the
//! earlier ones back.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::codegen::CodeGenerator;
use crate::config::GeneratorConfig;
use crate::declaration::is_identifier;
use crate::error::{GlueError, Result};
use crate::scanner::{ScanSession, ShaderInterface};

/// One output file and the shader sources it is generated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
}

impl Target {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.inputs.push(input.into());
        self
    }
}

/// Generated text waiting to be written
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub type_name: String,
    pub contents: String,
}

/// Derive the accessor type name from an output path
///
/// `shaders/basic.rs` becomes `Basic`: directory and everything from the
/// first `.` are dropped and the first character is upper-cased.
pub fn type_name_for(output: &Path) -> Result<String> {
    let file_name = output
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| GlueError::invalid_argument(output.display(), "output has no file name"))?;
    let stem = file_name.split('.').next().unwrap_or(file_name);

    let mut chars = stem.chars();
    let type_name: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    if !is_identifier(&type_name) {
        return Err(GlueError::invalid_argument(
            output.display(),
            format!("'{}' is not a usable type name", stem),
        ));
    }
    Ok(type_name)
}

/// Drives scanning and code generation for a run
pub struct Generator {
    config: GeneratorConfig,
    session: ScanSession,
}

impl Generator {
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            session: ScanSession::new(),
        }
    }

    /// Generate one target from in-memory sources given as `(name, text)`
    pub fn generate_from_sources<'s>(
        &mut self,
        type_name: &str,
        sources: impl IntoIterator<Item = (&'s str, &'s str)>,
    ) -> Result<String> {
        let mut interface = ShaderInterface::new();
        for (name, text) in sources {
            self.session.scan_source(name, text, &mut interface)?;
        }
        if interface.is_empty() {
            warn!("{}: sources declare no uniforms or blocks", type_name);
        }
        CodeGenerator::new(self.session.registry(), &self.config).generate(type_name, &interface)
    }

    /// Generate one target, reading its inputs from disk
    pub fn generate_target(&mut self, target: &Target) -> Result<GeneratedFile> {
        let type_name = type_name_for(&target.output)?;

        let mut sources = Vec::with_capacity(target.inputs.len());
        for input in &target.inputs {
            let text = fs::read_to_string(input).map_err(|e| GlueError::read(input, e))?;
            sources.push((input.display().to_string(), text));
        }

        let contents = self.generate_from_sources(
            &type_name,
            sources.iter().map(|(name, text)| (name.as_str(), text.as_str())),
        )?;

        info!(
            "Generated {}Shader for {} ({} input(s))",
            type_name,
            target.output.display(),
            target.inputs.len()
        );
        Ok(GeneratedFile {
            path: target.output.clone(),
            type_name,
            contents,
        })
    }

    /// Generate every target, then write them all
    pub fn run(&mut self, targets: &[Target]) -> Result<Vec<PathBuf>> {
        self.config.validate()?;
        if targets.is_empty() {
            return Err(GlueError::invalid_argument("targets", "nothing to generate"));
        }

        let mut generated = Vec::with_capacity(targets.len());
        for target in targets {
            if target.inputs.is_empty() {
                return Err(GlueError::invalid_argument(
                    target.output.display(),
                    "no input files",
                ));
            }
            generated.push(self.generate_target(target)?);
        }

        persist(&generated)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sibling of `path` with `suffix` appended: `out/basic.rs` gives `out/basic.rs.tmp`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn temp_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

fn backup_path(path: &Path) -> PathBuf {
    sibling(path, ".bak")
}

/// An output moved into place, with the file it replaced
struct Replaced<'a> {
    path: &'a Path,
    backup: Option<PathBuf>,
}

/// Move `tmp` over `path`, keeping any existing file as a backup
fn replace<'a>(path: &'a Path, tmp: &Path) -> std::io::Result<Replaced<'a>> {
    let backup = if path.exists() {
        let backup = backup_path(path);
        fs::rename(path, &backup)?;
        Some(backup)
    } else {
        None
    };

    if let Err(e) = fs::rename(tmp, path) {
        if let Some(backup) = &backup {
            if let Err(e) = fs::rename(backup, path) {
                warn!("Failed to restore {}: {}", path.display(), e);
            }
        }
        return Err(e);
    }
    Ok(Replaced { path, backup })
}

fn roll_back(replaced: &[Replaced<'_>]) {
    for done in replaced.iter().rev() {
        let restored = match &done.backup {
            Some(backup) => fs::rename(backup, done.path),
            None => fs::remove_file(done.path),
        };
        if let Err(e) = restored {
            warn!("Failed to roll back {}: {}", done.path.display(), e);
        }
    }
}

/// Write every file through a temporary sibling
///
/// All temporary files are written before any output is replaced. If one
/// of them cannot be written, every temporary file is removed and no output
/// changes. If an output cannot be moved into place, the outputs already
/// replaced are restored from their backups.
fn persist(files: &[GeneratedFile]) -> Result<Vec<PathBuf>> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(files.len());
    for file in files {
        let tmp = temp_path(&file.path);
        if let Err(e) = fs::write(&tmp, &file.contents) {
            discard(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(GlueError::write(tmp, e));
        }
        staged.push(tmp);
    }

    let mut replaced = Vec::with_capacity(files.len());
    for (index, (file, tmp)) in files.iter().zip(&staged).enumerate() {
        match replace(&file.path, tmp) {
            Ok(done) => replaced.push(done),
            Err(e) => {
                discard(&staged[index..]);
                roll_back(&replaced);
                return Err(GlueError::write(&file.path, e));
            }
        }
        debug!(
            "Wrote {}Shader ({} bytes) to {}",
            file.type_name,
            file.contents.len(),
            file.path.display()
        );
    }

    let backups: Vec<PathBuf> = replaced.into_iter().filter_map(|done| done.backup).collect();
    discard(&backups);

    Ok(files.iter().map(|file| file.path.clone()).collect())
}

fn discard(staged: &[PathBuf]) {
    for tmp in staged {
        if let Err(e) = fs::remove_file(tmp) {
            warn!("Failed to remove {}: {}", tmp.display(), e);
        }
    }
}
