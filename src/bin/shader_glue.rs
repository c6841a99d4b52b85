//! Uniform Glue Generator
//!
//! Scans GLSL sources and writes one Rust accessor module per output file.
//! Struct definitions are shared across all outputs of one invocation, so a
//! common header only needs to be listed once, before the targets using it.
//!
//! Usage:
//!   shader_glue -o basic.rs basic.vert basic.frag
//!   shader_glue -o common.rs common.glsl -o lit.rs lit.vert lit.frag
//!   shader_glue --tab-width 2 --no-asserts -o post.rs post.frag

use std::env;
use std::path::PathBuf;

use log::info;

use shader_glue::{init_logging, Generator, GeneratorConfig, Target};

// ANSI colors for output
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_BOLD: &str = "\x1b[1m";

struct GlueArgs {
    config: GeneratorConfig,
    targets: Vec<Target>,
    verbose: bool,
}

fn main() {
    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}{}error:{} {}", ANSI_BOLD, ANSI_RED, ANSI_RESET, message);
            eprintln!();
            print_usage();
            std::process::exit(2);
        }
    };

    init_logging(args.verbose);
    info!("Generating {} target(s)", args.targets.len());

    let mut generator = Generator::with_config(args.config);
    match generator.run(&args.targets) {
        Ok(written) => {
            for path in &written {
                println!("{}wrote{} {}", ANSI_GREEN, ANSI_RESET, path.display());
            }
        }
        Err(e) => {
            eprintln!("{}{}error:{} {}", ANSI_BOLD, ANSI_RED, ANSI_RESET, e);
            std::process::exit(1);
        }
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<GlueArgs, String> {
    let mut config = GeneratorConfig::default();
    let mut targets: Vec<Target> = Vec::new();
    let mut verbose = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--output" | "-o" => {
                let output = args
                    .next()
                    .ok_or_else(|| format!("{} expects an output path", arg))?;
                targets.push(Target::new(output));
            }
            "--tab-width" | "-t" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("{} expects a number", arg))?;
                let width = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid tab width '{}'", value))?;
                config = config.with_tab_width(width);
            }
            "--no-asserts" => config = config.with_layout_assertions(false),
            "--verbose" | "-v" => verbose = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option '{}'", flag));
            }
            _ => match targets.last_mut() {
                Some(target) => target.inputs.push(PathBuf::from(arg)),
                None => return Err(format!("input '{}' given before any -o <output>", arg)),
            },
        }
    }

    if targets.is_empty() {
        return Err("no output given".to_string());
    }
    if let Some(target) = targets.iter().find(|t| t.inputs.is_empty()) {
        return Err(format!("output '{}' has no input files", target.output.display()));
    }
    config.validate().map_err(|e| e.to_string())?;

    Ok(GlueArgs {
        config,
        targets,
        verbose,
    })
}

fn print_usage() {
    println!("Usage: shader_glue [OPTIONS] -o <output> <input>... [-o <output> <input>...]");
    println!();
    println!("Options:");
    println!("  --output, -o <path>     Start a new target written to <path>");
    println!("  --tab-width, -t <n>     Spaces per indentation level (default: 4)");
    println!("  --no-asserts            Omit compile-time block layout assertions");
    println!("  --verbose, -v           Show detailed information");
    println!("  --help, -h              Show this help");
    println!();
    println!("The accessor type is named after the output file: basic.rs -> BasicShader.");
    println!("Set SHADER_GLUE_DEBUG or RUST_LOG=debug for scanner tracing.");
}
