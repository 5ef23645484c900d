//! `kforge` CLI: wires the builder, analyzer, planner, and emitter together
//! in one single-threaded, synchronous invocation.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use thiserror::Error;

use kforge_analyze::{analyze, plan};
use kforge_emit::{profile_by_name, EmitError};
use kforge_ir::{build, BuildConfig, BuildError, ParsedFunction};

/// Generic kernel specializer: turns a portable vector-API kernel into a
/// fused, target-specific C kernel.
#[derive(Parser)]
#[command(name = "kforge", about = "Generic SIMD kernel specializer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, analyze, fuse, and emit one kernel function.
    Generate {
        /// Path to a JSON-encoded `ParsedFunction`.
        #[arg(long)]
        input: PathBuf,

        /// Target intrinsic profile: neon, avx2, avx512, fallback.
        #[arg(long)]
        profile: String,

        /// Concrete element type substituted for generic parameters
        /// (e.g. "float32").
        #[arg(long = "element-type")]
        element_type: String,

        /// Output path for the emitted C source; stdout if omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also print the annotated, fused IR as JSON (diagnostic only).
        #[arg(long = "emit-ir")]
        emit_ir: bool,
    },
}

/// The CLI's own error type, wrapping each pipeline stage's error plus the
/// I/O and JSON failures of reading the input file.
///
/// `exit_code` maps each failure class to a distinct process exit status:
/// 1 = I/O/parse, 2 = build, 3 = emit.
#[derive(Debug, Error)]
enum CliError {
    #[error("unknown profile '{0}' (expected neon, avx2, avx512, or fallback)")]
    UnknownProfile(String),

    #[error("failed to read '{path}': {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse '{path}' as a ParsedFunction: {source}")]
    Json { path: PathBuf, #[source] source: serde_json::Error },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::UnknownProfile(_) | CliError::Io { .. } | CliError::Json { .. } => 1,
            CliError::Build(_) => 2,
            CliError::Emit(_) => 3,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Generate { input, profile, element_type, output, emit_ir } => {
            match run_generate(&input, &profile, &element_type, output, emit_ir) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Error: {e}");
                    e.exit_code()
                }
            }
        }
    };
    process::exit(exit_code);
}

/// Runs one generator invocation end to end: read, build, analyze, plan,
/// emit, write.
fn run_generate(
    input: &PathBuf,
    profile_name: &str,
    element_type: &str,
    output: Option<PathBuf>,
    emit_ir: bool,
) -> Result<(), CliError> {
    let profile =
        profile_by_name(profile_name).ok_or_else(|| CliError::UnknownProfile(profile_name.to_string()))?;

    let raw = fs::read_to_string(input).map_err(|source| CliError::Io { path: input.clone(), source })?;
    let parsed: ParsedFunction =
        serde_json::from_str(&raw).map_err(|source| CliError::Json { path: input.clone(), source })?;

    let config = BuildConfig { element_type: element_type.to_string(), lanes: profile.lanes() };

    let mut ir = build(&parsed, &config)?;

    let candidates = analyze(&mut ir);
    plan(&mut ir, &candidates);

    let source = kforge_emit::emit(&ir, profile.as_ref())?;

    if emit_ir {
        match serde_json::to_string_pretty(&ir) {
            Ok(json) => eprintln!("{json}"),
            Err(e) => eprintln!("Warning: failed to serialize IR for --emit-ir: {e}"),
        }
    }

    match output {
        Some(path) => fs::write(&path, &source).map_err(|source| CliError::Io { path, source })?,
        None => print!("{source}"),
    }

    Ok(())
}
