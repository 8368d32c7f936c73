//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Berth - builds native extension modules with CMake
#[derive(Parser)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure and build every extension declared in Berth.toml
    BuildExt(BuildExtArgs),

    /// Check the CMake toolchain
    Toolchain(ToolchainArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    #[default]
    Human,
    Json,
}

#[derive(Args)]
pub struct BuildExtArgs {
    /// Path to Berth.toml (defaults to searching upward from the current directory)
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Directory extension modules are placed in
    #[arg(long)]
    pub build_lib: Option<PathBuf>,

    /// Staging directory for CMake
    #[arg(long)]
    pub build_temp: Option<PathBuf>,

    /// Extension module filename suffix, e.g. `.cpython-311-x86_64-linux-gnu.so`
    #[arg(long)]
    pub ext_suffix: Option<String>,

    /// Interpreter the extensions are built for
    #[arg(long)]
    pub interpreter: Option<PathBuf>,

    /// CMake executable to use
    #[arg(long)]
    pub cmake: Option<PathBuf>,

    /// CMake build type (Debug, Release, RelWithDebInfo, MinSizeRel)
    #[arg(long, env = "BUILD_TYPE")]
    pub build_type: Option<String>,

    /// Number of parallel jobs for each CMake build
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Don't check that each extension module was produced
    #[arg(long)]
    pub no_verify: bool,

    /// Output format for build messages
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct ToolchainArgs {
    /// CMake executable to check
    #[arg(long)]
    pub cmake: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
