//! CLI argument definitions for radio-studio.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "radio-studio",
    version,
    about = "Radio project tool - export RadioData and recorded media for the game",
    long_about = "Export radio projects to the game's RadioData XML and recorded media \
                  script/translation files, import RadioData back into a project, and \
                  verify that an export round-trips."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Settings file (default: settings.toml in the platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty project file.
    New(NewArgs),

    /// Export a project to RadioData XML.
    Export(ExportArgs),

    /// Merge a RadioData XML file into a project.
    Import(ImportArgs),

    /// Export to memory, parse it back and compare with the project.
    Verify(ProjectArgs),

    /// Write the recorded media script and translation files.
    Media(MediaArgs),
}

#[derive(Parser)]
pub struct NewArgs {
    /// Path of the project file to create.
    #[arg(value_name = "PROJECT")]
    pub path: PathBuf,

    /// Overwrite an existing file.
    #[arg(long = "force")]
    pub force: bool,
}

#[derive(Parser)]
pub struct ProjectArgs {
    /// Project file (default: project_path from the settings file when
    /// auto_load_project is enabled).
    #[arg(long = "project", short = 'p', value_name = "PROJECT")]
    pub project: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ExportArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Output file (default: <export_dir>/RadioData.xml).
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Exit with an error status when the export reports issues.
    #[arg(long = "strict")]
    pub strict: bool,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// RadioData XML file to import.
    #[arg(value_name = "RADIO_DATA")]
    pub input: PathBuf,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// Report what would change without saving the project.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct MediaArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Script output (default: <export_dir>/recorded_media.lua).
    #[arg(long = "script", value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Translation output (default: <export_dir>/Recorded_Media_EN.txt).
    #[arg(long = "translation", value_name = "FILE")]
    pub translation: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
