//! radio-studio CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use radio_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use radio_cli::commands::{run_export, run_import, run_media, run_new, run_verify};
use radio_cli::config::load_settings;
use radio_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod summary;

use crate::summary::{
    print_export_summary, print_import_summary, print_media_summary, print_verify_summary,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            tracing::error!("{error:#}");
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    let settings = load_settings(cli.config.as_deref())?;
    let code = match &cli.command {
        Command::New(args) => {
            let path = run_new(args)?;
            println!("Created {}", path.display());
            0
        }
        Command::Export(args) => {
            let outcome = run_export(args, &settings)?;
            print_export_summary(&outcome);
            i32::from(args.strict && outcome.report.has_issues())
        }
        Command::Import(args) => {
            let outcome = run_import(args, &settings)?;
            print_import_summary(&outcome);
            0
        }
        Command::Verify(args) => {
            let report = run_verify(args, &settings)?;
            print_verify_summary(&report);
            i32::from(!report.is_clean())
        }
        Command::Media(args) => {
            let outcome = run_media(args, &settings)?;
            print_media_summary(&outcome);
            0
        }
    };
    Ok(code)
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let mut config = LogConfig::default()
        .with_level(cli.verbosity.tracing_level_filter())
        .with_format(format)
        .with_log_file(cli.log_file.clone());
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
