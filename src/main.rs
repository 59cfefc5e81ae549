mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod resource;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Flags every command receives
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Manifest given on the command line
    pub manifest: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        ui::error(&format!("{e:#}"));
        if let Some(category) = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<xmlkit::Error>())
            .map(xmlkit::Error::category)
        {
            ui::dim(&format!("{}: {}", category.description(), category.advice()));
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // -v raises the level, -q wins over it
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        manifest: cli.manifest,
    };

    match cli.command {
        Command::Status(args) => commands::status::run(&ctx, args),
        Command::Diff(args) => commands::diff::run(&ctx, args),
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Validate => commands::validate::run(&ctx),
        Command::Inspect(args) => commands::inspect::run(&ctx, args),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "xmlconverge", &mut io::stdout());
            Ok(())
        }
    }
}
