use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xmlconverge")]
#[command(version)]
#[command(about = "Converge XML files to declared transforms", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest file (default: $XMLCONVERGE_MANIFEST or <config dir>/manifest.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show which transforms hold and which have drifted
    Status(StatusArgs),

    /// Preview what apply would change
    Diff(TargetArgs),

    /// Make every file satisfy its transforms
    Apply(ApplyArgs),

    /// Check the manifest without reading any XML file
    Validate,

    /// List the elements an xpath matches in a file
    Inspect(InspectArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Only these transforms: "xml_transform", "xml_transform.<name>" or "<name>"
    pub target: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Only these transforms: "xml_transform", "xml_transform.<name>" or "<name>"
    pub target: Option<String>,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only these transforms: "xml_transform", "xml_transform.<name>" or "<name>"
    pub target: Option<String>,

    /// Show what would be written without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of files converged at once (default: manifest setting, then 4)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct InspectArgs {
    /// XML file to read
    pub file: PathBuf,

    /// Selector to evaluate
    #[arg(short = 'x', long)]
    pub xpath: String,
}
