//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use skate::util::shell::ColorChoice;

/// Skate - run Kotlin scripts that declare their own dependencies
#[derive(Parser)]
#[command(name = "skate")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Show every resolution step
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Never touch the network; use cached files of any age
    #[arg(long, global = true)]
    pub offline: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display the include graph and resolved libraries of a script
    Tree(TreeArgs),

    /// Manage the remote include cache
    Cache(CacheArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Start an interactive session with the script loaded
    #[arg(short, long)]
    pub interactive: bool,

    /// Evaluate the trailing arguments (joined with `; `) against the script
    #[arg(short, long)]
    pub action: bool,

    /// Regenerate the script's project workspace
    #[arg(short, long)]
    pub project: bool,

    /// Regenerate the project workspace and open it in the configured IDE
    #[arg(short, long)]
    pub edit: bool,

    /// Create a missing script without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Script to run
    pub file: Option<PathBuf>,

    /// Arguments passed to the script's main function
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Script to inspect
    pub file: PathBuf,

    /// Maximum include depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Expand files already shown elsewhere in the graph
    #[arg(long)]
    pub duplicates: bool,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List cached remote includes
    List,

    /// Remove cached remote includes
    Clean(CacheCleanArgs),

    /// Show the cache directory
    Path,
}

#[derive(Args)]
pub struct CacheCleanArgs {
    /// Only remove includes fetched more than N days ago
    #[arg(long, value_name = "N")]
    pub older_than_days: Option<u64>,

    /// Also remove every build workspace
    #[arg(long)]
    pub builds: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: CompletionShell,
}

/// Flags shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct GlobalOpts {
    pub verbose: bool,
    pub quiet: bool,
    pub offline: bool,
    pub color: ColorChoice,
}

impl Cli {
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            verbose: self.verbose,
            quiet: self.quiet,
            offline: self.offline,
            color: self.color,
        }
    }
}
