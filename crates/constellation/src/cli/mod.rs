//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a `.constellation/` repository
//! - `create`, `show`, `list`, `update`, `delete`, `search`, `count`: CIs
//! - `link`, `links`, `unlink`, `edges`, `stats`: relationships
//! - `impact`, `deps`, `bus-factor`: graph analysis
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! constellation create payments-db --type DATABASE --criticality CRITICAL --id db-1
//! constellation create payments-api --type APPLICATION --rel DEPENDS_ON:db-1
//! constellation impact db-1 --depth 2
//! ```

mod args;
mod execute;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    BusFactorArgs, CountArgs, CreateArgs, DeleteArgs, DepsArgs, EdgesArgs, ImpactArgs, InitArgs,
    LinkArgs, LinksArgs, ListArgs, SearchArgs, ShowArgs, StatsArgs, UnlinkArgs, UpdateArgs,
};

pub use validators::{
    parse_attribute, parse_backend, parse_enum, parse_json_object, parse_relationship_arg,
    validate_name, validate_weight,
};

/// Constellation - a configuration management database
///
/// Track configuration items and their relationships, and ask what breaks
/// when one of them fails. Data lives in `.constellation/graph.jsonl`.
#[derive(Parser, Debug)]
#[command(name = "constellation")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new constellation repository
    ///
    /// Creates `.constellation/` with a config file and an empty graph.
    Init(InitArgs),

    /// Create a configuration item
    ///
    /// Outgoing relationships can be attached with `--rel TYPE:TARGET`.
    Create(CreateArgs),

    /// Show a CI with all attributes and relationships
    Show(ShowArgs),

    /// List CIs with optional filters
    List(ListArgs),

    /// Update fields of an existing CI
    ///
    /// Only provided fields change. `id`, `created_at` and `updated_at`
    /// cannot be set.
    Update(UpdateArgs),

    /// Delete a CI and every relationship touching it
    Delete(DeleteArgs),

    /// Search CIs by text
    Search(SearchArgs),

    /// Count all CIs
    Count(CountArgs),

    /// Create a relationship between two CIs
    Link(LinkArgs),

    /// List relationships of one CI
    Links(LinksArgs),

    /// Delete a relationship
    Unlink(UnlinkArgs),

    /// List all relationships, newest first
    Edges(EdgesArgs),

    /// Show graph statistics
    Stats(StatsArgs),

    /// Show which CIs are affected if a CI fails
    ///
    /// Follows DEPENDS_ON, HOSTED_ON and USES edges backwards.
    Impact(ImpactArgs),

    /// Show what a CI transitively depends on
    Deps(DepsArgs),

    /// Rank CIs by how many others depend on them
    BusFactor(BusFactorArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns clap's error for unknown commands or invalid values.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns any error from opening the repository or running the command.
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = OutputMode::from_json_flag(self.json);

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await,
            Some(command) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                let result = execute::dispatch(&app, command, output_mode).await;
                app.close().await?;
                result
            }
            None => {
                println!("Constellation configuration management database");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
