//! nestset CLI
//!
//! Command-line interface for nested-set trees stored in SQLite

use clap::{Parser, Subcommand};
use nestset_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "nestset")]
#[command(about = "nestset - Nested-set trees in SQLite", long_about = None)]
struct Cli {
    /// Emit JSON logs on stderr instead of human-readable ones
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database and table
    Init(commands::TreeArgs),
    /// Add one node
    Add(commands::write::AddArgs),
    /// Add a subtree described as JSON
    AddTree(commands::write::AddTreeArgs),
    /// Make a node the last child of another
    Move(commands::write::MoveArgs),
    /// Delete a node and its descendants
    Delete(commands::write::DeleteArgs),
    /// Print a tree or subtree
    Show(commands::read::ShowArgs),
    /// Print the ancestors of a node, nearest first
    Ancestors(commands::read::AncestorsArgs),
    /// Check every interval invariant of the scope
    Verify(commands::TreeArgs),
}

fn main() {
    let cli = Cli::parse();
    init(if cli.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = match cli.command {
        Commands::Init(args) => commands::init(args),
        Commands::Add(args) => commands::write::add(args),
        Commands::AddTree(args) => commands::write::add_tree(args),
        Commands::Move(args) => commands::write::move_node(args),
        Commands::Delete(args) => commands::write::delete(args),
        Commands::Show(args) => commands::read::show(args),
        Commands::Ancestors(args) => commands::read::ancestors(args),
        Commands::Verify(args) => commands::read::verify(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
