//! CLI command implementations

pub mod read;
pub mod write;

use clap::Args;
use nestset_core::{NestedSet, Scope, TreeConfig};
use nestset_store::SqliteRowStore;
use std::path::PathBuf;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Database, scope and layout shared by every command
#[derive(Debug, Args)]
pub struct TreeArgs {
    #[arg(long, default_value = ".nestset/tree.db")]
    pub db: PathBuf,

    #[arg(long, default_value = "default")]
    pub scope: String,

    /// TOML file with table and column names
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl TreeArgs {
    pub fn scope(&self) -> Scope {
        Scope::new(self.scope.clone())
    }

    /// Open the database, applying migrations and creating the table
    pub fn open(&self) -> Result<NestedSet<SqliteRowStore>, Box<dyn std::error::Error>> {
        let config = match &self.config {
            Some(path) => TreeConfig::load(path)?,
            None => TreeConfig::default(),
        };
        let store = SqliteRowStore::open(&self.db, config.clone())?;
        Ok(NestedSet::new(store, config)?)
    }
}

pub fn init(args: TreeArgs) -> CliResult {
    let tree = args.open()?;
    println!(
        "Initialized {} (table {})",
        args.db.display(),
        tree.config().table
    );
    Ok(())
}
