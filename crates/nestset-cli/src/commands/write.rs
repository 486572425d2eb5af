//! Structural commands: add, add-tree, move, delete

use clap::Args;
use nestset_core::{NodeId, Payload};
use nestset_engine::{apply_tree_command, NodeSpec, TreeCommand, TreeCommandResult};
use std::path::PathBuf;

use super::{CliResult, TreeArgs};

#[derive(Debug, Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Value of the `name` attribute
    pub name: String,

    /// Parent node id; omitted for the root
    #[arg(long)]
    pub parent: Option<String>,

    /// Extra attribute as key=value; the value is parsed as JSON when possible
    #[arg(long = "attr", value_parser = parse_attr)]
    pub attrs: Vec<(String, serde_json::Value)>,
}

#[derive(Debug, Args)]
pub struct AddTreeArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// JSON file holding `{"payload": {...}, "children": [...]}`
    pub file: PathBuf,

    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    pub node: String,

    pub new_parent: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    pub node: String,
}

fn parse_attr(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn add(args: AddArgs) -> CliResult {
    let mut tree = args.tree.open()?;
    let mut payload = Payload::named(args.name);
    for (key, value) in args.attrs {
        payload.set(key, value);
    }

    let cmd = TreeCommand::AddNode {
        parent_id: args.parent.as_deref().map(NodeId::from),
        payload,
    };
    if let TreeCommandResult::Added { node_id, .. } =
        apply_tree_command(cmd, &mut tree, &args.tree.scope())?
    {
        println!("{}", node_id);
    }
    Ok(())
}

pub fn add_tree(args: AddTreeArgs) -> CliResult {
    let text = std::fs::read_to_string(&args.file)?;
    let spec: NodeSpec = serde_json::from_str(&text)?;
    let mut tree = args.tree.open()?;

    let cmd = TreeCommand::AddSubtree {
        parent_id: args.parent.as_deref().map(NodeId::from),
        spec,
    };
    if let TreeCommandResult::AddedSubtree { node_ids, .. } =
        apply_tree_command(cmd, &mut tree, &args.tree.scope())?
    {
        for id in node_ids {
            println!("{}", id);
        }
    }
    Ok(())
}

pub fn move_node(args: MoveArgs) -> CliResult {
    let mut tree = args.tree.open()?;
    let cmd = TreeCommand::MoveNode {
        node_id: NodeId::from(args.node.as_str()),
        new_parent_id: NodeId::from(args.new_parent.as_str()),
    };
    if let TreeCommandResult::Moved(report) =
        apply_tree_command(cmd, &mut tree, &args.tree.scope())?
    {
        println!(
            "Moved {} under {} ({} rows shifted)",
            report.node_id, report.new_parent_id, report.rows_shifted
        );
    }
    Ok(())
}

pub fn delete(args: DeleteArgs) -> CliResult {
    let mut tree = args.tree.open()?;
    let cmd = TreeCommand::DeleteNode {
        node_id: NodeId::from(args.node.as_str()),
    };
    if let TreeCommandResult::Deleted(report) =
        apply_tree_command(cmd, &mut tree, &args.tree.scope())?
    {
        println!(
            "Deleted {} ({} rows removed)",
            report.node_id, report.rows_deleted
        );
    }
    Ok(())
}
