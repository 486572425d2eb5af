//! Read commands: show, ancestors, verify

use clap::Args;
use nestset_core::{LoadedSubtree, NodeId, NodeRow};
use nestset_engine::{apply_tree_query, TreeQuery, TreeQueryResult};

use super::{CliResult, TreeArgs};

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Node to start from; every root when omitted
    pub node: Option<String>,

    /// Levels below the start node to print (0 = all)
    #[arg(long, default_value_t = 0)]
    pub depth: u32,
}

#[derive(Debug, Args)]
pub struct AncestorsArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    pub node: String,
}

/// `name [left,right] id`
fn describe(row: &NodeRow) -> String {
    format!(
        "{} [{},{}] {}",
        row.payload.name().unwrap_or("-"),
        row.left,
        row.right,
        row.id
    )
}

fn print_subtree(subtree: &LoadedSubtree) {
    println!("{}", describe(subtree.root()));
    let mut stack: Vec<usize> = subtree.root_children().iter().rev().copied().collect();
    while let Some(index) = stack.pop() {
        if let (Some(row), Some(depth)) = (subtree.get(index), subtree.depth(index)) {
            println!("{}{}", "  ".repeat(depth as usize), describe(row));
        }
        stack.extend(subtree.children_of(index).iter().rev().copied());
    }
}

pub fn show(args: ShowArgs) -> CliResult {
    let tree = args.tree.open()?;
    let scope = args.tree.scope();

    let starts: Vec<NodeId> = match args.node {
        Some(node) => vec![NodeId::from(node.as_str())],
        None => match apply_tree_query(TreeQuery::Roots, &tree, &scope)? {
            TreeQueryResult::Rows(rows) => rows.into_iter().map(|r| r.id).collect(),
            _ => Vec::new(),
        },
    };

    for node_id in starts {
        let query = TreeQuery::Subtree {
            node_id,
            max_depth: args.depth,
        };
        if let TreeQueryResult::Subtree(subtree) = apply_tree_query(query, &tree, &scope)? {
            print_subtree(&subtree);
        }
    }
    Ok(())
}

pub fn ancestors(args: AncestorsArgs) -> CliResult {
    let tree = args.tree.open()?;
    let query = TreeQuery::Ancestors {
        node_id: NodeId::from(args.node.as_str()),
    };
    if let TreeQueryResult::Rows(rows) = apply_tree_query(query, &tree, &args.tree.scope())? {
        for row in rows {
            println!("{}", describe(&row));
        }
    }
    Ok(())
}

pub fn verify(args: TreeArgs) -> CliResult {
    let tree = args.open()?;
    if let TreeQueryResult::Verified(rows) =
        apply_tree_query(TreeQuery::Verify, &tree, &args.scope())?
    {
        println!("ok: {} rows", rows);
    }
    Ok(())
}
