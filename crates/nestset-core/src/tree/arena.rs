//! In-memory working set of tree nodes
//!
//! Callers build new subtrees here and hold loaded stored nodes. Nodes live in
//! slots addressed by `NodeHandle`; parent and child links are handles, so a
//! child never owns its parent. Destroying a node releases its slot and every
//! handle to it becomes stale.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::{Result, TreeError};
use crate::model::{NodeId, NodeRow, Payload, Scope, Span};
use crate::queries::subtree::LoadedSubtree;
use crate::tree::shift::Shift;

/// Index of a node slot inside one `TreeArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Lifecycle of an in-memory node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Created, not attached to any parent
    Unattached,
    /// Attached to a parent, not yet stored
    Staged,
    /// Stored; left/right/level mirror the row store
    Committed,
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    id: NodeId,
    parent: Option<NodeHandle>,
    parent_id: Option<NodeId>,
    children: Vec<NodeHandle>,
    /// The child list holds every stored child
    children_loaded: bool,
    span: Option<Span>,
    level: Option<i64>,
    payload: Payload,
    state: NodeState,
    dirty: bool,
    attributes_changed: bool,
}

impl TreeNode {
    fn new(id: NodeId, payload: Payload) -> Self {
        Self {
            id,
            parent: None,
            parent_id: None,
            children: Vec::new(),
            children_loaded: true,
            span: None,
            level: None,
            payload,
            state: NodeState::Unattached,
            dirty: false,
            attributes_changed: false,
        }
    }

    fn from_row(row: &NodeRow) -> Self {
        Self {
            id: row.id.clone(),
            parent: None,
            parent_id: row.parent_id.clone(),
            children: Vec::new(),
            children_loaded: row.children_count() == 0,
            span: Some(row.span()),
            level: row.level,
            payload: row.payload.clone(),
            state: NodeState::Committed,
            dirty: false,
            attributes_changed: false,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    pub fn children_loaded(&self) -> bool {
        self.children_loaded
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn level(&self) -> Option<i64> {
        self.level
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_committed(&self) -> bool {
        self.state == NodeState::Committed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn attributes_changed(&self) -> bool {
        self.attributes_changed
    }
}

/// Arena of nodes belonging to one scope
#[derive(Debug, Clone)]
pub struct TreeArena {
    scope: Scope,
    slots: Vec<Option<TreeNode>>,
    index: HashMap<NodeId, NodeHandle>,
}

impl TreeArena {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            slots: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Create an unattached node with a fresh id
    pub fn create(&mut self, payload: Payload) -> NodeHandle {
        self.push(TreeNode::new(NodeId::generate(), payload))
    }

    fn push(&mut self, node: TreeNode) -> NodeHandle {
        let handle = NodeHandle(self.slots.len());
        self.index.insert(node.id.clone(), handle);
        self.slots.push(Some(node));
        handle
    }

    pub fn node(&self, handle: NodeHandle) -> Result<&TreeNode> {
        self.slots
            .get(handle.0)
            .and_then(Option::as_ref)
            .ok_or(TreeError::StaleHandle { handle: handle.0 })
    }

    fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut TreeNode> {
        self.slots
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::StaleHandle { handle: handle.0 })
    }

    /// Handle of a live node by id
    pub fn find(&self, id: &NodeId) -> Option<NodeHandle> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.node(handle).is_ok()
    }

    /// Attach `child` as the last child of `parent`
    ///
    /// The child becomes staged and every in-memory ancestor is marked dirty.
    pub fn attach(&mut self, parent: NodeHandle, child: NodeHandle) -> Result<()> {
        let child_node = self.node(child)?;
        if child_node.state != NodeState::Unattached || child_node.parent.is_some() {
            return Err(TreeError::AlreadyAttached {
                node_id: child_node.id.to_string(),
            });
        }
        let child_id = child_node.id.clone();

        // Walking up from the parent must not reach the child
        let mut cursor = Some(parent);
        while let Some(handle) = cursor {
            let node = self.node(handle)?;
            if handle == child {
                return Err(TreeError::IllegalReparent {
                    node_id: child_id.to_string(),
                    new_parent_id: self.node(parent)?.id.to_string(),
                });
            }
            cursor = node.parent;
        }

        let parent_id = self.node(parent)?.id.clone();
        {
            let node = self.node_mut(child)?;
            node.parent = Some(parent);
            node.parent_id = Some(parent_id);
            node.state = NodeState::Staged;
            node.dirty = true;
        }
        self.node_mut(parent)?.children.push(child);
        self.mark_dirty(parent)
    }

    /// Undo `attach` for a node that was never stored
    pub fn detach(&mut self, child: NodeHandle) -> Result<()> {
        let node = self.node(child)?;
        if node.state == NodeState::Committed {
            return Err(TreeError::AlreadyAttached {
                node_id: node.id.to_string(),
            });
        }
        if let Some(parent) = node.parent {
            self.node_mut(parent)?.children.retain(|h| *h != child);
        }
        let node = self.node_mut(child)?;
        node.parent = None;
        node.parent_id = None;
        node.state = NodeState::Unattached;
        Ok(())
    }

    /// Set the dirty flag on `handle` and every in-memory ancestor
    pub fn mark_dirty(&mut self, handle: NodeHandle) -> Result<()> {
        let mut cursor = Some(handle);
        while let Some(h) = cursor {
            let node = self.node_mut(h)?;
            node.dirty = true;
            cursor = node.parent;
        }
        Ok(())
    }

    /// Change one payload attribute
    pub fn set_attribute(
        &mut self,
        handle: NodeHandle,
        key: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        self.node_mut(handle)?.payload.set(key, value);
        self.touch_attributes(handle)
    }

    /// Replace the whole payload
    pub fn replace_payload(&mut self, handle: NodeHandle, payload: Payload) -> Result<()> {
        self.node_mut(handle)?.payload = payload;
        self.touch_attributes(handle)
    }

    fn touch_attributes(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.node_mut(handle)?;
        if node.state == NodeState::Committed {
            node.attributes_changed = true;
            self.mark_dirty(handle)?;
        }
        Ok(())
    }

    /// `handle` followed by its in-memory descendants in preorder
    pub fn preorder(&self, handle: NodeHandle) -> Result<Vec<NodeHandle>> {
        let mut out = Vec::new();
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            let node = self.node(h)?;
            out.push(h);
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Top-most unsaved node of the batch containing `handle`
    ///
    /// A committed node is its own batch root.
    pub fn batch_root(&self, handle: NodeHandle) -> Result<NodeHandle> {
        let mut current = handle;
        loop {
            let node = self.node(current)?;
            if node.state == NodeState::Committed {
                return Ok(current);
            }
            match node.parent {
                Some(parent) if !self.node(parent)?.is_committed() => current = parent,
                _ => return Ok(current),
            }
        }
    }

    /// Row image of a numbered node
    pub fn row(&self, handle: NodeHandle) -> Result<NodeRow> {
        let node = self.node(handle)?;
        let span = node.span.ok_or_else(|| TreeError::NotCommitted {
            node_id: node.id.to_string(),
        })?;
        Ok(NodeRow {
            id: node.id.clone(),
            parent_id: node.parent_id.clone(),
            left: span.left,
            right: span.right,
            level: node.level,
            scope: self.scope.clone(),
            payload: node.payload.clone(),
        })
    }

    /// Add a stored row, or refresh the node already holding its id
    ///
    /// The node is linked under its parent when the parent is present.
    pub fn insert_committed(&mut self, row: &NodeRow) -> Result<NodeHandle> {
        if row.scope != self.scope {
            return Err(TreeError::ScopeMismatch {
                expected: self.scope.to_string(),
                found: row.scope.to_string(),
            });
        }

        if let Some(handle) = self.find(&row.id) {
            self.refresh(handle, row)?;
            return Ok(handle);
        }

        let parent = row.parent_id.as_ref().and_then(|id| self.find(id));
        let mut node = TreeNode::from_row(row);
        node.parent = parent;
        let handle = self.push(node);
        if let Some(parent) = parent {
            let siblings = &mut self.node_mut(parent)?.children;
            if !siblings.contains(&handle) {
                siblings.push(handle);
            }
        }
        Ok(handle)
    }

    /// Overwrite interval and level from a stored row
    ///
    /// Pending payload edits are kept.
    pub fn refresh(&mut self, handle: NodeHandle, row: &NodeRow) -> Result<()> {
        let node = self.node_mut(handle)?;
        node.span = Some(row.span());
        node.level = row.level;
        node.parent_id = row.parent_id.clone();
        if !node.attributes_changed {
            node.payload = row.payload.clone();
        }
        Ok(())
    }

    /// Link a loaded subtree under `anchor`, replacing its stored-child cache
    ///
    /// Staged children of `anchor` stay attached after the loaded ones.
    pub fn graft(
        &mut self,
        anchor: NodeHandle,
        subtree: &LoadedSubtree,
    ) -> Result<Vec<NodeHandle>> {
        let anchor_id = self.node(anchor)?.id.clone();
        if anchor_id != subtree.root().id {
            return Err(TreeError::invariant(
                &self.scope,
                format!(
                    "subtree of {} grafted onto {}",
                    subtree.root().id,
                    anchor_id
                ),
            ));
        }

        let mut handles = Vec::with_capacity(subtree.len());
        for (index, row) in subtree.rows().iter().enumerate() {
            let handle = self.insert_committed(row)?;
            let complete = subtree.loaded_descendants(index) as i64 == row.children_count();
            let node = self.node_mut(handle)?;
            node.children_loaded = complete;
            handles.push(handle);
        }

        // Rebuild child lists in stored order
        for (index, handle) in handles.iter().enumerate() {
            let loaded: Vec<NodeHandle> = subtree
                .children_of(index)
                .iter()
                .map(|child| handles[*child])
                .collect();
            self.replace_committed_children(*handle, loaded)?;
        }
        let top: Vec<NodeHandle> = subtree
            .root_children()
            .iter()
            .map(|child| handles[*child])
            .collect();
        self.replace_committed_children(anchor, top)?;
        let complete = subtree.len() as i64 == subtree.root().children_count();
        self.node_mut(anchor)?.children_loaded = complete;

        Ok(handles)
    }

    fn replace_committed_children(
        &mut self,
        parent: NodeHandle,
        loaded: Vec<NodeHandle>,
    ) -> Result<()> {
        let staged: Vec<NodeHandle> = self
            .node(parent)?
            .children
            .iter()
            .copied()
            .filter(|h| !loaded.contains(h))
            .filter(|h| self.node(*h).map(|n| !n.is_committed()).unwrap_or(false))
            .collect();
        for child in &loaded {
            self.node_mut(*child)?.parent = Some(parent);
        }
        let node = self.node_mut(parent)?;
        node.children = loaded;
        node.children.extend(staged);
        Ok(())
    }

    /// Apply a bulk shift to every committed node held in memory
    pub fn apply_shift(&mut self, shift: &Shift) {
        for node in self.slots.iter_mut().flatten() {
            if node.state != NodeState::Committed {
                continue;
            }
            if let Some(span) = node.span {
                node.level = node.level.map(|level| shift.apply_level(span.left, level));
                node.span = Some(shift.apply_span(span));
            }
        }
    }

    pub(crate) fn set_numbering(
        &mut self,
        handle: NodeHandle,
        span: Span,
        level: Option<i64>,
    ) -> Result<()> {
        let node = self.node_mut(handle)?;
        node.span = Some(span);
        node.level = level;
        Ok(())
    }

    /// Make `child` the last in-memory child of `new_parent`
    pub(crate) fn relink(&mut self, child: NodeHandle, new_parent: NodeHandle) -> Result<()> {
        if let Some(old) = self.node(child)?.parent {
            self.node_mut(old)?.children.retain(|h| *h != child);
        }
        let parent_id = self.node(new_parent)?.id.clone();
        self.node_mut(new_parent)?.children.push(child);
        let node = self.node_mut(child)?;
        node.parent = Some(new_parent);
        node.parent_id = Some(parent_id);
        Ok(())
    }

    pub(crate) fn mark_committed(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.node_mut(handle)?;
        node.state = NodeState::Committed;
        node.dirty = false;
        node.attributes_changed = false;
        Ok(())
    }

    pub(crate) fn clear_flags(&mut self, handle: NodeHandle) -> Result<()> {
        let node = self.node_mut(handle)?;
        node.dirty = false;
        node.attributes_changed = false;
        Ok(())
    }

    /// Free one slot and unlink it from its parent; children must be gone
    pub(crate) fn release(&mut self, handle: NodeHandle) -> Result<()> {
        if let Some(parent) = self.node(handle)?.parent {
            if let Ok(node) = self.node_mut(parent) {
                node.children.retain(|h| *h != handle);
            }
        }
        if let Some(node) = self.slots.get_mut(handle.0).and_then(Option::take) {
            self.index.remove(&node.id);
        }
        Ok(())
    }

    /// Free a node and everything below it
    pub fn release_subtree(&mut self, handle: NodeHandle) -> Result<()> {
        let mut order = self.preorder(handle)?;
        order.reverse();
        for h in order {
            self.release(h)?;
        }
        Ok(())
    }
}
