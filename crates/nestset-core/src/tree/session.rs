//! Per-operation commit state
//!
//! A `CommitSession` lives for exactly one save or destroy and is threaded
//! through every recursive call. The active save root is the only node
//! allowed to issue a structural shift; staged nodes discovered while it
//! runs are queued and each becomes its own active root afterwards.

use std::collections::VecDeque;

use serde::Serialize;

use crate::core_types::OperationId;
use crate::model::Scope;
use crate::tree::arena::NodeHandle;

/// Counters describing what one structural operation wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub inserted: usize,
    pub rewritten: usize,
    pub shifts: usize,
    pub rows_shifted: usize,
}

#[derive(Debug)]
pub struct CommitSession {
    operation_id: OperationId,
    scope: Scope,
    active_root: Option<NodeHandle>,
    destroy_root: Option<NodeHandle>,
    pending: VecDeque<NodeHandle>,
    report: SaveReport,
}

impl CommitSession {
    pub fn new(scope: Scope) -> Self {
        Self {
            operation_id: OperationId::new(),
            scope,
            active_root: None,
            destroy_root: None,
            pending: VecDeque::new(),
            report: SaveReport::default(),
        }
    }

    pub fn operation_id(&self) -> &OperationId {
        &self.operation_id
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Register `node` as the active save root if none is set
    ///
    /// Returns true when `node` now holds the marker.
    pub fn claim_save_root(&mut self, node: NodeHandle) -> bool {
        match self.active_root {
            None => {
                self.active_root = Some(node);
                true
            }
            Some(active) => active == node,
        }
    }

    pub fn release_save_root(&mut self, node: NodeHandle) {
        if self.active_root == Some(node) {
            self.active_root = None;
        }
    }

    pub fn active_root(&self) -> Option<NodeHandle> {
        self.active_root
    }

    pub fn claim_destroy_root(&mut self, node: NodeHandle) -> bool {
        match self.destroy_root {
            None => {
                self.destroy_root = Some(node);
                true
            }
            Some(active) => active == node,
        }
    }

    pub fn is_destroy_root(&self, node: NodeHandle) -> bool {
        self.destroy_root == Some(node)
    }

    pub fn release_destroy_root(&mut self, node: NodeHandle) {
        if self.destroy_root == Some(node) {
            self.destroy_root = None;
        }
    }

    /// Queue a staged node; the most recently queued is flushed first
    pub fn queue_pending(&mut self, node: NodeHandle) {
        if !self.pending.contains(&node) {
            self.pending.push_front(node);
        }
    }

    pub fn take_pending(&mut self) -> Option<NodeHandle> {
        self.pending.pop_front()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn record_inserted(&mut self, rows: usize) {
        self.report.inserted += rows;
    }

    pub fn record_rewritten(&mut self) {
        self.report.rewritten += 1;
    }

    pub fn record_shift(&mut self, rows: usize) {
        self.report.shifts += 1;
        self.report.rows_shifted += rows;
    }

    pub fn report(&self) -> &SaveReport {
        &self.report
    }

    pub fn into_report(self) -> SaveReport {
        self.report
    }
}
