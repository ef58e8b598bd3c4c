// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lookup table for associating data with AST nodes.
//!
//! Every expression gets a dense index (`eidx`) when it is parsed, so per-node
//! data can live in a flat vector instead of a map keyed by node identity.

use thiserror::Error;

/// Error indicating that a lookup index is out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LookupIndexError {
    #[error("node_idx {node_idx} out of bounds (nodes={nodes})")]
    NodeOutOfBounds { node_idx: u32, nodes: usize },
}

pub type LookupResult<T> = core::result::Result<T, LookupIndexError>;

/// Slot table indexed by node index.
#[derive(Debug, Clone)]
pub struct Lookup<T: Clone> {
    slots: Vec<Option<T>>,
}

impl<T: Clone> Default for Lookup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Lookup<T> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Create a table with room for `nodes` entries.
    pub fn with_nodes(nodes: u32) -> Self {
        Self {
            slots: vec![None; nodes as usize],
        }
    }

    /// Ensure the table can hold the given node index.
    pub fn ensure_capacity(&mut self, node_idx: u32) {
        let node_idx = node_idx as usize;
        if self.slots.len() <= node_idx {
            self.slots.resize(node_idx + 1, None);
        }
    }

    /// Set data with bounds checking.
    pub fn set_checked(&mut self, node_idx: u32, value: T) -> LookupResult<()> {
        let n = self.validate_index(node_idx)?;
        self.slots[n] = Some(value);
        Ok(())
    }

    /// Get data with bounds checking.
    /// Returns Ok(None) if the entry is unset, Err if the index is out of range.
    pub fn get_checked(&self, node_idx: u32) -> LookupResult<Option<&T>> {
        let n = self.validate_index(node_idx)?;
        Ok(self.slots[n].as_ref())
    }

    /// Clear the entry at the given index.
    pub fn clear(&mut self, node_idx: u32) {
        if let Some(slot) = self.slots.get_mut(node_idx as usize) {
            *slot = None;
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a value.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn validate_index(&self, node_idx: u32) -> LookupResult<usize> {
        let n = node_idx as usize;
        if n >= self.slots.len() {
            return Err(LookupIndexError::NodeOutOfBounds {
                node_idx,
                nodes: self.slots.len(),
            });
        }
        Ok(n)
    }
}
