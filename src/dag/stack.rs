// src/dag/stack.rs

use crate::task::Name;

/// The names currently being expanded, outermost first.
///
/// Revisiting a name that is still on the stack means the dependency graph
/// has a cycle; the stack contents are the cycle's path.
#[derive(Debug, Default, Clone)]
pub struct ActiveStack {
    names: Vec<Name>,
}

impl ActiveStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.names.contains(name)
    }

    pub fn push(&mut self, name: Name) {
        self.names.push(name);
    }

    pub fn pop(&mut self) -> Option<Name> {
        self.names.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Snapshot of the path for diagnostics.
    pub fn path(&self) -> Vec<Name> {
        self.names.clone()
    }
}
