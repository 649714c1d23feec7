//! A single entity: a document plus the invoke entries and command
//! queues that act on it.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::document::Document;
use crate::invoke::{CommandQueues, CompiledEntry, EntryDef};

use super::arena::ObjectHandle;

/// A render object's ruleset, split the way the dispatcher consumes it:
/// entries with a topic are broadcast/paired, everything else only ever
/// matters through the object's own command queues.
pub struct RenderObject {
    pub document: Arc<RwLock<Document>>,
    pub queues: CommandQueues,
    entries: Vec<Arc<CompiledEntry>>,
    rules_dirty: bool,
    pub delete_flag: bool,
    pub handle: Option<ObjectHandle>,
}

impl RenderObject {
    pub fn new(document: Document) -> Self {
        RenderObject {
            document: Arc::new(RwLock::new(document)),
            queues: CommandQueues::default(),
            entries: Vec::new(),
            rules_dirty: false,
            delete_flag: false,
            handle: None,
        }
    }

    pub fn entries(&self) -> &[Arc<CompiledEntry>] {
        &self.entries
    }

    pub fn set_entry_defs(&mut self, defs: &[EntryDef]) -> Result<(), String> {
        self.entries = defs
            .iter()
            .map(|d| CompiledEntry::compile(d).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        self.rules_dirty = false;
        Ok(())
    }

    pub fn mark_rules_dirty(&mut self) {
        self.rules_dirty = true;
    }

    pub fn rules_dirty(&self) -> bool {
        self.rules_dirty
    }

    /// Rough cost estimate for this object's ruleset: the sum of each
    /// entry's compiled cost, used by the environment to keep per-tile
    /// batches under budget.
    pub fn estimate_cost(&self) -> usize {
        self.entries.iter().map(|e| e.cost).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_flag_defaults_false() {
        let obj = RenderObject::new(Document::new());
        assert!(!obj.delete_flag);
    }

    #[test]
    fn loading_rules_clears_dirty_flag() {
        let mut obj = RenderObject::new(Document::new());
        obj.mark_rules_dirty();
        assert!(obj.rules_dirty());
        obj.set_entry_defs(&[]).unwrap();
        assert!(!obj.rules_dirty());
    }
}
