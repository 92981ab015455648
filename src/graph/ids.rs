use super::model::{NodeId, NodeType};
use ahash::AHashMap;

/// Hands out human-legible node ids, namespaced per node type.
///
/// Counters live as long as the allocator and are independent per type, so
/// `input-1`, `input-2`, `math-1` can be issued in any interleaving without
/// ever repeating a value.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    counters: AHashMap<NodeType, u64>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter for `node_type` and returns `"{type}-{counter}"`.
    pub fn allocate(&mut self, node_type: NodeType) -> NodeId {
        let counter = self.counters.entry(node_type).or_insert(0);
        *counter += 1;
        format!("{}-{}", node_type, counter)
    }

    /// The last counter value issued for `node_type` (0 if none yet).
    pub fn peek(&self, node_type: NodeType) -> u64 {
        self.counters.get(&node_type).copied().unwrap_or(0)
    }

    /// Raises the counter of the type named by `id`'s prefix so that `id` is
    /// never re-issued. Ids not shaped `"{type}-{n}"` are left alone.
    ///
    /// The prefix decides, not the node's own type: a math node stored under
    /// `input-3` still reserves `input-3`.
    pub fn observe(&mut self, id: &str) {
        let Some((prefix, suffix)) = id.rsplit_once('-') else {
            return;
        };
        let Some(node_type) = NodeType::ALL.into_iter().find(|t| t.as_str() == prefix) else {
            return;
        };
        if let Ok(n) = suffix.parse::<u64>() {
            let counter = self.counters.entry(node_type).or_insert(0);
            *counter = (*counter).max(n);
        }
    }
}
