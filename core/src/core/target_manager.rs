use std::collections::{HashSet, VecDeque};

/// Deduplicating queue of raw audit inputs.
///
/// Inputs are kept exactly as given (validation happens in the pipeline);
/// blank lines are ignored.
#[derive(Debug, Default)]
pub struct TargetManager {
    queue: VecDeque<String>,
    seen: HashSet<String>,
}

impl TargetManager {
    /// Creates a new, empty `TargetManager`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut manager = Self::new();
        for input in inputs {
            manager.add_target(input.into());
        }
        manager
    }

    /// Adds a target unless it is blank or already queued.
    pub fn add_target(&mut self, target: String) {
        if target.trim().is_empty() {
            return;
        }
        if self.seen.insert(target.clone()) {
            self.queue.push_back(target);
        }
    }

    /// Returns the next pending target, or `None` if the queue is empty.
    pub fn next(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    /// Number of targets still queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_and_order() {
        let mut manager = TargetManager::from_inputs(["b.com", "a.com", "b.com", "  ", ""]);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.next().as_deref(), Some("b.com"));
        assert_eq!(manager.next().as_deref(), Some("a.com"));
        assert!(manager.next().is_none());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_seen_targets_are_not_requeued() {
        let mut manager = TargetManager::new();
        manager.add_target("a.com".to_string());
        manager.next();
        manager.add_target("a.com".to_string());
        assert!(manager.is_empty());
    }
}
