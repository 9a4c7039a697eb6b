//! Run identifier bookkeeping and delegation depth tracking.
//!
//! The engine reports invocations only by opaque run id; nesting is
//! reconstructed here from a record map plus a stack over the single
//! delegation operation. This models one active delegation chain: with
//! concurrent sibling delegations the stack still enforces LIFO close
//! ordering, which the engine guarantees by construction. A per-branch
//! tree would be needed to lift that restriction.

use std::collections::HashMap;

/// The one well-known operation name that opens a nesting level.
pub const DELEGATION_TOOL: &str = "task";

/// Bookkeeping for one observed invocation start.
#[derive(Debug, Clone)]
struct InvocationRecord {
    name: String,
    is_delegation: bool,
}

/// A closed invocation as reported by [`NestingTracker::on_end`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedInvocation {
    pub name: String,
    pub is_delegation: bool,
    /// Stack depth after the close; the depth the operation's own
    /// start/end events are tagged with (its parent's depth).
    pub depth: usize,
}

/// Tracks open invocations and the active delegation stack for one request.
#[derive(Debug, Default)]
pub struct NestingTracker {
    records: HashMap<String, InvocationRecord>,
    stack: Vec<String>,
}

impl NestingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invocation start. Returns whether it is a delegation,
    /// or `None` for a repeated start of an already-open run id, which
    /// is ignored so the stack cannot be double-pushed and no duplicate
    /// start event gets emitted for it.
    pub fn on_start(&mut self, run_id: &str, name: &str) -> Option<bool> {
        if self.records.contains_key(run_id) {
            return None;
        }

        let is_delegation = name == DELEGATION_TOOL;
        self.records.insert(
            run_id.to_string(),
            InvocationRecord {
                name: name.to_string(),
                is_delegation,
            },
        );
        if is_delegation {
            self.stack.push(run_id.to_string());
        }
        Some(is_delegation)
    }

    /// Close an invocation. Returns `None` for an unknown run id
    /// (end-without-start is tolerated, not an error).
    pub fn on_end(&mut self, run_id: &str) -> Option<ClosedInvocation> {
        let record = self.records.remove(run_id)?;

        if record.is_delegation && self.stack.last().map(String::as_str) == Some(run_id) {
            self.stack.pop();
        }

        Some(ClosedInvocation {
            name: record.name,
            is_delegation: record.is_delegation,
            depth: self.stack.len(),
        })
    }

    /// Current delegation depth; tags events emitted inside an operation.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_tools_do_not_change_depth() {
        let mut tracker = NestingTracker::new();
        assert_eq!(tracker.on_start("1", "tavily_search"), Some(false));
        assert_eq!(tracker.depth(), 0);
        let closed = tracker.on_end("1").unwrap();
        assert_eq!(closed.name, "tavily_search");
        assert!(!closed.is_delegation);
        assert_eq!(closed.depth, 0);
    }

    #[test]
    fn delegation_opens_and_closes_a_level() {
        let mut tracker = NestingTracker::new();
        assert_eq!(tracker.on_start("t1", "task"), Some(true));
        assert_eq!(tracker.depth(), 1);

        tracker.on_start("s1", "think_tool");
        assert_eq!(tracker.depth(), 1);
        tracker.on_end("s1");

        let closed = tracker.on_end("t1").unwrap();
        assert!(closed.is_delegation);
        // Closing events carry the parent depth
        assert_eq!(closed.depth, 0);
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn nested_delegations_close_lifo() {
        let mut tracker = NestingTracker::new();
        tracker.on_start("outer", "task");
        tracker.on_start("inner", "task");
        assert_eq!(tracker.depth(), 2);

        assert_eq!(tracker.on_end("inner").unwrap().depth, 1);
        assert_eq!(tracker.on_end("outer").unwrap().depth, 0);
    }

    #[test]
    fn end_without_start_is_ignored() {
        let mut tracker = NestingTracker::new();
        assert!(tracker.on_end("ghost").is_none());
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn duplicate_start_does_not_double_push() {
        let mut tracker = NestingTracker::new();
        assert_eq!(tracker.on_start("t1", "task"), Some(true));
        assert_eq!(tracker.on_start("t1", "task"), None);
        assert_eq!(tracker.depth(), 1);
        tracker.on_end("t1");
        assert_eq!(tracker.depth(), 0);
        // The second close finds no record
        assert!(tracker.on_end("t1").is_none());
    }

    #[test]
    fn depth_is_never_negative() {
        let mut tracker = NestingTracker::new();
        tracker.on_end("a");
        tracker.on_end("b");
        assert_eq!(tracker.depth(), 0);
    }
}
