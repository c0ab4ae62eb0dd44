//! Outstanding-request bookkeeping for one ticker cycle.

use std::collections::HashSet;

use crate::gateway::CorrelationId;
use crate::ProtocolError;

/// Tracks which correlation ids of the active cycle are still awaiting
/// their completion event.
///
/// Marking an id that was never registered, or one already retired, is a
/// [`ProtocolError`]: it means the issuer and the gateway disagree about
/// correlation ids, which must never be papered over.
#[derive(Debug, Default)]
pub struct CompletionTracker {
    outstanding: HashSet<CorrelationId>,
    active: bool,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the outstanding set for a fresh cycle, discarding any
    /// previous cycle's state.
    pub fn begin(&mut self, ids: impl IntoIterator<Item = CorrelationId>) {
        self.outstanding = ids.into_iter().collect();
        self.active = true;
    }

    /// Retire one outstanding request.
    pub fn mark_done(&mut self, correlation: CorrelationId) -> Result<(), ProtocolError> {
        if !self.active {
            return Err(ProtocolError::NoActiveCycle(correlation));
        }
        if !self.outstanding.remove(&correlation) {
            return Err(ProtocolError::UnknownCorrelation(correlation));
        }
        Ok(())
    }

    /// True once every registered request has completed.
    pub fn is_cycle_complete(&self) -> bool {
        self.active && self.outstanding.is_empty()
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    pub fn reset(&mut self) {
        self.outstanding.clear();
        self.active = false;
    }
}
