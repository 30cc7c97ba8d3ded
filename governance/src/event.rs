//! Events emitted by the governance engine for observers.

use crate::proposal::{ProposalKind, ProposalResult};
use commons_types::{Address, Amount, ProposalId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    /// A proposal was registered and its fee credited to the treasury.
    ProposalCreated {
        proposal_id: ProposalId,
        kind: ProposalKind,
        proposer: Address,
        fee: Amount,
    },
    /// Value was paid into the treasury.
    Deposited { from: Address, amount: Amount },
    /// One batch of voter fees was paid.
    VoterFeesDistributed {
        proposal_id: ProposalId,
        start_index: usize,
        paid: usize,
        total: Amount,
    },
    AssessmentFinished {
        proposal_id: ProposalId,
        passed: bool,
    },
    VoteFinished {
        proposal_id: ProposalId,
        result: ProposalResult,
    },
    /// Approved funds left the treasury.
    FundTransferred {
        proposal_id: ProposalId,
        to: Address,
        amount: Amount,
    },
    FundingRefused { proposal_id: ProposalId },
    FundingAllowed { proposal_id: ProposalId },
}

impl GovernanceEvent {
    pub fn proposal_id(&self) -> Option<&ProposalId> {
        match self {
            Self::Deposited { .. } => None,
            Self::ProposalCreated { proposal_id, .. }
            | Self::VoterFeesDistributed { proposal_id, .. }
            | Self::AssessmentFinished { proposal_id, .. }
            | Self::VoteFinished { proposal_id, .. }
            | Self::FundTransferred { proposal_id, .. }
            | Self::FundingRefused { proposal_id }
            | Self::FundingAllowed { proposal_id } => Some(proposal_id),
        }
    }
}

/// Synchronous fan-out of governance events.
///
/// Listeners run inline on the emitting thread.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&GovernanceEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &GovernanceEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn every_listener_sees_every_event() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();
        for _ in 0..2 {
            let seen = Arc::clone(&seen);
            bus.subscribe(Box::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }));
        }
        bus.emit(&GovernanceEvent::Deposited {
            from: Address::ZERO,
            amount: Amount::coins(1),
        });
        bus.emit(&GovernanceEvent::FundingAllowed {
            proposal_id: ProposalId::new([1; 32]),
        });
        assert_eq!(seen.load(Ordering::SeqCst), 4);
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn deposit_has_no_proposal() {
        let event = GovernanceEvent::Deposited {
            from: Address::ZERO,
            amount: Amount::ZERO,
        };
        assert!(event.proposal_id().is_none());
    }
}
