//! Nullable value transfer. Records payouts instead of moving value.

use commons_types::{Address, Amount, Payout, TransferError, ValueTransfer};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Ledger {
    delivered: Vec<Payout>,
    fail_next: usize,
    reject: Vec<Address>,
}

/// A transfer backend that records every delivered payout.
///
/// Failures can be injected either for the next `n` transfers or permanently
/// for specific recipients.
#[derive(Clone, Debug, Default)]
pub struct NullTransfer {
    inner: Arc<Mutex<Ledger>>,
}

impl NullTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fail the next `count` transfers with `TransferError::Unavailable`.
    pub fn fail_next(&self, count: usize) {
        self.lock().fail_next = count;
    }

    /// Reject every transfer to `recipient`.
    pub fn reject(&self, recipient: Address) {
        self.lock().reject.push(recipient);
    }

    /// All payouts delivered so far, in order.
    pub fn delivered(&self) -> Vec<Payout> {
        self.lock().delivered.clone()
    }

    /// Sum of everything delivered to `recipient`.
    pub fn total_to(&self, recipient: &Address) -> Amount {
        self.lock()
            .delivered
            .iter()
            .filter(|p| &p.to == recipient)
            .map(|p| p.amount)
            .sum()
    }

    /// Clear all state.
    pub fn reset(&self) {
        *self.lock() = Ledger::default();
    }
}

impl ValueTransfer for NullTransfer {
    fn transfer(&self, payout: &Payout) -> Result<(), TransferError> {
        let mut ledger = self.lock();
        if ledger.fail_next > 0 {
            ledger.fail_next -= 1;
            return Err(TransferError::Unavailable("injected failure".into()));
        }
        if ledger.reject.contains(&payout.to) {
            return Err(TransferError::Rejected {
                to: payout.to,
                reason: "recipient rejected".into(),
            });
        }
        ledger.delivered.push(payout.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons_types::{PayoutReason, ProposalId};

    fn payout(to: u8, amount: u128) -> Payout {
        Payout {
            to: Address::new([to; 32]),
            amount: Amount::new(amount),
            reason: PayoutReason::Funding(ProposalId::ZERO),
        }
    }

    #[test]
    fn records_and_sums() {
        let transfer = NullTransfer::new();
        transfer.transfer(&payout(1, 10)).unwrap();
        transfer.transfer(&payout(1, 5)).unwrap();
        transfer.transfer(&payout(2, 7)).unwrap();
        assert_eq!(transfer.delivered().len(), 3);
        assert_eq!(transfer.total_to(&Address::new([1; 32])), Amount::new(15));
    }

    #[test]
    fn injected_failures() {
        let transfer = NullTransfer::new();
        transfer.fail_next(1);
        assert!(transfer.transfer(&payout(1, 1)).is_err());
        transfer.transfer(&payout(1, 1)).unwrap();

        transfer.reject(Address::new([9; 32]));
        assert!(matches!(
            transfer.transfer(&payout(9, 1)),
            Err(TransferError::Rejected { .. })
        ));
        assert_eq!(transfer.delivered().len(), 1);
    }
}
