//! Append-then-lock validator set.
//!
//! While open, the set accepts additions (duplicates are dropped, first
//! position wins). Freezing consumes the open set and yields an immutable
//! snapshot whose size is the quorum denominator.

use commons_types::Address;
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct OpenValidatorSet {
    order: Vec<Address>,
    members: HashSet<Address>,
}

impl OpenValidatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append addresses in order, skipping ones already present. Returns how many were added.
    pub fn extend<'a>(&mut self, addresses: impl IntoIterator<Item = &'a Address>) -> usize {
        let before = self.order.len();
        for address in addresses {
            if self.members.insert(*address) {
                self.order.push(*address);
            }
        }
        self.order.len() - before
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn freeze(self) -> FrozenValidatorSet {
        FrozenValidatorSet {
            order: self.order,
            members: self.members,
        }
    }
}

/// Immutable, ordered validator snapshot.
#[derive(Clone, Debug, Default)]
pub struct FrozenValidatorSet {
    order: Vec<Address>,
    members: HashSet<Address>,
}

impl FrozenValidatorSet {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    pub fn get(&self, index: usize) -> Option<&Address> {
        self.order.get(index)
    }

    /// At most `limit` validators starting at `start`. Empty past the end.
    pub fn window(&self, start: usize, limit: usize) -> &[Address] {
        let start = start.min(self.order.len());
        let end = start.saturating_add(limit).min(self.order.len());
        &self.order[start..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.order.iter()
    }
}

/// A validator set in one of its two phases.
#[derive(Clone, Debug)]
pub enum ValidatorSet {
    Open(OpenValidatorSet),
    Frozen(FrozenValidatorSet),
}

impl Default for ValidatorSet {
    fn default() -> Self {
        Self::Open(OpenValidatorSet::new())
    }
}

impl ValidatorSet {
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::Frozen(_))
    }

    pub fn frozen(&self) -> Option<&FrozenValidatorSet> {
        match self {
            Self::Frozen(set) => Some(set),
            Self::Open(_) => None,
        }
    }

    pub fn open_mut(&mut self) -> Option<&mut OpenValidatorSet> {
        match self {
            Self::Open(set) => Some(set),
            Self::Frozen(_) => None,
        }
    }

    /// Freeze in place. Freezing a frozen set is a no-op.
    pub fn freeze(&mut self) {
        if let Self::Open(open) = self {
            let open = std::mem::take(open);
            *self = Self::Frozen(open.freeze());
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Open(set) => set.len(),
            Self::Frozen(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, address: &Address) -> bool {
        match self {
            Self::Open(set) => set.members.contains(address),
            Self::Frozen(set) => set.contains(address),
        }
    }

    pub fn get(&self, index: usize) -> Option<&Address> {
        match self {
            Self::Open(set) => set.order.get(index),
            Self::Frozen(set) => set.get(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    #[test]
    fn duplicates_dropped_first_position_wins() {
        let mut set = OpenValidatorSet::new();
        assert_eq!(set.extend(&[addr(1), addr(2), addr(1)]), 2);
        assert_eq!(set.extend(&[addr(3), addr(2)]), 1);
        let frozen = set.freeze();
        let order: Vec<_> = frozen.iter().copied().collect();
        assert_eq!(order, vec![addr(1), addr(2), addr(3)]);
    }

    #[test]
    fn window_clamps() {
        let mut set = OpenValidatorSet::new();
        set.extend(&(0..10).map(addr).collect::<Vec<_>>());
        let frozen = set.freeze();
        assert_eq!(frozen.window(8, 5).len(), 2);
        assert!(frozen.window(10, 5).is_empty());
        assert!(frozen.window(usize::MAX, usize::MAX).is_empty());
    }

    #[test]
    fn freeze_in_place() {
        let mut set = ValidatorSet::default();
        set.open_mut().unwrap().extend(&[addr(1)]);
        set.freeze();
        assert!(set.is_frozen());
        assert!(set.open_mut().is_none());
        assert!(set.contains(&addr(1)));
        set.freeze();
        assert_eq!(set.len(), 1);
    }
}
