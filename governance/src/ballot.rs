//! Commit-reveal ballots.

use commons_types::{Address, Commitment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::decision::VoteTally;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Choice {
    Blank = 0,
    Positive = 1,
    Negative = 2,
}

impl Choice {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Choice {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Blank),
            1 => Ok(Self::Positive),
            2 => Ok(Self::Negative),
            other => Err(other),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    pub choice: Choice,
    pub nonce: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub voter: Address,
    pub commitment: Commitment,
    pub reveal: Option<Reveal>,
}

impl Ballot {
    pub fn is_revealed(&self) -> bool {
        self.reveal.is_some()
    }

    /// Revealed choice, `Blank` until revealed.
    pub fn choice(&self) -> Choice {
        self.reveal.map_or(Choice::Blank, |r| r.choice)
    }

    /// Revealed nonce, zero until revealed.
    pub fn nonce(&self) -> u64 {
        self.reveal.map_or(0, |r| r.nonce)
    }
}

/// Ballots of one proposal, in first-submission order.
#[derive(Clone, Debug, Default)]
pub struct BallotBox {
    order: Vec<Address>,
    ballots: HashMap<Address, Ballot>,
    revealed: usize,
}

impl BallotBox {
    /// Store or overwrite a voter's commitment. Returns `true` for a first submission.
    pub fn submit(&mut self, voter: Address, commitment: Commitment) -> bool {
        match self.ballots.get_mut(&voter) {
            Some(ballot) => {
                ballot.commitment = commitment;
                false
            }
            None => {
                self.order.push(voter);
                self.ballots.insert(
                    voter,
                    Ballot {
                        voter,
                        commitment,
                        reveal: None,
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, voter: &Address) -> Option<&Ballot> {
        self.ballots.get(voter)
    }

    pub fn voter_at(&self, index: usize) -> Option<&Address> {
        self.order.get(index)
    }

    /// Record a reveal. The caller has already checked the commitment.
    pub(crate) fn record_reveal(&mut self, voter: &Address, reveal: Reveal) {
        if let Some(ballot) = self.ballots.get_mut(voter) {
            if ballot.reveal.replace(reveal).is_none() {
                self.revealed += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn all_revealed(&self) -> bool {
        self.revealed == self.order.len()
    }

    pub fn tally(&self) -> VoteTally {
        let mut tally = VoteTally::default();
        for ballot in self.ballots.values() {
            match ballot.reveal.map(|r| r.choice) {
                Some(Choice::Positive) => tally.positive += 1,
                Some(Choice::Negative) => tally.negative += 1,
                Some(Choice::Blank) => tally.blank += 1,
                None => {}
            }
        }
        tally
    }
}
