//! Fundamental types for the commons governance engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identities, 32-byte digests, amounts, timestamps, keys, governance parameters,
//! and the two external collaborator seams (clock and value transfer).

pub mod address;
pub mod amount;
pub mod error;
pub mod hash;
pub mod keys;
pub mod params;
pub mod time;
pub mod transfer;

pub use address::Address;
pub use amount::{Amount, COIN};
pub use error::TypeError;
pub use hash::{Commitment, DocHash, ProposalId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::{GovernanceParams, MarginBasis, MarginPolicy, PPM};
pub use time::{Clock, SystemClock, Timestamp};
pub use transfer::{Payout, PayoutReason, TransferError, ValueTransfer};
