//! Cryptographic primitives for commons governance.
//!
//! - **Ed25519** for signing and verifying vote-manager authorizations
//! - **Blake2b-256** for ballot commitments
//! - Canonical `bincode` encodings of every signed payload

pub mod error;
pub mod hash;
pub mod keys;
pub mod payload;
pub mod sign;

pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use payload::{
    ballot_commitment, BallotAuthorization, FundProposalPayload, SignedPayload,
    SystemProposalPayload,
};
pub use sign::{sign_message, sign_payload, verify_payload, verify_signature};
