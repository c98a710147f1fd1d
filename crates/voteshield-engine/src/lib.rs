//! VoteShield Engine
//!
//! Poll lifecycle and encrypted-tally engine for confidential polls. Accounts
//! create polls with 2 to 4 options, cast one encrypted vote each, and the
//! per-option tallies are accumulated homomorphically. Tallies become publicly
//! decryptable only after the poll's end time has passed and someone finalizes
//! it.
//!
//! # Examples
//!
//! ```
//! use voteshield_engine::{Address, EngineConfig, MockFhe, TxContext, VoteShield};
//!
//! let config = EngineConfig::new(Address::new([0xc0; 20]), Address::new([0xd0; 20]));
//! let mut shield = VoteShield::new(config.clone(), MockFhe::with_seed(1));
//!
//! let alice = TxContext::new(Address::new([0xa1; 20]), 1_000);
//! let options = ["Solidity", "Rust"];
//! let poll_id = shield.create_poll(&alice, "Best language", &options, 1_060).unwrap();
//!
//! let contract = config.contract_address;
//! let (choice, proof) = shield.fhe_mut().encrypt_input(1, &contract, &alice.sender);
//! shield.vote(&alice, poll_id, &choice, &proof).unwrap();
//!
//! shield.finalize(&TxContext::new(alice.sender, 1_060), poll_id).unwrap();
//! let results = shield.decryption_gate().public_results(poll_id).unwrap();
//! assert_eq!(results.counts(), vec![0, 1]);
//! ```

pub mod ballots;
pub mod config;
pub mod events;
pub mod fhe;
pub mod gate;
pub mod lifecycle;
pub mod registry;
pub mod store;
pub mod tally;

pub use ballots::BallotLedger;
pub use config::EngineConfig;
pub use events::PollEvent;
pub use fhe::{FheService, MockFhe};
pub use gate::{DecryptionGate, OptionResult, PollResults};
pub use lifecycle::{LedgerState, VoteShield};
pub use registry::{Poll, PollMeta, PollRegistry, PollStatus, MAX_OPTIONS, MIN_OPTIONS};
pub use store::LedgerStore;
pub use tally::TallyAccumulator;

// Re-export runtime types for convenience
pub use voteshield_runtime::{
    Address, CiphertextHandle, EncryptedBool, InputProof, ParameterViolation, PollId, Result,
    TxContext, VoteShieldError,
};
