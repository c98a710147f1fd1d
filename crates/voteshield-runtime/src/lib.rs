//! VoteShield Runtime
//!
//! Shared value types and error handling for the VoteShield toolkit.
//! The engine, the FHE service boundary and the CLI all speak in these types.

pub mod error;
pub mod types;

// Re-export core types for convenience
pub use error::{ParameterViolation, Result, VoteShieldError};
pub use types::{Address, CiphertextHandle, EncryptedBool, InputProof, PollId, TxContext};
