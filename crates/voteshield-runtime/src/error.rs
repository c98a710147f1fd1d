//! Error types for VoteShield

use std::fmt;

use thiserror::Error;

use crate::types::{Address, CiphertextHandle, PollId};

/// Result type alias for VoteShield operations
pub type Result<T> = std::result::Result<T, VoteShieldError>;

/// Which creation constraint a rejected `create_poll` request violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterViolation {
    /// Poll name is empty after trimming
    EmptyName,
    /// Number of non-empty options is outside `2..=4`
    OptionCount(usize),
    /// End time is not strictly after the transaction timestamp
    EndTimeNotInFuture { end_time: u64, now: u64 },
}

impl fmt::Display for ParameterViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "poll name is empty"),
            Self::OptionCount(count) => {
                write!(f, "poll must have 2 to 4 non-empty options, got {}", count)
            }
            Self::EndTimeNotInFuture { end_time, now } => {
                write!(f, "end time {} is not after current time {}", end_time, now)
            }
        }
    }
}

/// Main error type for VoteShield operations
#[derive(Debug, Error)]
pub enum VoteShieldError {
    /// Creation request rejected
    #[error("Invalid poll parameters: {0}")]
    InvalidPollParameters(ParameterViolation),

    /// No poll is registered under this identifier
    #[error("Unknown poll: {0}")]
    UnknownPoll(PollId),

    /// Poll has reached its end time or is finalized
    #[error("Voting closed for poll {poll_id}")]
    VotingClosed { poll_id: PollId },

    /// Voter already holds a ballot record for this poll
    #[error("Duplicate vote: {voter} already voted in poll {poll_id}")]
    DuplicateVote { poll_id: PollId, voter: Address },

    /// Encrypted input failed validation, or the FHE service failed while processing it
    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Poll was already finalized
    #[error("Poll {0} is already finalized")]
    AlreadyFinalized(PollId),

    /// Finalize attempted before the end time
    #[error("Voting still open for poll {poll_id}: ends at {end_time}, now {now}")]
    VotingStillOpen { poll_id: PollId, end_time: u64, now: u64 },

    /// Option index outside the poll's option list
    #[error("Option index {index} out of range for poll {poll_id} ({options_count} options)")]
    OptionOutOfRange { poll_id: PollId, index: usize, options_count: usize },

    /// FHE service refused public decryption of a handle without a grant
    #[error("Public decryption not permitted for handle {0}")]
    DecryptionNotPermitted(CiphertextHandle),

    /// FHE service holds no ciphertext under this handle
    #[error("Unknown ciphertext handle {0}")]
    UnknownCiphertext(CiphertextHandle),

    /// Serialization or deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoteShieldError {
    pub fn invalid_ciphertext(msg: impl Into<String>) -> Self {
        Self::InvalidCiphertext(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// True for errors that can never succeed on retry with the same input.
    ///
    /// `VotingStillOpen` is temporal: the same finalize succeeds once the
    /// end time passes. `InvalidCiphertext` asks the caller to resubmit a new
    /// ciphertext, which is a different input.
    pub fn is_permanent(&self) -> bool {
        !matches!(self, Self::VotingStillOpen { .. } | Self::Io(_))
    }
}

impl From<ParameterViolation> for VoteShieldError {
    fn from(violation: ParameterViolation) -> Self {
        Self::InvalidPollParameters(violation)
    }
}
