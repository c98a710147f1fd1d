//! Notifications emitted on every committed transition
//!
//! Events are not needed for correctness; they let read-side collaborators
//! refresh without polling. Choices never appear in an event.

use serde::{Deserialize, Serialize};
use voteshield_runtime::{Address, PollId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PollEvent {
    PollCreated { poll_id: PollId, creator: Address },
    VoteCast { poll_id: PollId, voter: Address },
    PollFinalized { poll_id: PollId },
}

impl PollEvent {
    pub fn poll_id(&self) -> PollId {
        match self {
            Self::PollCreated { poll_id, .. }
            | Self::VoteCast { poll_id, .. }
            | Self::PollFinalized { poll_id } => *poll_id,
        }
    }
}
