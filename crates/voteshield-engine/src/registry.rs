//! Poll registry
//!
//! Durable mapping from poll identifier to poll metadata and option labels,
//! plus the monotonic identifier counter. Only the lifecycle state machine
//! writes here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use voteshield_runtime::{Address, ParameterViolation, PollId, Result, VoteShieldError};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

/// A registered poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub name: String,
    /// Trimmed, non-empty labels. Fixed at creation.
    pub options: Vec<String>,
    /// Unix seconds; voting is open while `now < end_time`
    pub end_time: u64,
    pub creator: Address,
    /// Monotonic: false until finalize succeeds, never reverts
    pub finalized: bool,
}

impl Poll {
    pub fn options_count(&self) -> usize {
        self.options.len()
    }

    pub fn meta(&self) -> PollMeta {
        PollMeta {
            name: self.name.clone(),
            end_time: self.end_time,
            options_count: self.options.len(),
            creator: self.creator,
            finalized: self.finalized,
        }
    }

    pub fn status(&self, now: u64) -> PollStatus {
        if self.finalized {
            PollStatus::Finalized
        } else if now >= self.end_time {
            PollStatus::Ended
        } else {
            PollStatus::Open
        }
    }
}

/// Public metadata view of a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollMeta {
    pub name: String,
    pub end_time: u64,
    pub options_count: usize,
    pub creator: Address,
    pub finalized: bool,
}

/// Lifecycle phase derived from the stored flag and the current time.
///
/// Only `finalized` is stored. `Ended` is a computed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    Open,
    Ended,
    Finalized,
}

impl std::fmt::Display for PollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Open => "open",
            Self::Ended => "ended",
            Self::Finalized => "finalized",
        };
        f.write_str(label)
    }
}

/// Trims the name and labels, drops empty labels, and checks every creation constraint.
///
/// Returns the normalized name and options on success.
pub fn validate_poll_parameters<S: AsRef<str>>(
    name: &str,
    options: &[S],
    end_time: u64,
    now: u64,
) -> Result<(String, Vec<String>)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ParameterViolation::EmptyName.into());
    }

    let options: Vec<String> = options
        .iter()
        .map(|option| option.as_ref().trim())
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect();
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(ParameterViolation::OptionCount(options.len()).into());
    }

    if end_time <= now {
        return Err(ParameterViolation::EndTimeNotInFuture { end_time, now }.into());
    }

    Ok((name.to_string(), options))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollRegistry {
    /// Number of polls ever created; also the last allocated identifier
    poll_count: u64,
    polls: BTreeMap<PollId, Poll>,
}

impl PollRegistry {
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    pub fn get(&self, poll_id: PollId) -> Result<&Poll> {
        self.polls.get(&poll_id).ok_or(VoteShieldError::UnknownPoll(poll_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Poll> {
        self.polls.values()
    }

    pub(crate) fn get_mut(&mut self, poll_id: PollId) -> Result<&mut Poll> {
        self.polls.get_mut(&poll_id).ok_or(VoteShieldError::UnknownPoll(poll_id))
    }

    pub(crate) fn next_id(&self) -> PollId {
        self.poll_count + 1
    }

    /// Registers a poll under the identifier returned by `next_id`.
    pub(crate) fn insert(&mut self, poll: Poll) {
        debug_assert_eq!(poll.id, self.next_id());
        self.poll_count = poll.id;
        self.polls.insert(poll.id, poll);
    }
}
