//! Decryption gate
//!
//! Read-only view over the tallies of a poll. The handles are always readable;
//! whether they can be *decrypted* is decided by the FHE service's access list,
//! which finalize populates. The gate never checks `finalized` itself.

use serde::{Deserialize, Serialize};
use voteshield_runtime::{CiphertextHandle, PollId, Result, VoteShieldError};

use crate::{fhe::FheService, registry::PollRegistry, tally::TallyAccumulator};

/// Decrypted count of one option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionResult {
    pub label: String,
    pub handle: CiphertextHandle,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResults {
    pub poll_id: PollId,
    pub options: Vec<OptionResult>,
}

impl PollResults {
    pub fn counts(&self) -> Vec<u64> {
        self.options.iter().map(|option| option.count).collect()
    }

    pub fn total(&self) -> u64 {
        self.options.iter().map(|option| option.count).sum()
    }
}

pub struct DecryptionGate<'a, F: FheService> {
    registry: &'a PollRegistry,
    tallies: &'a TallyAccumulator,
    fhe: &'a F,
}

impl<'a, F: FheService> DecryptionGate<'a, F> {
    pub(crate) fn new(
        registry: &'a PollRegistry,
        tallies: &'a TallyAccumulator,
        fhe: &'a F,
    ) -> Self {
        Self { registry, tallies, fhe }
    }

    /// Ordered tally handles of a poll.
    pub fn tally_handles(&self, poll_id: PollId) -> Result<Vec<CiphertextHandle>> {
        self.registry.get(poll_id)?;
        self.tallies
            .handles(poll_id)
            .map(<[CiphertextHandle]>::to_vec)
            .ok_or(VoteShieldError::UnknownPoll(poll_id))
    }

    /// Publicly decrypts every tally of a poll.
    ///
    /// Fails with `DecryptionNotPermitted` until the poll has been finalized.
    pub fn public_results(&self, poll_id: PollId) -> Result<PollResults> {
        let poll = self.registry.get(poll_id)?;
        let handles = self.tally_handles(poll_id)?;
        let clear = self.fhe.public_decrypt(&handles)?;

        let options = poll
            .options
            .iter()
            .zip(&handles)
            .map(|(label, handle)| {
                let count =
                    clear.get(handle).copied().ok_or(VoteShieldError::UnknownCiphertext(*handle))?;
                Ok(OptionResult { label: label.clone(), handle: *handle, count })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PollResults { poll_id, options })
    }
}
