//! Tally accumulator and homomorphic option selection
//!
//! Each poll owns one running ciphertext per option. A vote advances *every*
//! option: option `i` receives `choice == i` as an encrypted 0/1, so the set of
//! slots that change is the same whichever option was chosen.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use voteshield_runtime::{CiphertextHandle, PollId, Result};

use crate::fhe::FheService;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TallyAccumulator {
    slots: BTreeMap<PollId, Vec<CiphertextHandle>>,
}

impl TallyAccumulator {
    /// Current tally handles of a poll, in option order.
    pub fn handles(&self, poll_id: PollId) -> Option<&[CiphertextHandle]> {
        self.slots.get(&poll_id).map(Vec::as_slice)
    }

    pub fn handle(&self, poll_id: PollId, index: usize) -> Option<CiphertextHandle> {
        self.handles(poll_id).and_then(|handles| handles.get(index).copied())
    }

    /// Installs the tallies of a new poll, or replaces them after a vote.
    pub(crate) fn store(&mut self, poll_id: PollId, handles: Vec<CiphertextHandle>) {
        self.slots.insert(poll_id, handles);
    }
}

/// One fresh encrypted zero per option.
pub fn zeroed<F: FheService>(fhe: &mut F, options_count: usize) -> Result<Vec<CiphertextHandle>> {
    (0..options_count).map(|_| fhe.encrypt_zero()).collect()
}

/// Folds a validated encrypted choice into the running tallies.
///
/// Returns the next handle for every option; `current` is left untouched so
/// the caller can commit or discard the whole update at once.
pub fn fold_choice<F: FheService>(
    fhe: &mut F,
    current: &[CiphertextHandle],
    choice: &CiphertextHandle,
) -> Result<Vec<CiphertextHandle>> {
    current
        .iter()
        .enumerate()
        .map(|(index, tally)| {
            // options_count <= MAX_OPTIONS, so the index always fits a u8
            let indicator = fhe.encrypted_equals(choice, index as u8)?;
            fhe.homomorphic_add(tally, indicator.handle())
        })
        .collect()
}
