//! Ballot ledger: one presence marker per (poll, voter), never removed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use voteshield_runtime::{Address, PollId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BallotLedger {
    records: BTreeSet<(PollId, Address)>,
}

impl BallotLedger {
    pub fn has_voted(&self, poll_id: PollId, voter: &Address) -> bool {
        self.records.contains(&(poll_id, *voter))
    }

    /// Number of ballots recorded for a poll.
    pub fn ballots_cast(&self, poll_id: PollId) -> usize {
        let first = (poll_id, Address::new([0; 20]));
        let last = (poll_id, Address::new([0xff; 20]));
        self.records.range(first..=last).count()
    }

    /// Records a ballot. Returns false if the pair was already present.
    pub(crate) fn record(&mut self, poll_id: PollId, voter: Address) -> bool {
        self.records.insert((poll_id, voter))
    }
}
