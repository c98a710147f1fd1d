//! Poll lifecycle state machine
//!
//! [`VoteShield`] is the only writer of the poll registry, the ballot ledger and
//! the tally accumulator. Each transition checks every precondition and runs
//! every FHE computation before it writes anything, so a rejected transition
//! leaves the ledger exactly as it found it. Serializing transitions is the
//! hosting ledger's job; within one transition there is nothing to interleave.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use voteshield_runtime::{
    Address, CiphertextHandle, InputProof, PollId, Result, TxContext, VoteShieldError,
};

use crate::{
    ballots::BallotLedger,
    config::EngineConfig,
    events::PollEvent,
    fhe::FheService,
    gate::DecryptionGate,
    registry::{validate_poll_parameters, Poll, PollMeta, PollRegistry, PollStatus},
    tally::{self, TallyAccumulator},
};

/// Everything the engine persists between transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    pub registry: PollRegistry,
    pub ballots: BallotLedger,
    pub tallies: TallyAccumulator,
}

pub struct VoteShield<F: FheService> {
    config: EngineConfig,
    state: LedgerState,
    fhe: F,
    outbox: Vec<PollEvent>,
}

fn rejected(transition: &'static str, error: VoteShieldError) -> VoteShieldError {
    warn!(transition, %error, "transition rejected");
    error
}

/// Any FHE failure during a vote is reported as an invalid ciphertext.
fn as_invalid_ciphertext(error: VoteShieldError) -> VoteShieldError {
    match error {
        VoteShieldError::InvalidCiphertext(_) => error,
        other => VoteShieldError::invalid_ciphertext(other.to_string()),
    }
}

impl<F: FheService> VoteShield<F> {
    pub fn new(config: EngineConfig, fhe: F) -> Self {
        Self::from_parts(config, LedgerState::default(), fhe)
    }

    pub fn from_parts(config: EngineConfig, state: LedgerState, fhe: F) -> Self {
        Self { config, state, fhe, outbox: Vec::new() }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn fhe(&self) -> &F {
        &self.fhe
    }

    /// Client-side access to the service, e.g. to encrypt a choice before voting.
    pub fn fhe_mut(&mut self) -> &mut F {
        &mut self.fhe
    }

    /// Creates a poll with zero-initialized encrypted tallies.
    ///
    /// The name and option labels are trimmed and empty labels dropped before
    /// validation. `end_time` must be strictly after the transaction timestamp.
    pub fn create_poll<S: AsRef<str>>(
        &mut self,
        ctx: &TxContext,
        name: &str,
        options: &[S],
        end_time: u64,
    ) -> Result<PollId> {
        let (name, options) = validate_poll_parameters(name, options, end_time, ctx.timestamp)
            .map_err(|e| rejected("create_poll", e))?;
        let tallies = tally::zeroed(&mut self.fhe, options.len())
            .map_err(|e| rejected("create_poll", e))?;

        let poll_id = self.state.registry.next_id();
        let options_count = options.len();
        self.state.registry.insert(Poll {
            id: poll_id,
            name,
            options,
            end_time,
            creator: ctx.sender,
            finalized: false,
        });
        self.state.tallies.store(poll_id, tallies);

        info!(poll_id, creator = %ctx.sender, options = options_count, end_time, "poll created");
        self.outbox.push(PollEvent::PollCreated { poll_id, creator: ctx.sender });
        Ok(poll_id)
    }

    /// Casts the sender's single encrypted vote.
    ///
    /// Every option's tally is replaced by `tally + (choice == i)`, and the
    /// sender's ballot record is written, in one commit.
    pub fn vote(
        &mut self,
        ctx: &TxContext,
        poll_id: PollId,
        encrypted_choice: &CiphertextHandle,
        proof: &InputProof,
    ) -> Result<()> {
        let options_count = self.check_vote(ctx, poll_id).map_err(|e| rejected("vote", e))?;
        let next = self
            .compute_vote(ctx, poll_id, encrypted_choice, proof, options_count)
            .map_err(|e| rejected("vote", as_invalid_ciphertext(e)))?;

        self.state.ballots.record(poll_id, ctx.sender);
        self.state.tallies.store(poll_id, next);

        info!(poll_id, voter = %ctx.sender, "vote cast");
        self.outbox.push(PollEvent::VoteCast { poll_id, voter: ctx.sender });
        Ok(())
    }

    /// Closes the poll and makes its tallies publicly decryptable.
    ///
    /// Callable by anyone once `now >= end_time`; exactly once per poll.
    pub fn finalize(&mut self, ctx: &TxContext, poll_id: PollId) -> Result<()> {
        self.check_finalize(ctx, poll_id).map_err(|e| rejected("finalize", e))?;

        let handles = self
            .state
            .tallies
            .handles(poll_id)
            .ok_or(VoteShieldError::UnknownPoll(poll_id))
            .map_err(|e| rejected("finalize", e))?
            .to_vec();
        self.fhe.grant_public_decrypt(&handles).map_err(|e| rejected("finalize", e))?;
        self.state.registry.get_mut(poll_id)?.finalized = true;

        info!(poll_id, caller = %ctx.sender, "poll finalized");
        self.outbox.push(PollEvent::PollFinalized { poll_id });
        Ok(())
    }

    fn check_vote(&self, ctx: &TxContext, poll_id: PollId) -> Result<usize> {
        let poll = self.state.registry.get(poll_id)?;
        if poll.finalized || ctx.timestamp >= poll.end_time {
            return Err(VoteShieldError::VotingClosed { poll_id });
        }
        if self.state.ballots.has_voted(poll_id, &ctx.sender) {
            return Err(VoteShieldError::DuplicateVote { poll_id, voter: ctx.sender });
        }
        Ok(poll.options_count())
    }

    fn compute_vote(
        &mut self,
        ctx: &TxContext,
        poll_id: PollId,
        encrypted_choice: &CiphertextHandle,
        proof: &InputProof,
        options_count: usize,
    ) -> Result<Vec<CiphertextHandle>> {
        let choice = self.fhe.validate_encrypted_input(
            encrypted_choice,
            proof,
            &self.config.contract_address,
            &ctx.sender,
            options_count as u8,
        )?;
        let current =
            self.state.tallies.handles(poll_id).ok_or(VoteShieldError::UnknownPoll(poll_id))?;
        tally::fold_choice(&mut self.fhe, current, &choice)
    }

    fn check_finalize(&self, ctx: &TxContext, poll_id: PollId) -> Result<()> {
        let poll = self.state.registry.get(poll_id)?;
        if poll.finalized {
            return Err(VoteShieldError::AlreadyFinalized(poll_id));
        }
        if ctx.timestamp < poll.end_time {
            return Err(VoteShieldError::VotingStillOpen {
                poll_id,
                end_time: poll.end_time,
                now: ctx.timestamp,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read surface
    // ------------------------------------------------------------------

    pub fn poll_count(&self) -> u64 {
        self.state.registry.poll_count()
    }

    pub fn poll(&self, poll_id: PollId) -> Result<&Poll> {
        self.state.registry.get(poll_id)
    }

    pub fn polls(&self) -> impl Iterator<Item = &Poll> {
        self.state.registry.iter()
    }

    pub fn poll_meta(&self, poll_id: PollId) -> Result<PollMeta> {
        self.poll(poll_id).map(Poll::meta)
    }

    pub fn poll_options(&self, poll_id: PollId) -> Result<&[String]> {
        self.poll(poll_id).map(|poll| poll.options.as_slice())
    }

    /// False for unknown polls as well as for accounts that have not voted.
    pub fn has_voted(&self, poll_id: PollId, voter: &Address) -> bool {
        self.state.ballots.has_voted(poll_id, voter)
    }

    pub fn ballots_cast(&self, poll_id: PollId) -> Result<usize> {
        self.poll(poll_id)?;
        Ok(self.state.ballots.ballots_cast(poll_id))
    }

    /// Current tally handle of one option. Readable at any time; decryptable only after finalize.
    pub fn encrypted_count(&self, poll_id: PollId, index: usize) -> Result<CiphertextHandle> {
        let options_count = self.poll(poll_id)?.options_count();
        self.state.tallies.handle(poll_id, index).ok_or(VoteShieldError::OptionOutOfRange {
            poll_id,
            index,
            options_count,
        })
    }

    pub fn status(&self, poll_id: PollId, now: u64) -> Result<PollStatus> {
        self.poll(poll_id).map(|poll| poll.status(now))
    }

    pub fn decryption_gate(&self) -> DecryptionGate<'_, F> {
        DecryptionGate::new(&self.state.registry, &self.state.tallies, &self.fhe)
    }

    /// Takes the events emitted since the last drain, in commit order.
    pub fn drain_events(&mut self) -> Vec<PollEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn into_parts(self) -> (EngineConfig, LedgerState, F) {
        (self.config, self.state, self.fhe)
    }
}
