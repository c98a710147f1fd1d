//! Tests for public decryption gating of poll results

use voteshield_engine::{
    Address, EngineConfig, MockFhe, PollStatus, TxContext, VoteShield, VoteShieldError,
};

fn contract() -> Address {
    Address::new([0xc0; 20])
}

fn engine(fhe: MockFhe) -> VoteShield<MockFhe> {
    VoteShield::new(EngineConfig::new(contract(), Address::default()), fhe)
}

#[test]
fn test_decryption_refused_before_finalize() {
    let mut shield = engine(MockFhe::with_seed(9));
    let alice = Address::new([0xa1; 20]);
    let poll_id = shield.create_poll(&TxContext::new(alice, 100), "p", &["a", "b"], 200).unwrap();

    let gate = shield.decryption_gate();

    // Handles are readable, just not decryptable
    assert_eq!(gate.tally_handles(poll_id).unwrap().len(), 2);
    assert!(matches!(
        gate.public_results(poll_id),
        Err(VoteShieldError::DecryptionNotPermitted(_))
    ));

    // Still refused once voting has ended but nobody finalized
    assert_eq!(shield.status(poll_id, 250).unwrap(), PollStatus::Ended);
    let handle = shield.encrypted_count(poll_id, 0).unwrap();
    assert!(!shield.fhe().is_publicly_decryptable(&handle));
}

#[test]
fn test_unknown_poll_through_gate() {
    let shield = engine(MockFhe::with_seed(9));
    let gate = shield.decryption_gate();

    assert!(matches!(gate.tally_handles(3), Err(VoteShieldError::UnknownPoll(3))));
    assert!(matches!(gate.public_results(3), Err(VoteShieldError::UnknownPoll(3))));
}

#[test]
fn test_best_language_scenario() {
    let now = 1_700_000_000;
    let end_time = now + 60;
    let alice = Address::new([0xa1; 20]);
    let bob = Address::new([0xb0; 20]);

    let mut shield = engine(MockFhe::new());
    let options = ["Solidity", "Rust", "TypeScript"];
    let creator = TxContext::new(alice, now);
    let poll_id = shield.create_poll(&creator, "Best language", &options, end_time).unwrap();
    assert_eq!(poll_id, 1);

    let (choice, proof) = shield.fhe_mut().encrypt_input(1, &contract(), &alice);
    shield.vote(&TxContext::new(alice, now + 1), poll_id, &choice, &proof).unwrap();

    let (choice, proof) = shield.fhe_mut().encrypt_input(2, &contract(), &bob);
    shield.vote(&TxContext::new(bob, now + 2), poll_id, &choice, &proof).unwrap();

    let meta = shield.poll_meta(poll_id).unwrap();
    assert_eq!(meta.name, "Best language");
    assert_eq!(meta.options_count, 3);
    assert!(!meta.finalized);

    shield.finalize(&TxContext::new(bob, end_time), poll_id).unwrap();

    let results = shield.decryption_gate().public_results(poll_id).unwrap();
    assert_eq!(results.counts(), vec![0, 1, 1]);
    assert_eq!(results.total(), 2);
    assert_eq!(results.options[1].label, "Rust");
    assert_eq!(results.options[2].label, "TypeScript");
}

#[test]
fn test_finalize_grants_only_that_poll() {
    let mut shield = engine(MockFhe::with_seed(9));
    let alice = Address::new([0xa1; 20]);
    let early = shield.create_poll(&TxContext::new(alice, 100), "early", &["a", "b"], 150).unwrap();
    let late = shield.create_poll(&TxContext::new(alice, 100), "late", &["a", "b"], 500).unwrap();

    shield.finalize(&TxContext::new(alice, 200), early).unwrap();

    let gate = shield.decryption_gate();
    assert_eq!(gate.public_results(early).unwrap().counts(), vec![0, 0]);
    assert!(matches!(gate.public_results(late), Err(VoteShieldError::DecryptionNotPermitted(_))));
}
