//! VoteShield Demo
//!
//! Walks one poll through its whole life:
//! 1. Create a poll with three options
//! 2. Two accounts cast encrypted votes
//! 3. Try to decrypt early (refused)
//! 4. Finalize after the deadline and publicly decrypt the tallies

use voteshield_engine::{Address, EngineConfig, MockFhe, TxContext, VoteShield};

fn main() {
    println!("\n=== VoteShield Demo ===\n");

    let config = EngineConfig::random();
    let contract = config.contract_address;
    let mut shield = VoteShield::new(config, MockFhe::new());

    let alice = Address::new([0xa1; 20]);
    let bob = Address::new([0xb0; 20]);
    let now = 1_700_000_000;
    let end_time = now + 60;

    println!("STEP 1: Create poll");
    println!("───────────────────");
    let options = ["Solidity", "Rust", "TypeScript"];
    let poll_id = shield
        .create_poll(&TxContext::new(alice, now), "Best language", &options, end_time)
        .expect("Failed to create poll");
    let meta = shield.poll_meta(poll_id).expect("Poll must exist");
    println!(
        "  Poll #{}: {} ({} options, ends at {})",
        poll_id, meta.name, meta.options_count, meta.end_time
    );
    println!();

    println!("STEP 2: Cast encrypted votes");
    println!("────────────────────────────");
    for (voter, choice) in [(alice, 1u8), (bob, 2u8)] {
        let (ciphertext, proof) = shield.fhe_mut().encrypt_input(choice, &contract, &voter);
        shield
            .vote(&TxContext::new(voter, now + 1), poll_id, &ciphertext, &proof)
            .expect("Vote failed");
        println!("  {} voted with ciphertext {}", voter, ciphertext);
    }
    println!();

    println!("STEP 3: Attempt early decryption");
    println!("────────────────────────────────");
    match shield.decryption_gate().public_results(poll_id) {
        Ok(_) => println!("  Unexpected: results decrypted before finalize"),
        Err(e) => println!("  Refused: {}", e),
    }
    println!();

    println!("STEP 4: Finalize and decrypt");
    println!("────────────────────────────");
    shield.finalize(&TxContext::new(bob, end_time), poll_id).expect("Finalize failed");
    let results = shield.decryption_gate().public_results(poll_id).expect("Decryption failed");
    for option in &results.options {
        println!("  {:<12} {}", option.label, option.count);
    }
    println!("  Total ballots: {}", results.total());

    println!("\nEvents:");
    for event in shield.drain_events() {
        println!("  {:?}", event);
    }
}
