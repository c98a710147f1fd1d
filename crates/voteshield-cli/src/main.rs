//! VoteShield CLI
//!
//! Local tasks against a VoteShield ledger file: create polls, cast encrypted
//! votes, finalize, and publicly decrypt results once a poll is finalized.

use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use voteshield_engine::{
    Address, EngineConfig, LedgerStore, MockFhe, PollEvent, PollId, PollMeta, PollStatus,
    TxContext, VoteShield, VoteShieldError, MAX_OPTIONS,
};

#[derive(Parser)]
#[command(name = "voteshield")]
#[command(about = "Confidential polls with encrypted tallies", long_about = None)]
struct Cli {
    /// Ledger file holding polls, ballots and encrypted tallies
    #[arg(long, global = true, default_value = ".voteshield/ledger.json")]
    ledger: PathBuf,

    /// Log engine activity at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new ledger with a fresh contract address
    Init {
        /// Contract address input proofs are bound to (random if omitted)
        #[arg(long)]
        contract: Option<Address>,

        /// Default sender for transactions (random if omitted)
        #[arg(long)]
        deployer: Option<Address>,

        /// Read contract and deployer from an exported config file
        #[arg(long, conflicts_with_all = ["contract", "deployer"])]
        config: Option<PathBuf>,

        /// Overwrite an existing ledger
        #[arg(long)]
        force: bool,
    },

    /// Print the contract address
    Address {
        /// Also write the engine config to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Create a new poll
    CreatePoll {
        /// Poll name
        #[arg(short, long)]
        name: String,

        /// Comma-separated options (2-4)
        #[arg(short, long)]
        options: String,

        /// Poll end time (unix seconds)
        #[arg(short, long)]
        end: u64,

        #[command(flatten)]
        tx: TxArgs,
    },

    /// Cast an encrypted vote in a poll
    Vote {
        /// Poll id
        #[arg(short, long)]
        poll: PollId,

        /// Option index (0-based)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..MAX_OPTIONS as i64))]
        option: u8,

        #[command(flatten)]
        tx: TxArgs,
    },

    /// Finalize a poll and make its results publicly decryptable
    Finalize {
        /// Poll id
        #[arg(short, long)]
        poll: PollId,

        #[command(flatten)]
        tx: TxArgs,
    },

    /// Publicly decrypt poll results (requires a finalized poll)
    PublicDecrypt {
        /// Poll id
        #[arg(short, long)]
        poll: PollId,
    },

    /// List all polls
    List {
        /// Evaluate status at this unix time instead of now
        #[arg(long)]
        now: Option<u64>,
    },

    /// Show a poll's metadata, options and tally handles
    Info {
        /// Poll id
        #[arg(short, long)]
        poll: PollId,

        /// Also report whether this account has voted
        #[arg(long)]
        voter: Option<Address>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
struct TxArgs {
    /// Sender address (defaults to the ledger's deployer)
    #[arg(long)]
    from: Option<Address>,

    /// Transaction timestamp in unix seconds (defaults to the system clock)
    #[arg(long)]
    now: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PollInfo {
    id: PollId,
    #[serde(flatten)]
    meta: PollMeta,
    status: PollStatus,
    options: Vec<String>,
    ballots_cast: usize,
    tally_handles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_voted: Option<bool>,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn current_time() -> Result<u64> {
    let elapsed =
        SystemTime::now().duration_since(UNIX_EPOCH).context("System clock is before 1970")?;
    Ok(elapsed.as_secs())
}

/// Splits a comma-separated option list, trimming labels and dropping empty ones.
fn split_options(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn load_ledger(path: &Path) -> Result<VoteShield<MockFhe>> {
    let store = LedgerStore::new(path);
    if !store.exists() {
        anyhow::bail!("No ledger at {:?}. Run `voteshield init` first.", path);
    }
    store.load().context(format!("Failed to load ledger from {:?}", path))
}

fn save_ledger(path: &Path, shield: &VoteShield<MockFhe>) -> Result<()> {
    LedgerStore::new(path).save(shield).context(format!("Failed to save ledger to {:?}", path))
}

fn tx_context(shield: &VoteShield<MockFhe>, args: &TxArgs) -> Result<TxContext> {
    let sender = args.from.unwrap_or(shield.config().deployer);
    let timestamp = match args.now {
        Some(now) => now,
        None => current_time()?,
    };
    debug!(%sender, timestamp, "transaction context");
    Ok(TxContext::new(sender, timestamp))
}

fn report_events(events: &[PollEvent]) {
    for event in events {
        match event {
            PollEvent::PollCreated { poll_id, creator } => {
                println!("📣 PollCreated(poll={}, creator={})", poll_id, creator)
            }
            PollEvent::VoteCast { poll_id, voter } => {
                println!("📣 VoteCast(poll={}, voter={})", poll_id, voter)
            }
            PollEvent::PollFinalized { poll_id } => {
                println!("📣 PollFinalized(poll={})", poll_id)
            }
        }
    }
}

/// Adds a retry hint for temporal rejections.
fn transition_error(error: VoteShieldError) -> anyhow::Error {
    if error.is_permanent() {
        anyhow::Error::new(error)
    } else {
        anyhow::Error::new(error)
            .context("Transition rejected for now; retry after the poll's end time")
    }
}

fn init_ledger(path: &Path, config: EngineConfig, force: bool) -> Result<()> {
    let store = LedgerStore::new(path);
    if force && store.exists() {
        store
            .save(&VoteShield::new(config, MockFhe::new()))
            .context(format!("Failed to reset ledger at {:?}", path))?;
        return Ok(());
    }

    store
        .init(config, MockFhe::new())
        .context(format!("Could not create ledger at {:?} (use --force to overwrite)", path))?;
    Ok(())
}

fn resolve_config(
    file: Option<&Path>,
    contract: Option<Address>,
    deployer: Option<Address>,
) -> Result<EngineConfig> {
    if let Some(file) = file {
        return EngineConfig::load(file).context(format!("Failed to read config from {:?}", file));
    }

    let random = EngineConfig::random();
    Ok(EngineConfig::new(
        contract.unwrap_or(random.contract_address),
        deployer.unwrap_or(random.deployer),
    ))
}

fn create_poll(path: &Path, name: &str, options: &str, end: u64, tx: &TxArgs) -> Result<PollId> {
    let mut shield = load_ledger(path)?;
    let ctx = tx_context(&shield, tx)?;

    let options = split_options(options);
    let poll_id = shield.create_poll(&ctx, name, &options, end).map_err(transition_error)?;
    save_ledger(path, &shield)?;

    report_events(&shield.drain_events());
    Ok(poll_id)
}

fn vote(path: &Path, poll_id: PollId, option: u8, tx: &TxArgs) -> Result<()> {
    let mut shield = load_ledger(path)?;
    let ctx = tx_context(&shield, tx)?;

    println!("🔐 Encrypting choice for {}...", ctx.sender);
    let contract = shield.config().contract_address;
    let (choice, proof) = shield.fhe_mut().encrypt_input(option, &contract, &ctx.sender);

    shield.vote(&ctx, poll_id, &choice, &proof).map_err(transition_error)?;
    save_ledger(path, &shield)?;

    report_events(&shield.drain_events());
    Ok(())
}

fn finalize(path: &Path, poll_id: PollId, tx: &TxArgs) -> Result<()> {
    let mut shield = load_ledger(path)?;
    let ctx = tx_context(&shield, tx)?;

    shield.finalize(&ctx, poll_id).map_err(transition_error)?;
    save_ledger(path, &shield)?;

    report_events(&shield.drain_events());
    Ok(())
}

fn public_decrypt(path: &Path, poll_id: PollId) -> Result<Vec<(String, u64)>> {
    let shield = load_ledger(path)?;

    let meta = shield.poll_meta(poll_id)?;
    if !meta.finalized {
        anyhow::bail!("Poll {} is not finalized yet", poll_id);
    }

    let results = shield
        .decryption_gate()
        .public_results(poll_id)
        .context("Public decryption failed")?;

    for option in &results.options {
        println!("   {} => {} ({})", option.handle, option.count, option.label);
    }

    Ok(results.options.into_iter().map(|option| (option.label, option.count)).collect())
}

fn poll_info(
    shield: &VoteShield<MockFhe>,
    poll_id: PollId,
    now: u64,
    voter: Option<Address>,
) -> Result<PollInfo> {
    let meta = shield.poll_meta(poll_id)?;
    let tally_handles = shield
        .decryption_gate()
        .tally_handles(poll_id)?
        .iter()
        .map(ToString::to_string)
        .collect();

    Ok(PollInfo {
        id: poll_id,
        status: shield.status(poll_id, now)?,
        options: shield.poll_options(poll_id)?.to_vec(),
        ballots_cast: shield.ballots_cast(poll_id)?,
        tally_handles,
        has_voted: voter.map(|voter| shield.has_voted(poll_id, &voter)),
        meta,
    })
}

fn show_poll_info(info: &PollInfo) {
    println!("📋 Poll #{}: {}", info.id, info.meta.name);
    println!("   Status: {}", info.status);
    println!("   Creator: {}", info.meta.creator);
    println!("   Ends at: {}", info.meta.end_time);
    println!("   Ballots cast: {}", info.ballots_cast);
    println!("   Options:");
    for (index, (label, handle)) in info.options.iter().zip(&info.tally_handles).enumerate() {
        println!("     [{}] {:<16} {}", index, label, handle);
    }
    if let Some(has_voted) = info.has_voted {
        println!("   Has voted: {}", has_voted);
    }
}

fn list_polls(shield: &VoteShield<MockFhe>, now: u64) {
    if shield.poll_count() == 0 {
        println!("No polls yet.");
        return;
    }

    println!("📋 {} poll(s)", shield.poll_count());
    for poll in shield.polls() {
        println!(
            "   #{:<4} {:<10} {:<32} {} options, ends {}",
            poll.id,
            poll.status(now).to_string(),
            poll.name,
            poll.options_count(),
            poll.end_time
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init { contract, deployer, config, force } => {
            let config = resolve_config(config.as_deref(), contract, deployer)?;
            init_ledger(&cli.ledger, config.clone(), force)?;
            println!("✅ Ledger created at {:?}", cli.ledger);
            println!("   Contract: {}", config.contract_address);
            println!("   Deployer: {}", config.deployer);
        }
        Commands::Address { export } => {
            let shield = load_ledger(&cli.ledger)?;
            println!("VoteShield address is {}", shield.config().contract_address);
            if let Some(file) = export {
                shield
                    .config()
                    .save(&file)
                    .context(format!("Failed to write config to {:?}", file))?;
                println!("💾 Config written to {:?}", file);
            }
        }
        Commands::CreatePoll { name, options, end, tx } => {
            println!("🗳️  Creating poll '{}'...", name);
            let poll_id = create_poll(&cli.ledger, &name, &options, end, &tx)?;
            println!("✅ Poll #{} created", poll_id);
        }
        Commands::Vote { poll, option, tx } => {
            vote(&cli.ledger, poll, option, &tx)?;
            println!("✅ Vote recorded in poll #{}", poll);
        }
        Commands::Finalize { poll, tx } => {
            finalize(&cli.ledger, poll, &tx)?;
            println!("✅ Poll #{} finalized; results are publicly decryptable", poll);
        }
        Commands::PublicDecrypt { poll } => {
            println!("🔓 Decrypting results of poll #{}...", poll);
            public_decrypt(&cli.ledger, poll)?;
        }
        Commands::List { now } => {
            let shield = load_ledger(&cli.ledger)?;
            let now = match now {
                Some(now) => now,
                None => current_time()?,
            };
            list_polls(&shield, now);
        }
        Commands::Info { poll, voter, json } => {
            let shield = load_ledger(&cli.ledger)?;
            let info = poll_info(&shield, poll, current_time()?, voter)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                show_poll_info(&info);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NOW: u64 = 1_700_000_000;

    fn ledger_in(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().join("ledger.json")
    }

    fn sender(byte: u8, now: u64) -> TxArgs {
        TxArgs { from: Some(Address::new([byte; 20])), now: Some(now) }
    }

    #[test]
    fn test_split_options_trims_and_drops_empty() {
        assert_eq!(
            split_options(" Solidity, Rust ,,TypeScript, "),
            vec!["Solidity", "Rust", "TypeScript"]
        );
        assert!(split_options(" , ,").is_empty());
    }

    #[test]
    fn test_cli_parses_vote_command() {
        let args = ["voteshield", "vote", "--poll", "3", "--option", "2", "--now", "5"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Vote { poll, option, tx } => {
                assert_eq!((poll, option), (3, 2));
                assert_eq!(tx.now, Some(5));
                assert!(tx.from.is_none());
            }
            _ => panic!("expected vote command"),
        }
    }

    #[test]
    fn test_cli_rejects_option_above_three() {
        let result = Cli::try_parse_from(["voteshield", "vote", "--poll", "1", "--option", "4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_address_argument() {
        let cli = Cli::try_parse_from([
            "voteshield",
            "finalize",
            "--poll",
            "1",
            "--from",
            "0x00000000000000000000000000000000000000b0",
        ])
        .unwrap();

        match cli.command {
            Commands::Finalize { tx, .. } => assert_eq!(tx.from.unwrap().as_bytes()[19], 0xb0),
            _ => panic!("expected finalize command"),
        }
    }

    #[test]
    fn test_commands_require_ledger() {
        let temp_dir = TempDir::new().unwrap();
        let result = create_poll(&ledger_in(&temp_dir), "p", "a,b", NOW + 60, &sender(1, NOW));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("voteshield init"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = ledger_in(&temp_dir);

        init_ledger(&path, EngineConfig::random(), false).unwrap();
        assert!(init_ledger(&path, EngineConfig::random(), false).is_err());
        assert!(init_ledger(&path, EngineConfig::random(), true).is_ok());
    }

    #[test]
    fn test_exported_config_initializes_same_contract() {
        let temp_dir = TempDir::new().unwrap();
        let first = ledger_in(&temp_dir);
        let exported = temp_dir.path().join("config.json");

        let config = resolve_config(None, Some(Address::new([0xc0; 20])), None).unwrap();
        init_ledger(&first, config.clone(), false).unwrap();
        load_ledger(&first).unwrap().config().save(&exported).unwrap();

        let second = temp_dir.path().join("second/ledger.json");
        let loaded = resolve_config(Some(&exported), None, None).unwrap();
        init_ledger(&second, loaded, false).unwrap();

        assert_eq!(load_ledger(&second).unwrap().config(), &config);
    }

    #[test]
    fn test_cli_parses_info_command() {
        let args = ["voteshield", "--ledger", "l.json", "info", "--poll", "2", "--json"];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.ledger, PathBuf::from("l.json"));
        assert!(matches!(cli.command, Commands::Info { poll: 2, json: true, voter: None }));
    }

    #[test]
    fn test_full_task_flow() {
        let temp_dir = TempDir::new().unwrap();
        let path = ledger_in(&temp_dir);
        let deployer = Address::new([0xd0; 20]);
        init_ledger(&path, resolve_config(None, None, Some(deployer)).unwrap(), false).unwrap();

        let as_deployer = TxArgs { from: None, now: Some(NOW) };
        let poll_id =
            create_poll(&path, "Best language", "Solidity,Rust,TypeScript", NOW + 60, &as_deployer)
                .unwrap();
        assert_eq!(poll_id, 1);

        vote(&path, poll_id, 1, &sender(0xa1, NOW + 1)).unwrap();
        vote(&path, poll_id, 2, &sender(0xb0, NOW + 2)).unwrap();
        assert!(vote(&path, poll_id, 0, &sender(0xb0, NOW + 3)).is_err());

        assert!(public_decrypt(&path, poll_id).is_err());
        assert!(finalize(&path, poll_id, &sender(0xb0, NOW + 59)).is_err());
        finalize(&path, poll_id, &sender(0xb0, NOW + 60)).unwrap();

        let results = public_decrypt(&path, poll_id).unwrap();
        assert_eq!(
            results,
            vec![
                ("Solidity".to_string(), 0),
                ("Rust".to_string(), 1),
                ("TypeScript".to_string(), 1)
            ]
        );

        let shield = load_ledger(&path).unwrap();
        let info = poll_info(&shield, poll_id, NOW + 60, Some(Address::new([0xa1; 20]))).unwrap();
        assert_eq!(info.meta.creator, deployer);
        assert_eq!(info.status, PollStatus::Finalized);
        assert_eq!(info.ballots_cast, 2);
        assert_eq!(info.has_voted, Some(true));
    }

    #[test]
    fn test_still_open_error_carries_retry_hint() {
        let still_open = VoteShieldError::VotingStillOpen { poll_id: 1, end_time: 10, now: 5 };
        let error = transition_error(still_open);
        assert!(error.to_string().contains("retry after"));

        let error = transition_error(VoteShieldError::AlreadyFinalized(1));
        assert!(!error.to_string().contains("retry after"));
    }

    #[test]
    fn test_poll_info_json_shape() {
        let temp_dir = TempDir::new().unwrap();
        let path = ledger_in(&temp_dir);
        init_ledger(&path, EngineConfig::random(), false).unwrap();
        create_poll(&path, "p", "a,b", NOW + 60, &sender(1, NOW)).unwrap();

        let shield = load_ledger(&path).unwrap();
        let info = poll_info(&shield, 1, NOW, None).unwrap();
        let json: serde_json::Value = serde_json::to_value(&info).unwrap();

        assert_eq!(json["name"], "p");
        assert_eq!(json["options_count"], 2);
        assert_eq!(json["status"], "open");
        assert_eq!(json["tally_handles"].as_array().unwrap().len(), 2);
        assert!(json.get("has_voted").is_none());
    }
}
