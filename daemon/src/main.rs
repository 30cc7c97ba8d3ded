//! `commons`: operator tooling for a governance deployment.
//!
//! Generates vote-manager keys, produces the signatures the ledger and
//! coordinator verify, computes ballot commitments for voters, and checks
//! node configuration files.

use anyhow::Context;
use clap::{Parser, Subcommand};
use commons_crypto::{
    ballot_commitment, generate_keypair, keypair_from_private, sign_payload, BallotAuthorization,
};
use commons_governance::{Choice, ProposalRequest, ProposalTimes};
use commons_node::NodeConfig;
use commons_types::{
    Address, Amount, Clock, Commitment, DocHash, KeyPair, PrivateKey, ProposalId, SystemClock,
    Timestamp,
};
use commons_utils::{format_remaining, LogFormat};
use serde_json::json;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commons", about = "Commons governance operator tooling")]
struct Cli {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "warn", env = "COMMONS_LOG_LEVEL")]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "COMMONS_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a vote-manager key pair.
    Keygen,

    /// Sign a proposal creation request as the vote manager.
    SignProposal {
        /// Manager private key (hex seed).
        #[arg(long, env = "COMMONS_MANAGER_KEY", hide_env_values = true)]
        key: String,

        #[command(subcommand)]
        kind: ProposalArgs,
    },

    /// Compute the commitment a voter submits for a ballot.
    Commitment {
        #[arg(long)]
        coordinator: Address,
        #[arg(long)]
        proposal: ProposalId,
        #[arg(long)]
        voter: Address,
        /// 0 = blank, 1 = positive, 2 = negative.
        #[arg(long, value_parser = parse_choice)]
        choice: Choice,
        /// Must not be zero.
        #[arg(long)]
        nonce: u64,
    },

    /// Authorize one ballot commitment as the vote manager.
    SignBallot {
        #[arg(long, env = "COMMONS_MANAGER_KEY", hide_env_values = true)]
        key: String,
        #[arg(long)]
        proposal: ProposalId,
        #[arg(long)]
        voter: Address,
        #[arg(long)]
        commitment: Commitment,
    },

    /// Node configuration files.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProposalArgs {
    /// A system proposal: voted on, never funded.
    System {
        #[command(flatten)]
        common: ProposalCommon,
    },
    /// A fund proposal: assessed, voted on and paid out on approval.
    Fund {
        #[command(flatten)]
        common: ProposalCommon,
        #[arg(long)]
        start_assess: u64,
        #[arg(long)]
        end_assess: u64,
        /// Requested amount in raw units.
        #[arg(long)]
        amount: u128,
        /// Address that will create, and later withdraw, the proposal.
        #[arg(long)]
        proposer: Address,
    },
}

#[derive(clap::Args)]
struct ProposalCommon {
    #[arg(long)]
    id: ProposalId,
    #[arg(long)]
    title: String,
    #[arg(long)]
    doc_hash: DocHash,
    /// Vote start, unix seconds.
    #[arg(long)]
    start: u64,
    /// Vote end, unix seconds.
    #[arg(long)]
    end: u64,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Parse and validate a TOML configuration file.
    Check { path: PathBuf },
    /// Print the default configuration.
    Default,
}

fn parse_choice(s: &str) -> Result<Choice, String> {
    let value: u8 = s.parse().map_err(|e| format!("{e}"))?;
    Choice::try_from(value).map_err(|v| format!("unknown choice {v}"))
}

fn manager_keypair(hex_seed: &str) -> anyhow::Result<KeyPair> {
    let private = PrivateKey::from_hex(hex_seed).context("manager key")?;
    Ok(keypair_from_private(private))
}

fn print(value: serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn sign_proposal(key: &str, kind: ProposalArgs) -> anyhow::Result<()> {
    let manager = manager_keypair(key)?;
    let (request, signature) = match kind {
        ProposalArgs::System { common } => {
            let request = ProposalRequest::system(
                common.id,
                common.title,
                common.doc_hash,
                Timestamp::new(common.start),
                Timestamp::new(common.end),
            );
            let signature = sign_payload(&request.system_payload(), &manager.private)?;
            (request, signature)
        }
        ProposalArgs::Fund {
            common,
            start_assess,
            end_assess,
            amount,
            proposer,
        } => {
            let times = ProposalTimes {
                start: Timestamp::new(common.start),
                end: Timestamp::new(common.end),
                start_assess: Timestamp::new(start_assess),
                end_assess: Timestamp::new(end_assess),
            };
            let request = ProposalRequest::fund(
                common.id,
                common.title,
                common.doc_hash,
                times,
                Amount::new(amount),
            );
            let signature = sign_payload(&request.fund_payload(proposer), &manager.private)?;
            (request, signature)
        }
    };
    tracing::debug!(proposal = %request.id, kind = ?request.kind, "signed proposal request");
    let opens_in = format_remaining(request.times.start, SystemClock.now());
    print(json!({
        "request": request,
        "signature": signature.to_string(),
        "vote_opens_in": opens_in,
    }))
}

fn check_config(path: PathBuf) -> anyhow::Result<()> {
    let config = NodeConfig::from_toml_file(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;
    let setup = config.engine_setup()?;
    tracing::info!(path = %path.display(), "configuration is valid");
    print(json!({
        "admin": setup.admin.to_string(),
        "manager": Address::from_public_key(&setup.manager_key).to_string(),
        "ledger": setup.ledger_address.to_string(),
        "coordinator": setup.coordinator_address.to_string(),
        "treasury": setup.treasury.to_string(),
        "queue_depth": config.queue_depth,
        "params": setup.params,
    }))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commons_utils::init_logging(cli.log_format, &cli.log_level)?;

    match cli.command {
        Command::Keygen => {
            let pair = generate_keypair()?;
            print(json!({
                "private_key": pair.private.to_hex(),
                "public_key": pair.public.to_string(),
                "address": Address::from_public_key(&pair.public).to_string(),
            }))
        }
        Command::SignProposal { key, kind } => sign_proposal(&key, kind),
        Command::Commitment {
            coordinator,
            proposal,
            voter,
            choice,
            nonce,
        } => {
            anyhow::ensure!(nonce != 0, "nonce must not be zero");
            let commitment = ballot_commitment(&coordinator, &proposal, &voter, choice.as_u8(), nonce);
            print(json!({
                "proposal": proposal.to_string(),
                "voter": voter.to_string(),
                "commitment": commitment.to_string(),
            }))
        }
        Command::SignBallot {
            key,
            proposal,
            voter,
            commitment,
        } => {
            let manager = manager_keypair(&key)?;
            let authorization = BallotAuthorization {
                proposal_id: proposal,
                voter,
                commitment,
            };
            let signature = sign_payload(&authorization, &manager.private)?;
            print(json!({
                "proposal": proposal.to_string(),
                "voter": voter.to_string(),
                "commitment": commitment.to_string(),
                "signature": signature.to_string(),
            }))
        }
        Command::Config { action } => match action {
            ConfigAction::Check { path } => check_config(path),
            ConfigAction::Default => {
                print!("{}", NodeConfig::default().to_toml_string()?);
                Ok(())
            }
        },
    }
}
