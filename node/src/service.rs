//! Single-writer command service.
//!
//! One tokio task owns the write side of the engine. Commands arrive over a
//! bounded `mpsc` channel and are applied one at a time under the write lock;
//! each caller gets its result back through a `oneshot`. Queries take the
//! read lock and run concurrently with each other.

use std::sync::Arc;

use commons_governance::{
    AssessmentReport, AssessmentScores, Choice, GovernanceEngine, GovernanceError,
    GovernanceEvent, ParamUpdate, ProposalRequest, ProposalResult,
};
use commons_types::{Address, Amount, Commitment, Payout, ProposalId, Signature, Timestamp};
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::NodeError;

/// A mutating governance operation, with its caller.
#[derive(Clone, Debug)]
pub enum Command {
    Deposit {
        from: Address,
        amount: Amount,
    },
    CreateProposal {
        caller: Address,
        request: ProposalRequest,
        fee: Amount,
        signature: Signature,
    },
    SetupVoteInfo {
        caller: Address,
        id: ProposalId,
        start: Timestamp,
        end: Timestamp,
        open_reveal: Timestamp,
        info: String,
    },
    AddValidators {
        caller: Address,
        id: ProposalId,
        validators: Vec<Address>,
        finalize: bool,
    },
    DistributeVoterFees {
        caller: Address,
        id: ProposalId,
        start_index: usize,
    },
    SubmitAssessment {
        caller: Address,
        id: ProposalId,
        scores: AssessmentScores,
    },
    CountAssessment {
        caller: Address,
        id: ProposalId,
    },
    SubmitBallot {
        caller: Address,
        id: ProposalId,
        commitment: Commitment,
        signature: Signature,
    },
    RevealBallot {
        caller: Address,
        id: ProposalId,
        voters: Vec<Address>,
        choices: Vec<Choice>,
        nonces: Vec<u64>,
    },
    CountVote {
        caller: Address,
        id: ProposalId,
    },
    RefuseFunding {
        caller: Address,
        id: ProposalId,
    },
    AllowFunding {
        caller: Address,
        id: ProposalId,
    },
    Withdraw {
        caller: Address,
        id: ProposalId,
    },
    UpdateParam {
        caller: Address,
        update: ParamUpdate,
    },
    TransferAdmin {
        caller: Address,
        new_admin: Address,
    },
    /// Take the engine's pending events.
    DrainEvents,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::CreateProposal { .. } => "create_proposal",
            Self::SetupVoteInfo { .. } => "setup_vote_info",
            Self::AddValidators { .. } => "add_validators",
            Self::DistributeVoterFees { .. } => "distribute_voter_fees",
            Self::SubmitAssessment { .. } => "submit_assessment",
            Self::CountAssessment { .. } => "count_assessment",
            Self::SubmitBallot { .. } => "submit_ballot",
            Self::RevealBallot { .. } => "reveal_ballot",
            Self::CountVote { .. } => "count_vote",
            Self::RefuseFunding { .. } => "refuse_funding",
            Self::AllowFunding { .. } => "allow_funding",
            Self::Withdraw { .. } => "withdraw",
            Self::UpdateParam { .. } => "update_param",
            Self::TransferAdmin { .. } => "transfer_admin",
            Self::DrainEvents => "drain_events",
        }
    }
}

/// What a successful command produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    ValidatorsAdded(usize),
    VoterFeesPaid(usize),
    Assessment(AssessmentReport),
    BallotAccepted { first: bool },
    Revealed(usize),
    Decided(ProposalResult),
    Withdrawn(Payout),
    Events(Vec<GovernanceEvent>),
}

fn apply(engine: &mut GovernanceEngine, command: Command) -> Result<Outcome, GovernanceError> {
    use Command::*;
    Ok(match command {
        Deposit { from, amount } => {
            engine.deposit(&from, amount)?;
            Outcome::Done
        }
        CreateProposal {
            caller,
            request,
            fee,
            signature,
        } => {
            engine.create_proposal(&caller, request, fee, &signature)?;
            Outcome::Done
        }
        SetupVoteInfo {
            caller,
            id,
            start,
            end,
            open_reveal,
            info,
        } => {
            engine.setup_vote_info(&caller, &id, start, end, open_reveal, info)?;
            Outcome::Done
        }
        AddValidators {
            caller,
            id,
            validators,
            finalize,
        } => Outcome::ValidatorsAdded(engine.add_validators(&caller, &id, &validators, finalize)?),
        DistributeVoterFees {
            caller,
            id,
            start_index,
        } => Outcome::VoterFeesPaid(engine.distribute_voter_fees(&caller, &id, start_index)?),
        SubmitAssessment { caller, id, scores } => {
            engine.submit_assessment(&caller, &id, scores)?;
            Outcome::Done
        }
        CountAssessment { caller, id } => Outcome::Assessment(engine.count_assessment(&caller, &id)?),
        SubmitBallot {
            caller,
            id,
            commitment,
            signature,
        } => Outcome::BallotAccepted {
            first: engine.submit_ballot(&caller, &id, commitment, &signature)?,
        },
        RevealBallot {
            caller,
            id,
            voters,
            choices,
            nonces,
        } => Outcome::Revealed(engine.reveal_ballot(&caller, &id, &voters, &choices, &nonces)?),
        CountVote { caller, id } => Outcome::Decided(engine.count_vote(&caller, &id)?),
        RefuseFunding { caller, id } => {
            engine.refuse_funding(&caller, &id)?;
            Outcome::Done
        }
        AllowFunding { caller, id } => {
            engine.allow_funding(&caller, &id)?;
            Outcome::Done
        }
        Withdraw { caller, id } => Outcome::Withdrawn(engine.withdraw(&caller, &id)?),
        UpdateParam { caller, update } => {
            engine.apply_param(&caller, update)?;
            Outcome::Done
        }
        TransferAdmin { caller, new_admin } => {
            engine.transfer_admin(&caller, new_admin)?;
            Outcome::Done
        }
        DrainEvents => Outcome::Events(engine.drain_events()),
    })
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<Outcome, GovernanceError>>,
}

pub struct GovernanceService;

impl GovernanceService {
    /// Start the writer task. It runs until every handle has been dropped.
    pub fn spawn(engine: GovernanceEngine, queue_depth: usize) -> (GovernanceHandle, JoinHandle<()>) {
        let engine = Arc::new(RwLock::new(engine));
        let (commands, rx) = mpsc::channel(queue_depth.max(1));
        let task = tokio::spawn(run(Arc::clone(&engine), rx));
        info!(queue_depth, "governance service started");
        (GovernanceHandle { commands, engine }, task)
    }
}

async fn run(engine: Arc<RwLock<GovernanceEngine>>, mut rx: mpsc::Receiver<Request>) {
    while let Some(Request { command, reply }) = rx.recv().await {
        let name = command.name();
        let result = {
            let mut engine = engine.write().await;
            apply(&mut engine, command)
        };
        match &result {
            Ok(outcome) => debug!(command = name, ?outcome, "command applied"),
            Err(e) => warn!(command = name, kind = %e.kind(), error = %e, "command rejected"),
        }
        // the submitter may have given up waiting
        let _ = reply.send(result);
    }
    info!("governance service stopped");
}

/// Cheap, cloneable access to a running [`GovernanceService`].
#[derive(Clone)]
pub struct GovernanceHandle {
    commands: mpsc::Sender<Request>,
    engine: Arc<RwLock<GovernanceEngine>>,
}

impl GovernanceHandle {
    /// Queue a command and wait for its result.
    pub async fn execute(&self, command: Command) -> Result<Outcome, NodeError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| NodeError::ServiceStopped)?;
        let result = response.await.map_err(|_| NodeError::ServiceStopped)?;
        Ok(result?)
    }

    /// Read committed state.
    pub async fn query<R>(&self, f: impl FnOnce(&GovernanceEngine) -> R) -> R {
        let engine = self.engine.read().await;
        f(&engine)
    }

    pub async fn drain_events(&self) -> Result<Vec<GovernanceEvent>, NodeError> {
        match self.execute(Command::DrainEvents).await? {
            Outcome::Events(events) => Ok(events),
            _ => Err(NodeError::UnexpectedOutcome("drain_events")),
        }
    }
}
