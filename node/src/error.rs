use commons_governance::GovernanceError;
use commons_utils::LoggingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("governance service has stopped")]
    ServiceStopped,

    #[error("unexpected outcome for {0}")]
    UnexpectedOutcome(&'static str),
}

impl NodeError {
    /// The governance error behind this failure, if any.
    pub fn governance(&self) -> Option<&GovernanceError> {
        match self {
            Self::Governance(e) => Some(e),
            _ => None,
        }
    }
}
