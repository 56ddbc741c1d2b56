use core_types::TickId;
use dom::{DomError, MetaKind};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TickProtocol {
    #[error("{0} is already active")]
    TickAlreadyActive(TickId),
    #[error("no tick is active")]
    NoActiveTick,
}

/// Why a token was refused. All variants surface as [`HostError::TokenViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenViolation {
    #[error("missing token")]
    Missing,
    #[error("token belongs to a different tick (current {expected}, token {got})")]
    WrongTick { expected: TickId, got: TickId },
    #[error("token for {0} was already consumed")]
    AlreadyConsumed(TickId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error("tick protocol violation: {0}")]
    TickProtocolViolation(TickProtocol),
    #[error("token violation: {0}")]
    TokenViolation(TokenViolation),
    #[error("{meta_kind} batch must not carry ops (got {count})")]
    RollbackOpsNotEmpty { meta_kind: MetaKind, count: usize },
    #[error("keyed identity space exhausted")]
    IdentityExhausted,
    #[error("invalid host config: {0}")]
    Config(String),
}

impl From<TickProtocol> for HostError {
    fn from(violation: TickProtocol) -> Self {
        HostError::TickProtocolViolation(violation)
    }
}

impl From<TokenViolation> for HostError {
    fn from(violation: TokenViolation) -> Self {
        HostError::TokenViolation(violation)
    }
}
