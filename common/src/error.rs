use thiserror::Error;

/// Failure fetching market or user data from one protocol. Adapters absorb
/// these at their boundary; the merge engine's stale-retention rule handles
/// the rest.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Failure of one claim attempt. Every variant maps to a user-facing message
/// and returns the orchestrator to idle; nothing here is retried implicitly.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not available.")]
    NotAvailable,

    #[error("Missing {0}.")]
    MissingCapability(String),

    #[error("Swap route unavailable.")]
    SwapRouteUnavailable,

    #[error("Missing swap coin for {0}.")]
    SwapCoinMissing(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
