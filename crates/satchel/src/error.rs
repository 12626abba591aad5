//! Controller error taxonomy.

use crate::store::StoreError;
use satchel_rpc::error::RpcError;

/// Errors raised by [`State`](crate::State) operations at the point of
/// precondition violation. The message layer turns these into
/// caller-visible rejections; none are retried.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The origin already has an unresolved authorization request queued.
    #[error("the source {0} has a pending authorization request")]
    DuplicateRequest(String),
    /// The origin was decided before and was granted no access.
    #[error("the source {0} is not allowed to interact with this extension")]
    NotAuthorized(String),
    /// The origin has never been authorized.
    #[error("the source {0} has not been enabled yet")]
    NotEnabled(String),
    /// No authorization entry exists for the origin.
    #[error("the source {0} is not known")]
    UnknownOrigin(String),
    /// The provider key is not in the registry.
    #[error("provider {0} is not exposed by extension")]
    UnknownProvider(String),
    /// An RPC call arrived before `rpc_start_provider` for this port.
    #[error("no provider has been started for this connection")]
    ProviderNotStarted,
    /// The request url could not be parsed into an origin.
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
