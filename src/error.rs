//! Publish error taxonomy.

use thiserror::Error;

use crate::handler::HandlerError;
use crate::transaction::ResourceError;

/// Failure of a publish call.
///
/// Handler errors abort the remainder of the dispatch (fail-fast) and reach
/// the caller with the original error preserved as [`source`]. Resource close
/// failures never surface here - they are logged and the publish outcome
/// stands.
///
/// [`source`]: std::error::Error::source
#[derive(Debug, Error)]
pub enum PublishError {
    /// Publish was called with an absent payload; checked before any hook or
    /// handler runs.
    #[error("event payload must not be null")]
    NullPayload,

    /// A handler failed during dispatch. No further handlers ran.
    #[error("event handler failed")]
    Handler(#[source] HandlerError),

    /// A shared resource could not be opened for a transactional publish.
    #[error("cannot open shared resource")]
    Resource(#[source] ResourceError),
}
