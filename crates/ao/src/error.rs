//! Error kinds shared by the actor pool and the message protocol.

use thiserror::Error;

/// Result type used throughout the runtime.
pub type AoResult<T> = Result<T, AoError>;

/// Failure of a runtime operation.
///
/// Every fallible operation reports one of these to its immediate caller;
/// the runtime never retries internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AoError {
    /// An argument was empty or inconsistent.
    #[error("invalid argument")]
    InvalidArgument,
    /// The receiver reference is missing or no longer alive.
    #[error("invalid receiver")]
    InvalidReceiver,
    /// Neither the receiver nor the sender owns a queue to carry the message.
    #[error("no mailbox available for a queueless receiver")]
    NoMailbox,
    /// Data or payload exceeds its fixed buffer.
    #[error("size exceeded")]
    SizeExceeded,
    /// Every pool slot is in use.
    #[error("actor pool exhausted")]
    NoCapacity,
    /// A queue or scheduling context could not be created, or a queue is full.
    #[error("os resource error")]
    OsResourceError,
}
