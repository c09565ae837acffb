use std::io;

use crate::transaction::TransactionId;

/// The five error kinds the core surfaces to callers.
///
/// Every fallible operation in the crate returns `DbResult<T>`. Layers never
/// invent their own ad hoc string error: a heap page that runs out of slots,
/// a catalog miss, a lock wait that outlives its timeout, and a torn read
/// all map onto one of these variants.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A lock wait exceeded its randomized timeout. Deadlock is presumed;
    /// the caller must roll back via `transaction_complete(tid, false)`.
    #[error("transaction {0:?} aborted")]
    TransactionAborted(TransactionId),

    /// Capacity, schema mismatch, or page/tuple state violation.
    #[error("{0}")]
    Db(String),

    /// Catalog miss, iterator exhausted, or descriptor name lookup failure.
    #[error("no such element: {0}")]
    NoSuchElement(String),

    /// Underlying file read/write failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Page buffer length or bitmap inconsistent with the descriptor.
    #[error("corrupt page: {0}")]
    Corrupt(String),
}

impl DbError {
    pub fn db(msg: impl Into<String>) -> Self {
        DbError::Db(msg.into())
    }

    pub fn no_such_element(msg: impl Into<String>) -> Self {
        DbError::NoSuchElement(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        DbError::Corrupt(msg.into())
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, DbError::TransactionAborted(_))
    }
}

pub type DbResult<T> = Result<T, DbError>;
