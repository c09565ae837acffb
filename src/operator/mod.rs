mod aggregate;
mod delete;
mod filter;
mod insert;
mod join;
mod order_by;
mod project;
mod seq_scan;

pub use aggregate::{Aggregate, AggregateOp};
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use join::Join;
pub use order_by::OrderBy;
pub use project::Project;
pub use seq_scan::SeqScan;

use crate::error::DbResult;
use crate::tuple::{Tuple, TupleDesc};

/// Pull-based iterator contract shared by every operator in a query tree.
/// `next` on an unopened or exhausted operator fails `NoSuchElement`.
pub trait OpIterator {
    fn open(&mut self) -> DbResult<()>;
    fn has_next(&mut self) -> DbResult<bool>;
    fn next(&mut self) -> DbResult<Tuple>;

    // Default: close then reopen. Operators that can cheaply reset a
    // cursor in place (SeqScan) override this.
    fn rewind(&mut self) -> DbResult<()> {
        self.close();
        self.open()
    }

    fn close(&mut self);
    fn tuple_desc(&self) -> &TupleDesc;
    fn children(&self) -> Vec<&dyn OpIterator>;
    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>);
}

/// One-tuple-ahead buffer backing every operator's `has_next`/`next` pair,
/// so `has_next` can be called repeatedly without losing the tuple it
/// peeked at.
#[derive(Default)]
pub(crate) struct Lookahead {
    peeked: Option<Tuple>,
}

impl Lookahead {
    pub fn new() -> Self {
        Lookahead { peeked: None }
    }

    pub fn reset(&mut self) {
        self.peeked = None;
    }

    pub fn is_primed(&self) -> bool {
        self.peeked.is_some()
    }

    pub fn fill(&mut self, t: Option<Tuple>) {
        self.peeked = t;
    }

    pub fn take(&mut self) -> Option<Tuple> {
        self.peeked.take()
    }
}
