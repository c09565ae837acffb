use std::sync::Arc;

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::fields::FieldVal;
use crate::fields::IntField;
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

use super::OpIterator;

/// Drains `child` and calls `BufferPool::delete_tuple` once per tuple,
/// reporting back a single count tuple — mirroring `Insert`. Each incoming
/// tuple must carry the record id the storage layer stamped on it, since
/// that's how the buffer pool finds the page and table to delete from.
pub struct Delete {
    tid: TransactionId,
    buffer_pool: Arc<BufferPool>,
    child: Box<dyn OpIterator>,
    desc: TupleDesc,
    done: bool,
}

impl Delete {
    pub fn new(tid: TransactionId, buffer_pool: Arc<BufferPool>, child: Box<dyn OpIterator>) -> Self {
        let desc = TupleDesc::new(
            vec![crate::types::Type::IntType],
            vec!["count".to_string()],
        );
        Delete {
            tid,
            buffer_pool,
            child,
            desc,
            done: false,
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        self.done = false;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(!self.done)
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if self.done {
            return Err(DbError::no_such_element("delete already produced its count"));
        }
        let mut count = 0i32;
        while self.child.has_next()? {
            let t = self.child.next()?;
            self.buffer_pool.delete_tuple(self.tid, &t)?;
            count += 1;
        }
        self.done = true;
        let tuple = Tuple::new(vec![FieldVal::IntField(IntField::new(count))], &self.desc);
        Ok(tuple)
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.child.rewind()?;
        self.done = false;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.done = false;
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) {
        if let Some(c) = children.pop() {
            self.child = c;
        }
    }
}
