use std::sync::Arc;

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::fields::IntField;
use crate::fields::FieldVal;
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

use super::OpIterator;

/// Drains `child` into `table_id`, one `BufferPool::insert_tuple` call per
/// tuple, and reports back a single count tuple — mirroring `Delete`.
/// `child`'s descriptor must already match the table's, since no widening
/// or reordering happens here.
pub struct Insert {
    tid: TransactionId,
    buffer_pool: Arc<BufferPool>,
    table_id: usize,
    child: Box<dyn OpIterator>,
    desc: TupleDesc,
    done: bool,
}

impl Insert {
    pub fn new(
        tid: TransactionId,
        buffer_pool: Arc<BufferPool>,
        table_id: usize,
        child: Box<dyn OpIterator>,
    ) -> DbResult<Self> {
        let table_desc = buffer_pool.get_tuple_desc(table_id)?;
        if child.tuple_desc() != &table_desc {
            return Err(DbError::db("insert child descriptor does not match table descriptor"));
        }
        let desc = TupleDesc::new(
            vec![crate::types::Type::IntType],
            vec!["count".to_string()],
        );
        Ok(Insert {
            tid,
            buffer_pool,
            table_id,
            child,
            desc,
            done: false,
        })
    }
}

impl OpIterator for Insert {
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
            return Err(DbError::no_such_element("insert already produced its count"));
        }
        let mut count = 0i32;
        while self.child.has_next()? {
            let t = self.child.next()?;
            self.buffer_pool.insert_tuple(self.tid, self.table_id, t)?;
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
