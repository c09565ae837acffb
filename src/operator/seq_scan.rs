use std::sync::Arc;

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::heap_file::{HeapFile, HeapFileIterator};
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

use super::OpIterator;

/// Leaf operator: pulls every tuple of one table through the buffer pool.
/// The advertised descriptor qualifies every field name with `alias`
/// (defaulting to the table's own name lets two scans of the same table
/// appear as distinct aliases in a self-join).
pub struct SeqScan {
    tid: TransactionId,
    heap_file: Arc<HeapFile>,
    buffer_pool: Arc<BufferPool>,
    desc: TupleDesc,
    iter: Option<HeapFileIterator>,
}

impl SeqScan {
    pub fn new(
        tid: TransactionId,
        heap_file: Arc<HeapFile>,
        buffer_pool: Arc<BufferPool>,
        alias: &str,
    ) -> Self {
        let desc = heap_file.get_tuple_desc().with_prefix(alias);
        SeqScan {
            tid,
            heap_file,
            buffer_pool,
            desc,
            iter: None,
        }
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> DbResult<()> {
        let mut iter = self.heap_file.iterator(&self.buffer_pool, self.tid);
        iter.open()?;
        self.iter = Some(iter);
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match &mut self.iter {
            Some(iter) => iter.has_next(),
            None => Ok(false),
        }
    }

    fn next(&mut self) -> DbResult<Tuple> {
        let iter = self
            .iter
            .as_mut()
            .ok_or_else(|| DbError::no_such_element("seq scan is not open"))?;
        let raw = iter.next()?;
        let rid = raw.get_record_id();
        let mut t = Tuple::new(raw.get_fields().to_vec(), &self.desc);
        if let Some(rid) = rid {
            t.set_record_id(rid);
        }
        Ok(t)
    }

    fn rewind(&mut self) -> DbResult<()> {
        match &mut self.iter {
            Some(iter) => iter.rewind(),
            None => self.open(),
        }
    }

    fn close(&mut self) {
        self.iter = None;
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![]
    }

    fn set_children(&mut self, _children: Vec<Box<dyn OpIterator>>) {
        // SeqScan is a leaf; nothing to rewrite.
    }
}
