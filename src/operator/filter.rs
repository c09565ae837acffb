use crate::error::{DbError, DbResult};
use crate::predicate::Predicate;
use crate::tuple::{Tuple, TupleDesc};

use super::{Lookahead, OpIterator};

/// Yields only the child's tuples that satisfy a single-field predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    lookahead: Lookahead,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Filter {
            predicate,
            child,
            lookahead: Lookahead::new(),
        }
    }

    fn advance(&mut self) -> DbResult<Option<Tuple>> {
        while self.child.has_next()? {
            let t = self.child.next()?;
            if self.predicate.filter(&t) {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        self.lookahead.reset();
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if !self.lookahead.is_primed() {
            let next = self.advance()?;
            self.lookahead.fill(next);
        }
        Ok(self.lookahead.is_primed())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if !self.lookahead.is_primed() {
            let next = self.advance()?;
            self.lookahead.fill(next);
        }
        self.lookahead
            .take()
            .ok_or_else(|| DbError::no_such_element("filter exhausted"))
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.child.rewind()?;
        self.lookahead.reset();
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.lookahead.reset();
    }

    fn tuple_desc(&self) -> &TupleDesc {
        self.child.tuple_desc()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldVal, IntField};
    use crate::operator::seq_scan::SeqScan;
    use crate::predicate::Op;
    use crate::transaction::TransactionId;
    use crate::types::Type;
    use std::fs::OpenOptions;
    use std::sync::Arc;

    fn int_desc() -> TupleDesc {
        TupleDesc::new(vec![Type::IntType], vec!["x".to_string()])
    }

    #[test]
    fn keeps_only_tuples_matching_predicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.dat");
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        let hf = Arc::new(crate::heap_file::HeapFile::new(file, &path, int_desc()).unwrap());
        let catalog = Arc::new(crate::catalog::Catalog::new());
        catalog.add_table(Arc::clone(&hf), "a".to_string(), None);
        let bp = Arc::new(crate::buffer_pool::BufferPool::new(16, catalog));
        let tid = TransactionId::new();
        for i in 1..=3 {
            hf.insert_tuple(
                tid,
                &bp,
                Tuple::new(vec![FieldVal::IntField(IntField::new(i))], &int_desc()),
            )
            .unwrap();
        }

        let scan = SeqScan::new(tid, hf, bp, "a");
        let pred = Predicate::new(0, Op::GreaterThan, FieldVal::IntField(IntField::new(1)));
        let mut filter = Filter::new(pred, Box::new(scan));
        filter.open().unwrap();
        let mut values = vec![];
        while filter.has_next().unwrap() {
            values.push(
                filter
                    .next()
                    .unwrap()
                    .get_field(0)
                    .unwrap()
                    .clone()
                    .into_int()
                    .unwrap()
                    .get_value(),
            );
        }
        assert_eq!(values, vec![2, 3]);
    }
}
