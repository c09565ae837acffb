use std::cmp::Ordering;

use crate::error::{DbError, DbResult};
use crate::tuple::{Tuple, TupleDesc};

use super::OpIterator;

/// Sorts the child's entire output by one field before replaying it.
/// Materializes the child fully on `open`; later operators see a stable
/// sort (equal keys keep the child's own relative order).
pub struct OrderBy {
    child: Box<dyn OpIterator>,
    field_index: usize,
    ascending: bool,
    buffer: Vec<Tuple>,
    cursor: usize,
}

impl OrderBy {
    pub fn new(child: Box<dyn OpIterator>, field_index: usize, ascending: bool) -> Self {
        OrderBy {
            child,
            field_index,
            ascending,
            buffer: vec![],
            cursor: 0,
        }
    }

    fn load(&mut self) -> DbResult<()> {
        let mut buffer = vec![];
        while self.child.has_next()? {
            buffer.push(self.child.next()?);
        }
        let field_index = self.field_index;
        buffer.sort_by(|a, b| {
            let ord = match (a.get_field(field_index), b.get_field(field_index)) {
                (Some(fa), Some(fb)) => fa.partial_compare(fb).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            ord
        });
        if !self.ascending {
            buffer.reverse();
        }
        self.buffer = buffer;
        self.cursor = 0;
        Ok(())
    }
}

impl OpIterator for OrderBy {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        self.load()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(self.cursor < self.buffer.len())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        let t = self
            .buffer
            .get(self.cursor)
            .cloned()
            .ok_or_else(|| DbError::no_such_element("order by exhausted"))?;
        self.cursor += 1;
        Ok(t)
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.child.rewind()?;
        self.load()
    }

    fn close(&mut self) {
        self.child.close();
        self.buffer.clear();
        self.cursor = 0;
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
