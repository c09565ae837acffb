use crate::error::{DbError, DbResult};
use crate::predicate::JoinPredicate;
use crate::tuple::{Tuple, TupleDesc};

use super::OpIterator;

/// Nested-loops join: for each left tuple, the right child is rewound and
/// scanned in full, looking for matches under `predicate`. Output order is
/// stable in both the left and right child's own order.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    desc: TupleDesc,
    current_left: Option<Tuple>,
    next_match: Option<Tuple>,
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: Box<dyn OpIterator>, right: Box<dyn OpIterator>) -> Self {
        let desc = TupleDesc::combine(left.tuple_desc(), right.tuple_desc());
        Join {
            predicate,
            left,
            right,
            desc,
            current_left: None,
            next_match: None,
        }
    }

    fn advance(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.next()?);
                self.right.rewind()?;
            }
            let left_tuple = self.current_left.as_ref().unwrap();
            while self.right.has_next()? {
                let right_tuple = self.right.next()?;
                if self.predicate.filter(left_tuple, &right_tuple) {
                    return Ok(Some(Tuple::concat(left_tuple, &right_tuple, &self.desc)));
                }
            }
            self.current_left = None;
        }
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> DbResult<()> {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        self.next_match = None;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        if self.next_match.is_none() {
            self.next_match = self.advance()?;
        }
        Ok(self.next_match.is_some())
    }

    fn next(&mut self) -> DbResult<Tuple> {
        if self.next_match.is_none() {
            self.next_match = self.advance()?;
        }
        self.next_match
            .take()
            .ok_or_else(|| DbError::no_such_element("join exhausted"))
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
        self.next_match = None;
        Ok(())
    }

    fn close(&mut self) {
        self.left.close();
        self.right.close();
        self.current_left = None;
        self.next_match = None;
    }

    fn tuple_desc(&self) -> &TupleDesc {
        &self.desc
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) {
        if children.len() == 2 {
            self.right = children.pop().unwrap();
            self.left = children.pop().unwrap();
        }
    }
}
