use crate::error::{DbError, DbResult};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::Type;

use super::OpIterator;

/// Re-projects each child tuple onto a chosen subset (and order) of fields.
pub struct Project {
    child: Box<dyn OpIterator>,
    field_indices: Vec<usize>,
    desc: TupleDesc,
}

impl Project {
    pub fn new(child: Box<dyn OpIterator>, field_indices: Vec<usize>, field_names: Vec<String>) -> Self {
        let child_desc = child.tuple_desc();
        let types: Vec<Type> = field_indices
            .iter()
            .map(|&i| child_desc.get_field_type(i).cloned().unwrap_or(Type::IntType))
            .collect();
        let desc = TupleDesc::new(types, field_names);
        Project {
            child,
            field_indices,
            desc,
        }
    }
}

impl OpIterator for Project {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.child.has_next()
    }

    fn next(&mut self) -> DbResult<Tuple> {
        let t = self.child.next()?;
        let fields = self
            .field_indices
            .iter()
            .map(|&i| {
                t.get_field(i)
                    .cloned()
                    .ok_or_else(|| DbError::db("projected field index out of range"))
            })
            .collect::<DbResult<Vec<_>>>()?;
        Ok(Tuple::new(fields, &self.desc))
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close();
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
