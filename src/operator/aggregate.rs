use std::collections::HashMap;

use crate::error::{DbError, DbResult};
use crate::fields::{FieldVal, IntField};
use crate::tuple::{Tuple, TupleDesc};
use crate::types::Type;

use super::OpIterator;

/// Aggregation functions supported over a single field, optionally grouped
/// by another field. String-typed fields only support `Count` — the rest
/// require an ordering that a string field doesn't carry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl AggregateOp {
    fn apply(self, acc: &GroupState, value: i32) -> GroupState {
        match self {
            AggregateOp::Min => GroupState {
                value: acc.value.min(value),
                count: acc.count + 1,
                sum: acc.sum,
            },
            AggregateOp::Max => GroupState {
                value: acc.value.max(value),
                count: acc.count + 1,
                sum: acc.sum,
            },
            AggregateOp::Sum => GroupState {
                value: acc.value + value,
                count: acc.count + 1,
                sum: acc.sum + value as i64,
            },
            AggregateOp::Avg => GroupState {
                value: 0,
                count: acc.count + 1,
                sum: acc.sum + value as i64,
            },
            AggregateOp::Count => GroupState {
                value: 0,
                count: acc.count + 1,
                sum: acc.sum,
            },
        }
    }

    fn seed(self, value: i32) -> GroupState {
        GroupState {
            value,
            count: 1,
            sum: value as i64,
        }
    }

    fn finish(self, state: &GroupState) -> i32 {
        match self {
            AggregateOp::Min | AggregateOp::Max => state.value,
            AggregateOp::Sum => state.value,
            AggregateOp::Count => state.count as i32,
            // Integer-truncated running average, per the running sum/count
            // kept alongside the min/max accumulator.
            AggregateOp::Avg => (state.sum / state.count as i64) as i32,
        }
    }
}

#[derive(Clone, Copy)]
struct GroupState {
    value: i32,
    count: usize,
    sum: i64,
}

/// Computes one running `op` over `agg_field`, grouped by `group_field`
/// (if any). The whole child is consumed on the first `open`; output order
/// follows first-seen group order, not any sort of the group key.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggregateOp,
    desc: TupleDesc,
    groups: Option<Vec<(Option<FieldVal>, GroupState)>>,
    cursor: usize,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn OpIterator>,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggregateOp,
    ) -> Self {
        let desc = Self::build_desc(child.tuple_desc(), agg_field, group_field, op);
        Aggregate {
            child,
            agg_field,
            group_field,
            op,
            desc,
            groups: None,
            cursor: 0,
        }
    }

    fn build_desc(
        child_desc: &TupleDesc,
        agg_field: usize,
        group_field: Option<usize>,
        op: AggregateOp,
    ) -> TupleDesc {
        let agg_name = format!("{:?}({})", op, child_desc.get_field_name(agg_field).cloned().unwrap_or_default());
        match group_field {
            Some(g) => TupleDesc::new(
                vec![
                    child_desc.get_field_type(g).cloned().unwrap_or(Type::IntType),
                    Type::IntType,
                ],
                vec![child_desc.get_field_name(g).cloned().unwrap_or_default(), agg_name],
            ),
            None => TupleDesc::new(vec![Type::IntType], vec![agg_name]),
        }
    }

    fn compute(&mut self) -> DbResult<()> {
        let mut order: Vec<Option<FieldVal>> = vec![];
        let mut index: HashMap<Option<FieldVal>, usize> = HashMap::new();
        let mut states: Vec<GroupState> = vec![];

        while self.child.has_next()? {
            let t = self.child.next()?;
            let field = t
                .get_field(self.agg_field)
                .ok_or_else(|| DbError::db("aggregate field index out of range"))?;
            let value = match field {
                FieldVal::IntField(f) => f.get_value(),
                FieldVal::StringField(_) if self.op == AggregateOp::Count => 0,
                FieldVal::StringField(_) => {
                    return Err(DbError::db("only COUNT supports string-typed aggregate fields"))
                }
            };
            let key = match self.group_field {
                Some(g) => Some(
                    t.get_field(g)
                        .ok_or_else(|| DbError::db("group field index out of range"))?
                        .clone(),
                ),
                None => None,
            };

            match index.get(&key) {
                Some(&i) => states[i] = self.op.apply(&states[i], value),
                None => {
                    index.insert(key.clone(), states.len());
                    order.push(key);
                    states.push(self.op.seed(value));
                }
            }
        }

        let groups = order
            .into_iter()
            .map(|key| {
                let i = index[&key];
                (key, states[i])
            })
            .collect();
        self.groups = Some(groups);
        self.cursor = 0;
        Ok(())
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        self.compute()?;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match &self.groups {
            Some(g) => Ok(self.cursor < g.len()),
            None => Ok(false),
        }
    }

    fn next(&mut self) -> DbResult<Tuple> {
        let groups = self
            .groups
            .as_ref()
            .ok_or_else(|| DbError::no_such_element("aggregate is not open"))?;
        let (key, state) = groups
            .get(self.cursor)
            .ok_or_else(|| DbError::no_such_element("aggregate exhausted"))?;
        self.cursor += 1;
        let result = self.op.finish(state);
        let fields = match key {
            Some(k) => vec![k.clone(), FieldVal::IntField(IntField::new(result))],
            None => vec![FieldVal::IntField(IntField::new(result))],
        };
        Ok(Tuple::new(fields, &self.desc))
    }

    fn rewind(&mut self) -> DbResult<()> {
        self.child.rewind()?;
        self.compute()
    }

    fn close(&mut self) {
        self.child.close();
        self.groups = None;
        self.cursor = 0;
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
