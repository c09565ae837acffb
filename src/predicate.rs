use crate::fields::FieldVal;
use crate::tuple::Tuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEq,
    GreaterThan,
    GreaterThanOrEq,
    Like,
}

impl Op {
    fn matches_ordering(&self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Op::Equals => ord == Equal,
            Op::NotEquals => ord != Equal,
            Op::LessThan => ord == Less,
            Op::LessThanOrEq => ord != Greater,
            Op::GreaterThan => ord == Greater,
            Op::GreaterThanOrEq => ord != Less,
            Op::Like => false,
        }
    }
}

// A single-field selection predicate for Filter: `field[i] op literal`.
pub struct Predicate {
    field_index: usize,
    op: Op,
    literal: FieldVal,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, literal: FieldVal) -> Self {
        Predicate {
            field_index,
            op,
            literal,
        }
    }

    pub fn filter(&self, t: &Tuple) -> bool {
        let field = match t.get_field(self.field_index) {
            Some(f) => f,
            None => return false,
        };
        if self.op == Op::Like {
            return match &self.literal {
                FieldVal::StringField(pattern) => field.like(&pattern.get_value()),
                FieldVal::IntField(_) => false,
            };
        }
        match field.partial_compare(&self.literal) {
            Some(ord) => self.op.matches_ordering(ord),
            None => false,
        }
    }
}

// A two-field join predicate: `left[leftField] op right[rightField]`.
pub struct JoinPredicate {
    left_field: usize,
    op: Op,
    right_field: usize,
}

impl JoinPredicate {
    pub fn new(left_field: usize, op: Op, right_field: usize) -> Self {
        JoinPredicate {
            left_field,
            op,
            right_field,
        }
    }

    pub fn filter(&self, left: &Tuple, right: &Tuple) -> bool {
        let (lf, rf) = match (
            left.get_field(self.left_field),
            right.get_field(self.right_field),
        ) {
            (Some(l), Some(r)) => (l, r),
            _ => return false,
        };
        if self.op == Op::Like {
            return match (lf, rf) {
                (FieldVal::StringField(l), FieldVal::StringField(r)) => {
                    l.get_value().contains(&r.get_value())
                }
                _ => false,
            };
        }
        match lf.partial_compare(rf) {
            Some(ord) => self.op.matches_ordering(ord),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::IntField;
    use crate::tuple::TupleDesc;
    use crate::types::Type;

    fn int_desc() -> TupleDesc {
        TupleDesc::new(vec![Type::IntType], vec!["x".to_string()])
    }

    #[test]
    fn greater_than_keeps_only_larger_values() {
        let td = int_desc();
        let small = Tuple::new(vec![FieldVal::IntField(IntField::new(1))], &td);
        let big = Tuple::new(vec![FieldVal::IntField(IntField::new(10))], &td);
        let pred = Predicate::new(0, Op::GreaterThan, FieldVal::IntField(IntField::new(5)));
        assert!(!pred.filter(&small));
        assert!(pred.filter(&big));
    }

    #[test]
    fn join_predicate_compares_across_tuples() {
        let td = int_desc();
        let left = Tuple::new(vec![FieldVal::IntField(IntField::new(3))], &td);
        let right = Tuple::new(vec![FieldVal::IntField(IntField::new(3))], &td);
        let pred = JoinPredicate::new(0, Op::Equals, 0);
        assert!(pred.filter(&left, &right));
    }
}
