use std::fmt::{Display, Formatter};

use crate::error::{DbError, DbResult};
use crate::fields::FieldVal;
use crate::heap_page::HeapPageId;
use crate::types::Type;

// Reference to a tuple on a page of a table
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct RecordId {
    pid: HeapPageId,
    tuple_no: usize,
}

impl RecordId {
    pub fn new(pid: HeapPageId, tuple_no: usize) -> Self {
        RecordId { pid, tuple_no }
    }

    pub fn get_page_id(&self) -> HeapPageId {
        self.pid
    }

    pub fn get_tuple_no(&self) -> usize {
        self.tuple_no
    }
}

#[derive(Debug, Clone)]
pub struct TupleDesc {
    types: Vec<Type>,
    fields: Vec<String>,
}

/// Two descriptors are equal iff they have the same length and the i-th
/// types match; field names are informational and don't participate.
impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}

impl Eq for TupleDesc {}

impl TupleDesc {
    pub fn new(types: Vec<Type>, fields: Vec<String>) -> Self {
        assert!(!types.is_empty(), "a tuple descriptor needs at least one field");
        TupleDesc { types, fields }
    }

    pub fn combine(td1: &TupleDesc, td2: &TupleDesc) -> TupleDesc {
        // Merge two TupleDescs into one, with td1.numFields + td2.numFields
        let mut types = td1.types.clone();
        types.extend(td2.types.clone());
        let mut field_names = td1.fields.clone();
        field_names.extend(td2.fields.clone());
        TupleDesc::new(types, field_names)
    }

    /// A copy of this descriptor with every field name qualified by a table
    /// alias, e.g. for `SeqScan`'s output descriptor.
    pub fn with_prefix(&self, prefix: &str) -> TupleDesc {
        let fields = self
            .fields
            .iter()
            .map(|f| format!("{}.{}", prefix, f))
            .collect();
        TupleDesc::new(self.types.clone(), fields)
    }

    pub fn get_num_fields(&self) -> usize {
        self.types.len()
    }

    // Returns the (possibly null) Field object with the given name.
    pub fn get_field_name(&self, i: usize) -> Option<&String> {
        self.fields.get(i)
    }

    // Returns the (possibly null) index of the field with a given name
    pub fn name_to_id(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|n| n == name)
    }

    pub fn name_to_id_result(&self, name: &str) -> DbResult<usize> {
        self.name_to_id(name)
            .ok_or_else(|| DbError::no_such_element(format!("no field named {}", name)))
    }

    // Returns the type of the ith field of this TupleDesc.
    pub fn get_field_type(&self, i: usize) -> Option<&Type> {
        self.types.get(i)
    }

    // Return the size (in bytes) of tuples corresponding to this TupleDesc.
    pub fn get_size(&self) -> usize {
        self.types.iter().fold(0, |acc, t| acc + t.get_len())
    }
}

// Describe the schema of a tuple/table
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Tuple {
    fields: Vec<FieldVal>,
    td: TupleDesc,
    rid: Option<RecordId>,
}

impl Display for Tuple {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            match field {
                FieldVal::IntField(int_field) => {
                    s.push_str(&format!("{}: {}", self.td.fields[i], int_field.get_value()))
                }
                FieldVal::StringField(string_field) => s.push_str(&format!(
                    "{}: {}",
                    self.td.fields[i],
                    string_field.get_value()
                )),
            }
            if i != self.fields.len() - 1 {
                s.push_str(", ");
            }
        }
        write!(f, "{{{}}}", s)
    }
}

impl Tuple {
    pub fn new(fields: Vec<FieldVal>, td: &TupleDesc) -> Self {
        Tuple {
            fields,
            td: td.clone(),
            rid: None,
        }
    }

    pub fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    pub fn get_record_id(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn set_record_id(&mut self, rid: RecordId) {
        self.rid = Some(rid);
    }

    pub fn invalidate_record_id(&mut self) {
        self.rid = None;
    }

    pub fn get_field(&self, i: usize) -> Option<&FieldVal> {
        self.fields.get(i)
    }

    pub fn set_field(&mut self, i: usize, field: FieldVal) {
        self.fields[i] = field;
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![];
        for field in self.fields.iter() {
            bytes.extend(field.serialize());
        }
        bytes
    }

    pub fn deserialize(bytes: &[u8], td: &TupleDesc) -> DbResult<Self> {
        let mut offset = 0;
        let mut fields = vec![];
        for t in td.types.iter() {
            let field = t.parse(&bytes[offset..])?;
            offset += t.get_len();
            fields.push(field);
        }
        Ok(Tuple::new(fields, td))
    }

    pub fn get_fields(&self) -> &[FieldVal] {
        &self.fields
    }

    /// Concatenates two tuples' fields under a merged descriptor, as used
    /// by the join operator.
    pub fn concat(left: &Tuple, right: &Tuple, merged_desc: &TupleDesc) -> Tuple {
        let mut fields = left.fields.clone();
        fields.extend(right.fields.clone());
        Tuple::new(fields, merged_desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{IntField, StringField};
    use crate::types::Type;

    #[test]
    fn test_tuple_desc_combine() {
        let td1 = TupleDesc::new(
            vec![Type::IntType, Type::StringType],
            vec!["int".to_string(), "string".to_string()],
        );
        let td2 = TupleDesc::new(
            vec![Type::IntType, Type::StringType],
            vec!["int".to_string(), "string".to_string()],
        );
        let td3 = TupleDesc::combine(&td1, &td2);
        assert_eq!(td3.get_num_fields(), 4);
        assert_eq!(td3.get_field_name(0), Some(&"int".to_string()));
        assert_eq!(td3.get_field_name(1), Some(&"string".to_string()));
        assert_eq!(td3.get_field_name(2), Some(&"int".to_string()));
        assert_eq!(td3.get_field_name(3), Some(&"string".to_string()));
    }

    #[test]
    fn test_tuple_desc_len() {
        let td = TupleDesc::new(
            vec![Type::IntType, Type::StringType],
            vec!["int".to_string(), "string".to_string()],
        );
        assert_eq!(td.get_size(), 264);
    }

    #[test]
    fn test_tuple_serialize_deserialize() {
        let td = TupleDesc::new(
            vec![Type::IntType, Type::StringType],
            vec!["int".to_string(), "string".to_string()],
        );
        let tuple = Tuple::new(
            vec![
                FieldVal::IntField(IntField::new(1)),
                FieldVal::StringField(StringField::new("hello".to_string(), 5)),
            ],
            &td,
        );
        let bytes = tuple.serialize();
        let tuple2 = Tuple::deserialize(&bytes, &td).unwrap();
        assert_eq!(tuple, tuple2);
    }

    #[test]
    fn fresh_tuple_has_no_record_id() {
        let td = TupleDesc::new(vec![Type::IntType], vec!["x".to_string()]);
        let tuple = Tuple::new(vec![FieldVal::IntField(IntField::new(1))], &td);
        assert_eq!(tuple.get_record_id(), None);
    }

    #[test]
    fn with_prefix_qualifies_field_names() {
        let td = TupleDesc::new(vec![Type::IntType], vec!["id".to_string()]);
        let prefixed = td.with_prefix("t");
        assert_eq!(prefixed.get_field_name(0), Some(&"t.id".to_string()));
    }
}
