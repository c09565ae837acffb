use std::cmp::Ordering;

use crate::types::{Type, STRING_SIZE};

// Wrapper for different types of fields
//
// Modeled as a tagged variant over the closed set {Int32, String} rather
// than a `dyn Field` hierarchy, so comparison and width are dispatched on
// the tag.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum FieldVal {
    IntField(IntField),
    StringField(StringField),
}

impl FieldVal {
    // Extracts the inner IntField
    pub fn into_int(self) -> Option<IntField> {
        match self {
            FieldVal::IntField(int_field) => Some(int_field),
            _ => None,
        }
    }
    // Extracts the inner StringField
    pub fn into_string(self) -> Option<StringField> {
        match self {
            FieldVal::StringField(string_field) => Some(string_field),
            _ => None,
        }
    }

    pub fn get_type(&self) -> Type {
        match self {
            FieldVal::IntField(f) => f.get_type(),
            FieldVal::StringField(f) => f.get_type(),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            FieldVal::IntField(f) => f.serialize_field(),
            FieldVal::StringField(f) => f.serialize_field(),
        }
    }

    /// Ordering between two fields of the same variant; `None` if the
    /// variants differ (predicates only ever compare same-column fields).
    pub fn partial_compare(&self, other: &FieldVal) -> Option<Ordering> {
        match (self, other) {
            (FieldVal::IntField(a), FieldVal::IntField(b)) => Some(a.value.cmp(&b.value)),
            (FieldVal::StringField(a), FieldVal::StringField(b)) => Some(a.value.cmp(&b.value)),
            _ => None,
        }
    }

    pub fn like(&self, pattern: &str) -> bool {
        match self {
            FieldVal::StringField(f) => f.value.contains(pattern),
            FieldVal::IntField(_) => false,
        }
    }
}

// Trait for different types of fields
pub trait Field {
    // Get the type of the field
    fn get_type(&self) -> Type;
    // Serialize the field into bytes
    fn serialize_field(&self) -> Vec<u8>;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
pub struct IntField {
    value: i32,
}

impl IntField {
    pub fn new(value: i32) -> Self {
        IntField { value }
    }
    pub fn get_value(&self) -> i32 {
        self.value
    }
}

impl Field for IntField {
    fn get_type(&self) -> Type {
        Type::IntType
    }
    fn serialize_field(&self) -> Vec<u8> {
        self.value.to_be_bytes().to_vec()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct StringField {
    value: String,
    len: u32,
}

impl StringField {
    pub fn new(value: String, len: u32) -> Self {
        StringField { value, len }
    }

    pub fn get_value(&self) -> String {
        self.value.clone()
    }
}

impl Field for StringField {
    fn get_type(&self) -> Type {
        Type::StringType
    }

    fn serialize_field(&self) -> Vec<u8> {
        let mut bytes = vec![0; STRING_SIZE + 4];
        bytes[0..4].copy_from_slice(&self.len.to_be_bytes());
        // copy as many bytes as possible from string and pad with 0s
        let str_bytes = self.value.as_bytes();
        let copy_len = std::cmp::min(str_bytes.len(), STRING_SIZE);
        bytes[4..4 + copy_len].copy_from_slice(&str_bytes[..copy_len]);
        bytes
    }
}
