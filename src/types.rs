use crate::error::{DbError, DbResult};
use crate::fields::{FieldVal, IntField, StringField};

pub const STRING_SIZE: usize = 256;

// Only support Int and String types
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Type {
    IntType,
    StringType,
}

impl Type {
    // Get the size of the type in bytes
    pub fn get_len(&self) -> usize {
        match self {
            // 4 bytes ints
            Type::IntType => 4,
            // 4 bytes for length + STRING_SIZE bytes for string
            Type::StringType => STRING_SIZE + 4,
        }
    }

    // Parse bytes into a FieldVal
    pub fn parse(&self, bytes: &[u8]) -> DbResult<FieldVal> {
        if bytes.len() < self.get_len() {
            return Err(DbError::corrupt("slot too short for its declared type"));
        }
        match self {
            Type::IntType => {
                let mut int_bytes = [0; 4];
                int_bytes.copy_from_slice(&bytes[..4]);
                Ok(FieldVal::IntField(IntField::new(i32::from_be_bytes(
                    int_bytes,
                ))))
            }
            Type::StringType => {
                let mut len_bytes = [0; 4];
                len_bytes.copy_from_slice(&bytes[..4]);
                let len = u32::from_be_bytes(len_bytes) as usize;
                if len > STRING_SIZE {
                    return Err(DbError::corrupt("string length prefix exceeds STRING_SIZE"));
                }
                let string_bytes = bytes[4..4 + len].to_vec();
                let value = String::from_utf8(string_bytes)
                    .map_err(|_| DbError::corrupt("string slot is not valid utf-8"))?;
                Ok(FieldVal::StringField(StringField::new(value, len as u32)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trips() {
        let f = IntField::new(-7);
        let bytes = f.serialize_field();
        let parsed = Type::IntType.parse(&bytes).unwrap();
        assert_eq!(parsed, FieldVal::IntField(IntField::new(-7)));
    }

    #[test]
    fn string_rejects_oversized_length_prefix() {
        let mut bytes = vec![0u8; Type::StringType.get_len()];
        bytes[0..4].copy_from_slice(&((STRING_SIZE as u32) + 1).to_be_bytes());
        assert!(Type::StringType.parse(&bytes).is_err());
    }
}
