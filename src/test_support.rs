//! Scratch-table fixtures shared by unit tests across the crate. Mirrors
//! `gtnao-junkdb`'s `test_helpers.rs`: one function that builds a fresh
//! temp-backed table and wires it into a catalog and buffer pool, so each
//! test module doesn't hand-roll the same `tempdir` + `OpenOptions` +
//! `HeapFile::new` boilerplate.

use std::fs::OpenOptions;
use std::sync::Arc;

use crate::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::heap_file::HeapFile;
use crate::tuple::TupleDesc;

/// A scratch table backed by a real temp file, plus the catalog and buffer
/// pool it's registered in. The `TempDir` must be kept alive for as long as
/// the table is used; dropping it deletes the backing file.
pub struct ScratchTable {
    pub heap_file: Arc<HeapFile>,
    pub catalog: Arc<Catalog>,
    pub buffer_pool: Arc<BufferPool>,
    pub _dir: tempfile::TempDir,
}

/// Creates one scratch table named `name` with descriptor `td`, backed by a
/// buffer pool of `capacity` pages.
pub fn scratch_table(name: &str, td: TupleDesc, capacity: usize) -> ScratchTable {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(format!("{}.dat", name));
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .expect("open scratch file");
    let heap_file = Arc::new(HeapFile::new(file, &path, td).expect("create heap file"));
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(Arc::clone(&heap_file), name.to_string(), None);
    let buffer_pool = Arc::new(BufferPool::new(capacity, Arc::clone(&catalog)));
    ScratchTable {
        heap_file,
        catalog,
        buffer_pool,
        _dir: dir,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldVal, IntField};
    use crate::transaction::TransactionId;
    use crate::tuple::Tuple;
    use crate::types::Type;

    #[test]
    fn scratch_table_is_immediately_usable() {
        let td = TupleDesc::new(vec![Type::IntType], vec!["x".to_string()]);
        let table = scratch_table("t", td.clone(), 16);
        let tid = TransactionId::new();
        table
            .heap_file
            .insert_tuple(tid, &table.buffer_pool, Tuple::new(vec![FieldVal::IntField(IntField::new(1))], &td))
            .unwrap();
        let mut it = table.heap_file.iterator(&table.buffer_pool, tid);
        it.open().unwrap();
        assert!(it.has_next().unwrap());
    }
}
