use std::sync::Arc;

use rustic_db::database::Database;
use rustic_db::fields::{FieldVal, IntField, StringField};
use rustic_db::operator::{Filter, OpIterator, SeqScan};
use rustic_db::predicate::{Op, Predicate};
use rustic_db::transaction::TransactionId;
use rustic_db::tuple::Tuple;

/// Minimal driver: loads a catalog schema file, inserts a few rows, then
/// runs a `SeqScan` -> `Filter` pipeline over them and prints the result.
/// The SQL parser, query planner, and interactive shell are out of scope
/// for this engine; this binary only exists to exercise the storage and
/// execution core end to end.
fn main() {
    env_logger::init();

    let schema_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "schema.txt".to_string());

    let db = Database::with_default_capacity();
    if let Err(e) = db.load_schema(&schema_path) {
        log::warn!("could not load schema from {}: {}", schema_path, e);
        return;
    }

    let table_id = match db.get_catalog().get_table_id("employees") {
        Ok(id) => id,
        Err(e) => {
            log::warn!("no 'employees' table in schema: {}", e);
            return;
        }
    };
    let td = db.get_catalog().get_tuple_desc(table_id).unwrap();
    let heap_file = db.get_catalog().get_table_from_id(table_id).unwrap();
    let bp = Arc::clone(db.get_buffer_pool());

    let tid = TransactionId::new();
    for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Carol")] {
        let len = name.len() as u32;
        let tuple = Tuple::new(
            vec![
                FieldVal::IntField(IntField::new(id)),
                FieldVal::StringField(StringField::new(name.to_string(), len)),
            ],
            &td,
        );
        bp.insert_tuple(tid, table_id, tuple).unwrap();
    }
    bp.commit_transaction(tid).unwrap();

    let scan_tid = TransactionId::new();
    let scan = SeqScan::new(scan_tid, heap_file, Arc::clone(&bp), "employees");
    let pred = Predicate::new(0, Op::GreaterThan, FieldVal::IntField(IntField::new(1)));
    let mut filter = Filter::new(pred, Box::new(scan));
    filter.open().unwrap();
    while filter.has_next().unwrap() {
        println!("{}", filter.next().unwrap());
    }
    bp.commit_transaction(scan_tid).unwrap();
}
