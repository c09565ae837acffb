//! End-to-end coverage of the six concrete scenarios this engine is meant
//! to satisfy: scan, filter, join, aggregate, a blocked-then-aborted lock
//! wait, and commit/abort visibility. Each test builds its own scratch
//! tables rather than sharing fixtures, so they can run in parallel.

use std::fs::OpenOptions;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rustic_db::buffer_pool::BufferPool;
use rustic_db::catalog::Catalog;
use rustic_db::error::DbError;
use rustic_db::fields::{FieldVal, IntField, StringField};
use rustic_db::heap_file::HeapFile;
use rustic_db::heap_page::{HeapPageId, Permission};
use rustic_db::operator::{Aggregate, AggregateOp, Filter, Join, OpIterator, SeqScan};
use rustic_db::predicate::{JoinPredicate, Op, Predicate};
use rustic_db::transaction::TransactionId;
use rustic_db::tuple::{Tuple, TupleDesc};
use rustic_db::types::Type;

fn open_table(dir: &std::path::Path, name: &str, td: TupleDesc) -> Arc<HeapFile> {
    let path = dir.join(format!("{}.dat", name));
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .unwrap();
    Arc::new(HeapFile::new(file, &path, td).unwrap())
}

fn int_values(desc: &TupleDesc, vs: &[i32]) -> Vec<Tuple> {
    vs.iter()
        .map(|&v| Tuple::new(vec![FieldVal::IntField(IntField::new(v))], desc))
        .collect()
}

#[test]
fn scenario_1_scan_yields_insertion_order_then_exhausts() {
    let dir = tempfile::tempdir().unwrap();
    let td = TupleDesc::new(vec![Type::IntType], vec!["x".to_string()]);
    let hf = open_table(dir.path(), "a", td.clone());
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(Arc::clone(&hf), "a".to_string(), None);
    let bp = Arc::new(BufferPool::new(16, catalog));
    let tid = TransactionId::new();

    for t in int_values(&td, &[1, 2, 3]) {
        hf.insert_tuple(tid, &bp, t).unwrap();
    }

    let mut scan = SeqScan::new(tid, hf, bp, "a");
    scan.open().unwrap();
    let mut values = vec![];
    while scan.has_next().unwrap() {
        values.push(scan.next().unwrap().get_field(0).unwrap().clone().into_int().unwrap().get_value());
    }
    assert_eq!(values, vec![1, 2, 3]);
    assert!(!scan.has_next().unwrap());
    assert!(scan.next().is_err());
}

#[test]
fn scenario_2_filter_keeps_values_greater_than_one() {
    let dir = tempfile::tempdir().unwrap();
    let td = TupleDesc::new(vec![Type::IntType], vec!["x".to_string()]);
    let hf = open_table(dir.path(), "a", td.clone());
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(Arc::clone(&hf), "a".to_string(), None);
    let bp = Arc::new(BufferPool::new(16, catalog));
    let tid = TransactionId::new();

    for t in int_values(&td, &[1, 2, 3]) {
        hf.insert_tuple(tid, &bp, t).unwrap();
    }

    let scan = SeqScan::new(tid, hf, bp, "a");
    let pred = Predicate::new(0, Op::GreaterThan, FieldVal::IntField(IntField::new(1)));
    let mut filter = Filter::new(pred, Box::new(scan));
    filter.open().unwrap();
    let mut values = vec![];
    while filter.has_next().unwrap() {
        values.push(filter.next().unwrap().get_field(0).unwrap().clone().into_int().unwrap().get_value());
    }
    assert_eq!(values, vec![2, 3]);
}

#[test]
fn scenario_3_nested_loops_join_on_equality() {
    let dir = tempfile::tempdir().unwrap();
    let a_desc = TupleDesc::new(vec![Type::IntType], vec!["id".to_string()]);
    let b_desc = TupleDesc::new(
        vec![Type::IntType, Type::StringType],
        vec!["id".to_string(), "name".to_string()],
    );
    let a = open_table(dir.path(), "a", a_desc.clone());
    let b = open_table(dir.path(), "b", b_desc.clone());
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(Arc::clone(&a), "a".to_string(), None);
    catalog.add_table(Arc::clone(&b), "b".to_string(), None);
    let bp = Arc::new(BufferPool::new(16, catalog));
    let tid = TransactionId::new();

    for t in int_values(&a_desc, &[1, 2, 3]) {
        a.insert_tuple(tid, &bp, t).unwrap();
    }
    for (id, name) in [(2, "x"), (3, "y"), (4, "z")] {
        b.insert_tuple(
            tid,
            &bp,
            Tuple::new(
                vec![
                    FieldVal::IntField(IntField::new(id)),
                    FieldVal::StringField(StringField::new(name.to_string(), name.len() as u32)),
                ],
                &b_desc,
            ),
        )
        .unwrap();
    }

    let left = SeqScan::new(tid, a, Arc::clone(&bp), "a");
    let right = SeqScan::new(tid, b, bp, "b");
    let pred = JoinPredicate::new(0, Op::Equals, 0);
    let mut join = Join::new(pred, Box::new(left), Box::new(right));
    join.open().unwrap();

    let mut rows = vec![];
    while join.has_next().unwrap() {
        let t = join.next().unwrap();
        let id = t.get_field(0).unwrap().clone().into_int().unwrap().get_value();
        let name = t.get_field(2).unwrap().clone().into_string().unwrap().get_value();
        rows.push((id, name));
    }
    assert_eq!(rows, vec![(2, "x".to_string()), (3, "y".to_string())]);
}

#[test]
fn scenario_4_aggregate_count_and_avg() {
    let dir = tempfile::tempdir().unwrap();
    let td = TupleDesc::new(vec![Type::IntType], vec!["x".to_string()]);

    let count_table = open_table(dir.path(), "count_a", td.clone());
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(Arc::clone(&count_table), "count_a".to_string(), None);
    let bp = Arc::new(BufferPool::new(16, catalog));
    let tid = TransactionId::new();
    for t in int_values(&td, &[1, 2, 3]) {
        count_table.insert_tuple(tid, &bp, t).unwrap();
    }
    let scan = SeqScan::new(tid, count_table, Arc::clone(&bp), "a");
    let mut count_agg = Aggregate::new(Box::new(scan), 0, None, AggregateOp::Count);
    count_agg.open().unwrap();
    let t = count_agg.next().unwrap();
    assert_eq!(t.get_field(0).unwrap().clone().into_int().unwrap().get_value(), 3);
    assert!(!count_agg.has_next().unwrap());

    let avg_table = open_table(dir.path(), "avg_a", td.clone());
    let catalog2 = Arc::new(Catalog::new());
    catalog2.add_table(Arc::clone(&avg_table), "avg_a".to_string(), None);
    let bp2 = Arc::new(BufferPool::new(16, catalog2));
    let tid2 = TransactionId::new();
    for t in int_values(&td, &[2, 4, 5]) {
        avg_table.insert_tuple(tid2, &bp2, t).unwrap();
    }
    let scan2 = SeqScan::new(tid2, avg_table, bp2, "a");
    let mut avg_agg = Aggregate::new(Box::new(scan2), 0, None, AggregateOp::Avg);
    avg_agg.open().unwrap();
    let t = avg_agg.next().unwrap();
    assert_eq!(t.get_field(0).unwrap().clone().into_int().unwrap().get_value(), 3);
}

#[test]
fn scenario_5_blocked_transaction_aborts_on_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let td = TupleDesc::new(vec![Type::IntType], vec!["x".to_string()]);
    let hf = open_table(dir.path(), "a", td.clone());
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(Arc::clone(&hf), "a".to_string(), None);
    let bp = Arc::new(BufferPool::new(16, catalog));
    let page_id = HeapPageId::new(hf.get_id(), 0);

    // Materialize page 0 so both transactions contend over the same page.
    let t1 = TransactionId::new();
    hf.insert_tuple(t1, &bp, Tuple::new(vec![FieldVal::IntField(IntField::new(1))], &td))
        .unwrap();

    // t1 already holds X (from the insert above, still uncommitted). t2
    // requests S on the same page and must eventually time out.
    let t2 = TransactionId::new();
    let result = bp.get_page(t2, page_id, Permission::Read);
    assert!(matches!(result, Err(DbError::TransactionAborted(_))));

    // Caller rolls back the aborted transaction; its lock set is now empty.
    bp.abort_transaction(t2).unwrap();
    bp.abort_transaction(t1).unwrap();
}

#[test]
fn scenario_5b_waiter_unblocks_once_the_holder_actually_releases() {
    let dir = tempfile::tempdir().unwrap();
    let td = TupleDesc::new(vec![Type::IntType], vec!["x".to_string()]);
    let hf = open_table(dir.path(), "a", td.clone());
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(Arc::clone(&hf), "a".to_string(), None);
    let bp = Arc::new(BufferPool::new(16, catalog));
    let tid1 = TransactionId::new();
    hf.insert_tuple(tid1, &bp, Tuple::new(vec![FieldVal::IntField(IntField::new(1))], &td))
        .unwrap();

    let page_id = HeapPageId::new(hf.get_id(), 0);
    let (tx, rx) = mpsc::channel();
    let bp_waiter = Arc::clone(&bp);
    let tid2 = TransactionId::new();
    let waiter = thread::spawn(move || {
        tx.send(()).unwrap();
        bp_waiter.get_page(tid2, page_id, Permission::Read)
    });

    rx.recv().unwrap();
    thread::sleep(Duration::from_millis(50));
    bp.commit_transaction(tid1).unwrap();

    assert!(waiter.join().unwrap().is_ok());
    bp.commit_transaction(tid2).unwrap();
}

#[test]
fn scenario_6_abort_hides_the_insert_commit_reveals_it() {
    let dir = tempfile::tempdir().unwrap();
    let td = TupleDesc::new(vec![Type::IntType], vec!["x".to_string()]);
    let hf = open_table(dir.path(), "a", td.clone());
    let catalog = Arc::new(Catalog::new());
    catalog.add_table(Arc::clone(&hf), "a".to_string(), None);
    let bp = Arc::new(BufferPool::new(16, catalog));

    let t1 = TransactionId::new();
    hf.insert_tuple(t1, &bp, Tuple::new(vec![FieldVal::IntField(IntField::new(9))], &td))
        .unwrap();
    bp.abort_transaction(t1).unwrap();

    let t2 = TransactionId::new();
    let mut it = hf.iterator(&bp, t2);
    it.open().unwrap();
    assert!(!it.has_next().unwrap(), "aborted insert must not be visible");
    bp.commit_transaction(t2).unwrap();

    let t3 = TransactionId::new();
    hf.insert_tuple(t3, &bp, Tuple::new(vec![FieldVal::IntField(IntField::new(9))], &td))
        .unwrap();
    bp.commit_transaction(t3).unwrap();

    let t4 = TransactionId::new();
    let mut it2 = hf.iterator(&bp, t4);
    it2.open().unwrap();
    assert!(it2.has_next().unwrap(), "committed insert must be visible");
    assert_eq!(
        it2.next().unwrap().get_field(0).unwrap().clone().into_int().unwrap().get_value(),
        9
    );
    bp.commit_transaction(t4).unwrap();
}
