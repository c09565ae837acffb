use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use log::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{DbError, DbResult};
use crate::heap_page::{HeapPage, HeapPageId, Permission};
use crate::lock_manager::LockManager;
use crate::transaction::TransactionId;
use crate::tuple::Tuple;

pub const DEFAULT_PAGES: usize = 50;

/// The single shared cache of pages: each page on disk has at most one
/// live in-memory copy, held behind an `Arc<RwLock<_>>` so every caller
/// that fetches the same page id observes the same mutable state.
///
/// Eviction is NO-STEAL: a dirty page (one written by an uncommitted
/// transaction) is never written to disk to make room, since that would
/// let an aborted transaction's writes leak onto disk. When the cache is
/// full, the first clean page in insertion order is evicted; if every
/// cached page is dirty, eviction fails outright.
pub struct BufferPool {
    id_to_page: RwLock<HashMap<HeapPageId, Arc<RwLock<HeapPage>>>>,
    insertion_order: Mutex<VecDeque<HeapPageId>>,
    lock_manager: LockManager,
    catalog: Arc<Catalog>,
    num_pages: usize,
}

impl BufferPool {
    pub fn new(num_pages: usize, catalog: Arc<Catalog>) -> Self {
        BufferPool {
            id_to_page: RwLock::new(HashMap::new()),
            insertion_order: Mutex::new(VecDeque::new()),
            lock_manager: LockManager::new(),
            catalog,
            num_pages,
        }
    }

    pub fn with_default_capacity(catalog: Arc<Catalog>) -> Self {
        Self::new(DEFAULT_PAGES, catalog)
    }

    // Retrieves the specified page from cache or disk, first acquiring the
    // lock the given permission requires.
    pub fn get_page(
        &self,
        tid: TransactionId,
        pid: HeapPageId,
        perm: Permission,
    ) -> DbResult<Arc<RwLock<HeapPage>>> {
        let exclusive = perm == Permission::Write;
        self.lock_manager.acquire_lock(tid, pid, exclusive)?;

        {
            let id_to_page = self.id_to_page.read().unwrap();
            if let Some(page) = id_to_page.get(&pid) {
                return Ok(Arc::clone(page));
            }
        }

        let table = self.catalog.get_table_from_id(pid.get_table_id())?;
        let page = table.read_page(&pid)?;

        let mut id_to_page = self.id_to_page.write().unwrap();
        if let Some(page) = id_to_page.get(&pid) {
            return Ok(Arc::clone(page));
        }
        if id_to_page.len() >= self.num_pages {
            drop(id_to_page);
            self.evict_page()?;
            id_to_page = self.id_to_page.write().unwrap();
        }
        let handle = Arc::new(RwLock::new(page));
        id_to_page.insert(pid, Arc::clone(&handle));
        self.insertion_order.lock().unwrap().push_back(pid);
        debug!("cached page {:?}", pid);
        Ok(handle)
    }

    fn evict_page(&self) -> DbResult<()> {
        let mut order = self.insertion_order.lock().unwrap();
        let victim = {
            let id_to_page = self.id_to_page.read().unwrap();
            order.iter().position(|pid| {
                id_to_page
                    .get(pid)
                    .map(|p| p.read().unwrap().is_dirty().is_none())
                    .unwrap_or(true)
            })
        };
        match victim {
            Some(idx) => {
                let pid = order.remove(idx).unwrap();
                self.id_to_page.write().unwrap().remove(&pid);
                debug!("evicted clean page {:?}", pid);
                Ok(())
            }
            None => Err(DbError::db(
                "buffer pool is full of dirty pages; NO-STEAL forbids evicting them",
            )),
        }
    }

    // Writes a single dirty page through to its table's file, clearing its
    // dirty bit.
    fn flush_page(&self, pid: HeapPageId, tid: TransactionId) -> DbResult<()> {
        let page = {
            let id_to_page = self.id_to_page.read().unwrap();
            id_to_page.get(&pid).cloned()
        };
        if let Some(page) = page {
            let mut guard = page.write().unwrap();
            if guard.is_dirty().is_some() {
                let table = self.catalog.get_table_from_id(pid.get_table_id())?;
                table.write_page(&guard)?;
                guard.mark_dirty(false, tid);
            }
        }
        Ok(())
    }

    // Flushes every dirty page currently cached, regardless of which
    // transaction dirtied it. Used at shutdown / checkpoints, never as part
    // of ordinary commit processing (commit only flushes the committing
    // transaction's own pages).
    pub fn flush_all_pages(&self) -> DbResult<()> {
        let ids: Vec<HeapPageId> = self.id_to_page.read().unwrap().keys().cloned().collect();
        for pid in ids {
            let dirtied_by = {
                let id_to_page = self.id_to_page.read().unwrap();
                id_to_page
                    .get(&pid)
                    .and_then(|p| p.read().unwrap().is_dirty())
            };
            if let Some(tid) = dirtied_by {
                self.flush_page(pid, tid)?;
            }
        }
        Ok(())
    }

    // Drops a page from the cache without flushing it. Used by an aborting
    // transaction to throw away a dirty page it never got to flush.
    pub fn discard_page(&self, pid: HeapPageId) {
        self.id_to_page.write().unwrap().remove(&pid);
        self.insertion_order.lock().unwrap().retain(|p| p != &pid);
    }

    // Ends the transaction: on commit, flushes its dirty pages to disk; on
    // abort, discards each of its dirty cached pages so the next reader
    // re-fetches the pre-transaction bytes from disk (NO-STEAL guarantees
    // those bytes were never overwritten). Either way, releases every lock
    // the transaction holds.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> DbResult<()> {
        let locked_pages = self.lock_manager.get_locked_pages(tid);
        if commit {
            for pid in locked_pages {
                self.flush_page(pid, tid)?;
            }
            info!("transaction {:?} committed", tid);
        } else {
            for pid in locked_pages {
                let is_dirty = {
                    let id_to_page = self.id_to_page.read().unwrap();
                    id_to_page
                        .get(&pid)
                        .map(|p| p.read().unwrap().is_dirty().is_some())
                        .unwrap_or(false)
                };
                if is_dirty {
                    self.discard_page(pid);
                }
            }
            warn!("transaction {:?} aborted", tid);
        }
        self.lock_manager.release_locks(tid);
        Ok(())
    }

    pub fn commit_transaction(&self, tid: TransactionId) -> DbResult<()> {
        self.transaction_complete(tid, true)
    }

    pub fn abort_transaction(&self, tid: TransactionId) -> DbResult<()> {
        self.transaction_complete(tid, false)
    }

    // Adds the tuple to the specified table.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: usize, tuple: Tuple) -> DbResult<()> {
        let table = self.catalog.get_table_from_id(table_id)?;
        table.insert_tuple(tid, self, tuple)?;
        Ok(())
    }

    // Deletes the tuple, looking up its table from the record id it carries.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> DbResult<()> {
        let rid = tuple
            .get_record_id()
            .ok_or_else(|| DbError::db("tuple has no record id"))?;
        let table_id = rid.get_page_id().get_table_id();
        let table = self.catalog.get_table_from_id(table_id)?;
        table.delete_tuple(tid, self, tuple)?;
        Ok(())
    }

    // Gets the capacity of the buffer pool.
    pub fn get_num_pages(&self) -> usize {
        self.num_pages
    }

    // Looks up a table's tuple descriptor through the catalog, so operators
    // that only hold a `BufferPool` (e.g. `Insert`/`Delete`) can validate a
    // child's schema without reaching for the catalog directly.
    pub fn get_tuple_desc(&self, table_id: usize) -> DbResult<crate::tuple::TupleDesc> {
        self.catalog.get_tuple_desc(table_id)
    }
}
