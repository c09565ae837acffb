use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};

use crate::buffer_pool::BufferPool;
use crate::error::{DbError, DbResult};
use crate::heap_page::{HeapPage, HeapPageId, Permission, DEFAULT_PAGE_SIZE};
use crate::transaction::TransactionId;
use crate::tuple::{Tuple, TupleDesc};

// Representation of a table stored in a file on disk.
pub struct HeapFile {
    file: Mutex<File>,
    td: TupleDesc,
    id: usize,
    page_size: usize,
}

impl HeapFile {
    /// `path` must name the already-created backing file; the table id is
    /// derived by hashing its canonical path, so the same on-disk table
    /// always gets the same id across process restarts.
    pub fn new(file: File, path: &Path, td: TupleDesc) -> DbResult<Self> {
        Self::new_with_page_size(file, path, td, DEFAULT_PAGE_SIZE)
    }

    /// Same as `new`, but with a caller-chosen page size. Production tables
    /// always go through `new`; tests use this to exercise multi-page
    /// behavior without inserting thousands of tuples.
    pub fn new_with_page_size(file: File, path: &Path, td: TupleDesc, page_size: usize) -> DbResult<Self> {
        let canonical = std::fs::canonicalize(path)?;
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        canonical.hash(&mut hasher);
        let id = hasher.finish() as usize;
        Ok(HeapFile {
            file: Mutex::new(file),
            td,
            id,
            page_size,
        })
    }

    // Retrieves the unique id of this table.
    pub fn get_id(&self) -> usize {
        self.id
    }

    // Retrieves the tuple descriptor for this table.
    pub fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    // Retrieves the page with the specified pid from disk.
    pub fn read_page(&self, pid: &HeapPageId) -> DbResult<HeapPage> {
        let mut data = vec![0u8; self.page_size];
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((pid.get_page_number() * self.page_size) as u64))?;
        file.read_exact(&mut data)?;
        drop(file);
        HeapPage::new(*pid, &data, self.td.clone(), self.page_size)
    }

    // Writes the specified page to disk, extending the file if necessary.
    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let pid = page.get_id();
        let data = page.get_page_data();
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((pid.get_page_number() * self.page_size) as u64))?;
        file.write_all(&data)?;
        Ok(())
    }

    // Calculates the number of pages in this HeapFile: floor(len/page_size),
    // since the on-disk format requires exact-page files (see SPEC_FULL §9).
    pub fn num_pages(&self) -> DbResult<usize> {
        let file = self.file.lock().unwrap();
        let len = file.metadata()?.len();
        Ok((len / self.page_size as u64) as usize)
    }

    fn append_empty_page(&self, page_no: usize) -> DbResult<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start((page_no * self.page_size) as u64))?;
        file.write_all(&HeapPage::create_empty_page_data(self.page_size))?;
        Ok(())
    }

    // Adds `t` to the first page with a free slot, obtaining each
    // candidate page through the buffer pool with write permission. If no
    // page has space, extends the file with a fresh empty page first (this
    // bare zero page is safe to write eagerly — it carries no transaction's
    // data yet) and inserts into the cached copy of *that* page, so the
    // insert itself stays subject to NO-STEAL.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        bp: &BufferPool,
        t: Tuple,
    ) -> DbResult<Vec<HeapPageId>> {
        let table_id = self.get_id();
        let num_pages = self.num_pages()?;
        for page_no in 0..num_pages {
            let pid = HeapPageId::new(table_id, page_no);
            let page = bp.get_page(tid, pid, Permission::Read)?;
            let has_space = page.read().unwrap().get_num_empty_slots() > 0;
            if has_space {
                let page = bp.get_page(tid, pid, Permission::Write)?;
                let mut guard = page.write().unwrap();
                guard.insert_tuple(t)?;
                guard.mark_dirty(true, tid);
                return Ok(vec![pid]);
            }
        }

        let page_no = num_pages;
        let pid = HeapPageId::new(table_id, page_no);
        self.append_empty_page(page_no)?;
        let page = bp.get_page(tid, pid, Permission::Write)?;
        let mut guard = page.write().unwrap();
        guard.insert_tuple(t)?;
        guard.mark_dirty(true, tid);
        Ok(vec![pid])
    }

    // Deletes `t` from the page it claims to live on.
    pub fn delete_tuple(&self, tid: TransactionId, bp: &BufferPool, t: &Tuple) -> DbResult<HeapPageId> {
        let rid = t
            .get_record_id()
            .ok_or_else(|| DbError::db("tuple has no record id"))?;
        let pid = rid.get_page_id();
        if pid.get_table_id() != self.get_id() {
            return Err(DbError::db("tuple does not belong to this table"));
        }
        let page = bp.get_page(tid, pid, Permission::Write)?;
        let mut guard = page.write().unwrap();
        guard.delete_tuple(t)?;
        guard.mark_dirty(true, tid);
        Ok(pid)
    }

    /// Page-by-page cursor over every tuple in the file, obtaining each
    /// page through the buffer pool with read permission. Owns `Arc`
    /// clones of the file and pool rather than borrowing them, so the
    /// cursor can be embedded inside a long-lived operator (`SeqScan`)
    /// instead of only a stack-local loop.
    pub fn iterator(self: &Arc<HeapFile>, bp: &Arc<BufferPool>, tid: TransactionId) -> HeapFileIterator {
        HeapFileIterator::new(Arc::clone(self), Arc::clone(bp), tid)
    }
}

pub struct HeapFileIterator {
    heap_file: Arc<HeapFile>,
    buffer_pool: Arc<BufferPool>,
    tid: TransactionId,
    page_no: usize,
    next_slot: usize,
    open: bool,
    peeked: Option<Tuple>,
}

impl HeapFileIterator {
    fn new(heap_file: Arc<HeapFile>, buffer_pool: Arc<BufferPool>, tid: TransactionId) -> Self {
        HeapFileIterator {
            heap_file,
            buffer_pool,
            tid,
            page_no: 0,
            next_slot: 0,
            open: false,
            peeked: None,
        }
    }

    pub fn open(&mut self) -> DbResult<()> {
        self.page_no = 0;
        self.next_slot = 0;
        self.open = true;
        self.peeked = None;
        Ok(())
    }

    pub fn close(&mut self) {
        self.open = false;
        self.peeked = None;
    }

    pub fn rewind(&mut self) -> DbResult<()> {
        self.close();
        self.open()
    }

    fn fetch_next(&mut self) -> DbResult<Option<Tuple>> {
        if !self.open {
            return Ok(None);
        }
        loop {
            let num_pages = self.heap_file.num_pages()?;
            if self.page_no >= num_pages {
                return Ok(None);
            }
            let pid = HeapPageId::new(self.heap_file.get_id(), self.page_no);
            let page: Arc<RwLock<HeapPage>> =
                self.buffer_pool.get_page(self.tid, pid, Permission::Read)?;
            let guard = page.read().unwrap();
            if self.next_slot < guard.num_slots() {
                if let Some(t) = guard.get_tuple(self.next_slot) {
                    let t = t.clone();
                    self.next_slot += 1;
                    return Ok(Some(t));
                }
                self.next_slot += 1;
                continue;
            }
            drop(guard);
            self.page_no += 1;
            self.next_slot = 0;
        }
    }

    pub fn has_next(&mut self) -> DbResult<bool> {
        if self.peeked.is_none() {
            self.peeked = self.fetch_next()?;
        }
        Ok(self.peeked.is_some())
    }

    pub fn next(&mut self) -> DbResult<Tuple> {
        if self.peeked.is_none() {
            self.peeked = self.fetch_next()?;
        }
        self.peeked
            .take()
            .ok_or_else(|| DbError::no_such_element("heap file iterator exhausted"))
    }
}
