use crate::error::{DbError, DbResult};
use crate::transaction::TransactionId;
use crate::tuple::{RecordId, Tuple, TupleDesc};

/// Page size used by every table unless a test opts into a smaller one via
/// `HeapFile::new_with_page_size`. The on-disk format fixes this per file at
/// creation time rather than reading a process-wide setting, so a given
/// table's page geometry can never drift out from under pages already on
/// disk for it.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

#[derive(Debug, PartialEq, Eq, Clone, Hash, Copy)]
pub enum Permission {
    Read,
    Write,
}

/// Representation of a page id: a table id plus a page number within that
/// table's file.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Copy)]
pub struct HeapPageId {
    table_id: usize,
    page_number: usize,
}

impl HeapPageId {
    pub fn new(table_id: usize, page_number: usize) -> Self {
        HeapPageId {
            table_id,
            page_number,
        }
    }

    pub fn get_table_id(&self) -> usize {
        self.table_id
    }

    pub fn get_page_number(&self) -> usize {
        self.page_number
    }
}

/// A set of bytes of data read from disk: header bytes (slot-occupancy
/// bitmap) followed by tuple bytes. The number of header bytes is
/// `ceil(num_slots / 8)`.
#[derive(Debug, Clone)]
pub struct HeapPage {
    pid: HeapPageId,
    td: TupleDesc,
    page_size: usize,
    header_size: usize,
    header: Vec<u8>,
    tuples: Vec<Option<Tuple>>,
    num_slots: usize,
    dirtied_by: Option<TransactionId>,
}

impl HeapPage {
    pub fn num_slots_for(td: &TupleDesc, page_size: usize) -> usize {
        (page_size * 8) / (td.get_size() * 8 + 1)
    }

    pub fn new(pid: HeapPageId, data: &[u8], td: TupleDesc, page_size: usize) -> DbResult<Self> {
        if data.len() != page_size {
            return Err(DbError::corrupt(format!(
                "page buffer is {} bytes, expected {}",
                data.len(),
                page_size
            )));
        }

        let num_slots = Self::num_slots_for(&td, page_size);
        let header_size = (num_slots as f64 / 8.0).ceil() as usize;
        let header = data[..header_size].to_vec();

        let mut tuples = Vec::with_capacity(num_slots);
        for i in 0..num_slots {
            if Self::get_slot(&header, i) {
                let start = header_size + i * td.get_size();
                let end = start + td.get_size();
                let mut tuple = Tuple::deserialize(&data[start..end], &td)?;
                tuple.set_record_id(RecordId::new(pid, i));
                tuples.push(Some(tuple));
            } else {
                tuples.push(None);
            }
        }

        Ok(HeapPage {
            pid,
            td,
            page_size,
            header_size,
            header,
            tuples,
            num_slots,
            dirtied_by: None,
        })
    }

    pub fn get_id(&self) -> HeapPageId {
        self.pid
    }

    pub fn get_page_data(&self) -> Vec<u8> {
        let mut data = self.header.clone();
        for i in 0..self.num_slots {
            match &self.tuples[i] {
                Some(tuple) => data.extend(tuple.serialize()),
                None => data.extend(vec![0; self.td.get_size()]),
            }
        }
        // pad the rest of the page with 0s
        data.extend(vec![0; self.page_size - data.len()]);
        data
    }

    pub fn create_empty_page_data(page_size: usize) -> Vec<u8> {
        vec![0; page_size]
    }

    fn get_slot(header: &[u8], i: usize) -> bool {
        let idx = i / 8;
        let bit = i % 8;
        if idx >= header.len() {
            return false;
        }
        header[idx] & (1 << bit) != 0
    }

    fn set_slot(header: &mut [u8], i: usize, value: bool) {
        let idx = i / 8;
        let bit = i % 8;
        if value {
            header[idx] |= 1 << bit;
        } else {
            header[idx] &= !(1 << bit);
        }
    }

    pub fn is_slot_used(&self, i: usize) -> bool {
        Self::get_slot(&self.header, i)
    }

    pub fn mark_slot_used(&mut self, i: usize, used: bool) {
        Self::set_slot(&mut self.header, i, used);
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn insert_tuple(&mut self, mut t: Tuple) -> DbResult<()> {
        if t.get_tuple_desc() != &self.td {
            return Err(DbError::db("tuple descriptor does not match table descriptor"));
        }
        for i in 0..self.num_slots {
            if !self.is_slot_used(i) {
                let rid = RecordId::new(self.pid, i);
                t.set_record_id(rid);
                self.tuples[i] = Some(t);
                self.mark_slot_used(i, true);
                return Ok(());
            }
        }
        Err(DbError::db("page has no empty slots"))
    }

    pub fn delete_tuple(&mut self, t: &Tuple) -> DbResult<()> {
        let rid = t
            .get_record_id()
            .ok_or_else(|| DbError::db("tuple has no record id"))?;
        if rid.get_page_id() != self.pid {
            return Err(DbError::db("tuple is not on this page"));
        }
        let slot = rid.get_tuple_no();
        if !self.is_slot_used(slot) {
            return Err(DbError::db("slot is already empty"));
        }
        self.tuples[slot] = None;
        self.mark_slot_used(slot, false);
        Ok(())
    }

    pub fn get_num_empty_slots(&self) -> usize {
        (0..self.num_slots)
            .filter(|&i| !self.is_slot_used(i))
            .count()
    }

    pub fn mark_dirty(&mut self, dirty: bool, tid: TransactionId) {
        self.dirtied_by = if dirty { Some(tid) } else { None };
    }

    pub fn is_dirty(&self) -> Option<TransactionId> {
        self.dirtied_by
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter().filter_map(|t| t.as_ref())
    }

    pub fn get_tuple(&self, i: usize) -> Option<&Tuple> {
        self.tuples.get(i).and_then(|t| t.as_ref())
    }

    pub fn get_tuple_desc(&self) -> &TupleDesc {
        &self.td
    }

    pub fn get_page_size(&self) -> usize {
        self.page_size
    }
}
