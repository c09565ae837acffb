use std::sync::Arc;

use crate::buffer_pool::{BufferPool, DEFAULT_PAGES};
use crate::catalog::Catalog;
use crate::error::DbResult;

/// Owns one catalog and one buffer pool. Constructed explicitly and passed
/// around as `Arc<Database>` by callers, rather than reached through a
/// global singleton — so tests (and, in principle, multiple embedded
/// databases in one process) each get an isolated instance.
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new(num_pages: usize) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(num_pages, Arc::clone(&catalog)));
        Database {
            catalog,
            buffer_pool,
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_PAGES)
    }

    pub fn get_buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    pub fn get_catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn load_schema(&self, schema_file_path: &str) -> DbResult<()> {
        self.catalog.load_schema(schema_file_path)
    }
}
