use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::heap_file::HeapFile;
use crate::tuple::TupleDesc;
use crate::types::Type;

/// Maps table names and ids to their backing files, schemas, and primary
/// keys. Kept as four aligned maps rather than one struct-per-table map so
/// each lookup direction (by name, by id, by id-to-name, by id-to-pk) stays
/// O(1) without an extra indirection.
pub struct Catalog {
    id_to_file: RwLock<HashMap<usize, Arc<HeapFile>>>,
    id_to_name: RwLock<HashMap<usize, String>>,
    id_to_pk: RwLock<HashMap<usize, String>>,
    name_to_id: RwLock<HashMap<String, usize>>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            id_to_file: RwLock::new(HashMap::new()),
            id_to_name: RwLock::new(HashMap::new()),
            id_to_pk: RwLock::new(HashMap::new()),
            name_to_id: RwLock::new(HashMap::new()),
        }
    }

    // Registers `file` under `name`, with `pk` as its primary-key column
    // (if any). Re-registering an existing name evicts the table it used
    // to point to from every map first.
    pub fn add_table(&self, file: Arc<HeapFile>, name: String, pk: Option<String>) {
        let id = file.get_id();

        {
            let mut name_to_id = self.name_to_id.write().unwrap();
            if let Some(old_id) = name_to_id.insert(name.clone(), id) {
                if old_id != id {
                    self.id_to_file.write().unwrap().remove(&old_id);
                    self.id_to_name.write().unwrap().remove(&old_id);
                    self.id_to_pk.write().unwrap().remove(&old_id);
                }
            }
        }

        self.id_to_file.write().unwrap().insert(id, file);
        self.id_to_name.write().unwrap().insert(id, name);
        match pk {
            Some(pk) => {
                self.id_to_pk.write().unwrap().insert(id, pk);
            }
            None => {
                self.id_to_pk.write().unwrap().remove(&id);
            }
        }
    }

    // Registers `file` under an automatically generated, unique name.
    pub fn add_table_anonymous(&self, file: Arc<HeapFile>) {
        let name = format!("table_{}", Uuid::new_v4().simple());
        self.add_table(file, name, None);
    }

    pub fn get_table_id(&self, name: &str) -> DbResult<usize> {
        self.name_to_id
            .read()
            .unwrap()
            .get(name)
            .copied()
            .ok_or_else(|| DbError::no_such_element(format!("no table named {}", name)))
    }

    pub fn get_table_name(&self, id: usize) -> DbResult<String> {
        self.id_to_name
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::no_such_element(format!("no table with id {}", id)))
    }

    pub fn get_table_from_id(&self, id: usize) -> DbResult<Arc<HeapFile>> {
        self.id_to_file
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::no_such_element(format!("no table with id {}", id)))
    }

    pub fn get_table_from_name(&self, name: &str) -> DbResult<Arc<HeapFile>> {
        let id = self.get_table_id(name)?;
        self.get_table_from_id(id)
    }

    pub fn get_tuple_desc(&self, table_id: usize) -> DbResult<TupleDesc> {
        Ok(self.get_table_from_id(table_id)?.get_tuple_desc().clone())
    }

    // Returns the table's primary-key column name, or `""` if it was
    // registered with no primary key. Errors only when `table_id` isn't
    // registered at all.
    pub fn get_primary_key(&self, table_id: usize) -> DbResult<String> {
        if !self.id_to_name.read().unwrap().contains_key(&table_id) {
            return Err(DbError::no_such_element(format!("no table with id {}", table_id)));
        }
        Ok(self.id_to_pk.read().unwrap().get(&table_id).cloned().unwrap_or_default())
    }

    pub fn table_ids(&self) -> impl Iterator<Item = usize> {
        let ids: Vec<usize> = self.id_to_file.read().unwrap().keys().copied().collect();
        ids.into_iter()
    }

    pub fn clear(&self) {
        self.id_to_file.write().unwrap().clear();
        self.id_to_name.write().unwrap().clear();
        self.id_to_pk.write().unwrap().clear();
        self.name_to_id.write().unwrap().clear();
    }

    // Parses catalog entries of the form `NAME (COL TYPE [pk], COL TYPE [pk], ...)`,
    // one per line. TYPE is `int` or `string`, case-insensitive; a trailing
    // `pk` marker on a field names it the table's primary key. The backing
    // file for each table is created (or reopened) under `data/<name>.dat`.
    pub fn load_schema(&self, schema_file_path: &str) -> DbResult<()> {
        let schema_file = File::open(schema_file_path)?;
        let reader = BufReader::new(schema_file);
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let open = line
                .find('(')
                .ok_or_else(|| DbError::db("missing '(' in schema line"))?;
            let close = line
                .rfind(')')
                .ok_or_else(|| DbError::db("missing ')' in schema line"))?;
            let table_name = line[..open].trim().to_string();
            let body = &line[open + 1..close];

            let mut field_types = vec![];
            let mut field_names = vec![];
            let mut primary_key = None;
            for field in body.split(',') {
                let field = field.trim();
                if field.is_empty() {
                    continue;
                }
                let parts: Vec<&str> = field.split_whitespace().collect();
                if parts.len() < 2 {
                    return Err(DbError::db(format!("malformed field spec: {}", field)));
                }
                let field_name = parts[0].to_string();
                let field_type = match parts[1].to_lowercase().as_str() {
                    "int" => Type::IntType,
                    "string" => Type::StringType,
                    other => return Err(DbError::db(format!("unknown field type: {}", other))),
                };
                if parts
                    .get(2)
                    .map(|s| s.eq_ignore_ascii_case("pk"))
                    .unwrap_or(false)
                {
                    primary_key = Some(field_name.clone());
                }
                field_names.push(field_name);
                field_types.push(field_type);
            }

            std::fs::create_dir_all("data")?;
            let path = format!("data/{}.dat", table_name);
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .open(&path)?;
            let td = TupleDesc::new(field_types, field_names);
            let heap_file = Arc::new(HeapFile::new(file, Path::new(&path), td)?);
            self.add_table(heap_file, table_name, primary_key);
        }
        Ok(())
    }
}
