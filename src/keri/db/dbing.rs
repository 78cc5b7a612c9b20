use crate::keri::core::filing::Filer;
use crate::keri::db::errors::DBError;
use heed::{Database, Env, EnvOpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// Named sub database storing byte keys and byte values
pub type BytesDatabase = Database<heed::types::Bytes, heed::types::Bytes>;

/// LMDBer wraps one LMDB environment holding the named sub databases of
/// a keystore. All operations are synchronous and transactional; any
/// environment error is fatal and surfaced as DBError.
pub struct LMDBer {
    pub filer: Filer,
    env: Option<Arc<Env>>,
}

pub struct LMDBerBuilder {
    name: String,
    temp: bool,
    head_dir_path: Option<PathBuf>,
}

impl Default for LMDBerBuilder {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            temp: false,
            head_dir_path: None,
        }
    }
}

impl LMDBerBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn temp(mut self, temp: bool) -> Self {
        self.temp = temp;
        self
    }

    pub fn head_dir_path(mut self, head_dir_path: PathBuf) -> Self {
        self.head_dir_path = Some(head_dir_path);
        self
    }

    pub fn build(self) -> Result<LMDBer, DBError> {
        LMDBer::new(self.name, self.temp, self.head_dir_path)
    }
}

impl LMDBer {
    /// Maximum number of named sub databases in one environment
    pub const MAX_NAMED_DBS: u32 = 8;

    /// Map size of the environment, 100MB
    pub const MAP_SIZE: usize = 104_857_600;

    pub fn builder() -> LMDBerBuilder {
        LMDBerBuilder::default()
    }

    pub fn new(
        name: impl Into<String>,
        temp: bool,
        head_dir_path: Option<PathBuf>,
    ) -> Result<Self, DBError> {
        let name: String = name.into();
        let filer = Filer::new(&name, temp, head_dir_path)?;

        let dir_path = filer
            .path()
            .ok_or_else(|| DBError::FilerError("Database path not set.".into()))?;

        let mut env_builder = EnvOpenOptions::new();
        env_builder
            .map_size(Self::MAP_SIZE)
            .max_dbs(Self::MAX_NAMED_DBS);

        let env = unsafe { env_builder.open(dir_path)? };

        Ok(LMDBer {
            filer,
            env: Some(Arc::new(env)),
        })
    }

    pub fn name(&self) -> String {
        self.filer.name().to_string()
    }

    pub fn temp(&self) -> bool {
        self.filer.temp()
    }

    pub fn opened(&self) -> bool {
        self.filer.opened() && self.env.is_some()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.filer.path().cloned()
    }

    fn env(&self) -> Result<&Arc<Env>, DBError> {
        self.env.as_ref().ok_or(DBError::DbClosed)
    }

    /// Close the environment. When clear is true the directory is removed.
    pub fn close(&mut self, clear: bool) -> Result<(), DBError> {
        self.env = None;
        self.filer.close(clear)
    }

    /// Create (or open) a named sub database. Sub database names must
    /// contain a byte outside the Base64 alphabet, by convention a
    /// trailing '.', so they cannot collide with identifier prefixes.
    pub fn create_database(&self, name: &str) -> Result<BytesDatabase, DBError> {
        let env = self.env()?;
        let mut wtxn = env.write_txn()?;

        let mut options = env
            .database_options()
            .types::<heed::types::Bytes, heed::types::Bytes>();
        let db = options.name(name).create(&mut wtxn)?;

        wtxn.commit()?;
        Ok(db)
    }

    /// Write val at key only when the key is absent. Returns false when
    /// the key already exists.
    pub fn put_val(&self, db: &BytesDatabase, key: &[u8], val: &[u8]) -> Result<bool, DBError> {
        if key.is_empty() {
            return Err(DBError::KeyError("Key cannot be empty.".to_string()));
        }

        let env = self.env()?;
        let mut wtxn = env.write_txn()?;

        if db.get(&wtxn, key)?.is_some() {
            wtxn.abort();
            return Ok(false);
        }

        db.put(&mut wtxn, key, val)?;
        wtxn.commit()?;
        Ok(true)
    }

    /// Write val at key, overwriting any existing value.
    pub fn set_val(&self, db: &BytesDatabase, key: &[u8], val: &[u8]) -> Result<bool, DBError> {
        if key.is_empty() {
            return Err(DBError::KeyError("Key cannot be empty.".to_string()));
        }

        let env = self.env()?;
        let mut wtxn = env.write_txn()?;
        db.put(&mut wtxn, key, val)?;
        wtxn.commit()?;
        Ok(true)
    }

    /// Overwrite val at key only when the key is already present, in one
    /// transaction. Returns false when the key is absent, which callers
    /// use to detect a concurrently deleted entry.
    pub fn update_val(&self, db: &BytesDatabase, key: &[u8], val: &[u8]) -> Result<bool, DBError> {
        if key.is_empty() {
            return Err(DBError::KeyError("Key cannot be empty.".to_string()));
        }

        let env = self.env()?;
        let mut wtxn = env.write_txn()?;

        if db.get(&wtxn, key)?.is_none() {
            wtxn.abort();
            return Ok(false);
        }

        db.put(&mut wtxn, key, val)?;
        wtxn.commit()?;
        Ok(true)
    }

    pub fn get_val(&self, db: &BytesDatabase, key: &[u8]) -> Result<Option<Vec<u8>>, DBError> {
        let env = self.env()?;
        let rtxn = env.read_txn()?;

        Ok(db.get(&rtxn, key)?.map(|val| val.to_vec()))
    }

    /// Delete the entry at key. Returns false when the key is absent.
    pub fn del_val(&self, db: &BytesDatabase, key: &[u8]) -> Result<bool, DBError> {
        let env = self.env()?;
        let mut wtxn = env.write_txn()?;

        if db.get(&wtxn, key)?.is_none() {
            wtxn.abort();
            return Ok(false);
        }

        db.delete(&mut wtxn, key)?;
        wtxn.commit()?;
        Ok(true)
    }

    pub fn cnt(&self, db: &BytesDatabase) -> Result<u64, DBError> {
        let env = self.env()?;
        let rtxn = env.read_txn()?;

        Ok(db.len(&rtxn)?)
    }

    /// Collect all items whose key starts with the given prefix, in
    /// lexicographic key order. An empty prefix collects everything.
    pub fn get_top_items(
        &self,
        db: &BytesDatabase,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DBError> {
        let env = self.env()?;
        let rtxn = env.read_txn()?;

        let mut items = Vec::new();
        for result in db.iter(&rtxn)? {
            let (key, val) = result?;
            if key.starts_with(prefix) {
                items.push((key.to_vec(), val.to_vec()));
            }
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lmdber_basics() {
        let lmdber = LMDBer::builder()
            .name("test_dbing")
            .temp(true)
            .build()
            .unwrap();
        assert_eq!(lmdber.name(), "test_dbing");
        assert!(lmdber.opened());
        assert!(lmdber.temp());

        let path = lmdber.path().unwrap();
        assert!(path.exists());

        drop(lmdber);
        assert!(!path.exists());
    }

    #[test]
    fn test_put_set_get_del() {
        let lmdber = LMDBer::builder()
            .name("test_dbing_vals")
            .temp(true)
            .build()
            .unwrap();
        let db = lmdber.create_database("vals.").unwrap();

        let key = b"BDzwEHHzq7K0gzQPYGGwTmuupUhPx5_yZ-Wk1x4ejhcc";

        assert!(lmdber.put_val(&db, key, b"first").unwrap());
        assert_eq!(lmdber.get_val(&db, key).unwrap().unwrap(), b"first");

        // put does not overwrite
        assert!(!lmdber.put_val(&db, key, b"second").unwrap());
        assert_eq!(lmdber.get_val(&db, key).unwrap().unwrap(), b"first");

        // set overwrites
        assert!(lmdber.set_val(&db, key, b"second").unwrap());
        assert_eq!(lmdber.get_val(&db, key).unwrap().unwrap(), b"second");

        assert!(lmdber.del_val(&db, key).unwrap());
        assert!(!lmdber.del_val(&db, key).unwrap());
        assert!(lmdber.get_val(&db, key).unwrap().is_none());
    }

    #[test]
    fn test_update_val_requires_presence() {
        let lmdber = LMDBer::builder()
            .name("test_dbing_update")
            .temp(true)
            .build()
            .unwrap();
        let db = lmdber.create_database("vals.").unwrap();

        assert!(!lmdber.update_val(&db, b"missing", b"val").unwrap());
        assert!(lmdber.get_val(&db, b"missing").unwrap().is_none());

        assert!(lmdber.put_val(&db, b"present", b"old").unwrap());
        assert!(lmdber.update_val(&db, b"present", b"new").unwrap());
        assert_eq!(lmdber.get_val(&db, b"present").unwrap().unwrap(), b"new");
    }

    #[test]
    fn test_cnt_and_top_items() {
        let lmdber = LMDBer::builder()
            .name("test_dbing_iter")
            .temp(true)
            .build()
            .unwrap();
        let db = lmdber.create_database("vals.").unwrap();

        lmdber.put_val(&db, b"a.1", b"one").unwrap();
        lmdber.put_val(&db, b"a.2", b"two").unwrap();
        lmdber.put_val(&db, b"b.1", b"three").unwrap();

        assert_eq!(lmdber.cnt(&db).unwrap(), 3);

        let items = lmdber.get_top_items(&db, b"a.").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].0, b"a.1");
        assert_eq!(items[1].1, b"two");

        let all = lmdber.get_top_items(&db, b"").unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_empty_key_rejected() {
        let lmdber = LMDBer::builder()
            .name("test_dbing_empty")
            .temp(true)
            .build()
            .unwrap();
        let db = lmdber.create_database("vals.").unwrap();

        assert!(lmdber.put_val(&db, b"", b"val").is_err());
        assert!(lmdber.set_val(&db, b"", b"val").is_err());
    }
}
