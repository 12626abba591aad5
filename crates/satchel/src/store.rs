//! Durable, namespaced collections backing the controller.
//!
//! Each collection is one JSON document behind a [`StorageBackend`]. The
//! typed [`Store`] wrapper gives the read-modify-write primitive every
//! queue mutation relies on: `update` holds the collection lock across the
//! whole read-apply-write cycle, so interleaved operations cannot lose
//! updates to the same collection.

use parking_lot::Mutex;
use satchel_core::{
    auth::AuthUrls,
    metadata::ChainMetadata,
    request::{AuthRequest, MetadataRequest, SignRequest},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    fs, io,
    io::Write,
    marker::PhantomData,
    path::PathBuf,
    sync::Arc,
};

/// Failures of the persistence layer. Propagated to the caller of the
/// operation that touched the store; never swallowed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Io(#[from] io::Error),
    #[error("malformed collection document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Raw document storage, one document per named collection.
pub trait StorageBackend: Send + Sync {
    /// Reads a collection document; `None` if it was never written.
    fn read(&self, collection: &str) -> io::Result<Option<Vec<u8>>>;
    /// Replaces a collection document.
    fn write(&self, collection: &str, document: &[u8]) -> io::Result<()>;
}

/// File-per-collection JSON storage. Writes go through a temp file and a
/// rename, so a crash mid-write never truncates a collection.
#[derive(Debug)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Opens (and creates, if needed) the storage directory.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }
}

impl StorageBackend for JsonFileBackend {
    fn read(&self, collection: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path(collection)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&self, collection: &str, document: &[u8]) -> io::Result<()> {
        let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;
        file.write_all(document)?;
        file.persist(self.path(collection)).map_err(|err| err.error)?;
        Ok(())
    }
}

/// Volatile storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: Mutex<HashMap<String, Vec<u8>>>,
}

impl StorageBackend for MemoryBackend {
    fn read(&self, collection: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.collections.lock().get(collection).cloned())
    }

    fn write(&self, collection: &str, document: &[u8]) -> io::Result<()> {
        self.collections.lock().insert(collection.to_string(), document.to_vec());
        Ok(())
    }
}

/// A typed handle to one named collection.
pub struct Store<T> {
    backend: Arc<dyn StorageBackend>,
    collection: &'static str,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Store<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(backend: Arc<dyn StorageBackend>, collection: &'static str) -> Self {
        Self { backend, collection, lock: Mutex::new(()), _marker: PhantomData }
    }

    /// Returns the current collection value, or the empty default if the
    /// collection was never written.
    pub fn get(&self) -> Result<T, StoreError> {
        let _guard = self.lock.lock();
        self.read()
    }

    /// Replaces the collection wholesale.
    pub fn set(&self, value: T) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        self.write(&value)
    }

    /// Atomic read-modify-write: no other `get`/`set`/`update` on this
    /// collection can interleave between the read and the write.
    pub fn update(&self, apply: impl FnOnce(T) -> T) -> Result<T, StoreError> {
        let _guard = self.lock.lock();
        let next = apply(self.read()?);
        self.write(&next)?;
        Ok(next)
    }

    fn read(&self) -> Result<T, StoreError> {
        match self.backend.read(self.collection)? {
            Some(raw) => Ok(serde_json::from_slice(&raw)?),
            None => Ok(T::default()),
        }
    }

    fn write(&self, value: &T) -> Result<(), StoreError> {
        let document = serde_json::to_vec(value)?;
        Ok(self.backend.write(self.collection, &document)?)
    }
}

/// The five durable collections of the controller, plus the default
/// account-selection list, all sharing one backend.
pub struct Stores {
    pub chain_metadata: Store<ChainMetadata>,
    pub auth_urls: Store<AuthUrls>,
    pub default_auth_accounts: Store<Vec<String>>,
    pub auth_requests: Store<Vec<AuthRequest>>,
    pub metadata_requests: Store<Vec<MetadataRequest>>,
    pub sign_requests: Store<Vec<SignRequest>>,
}

impl Stores {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            chain_metadata: Store::new(Arc::clone(&backend), "chain_metadata"),
            auth_urls: Store::new(Arc::clone(&backend), "auth_urls"),
            default_auth_accounts: Store::new(Arc::clone(&backend), "default_auth_accounts"),
            auth_requests: Store::new(Arc::clone(&backend), "auth_requests"),
            metadata_requests: Store::new(Arc::clone(&backend), "metadata_requests"),
            sign_requests: Store::new(backend, "sign_requests"),
        }
    }
}
