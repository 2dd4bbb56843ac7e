//! Collection storage backends.
//!
//! A backend owns named collections of [`IndexedVector`]s and answers
//! nearest-neighbour queries by linear scan.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::types::{Candidate, DistanceMetric, IndexedVector, rank};
use super::{StoreError, StoreResult};

/// On-disk format version for collection files.
const COLLECTION_FORMAT_VERSION: u32 = 1;

/// Storage for named collections of embedded chunks.
pub trait VectorBackend: Send + Sync {
    fn has_collection(&self, name: &str) -> bool;

    /// Create the collection if it does not exist.
    fn ensure_collection(&self, name: &str) -> StoreResult<()>;

    /// Append vectors to an existing collection.
    fn add(&self, name: &str, vectors: Vec<IndexedVector>) -> StoreResult<()>;

    /// Up to `top_k` nearest vectors by ascending distance.
    fn similarity_query(
        &self,
        name: &str,
        embedding: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> StoreResult<Vec<Candidate>>;

    /// Number of vectors in a collection; 0 when it does not exist.
    fn count(&self, name: &str) -> usize;
}

#[derive(Debug, Default, Deserialize)]
struct Collection {
    /// Embedding width, fixed by the first insert.
    dimension: Option<usize>,
    vectors: Vec<IndexedVector>,
}

impl Collection {
    /// The dimension the collection has after appending `vectors`.
    fn check_dimension(&self, name: &str, vectors: &[IndexedVector]) -> StoreResult<Option<usize>> {
        let mut dimension = self.dimension;
        for v in vectors {
            let expected = *dimension.get_or_insert(v.embedding.len());
            if v.embedding.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    collection: name.to_string(),
                    expected,
                    actual: v.embedding.len(),
                });
            }
        }
        Ok(dimension)
    }

    fn append(&mut self, name: &str, vectors: Vec<IndexedVector>) -> StoreResult<()> {
        self.dimension = self.check_dimension(name, &vectors)?;
        self.vectors.extend(vectors);
        Ok(())
    }

    fn query(
        &self,
        name: &str,
        embedding: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> StoreResult<Vec<Candidate>> {
        if let Some(expected) = self.dimension {
            if embedding.len() != expected {
                return Err(StoreError::DimensionMismatch {
                    collection: name.to_string(),
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        Ok(rank(&self.vectors, embedding, top_k, metric))
    }
}

/// Non-durable backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorBackend for InMemoryBackend {
    fn has_collection(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    fn ensure_collection(&self, name: &str) -> StoreResult<()> {
        self.collections
            .write()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    fn add(&self, name: &str, vectors: Vec<IndexedVector>) -> StoreResult<()> {
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        collection.append(name, vectors)
    }

    fn similarity_query(
        &self,
        name: &str,
        embedding: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> StoreResult<Vec<Candidate>> {
        let collections = self.collections.read();
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        collection.query(name, embedding, top_k, metric)
    }

    fn count(&self, name: &str) -> usize {
        self.collections
            .read()
            .get(name)
            .map_or(0, |c| c.vectors.len())
    }
}

#[derive(Deserialize)]
struct PersistedCollection {
    version: u32,
    name: String,
    #[serde(flatten)]
    collection: Collection,
}

/// Borrowed write-side view of [`PersistedCollection`].
#[derive(Serialize)]
struct PersistedCollectionRef<'a> {
    version: u32,
    name: &'a str,
    dimension: Option<usize>,
    vectors: Vec<&'a IndexedVector>,
}

/// Durable backend: one JSON file per collection under `<root>/collections/`.
///
/// Collections are loaded when the backend opens and rewritten after every add.
/// Assumes a single writer.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    collections: RwLock<HashMap<String, Collection>>,
}

impl FileBackend {
    /// Open (creating if needed) the store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = root.as_ref().join("collections");
        std::fs::create_dir_all(&dir)?;

        let mut collections = HashMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let persisted = Self::load_collection(&path)?;
            collections.insert(persisted.name, persisted.collection);
        }

        tracing::debug!(
            target: "store",
            "opened vector store at {} ({} collections)",
            dir.display(),
            collections.len()
        );

        Ok(Self {
            dir,
            collections: RwLock::new(collections),
        })
    }

    /// Directory holding the collection files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn load_collection(path: &Path) -> StoreResult<PersistedCollection> {
        let content = std::fs::read_to_string(path)?;
        let persisted: PersistedCollection = serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("Failed to parse {}: {e}", path.display()))
        })?;

        if persisted.version != COLLECTION_FORMAT_VERSION {
            return Err(StoreError::Serialization(format!(
                "Unsupported collection format version {} in {}",
                persisted.version,
                path.display()
            )));
        }

        Ok(persisted)
    }

    /// Rewrite a collection file from its existing and pending vectors.
    fn save_collection<'a>(
        &self,
        name: &str,
        dimension: Option<usize>,
        vectors: impl Iterator<Item = &'a IndexedVector>,
    ) -> StoreResult<()> {
        let persisted = PersistedCollectionRef {
            version: COLLECTION_FORMAT_VERSION,
            name,
            dimension,
            vectors: vectors.collect(),
        };

        let content = serde_json::to_string(&persisted)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize {name}: {e}")))?;

        // Write then rename so a crash never leaves a truncated file
        let path = self.collection_path(name);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &path)?;

        Ok(())
    }
}

/// Collection names become file names.
fn validate_collection_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidCollectionName(name.to_string()))
    }
}

impl VectorBackend for FileBackend {
    fn has_collection(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    fn ensure_collection(&self, name: &str) -> StoreResult<()> {
        validate_collection_name(name)?;

        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Ok(());
        }

        self.save_collection(name, None, std::iter::empty())?;
        collections.insert(name.to_string(), Collection::default());
        tracing::info!(target: "store", "created collection '{name}'");
        Ok(())
    }

    fn add(&self, name: &str, vectors: Vec<IndexedVector>) -> StoreResult<()> {
        let mut collections = self.collections.write();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;

        // Disk first; memory only changes once the write succeeded
        let dimension = collection.check_dimension(name, &vectors)?;
        self.save_collection(name, dimension, collection.vectors.iter().chain(&vectors))?;
        collection.dimension = dimension;
        collection.vectors.extend(vectors);
        Ok(())
    }

    fn similarity_query(
        &self,
        name: &str,
        embedding: &[f32],
        top_k: usize,
        metric: DistanceMetric,
    ) -> StoreResult<Vec<Candidate>> {
        let collections = self.collections.read();
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        collection.query(name, embedding, top_k, metric)
    }

    fn count(&self, name: &str) -> usize {
        self.collections
            .read()
            .get(name)
            .map_or(0, |c| c.vectors.len())
    }
}
