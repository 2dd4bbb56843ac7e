//! The gateway between text and the vector backend.

use std::sync::Arc;
use uuid::Uuid;

use super::backend::{FileBackend, VectorBackend};
use super::types::{Candidate, ChunkMetadata, DistanceMetric, IndexedVector};
use super::{CandidateSource, StoreError, StoreResult};
use crate::config::Settings;
use crate::vector::EmbeddingGenerator;

/// Embeds chunks on the way in and queries on the way out, against one
/// named collection.
pub struct VectorStoreGateway {
    backend: Box<dyn VectorBackend>,
    embedder: Arc<dyn EmbeddingGenerator>,
    collection: String,
    metric: DistanceMetric,
}

impl VectorStoreGateway {
    pub fn new(
        backend: Box<dyn VectorBackend>,
        embedder: Arc<dyn EmbeddingGenerator>,
        collection: impl Into<String>,
        metric: DistanceMetric,
    ) -> Self {
        Self {
            backend,
            embedder,
            collection: collection.into(),
            metric,
        }
    }

    /// Open the persistent store configured in `settings`.
    pub fn from_settings(
        settings: &Settings,
        embedder: Arc<dyn EmbeddingGenerator>,
    ) -> StoreResult<Self> {
        let backend = FileBackend::open(&settings.index_path)?;
        Ok(Self::new(
            Box::new(backend),
            embedder,
            settings.collection.as_str(),
            settings.store.metric,
        ))
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Embed and append chunks from one source. Returns the number stored.
    ///
    /// The collection is created on first use. Each chunk gets a fresh id and
    /// metadata `{source, chunk_index, text_length}`.
    pub fn store(&self, chunks: &[String], source: &str) -> StoreResult<usize> {
        self.store_batches(&[(chunks, source)])
    }

    /// Store several `(chunks, source)` groups with one embedding call and
    /// one backend write. `chunk_index` restarts at 0 for each group.
    pub fn store_batches(&self, batches: &[(&[String], &str)]) -> StoreResult<usize> {
        let texts: Vec<&str> = batches
            .iter()
            .flat_map(|(chunks, _)| chunks.iter().map(String::as_str))
            .collect();
        if texts.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.generate_embeddings(&texts)?;
        if embeddings.len() != texts.len() {
            return Err(StoreError::Embedding(
                crate::vector::EmbeddingError::CountMismatch {
                    texts: texts.len(),
                    embeddings: embeddings.len(),
                },
            ));
        }

        let mut embeddings = embeddings.into_iter();
        let mut vectors = Vec::with_capacity(texts.len());
        for (chunks, source) in batches {
            for (chunk_index, (text, embedding)) in
                chunks.iter().zip(embeddings.by_ref()).enumerate()
            {
                vectors.push(IndexedVector {
                    id: Uuid::new_v4(),
                    chunk_text: text.clone(),
                    embedding,
                    metadata: ChunkMetadata {
                        source: source.to_string(),
                        chunk_index,
                        text_length: text.chars().count(),
                    },
                });
            }
        }

        self.backend.ensure_collection(&self.collection)?;
        self.backend.add(&self.collection, vectors)?;

        for (chunks, source) in batches.iter().filter(|(chunks, _)| !chunks.is_empty()) {
            tracing::info!(target: "store", "Stored {} chunks from {source}", chunks.len());
        }
        Ok(texts.len())
    }

    /// Up to `top_k` nearest chunks, ascending by distance.
    ///
    /// A collection that does not exist yet yields no candidates.
    pub fn query(&self, text: &str, top_k: usize) -> StoreResult<Vec<Candidate>> {
        if !self.backend.has_collection(&self.collection) {
            tracing::debug!(
                target: "store",
                "collection '{}' does not exist, returning no candidates",
                self.collection
            );
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed_one(text)?;
        let candidates =
            self.backend
                .similarity_query(&self.collection, &embedding, top_k, self.metric)?;

        tracing::debug!(
            target: "store",
            "query returned {} candidate(s) (top_k={top_k}, metric={})",
            candidates.len(),
            self.metric
        );
        Ok(candidates)
    }

    /// Number of chunks in the collection; 0 when it does not exist.
    pub fn chunk_count(&self) -> usize {
        self.backend.count(&self.collection)
    }
}

impl CandidateSource for VectorStoreGateway {
    fn candidates(&self, query: &str, top_k: usize) -> StoreResult<Vec<Candidate>> {
        self.query(query, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryBackend;
    use crate::vector::MockEmbeddingGenerator;

    fn gateway() -> VectorStoreGateway {
        VectorStoreGateway::new(
            Box::new(InMemoryBackend::new()),
            Arc::new(MockEmbeddingGenerator::new()),
            "rag_collection",
            DistanceMetric::Cosine,
        )
    }

    #[test]
    fn test_query_missing_collection_is_empty() {
        let gateway = gateway();
        assert!(gateway.query("anything", 5).unwrap().is_empty());
        assert_eq!(gateway.chunk_count(), 0);
    }

    #[test]
    fn test_store_empty_is_noop() {
        let gateway = gateway();
        assert_eq!(gateway.store(&[], "empty.txt").unwrap(), 0);
        assert_eq!(gateway.chunk_count(), 0);
    }

    #[test]
    fn test_store_and_query() {
        let gateway = gateway();
        let chunks = vec![
            "The cat sat on the mat.".to_string(),
            "Stock markets fell sharply today.".to_string(),
        ];
        assert_eq!(gateway.store(&chunks, "notes.txt").unwrap(), 2);
        assert_eq!(gateway.chunk_count(), 2);

        let results = gateway.query("cat mat", 5).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document, "The cat sat on the mat.");
        assert!(results[0].distance <= results[1].distance);

        let meta = &results[0].metadata;
        assert_eq!(meta.source, "notes.txt");
        assert_eq!(meta.chunk_index, 0);
        assert_eq!(meta.text_length, 23);
    }

    #[test]
    fn test_store_assigns_unique_ids() {
        let gateway = gateway();
        let chunks = vec!["same text".to_string(), "same text".to_string()];
        gateway.store(&chunks, "dup.txt").unwrap();

        let results = gateway.query("same text", 2).unwrap();
        assert_ne!(results[0].id, results[1].id);
    }

    #[test]
    fn test_store_batches_numbers_each_source() {
        let gateway = gateway();
        let page_one = vec!["Alpha one.".to_string(), "Alpha two.".to_string()];
        let page_two = vec!["Beta one.".to_string()];
        let blank: Vec<String> = Vec::new();
        let stored = gateway
            .store_batches(&[
                (page_one.as_slice(), "report.pdf"),
                (blank.as_slice(), "empty.pdf"),
                (page_two.as_slice(), "report.pdf"),
            ])
            .unwrap();
        assert_eq!(stored, 3);
        assert_eq!(gateway.chunk_count(), 3);

        let beta = gateway.query("beta one", 1).unwrap();
        assert_eq!(beta[0].document, "Beta one.");
        assert_eq!(beta[0].metadata.chunk_index, 0);

        let alpha_two = gateway.query("alpha two", 1).unwrap();
        assert_eq!(alpha_two[0].document, "Alpha two.");
        assert_eq!(alpha_two[0].metadata.chunk_index, 1);
    }

    #[test]
    fn test_query_respects_top_k() {
        let gateway = gateway();
        let chunks: Vec<String> = (0..10).map(|i| format!("chunk number {i}")).collect();
        gateway.store(&chunks, "many.txt").unwrap();
        assert_eq!(gateway.query("chunk", 3).unwrap().len(), 3);
    }
}
