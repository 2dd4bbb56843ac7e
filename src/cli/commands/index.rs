//! Index command - load, chunk, embed and store documents.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Settings;
use crate::documents::{ChunkingConfig, Chunker, DocumentLoader, LoaderError, SentenceChunker};
use crate::log_event;
use crate::store::VectorStoreGateway;

/// Totals for one index run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IndexSummary {
    pub files: usize,
    pub records: usize,
    pub chunks: usize,
    /// Files whose format is not supported; nothing was stored for them.
    pub skipped: Vec<String>,
}

/// Index each file in order.
///
/// Files of a known format with no registered extractor are skipped like
/// unsupported ones. Any other failure aborts the run.
pub fn index_files(
    files: &[PathBuf],
    loader: &DocumentLoader,
    chunker: &dyn Chunker,
    chunking: &ChunkingConfig,
    gateway: &VectorStoreGateway,
) -> Result<IndexSummary> {
    let mut summary = IndexSummary::default();

    for path in files {
        let records = match loader.load_path(path) {
            Ok(records) => records,
            Err(LoaderError::NoExtractor { file, doc_type }) => {
                tracing::warn!(
                    target: "documents",
                    "skipping {file}: no extractor registered for '{doc_type}'"
                );
                summary.files += 1;
                summary.skipped.push(file);
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to load {}", path.display()));
            }
        };

        let mut batches: Vec<(Vec<String>, &str)> = Vec::with_capacity(records.len());
        for record in &records {
            if !record.doc_type.is_supported() {
                tracing::warn!(
                    target: "documents",
                    "skipping {}: unsupported format '{}'",
                    record.source,
                    record.doc_type
                );
                summary.skipped.push(record.source.clone());
                continue;
            }

            let texts: Vec<String> = chunker
                .chunk_record(record, chunking)
                .into_iter()
                .map(|chunk| chunk.text)
                .collect();
            batches.push((texts, record.source.as_str()));
        }

        // One embedding call and one store write per file
        let borrowed: Vec<(&[String], &str)> = batches
            .iter()
            .map(|(texts, source)| (texts.as_slice(), *source))
            .collect();
        let file_chunks = gateway
            .store_batches(&borrowed)
            .with_context(|| format!("Failed to store chunks from {}", path.display()))?;

        log_event!("index", "file", "{} -> {file_chunks} chunks", path.display());
        summary.files += 1;
        summary.records += batches.len();
        summary.chunks += file_chunks;
    }

    Ok(summary)
}

/// Run index command.
pub fn run(settings: &Settings, gateway: &VectorStoreGateway, files: &[PathBuf]) -> Result<()> {
    let loader = DocumentLoader::new();
    let chunker = SentenceChunker::new();

    let summary = index_files(files, &loader, &chunker, &settings.chunking, gateway)?;

    for skipped in &summary.skipped {
        eprintln!("Skipped {skipped}: unsupported file format");
    }
    println!(
        "Indexed {} file(s): {} record(s), {} chunk(s) into '{}' ({} total)",
        summary.files,
        summary.records,
        summary.chunks,
        gateway.collection(),
        gateway.chunk_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentRecord, DocumentType, FormatExtractor};
    use crate::store::{
        Candidate, DistanceMetric, InMemoryBackend, IndexedVector, StoreResult, VectorBackend,
    };
    use crate::vector::MockEmbeddingGenerator;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn gateway() -> VectorStoreGateway {
        VectorStoreGateway::new(
            Box::new(InMemoryBackend::new()),
            Arc::new(MockEmbeddingGenerator::new()),
            "rag_collection",
            DistanceMetric::Cosine,
        )
    }

    #[test]
    fn test_index_files_counts_and_skips() {
        let temp_dir = TempDir::new().unwrap();
        let notes = temp_dir.path().join("notes.txt");
        let image = temp_dir.path().join("photo.png");
        let blank = temp_dir.path().join("blank.txt");
        std::fs::write(&notes, "The cat sat. The dog ran.").unwrap();
        std::fs::write(&image, [0x89, 0x50, 0x4e, 0x47]).unwrap();
        std::fs::write(&blank, "   ").unwrap();

        let gateway = gateway();
        let chunking = ChunkingConfig {
            chunk_size: 15,
            chunk_overlap: 0,
            ..ChunkingConfig::default()
        };
        let summary = index_files(
            &[notes, image, blank],
            &DocumentLoader::new(),
            &SentenceChunker::new(),
            &chunking,
            &gateway,
        )
        .unwrap();

        assert_eq!(summary.files, 3);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.chunks, 2);
        assert_eq!(summary.skipped, vec!["photo.png".to_string()]);
        assert_eq!(gateway.chunk_count(), 2);
    }

    #[test]
    fn test_index_continues_past_format_without_extractor() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("a.txt");
        let report = temp_dir.path().join("report.pdf");
        let last = temp_dir.path().join("b.txt");
        std::fs::write(&first, "Alpha notes.").unwrap();
        std::fs::write(&report, b"%PDF-1.7").unwrap();
        std::fs::write(&last, "Beta notes.").unwrap();

        let gateway = gateway();
        let summary = index_files(
            &[first, report, last],
            &DocumentLoader::new(),
            &SentenceChunker::new(),
            &ChunkingConfig::default(),
            &gateway,
        )
        .unwrap();

        assert_eq!(summary.files, 3);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.skipped, vec!["report.pdf".to_string()]);
        assert_eq!(gateway.chunk_count(), 2);
        assert_eq!(gateway.query("beta notes", 1).unwrap()[0].metadata.source, "b.txt");
    }

    /// Extractor returning one record per page.
    struct PagedExtractor;

    impl FormatExtractor for PagedExtractor {
        fn extract(&self, file_name: &str, _bytes: &[u8]) -> Result<Vec<DocumentRecord>, LoaderError> {
            Ok((1..=4)
                .map(|page| {
                    DocumentRecord::new(format!("Page {page} text."), file_name, DocumentType::Pdf)
                        .with_page(page)
                })
                .collect())
        }
    }

    /// In-memory backend that counts writes.
    struct CountingBackend {
        inner: InMemoryBackend,
        adds: Arc<AtomicUsize>,
    }

    impl VectorBackend for CountingBackend {
        fn has_collection(&self, name: &str) -> bool {
            self.inner.has_collection(name)
        }

        fn ensure_collection(&self, name: &str) -> StoreResult<()> {
            self.inner.ensure_collection(name)
        }

        fn add(&self, name: &str, vectors: Vec<IndexedVector>) -> StoreResult<()> {
            self.adds.fetch_add(1, Ordering::SeqCst);
            self.inner.add(name, vectors)
        }

        fn similarity_query(
            &self,
            name: &str,
            embedding: &[f32],
            top_k: usize,
            metric: DistanceMetric,
        ) -> StoreResult<Vec<Candidate>> {
            self.inner.similarity_query(name, embedding, top_k, metric)
        }

        fn count(&self, name: &str) -> usize {
            self.inner.count(name)
        }
    }

    #[test]
    fn test_multi_page_file_is_written_once() {
        let temp_dir = TempDir::new().unwrap();
        let report = temp_dir.path().join("report.pdf");
        std::fs::write(&report, b"%PDF-1.7").unwrap();

        let adds = Arc::new(AtomicUsize::new(0));
        let gateway = VectorStoreGateway::new(
            Box::new(CountingBackend {
                inner: InMemoryBackend::new(),
                adds: Arc::clone(&adds),
            }),
            Arc::new(MockEmbeddingGenerator::new()),
            "rag_collection",
            DistanceMetric::Cosine,
        );
        let loader = DocumentLoader::new().with_extractor(DocumentType::Pdf, PagedExtractor);

        let summary = index_files(
            &[report],
            &loader,
            &SentenceChunker::new(),
            &ChunkingConfig::default(),
            &gateway,
        )
        .unwrap();

        assert_eq!(summary.records, 4);
        assert_eq!(summary.chunks, 4);
        assert_eq!(adds.load(Ordering::SeqCst), 1);

        // Each page keeps its own chunk numbering
        let hit = gateway.query("page 3 text", 1).unwrap();
        assert_eq!(hit[0].document, "Page 3 text.");
        assert_eq!(hit[0].metadata.chunk_index, 0);
    }

    #[test]
    fn test_index_missing_file_fails() {
        let gateway = gateway();
        let err = index_files(
            &[PathBuf::from("/nonexistent/ragline/notes.txt")],
            &DocumentLoader::new(),
            &SentenceChunker::new(),
            &ChunkingConfig::default(),
            &gateway,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to load"));
    }
}
