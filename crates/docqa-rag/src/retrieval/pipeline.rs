//! Ingestion and query flow over one shared vector index

use parking_lot::{RwLock, RwLockWriteGuard};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::embeddings::Embedder;
use crate::error::{Error, Result};
use crate::ingestion::{display_name, DocumentExtractor, ExtractedText, TextChunker};
use crate::providers::EmbeddingProvider;
use crate::types::{DocumentSummary, EmbeddedChunk, IngestReport, ScoredChunk};

use super::index::{DimensionPolicy, VectorIndex};
use super::store::{self, StorePaths};

/// Default number of chunks returned by [`RetrievalPipeline::query`]
pub const DEFAULT_TOP_K: usize = 3;

/// Owns the index, the embedder and the chunker.
///
/// Searches share a read lock and see a consistent snapshot. An ingest batch
/// is appended under the write lock, which is then downgraded so searches can
/// resume while the batch is written to disk.
pub struct RetrievalPipeline {
    index: Arc<RwLock<VectorIndex>>,
    embedder: Embedder,
    extractor: Arc<dyn DocumentExtractor>,
    chunker: TextChunker,
    paths: StorePaths,
}

impl RetrievalPipeline {
    /// Load the persisted index, or start empty when neither file exists.
    /// Touches nothing on disk.
    pub fn open(
        config: &RagConfig,
        provider: Arc<dyn EmbeddingProvider>,
        extractor: Arc<dyn DocumentExtractor>,
    ) -> Result<Self> {
        let embedder = Embedder::new(provider, config.embeddings.batch_size);
        let chunker = TextChunker::from_config(&config.chunking)?;
        let paths = StorePaths::from_base(config.storage.index_base());
        let policy = DimensionPolicy::Fixed;

        let index = if paths.any_exists() {
            let index = store::load(&paths, policy)?;
            if !index.is_empty() && index.dimension() != embedder.dimension() {
                return Err(Error::DimensionMismatch {
                    expected: index.dimension(),
                    actual: embedder.dimension(),
                });
            }
            index
        } else {
            tracing::info!(
                "No index at {}; starting empty (dimension {})",
                paths.index.display(),
                embedder.dimension()
            );
            VectorIndex::new(embedder.dimension(), policy)
        };

        Ok(Self {
            index: Arc::new(RwLock::new(index)),
            embedder,
            extractor,
            chunker,
            paths,
        })
    }

    /// Extract, chunk and embed every file, then append everything in one
    /// batch and persist it.
    ///
    /// Per-file problems are recorded in the report and the rest of the batch
    /// goes ahead. Only failures of the final append or save are returned as
    /// `Err`; if the save fails the entries stay searchable in memory.
    pub async fn ingest(&self, paths: &[PathBuf]) -> Result<IngestReport> {
        let started = Instant::now();
        let mut report = IngestReport::default();
        let mut pending: Vec<EmbeddedChunk> = Vec::new();

        for path in paths {
            let filename = display_name(path);
            match self.process_file(path, &filename).await {
                Ok((summary, embedded)) => {
                    tracing::info!(
                        "Processed {} ({} chunks)",
                        filename,
                        summary.total_chunks
                    );
                    report.total_chunks_created += summary.total_chunks;
                    report.documents.push(summary);
                    pending.extend(embedded);
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", filename, e);
                    report.record_failure(&filename, &e);
                }
            }
        }

        if !pending.is_empty() {
            let index = Arc::clone(&self.index);
            let store_paths = self.paths.clone();

            tokio::task::spawn_blocking(move || -> Result<()> {
                let mut guard = index.write();
                guard.add(pending)?;
                let guard = RwLockWriteGuard::downgrade(guard);
                store::save(&guard, &store_paths)
            })
            .await
            .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;
        }

        report.processing_time_ms = started.elapsed().as_millis() as u64;
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    async fn process_file(
        &self,
        path: &Path,
        filename: &str,
    ) -> Result<(DocumentSummary, Vec<EmbeddedChunk>)> {
        let extractor = Arc::clone(&self.extractor);
        let owned = path.to_path_buf();
        let ExtractedText { file_type, text } =
            tokio::task::spawn_blocking(move || extractor.extract(&owned))
                .await
                .map_err(|e| Error::internal(format!("Task join error: {}", e)))??;

        if text.trim().is_empty() {
            return Err(Error::NoText(filename.to_string()));
        }

        let chunks = self.chunker.chunk(&text);
        let embedded = self.embedder.embed_many(chunks, filename).await?;

        let summary = DocumentSummary {
            filename: filename.to_string(),
            file_type,
            text_length: text.chars().count(),
            total_chunks: embedded.len(),
            ingested_at: chrono::Utc::now(),
        };
        Ok((summary, embedded))
    }

    /// Up to `top_k` chunks nearest to `question`
    pub async fn query(&self, question: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        if top_k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed_one(question).await?;
        let results = self.index.read().search(&embedding, top_k)?;

        tracing::debug!("Query matched {} chunks", results.len());
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.read().dimension()
    }

    pub fn store_paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Distinct source files in the index, in first-ingested order
    pub fn sources(&self) -> Vec<String> {
        let index = self.index.read();
        let mut seen = Vec::new();
        for &id in index.ids() {
            if let Some(meta) = index.metadata(id) {
                if !seen.contains(&meta.source) {
                    seen.push(meta.source.clone());
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::FileExtractor;
    use crate::testing::HashEmbedder;

    fn test_config(dir: &Path) -> RagConfig {
        let mut config = RagConfig::default();
        config.storage.data_dir = dir.join("processed");
        config.storage.raw_dir = dir.join("raw");
        config.embeddings.dimensions = 64;
        config.chunking.chunk_size = 80;
        config.chunking.chunk_overlap = 10;
        config
    }

    fn open(config: &RagConfig) -> Result<RetrievalPipeline> {
        RetrievalPipeline::open(config, Arc::new(HashEmbedder::new(64)), Arc::new(FileExtractor))
    }

    #[test]
    fn test_open_fresh_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let pipeline = open(&config).unwrap();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.dimension(), 64);
        assert!(!config.storage.data_dir.exists());
    }

    #[tokio::test]
    async fn test_ingest_then_query_finds_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let doc = dir.path().join("ysj.txt");
        std::fs::write(&doc, "YSJ offers a Computer Science degree.").unwrap();

        let pipeline = open(&config).unwrap();
        let report = pipeline.ingest(&[doc]).await.unwrap();
        assert!(report.is_complete_success());
        assert_eq!(report.total_chunks_created, 1);
        assert!(pipeline.store_paths().exists());

        let results = pipeline
            .query("What degrees does YSJ offer?", DEFAULT_TOP_K)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].metadata.text.contains("Computer Science"));
        assert_eq!(results[0].metadata.source, "ysj.txt");
    }

    #[tokio::test]
    async fn test_reopen_answers_identically() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let doc = dir.path().join("campus.md");
        std::fs::write(
            &doc,
            "The library opens at 8am on weekdays. Parking is available near the main \
             entrance. Computer Science lectures take place in the De Grey building. \
             Students can book study rooms online through the portal.",
        )
        .unwrap();

        let pipeline = open(&config).unwrap();
        pipeline.ingest(&[doc]).await.unwrap();
        let before = pipeline.query("where are lectures", 3).await.unwrap();

        let reopened = open(&config).unwrap();
        assert_eq!(reopened.len(), pipeline.len());
        assert_eq!(reopened.query("where are lectures", 3).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_bad_files_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let good = dir.path().join("good.txt");
        let empty = dir.path().join("empty.txt");
        let sheet = dir.path().join("grades.xlsx");
        std::fs::write(&good, "Term starts in September.").unwrap();
        std::fs::write(&empty, "   \n").unwrap();
        std::fs::write(&sheet, "x").unwrap();

        let pipeline = open(&config).unwrap();
        let report = pipeline
            .ingest(&[dir.path().join("missing.pdf"), empty, sheet, good])
            .await
            .unwrap();

        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].filename, "good.txt");
        assert_eq!(report.errors.len(), 3);
        assert_eq!(pipeline.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_ingested_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, "").unwrap();

        let pipeline = open(&config).unwrap();
        let report = pipeline.ingest(&[empty]).await.unwrap();
        assert!(report.documents.is_empty());
        assert!(!pipeline.store_paths().any_exists());
    }

    #[tokio::test]
    async fn test_query_on_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = open(&test_config(dir.path())).unwrap();
        assert!(pipeline.query("anything", 3).await.unwrap().is_empty());
    }

    #[test]
    fn test_half_written_store_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let paths = StorePaths::from_base(config.storage.index_base());
        std::fs::create_dir_all(&config.storage.data_dir).unwrap();
        std::fs::write(&paths.meta, "{}").unwrap();

        assert!(matches!(open(&config), Err(Error::CorruptStore { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_search_during_ingest_sees_whole_batches() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let doc = dir.path().join("long.txt");
        let text = "Admissions open in October. ".repeat(40);
        std::fs::write(&doc, &text).unwrap();
        let expected = crate::ingestion::chunk_text(&text, 80, 10).unwrap().len();

        let pipeline = Arc::new(open(&config).unwrap());
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move {
                    for _ in 0..50 {
                        let hits = pipeline.query("admissions", 1000).await.unwrap();
                        assert!(hits.is_empty() || hits.len() == expected);
                        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        let report = pipeline.ingest(&[doc]).await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }

        assert!(expected > 1);
        assert_eq!(report.total_chunks_created, expected);
        assert_eq!(pipeline.len(), expected);
    }
}
