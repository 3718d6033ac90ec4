//! Exact nearest-neighbour index over chunk embeddings

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{ChunkMetadata, EmbeddedChunk, EntryId, ScoredChunk};

/// How the index settles its dimension.
///
/// The retrieval pipeline always runs `Fixed`, since its embedder declares one
/// width up front. `InferFromFirstBatch` is for callers driving a
/// [`VectorIndex`] directly with vectors of a width not known in advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DimensionPolicy {
    /// The construction-time dimension is authoritative; every add must match it
    #[default]
    Fixed,
    /// An empty index adopts the width of the first batch added to it
    InferFromFirstBatch,
}

/// Flat L2 index: every search scans every vector.
///
/// Vectors live in one contiguous buffer in insertion order; `ids[i]` names the
/// vector at `vectors[i * dimension..]`. Metadata is looked up through the id,
/// so a hit whose id has no metadata is dropped instead of being reported.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    policy: DimensionPolicy,
    ids: Vec<EntryId>,
    vectors: Vec<f32>,
    metadata: HashMap<EntryId, ChunkMetadata>,
    next_id: u64,
}

impl VectorIndex {
    /// Create an empty index
    pub fn new(dimension: usize, policy: DimensionPolicy) -> Self {
        Self {
            dimension,
            policy,
            ids: Vec::new(),
            vectors: Vec::new(),
            metadata: HashMap::new(),
            next_id: 0,
        }
    }

    /// Rebuild an index from persisted parts. Callers have already checked
    /// that `vectors.len() == ids.len() * dimension`.
    pub(crate) fn from_parts(
        dimension: usize,
        policy: DimensionPolicy,
        ids: Vec<EntryId>,
        vectors: Vec<f32>,
        metadata: HashMap<EntryId, ChunkMetadata>,
        next_id: u64,
    ) -> Self {
        Self {
            dimension,
            policy,
            ids,
            vectors,
            metadata,
            next_id,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn policy(&self) -> DimensionPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Id the next appended entry will receive
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Entry ids in insertion order
    pub fn ids(&self) -> &[EntryId] {
        &self.ids
    }

    /// Flat vector buffer in insertion order
    pub fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    pub fn metadata(&self, id: EntryId) -> Option<&ChunkMetadata> {
        self.metadata.get(&id)
    }

    /// Append entries, all or nothing. Returns the ids assigned in order.
    pub fn add(&mut self, entries: Vec<EmbeddedChunk>) -> Result<Vec<EntryId>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let width = self.expected_width(entries[0].embedding.len());
        for entry in &entries {
            if entry.embedding.len() != width {
                return Err(Error::DimensionMismatch {
                    expected: width,
                    actual: entry.embedding.len(),
                });
            }
            if entry.embedding.iter().any(|v| !v.is_finite()) {
                return Err(Error::InvalidVector(format!(
                    "embedding for chunk {}..{} of '{}' has non-finite components",
                    entry.chunk.start, entry.chunk.end, entry.source
                )));
            }
        }

        if width != self.dimension {
            tracing::info!("Index adopting dimension {} from first batch", width);
            self.dimension = width;
        }

        self.ids.reserve(entries.len());
        self.vectors.reserve(entries.len() * width);

        let mut assigned = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = EntryId(self.next_id);
            self.next_id += 1;

            self.metadata.insert(id, entry.metadata());
            self.vectors.extend_from_slice(&entry.embedding);
            self.ids.push(id);
            assigned.push(id);
        }

        Ok(assigned)
    }

    /// Width a batch must have: the batch's own width only when an empty
    /// index is allowed to infer it.
    fn expected_width(&self, first: usize) -> usize {
        match self.policy {
            DimensionPolicy::InferFromFirstBatch if self.is_empty() => first,
            _ => self.dimension,
        }
    }

    /// Up to `k` nearest entries by ascending Euclidean distance.
    /// Equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .map(|v| l2_distance(query, v))
            .enumerate()
            .collect();

        // Stable sort, so ties stay in insertion order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        Ok(scored
            .into_iter()
            .filter_map(|(pos, distance)| {
                let id = self.ids[pos];
                let metadata = self.metadata.get(&id)?;
                Some(ScoredChunk {
                    id,
                    metadata: metadata.clone(),
                    distance,
                })
            })
            .take(k)
            .collect())
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    fn entry(text: &str, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: Chunk {
                text: text.to_string(),
                start: 0,
                end: text.chars().count(),
                overlap: 0,
            },
            source: "test.txt".to_string(),
            embedding,
        }
    }

    fn texts(results: &[ScoredChunk]) -> Vec<&str> {
        results.iter().map(|r| r.metadata.text.as_str()).collect()
    }

    #[test]
    fn test_empty_index_search() {
        let index = VectorIndex::new(2, DimensionPolicy::Fixed);
        assert!(index.search(&[0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_k_larger_than_len_returns_all_sorted() {
        let mut index = VectorIndex::new(2, DimensionPolicy::Fixed);
        index
            .add(vec![
                entry("far", vec![10.0, 0.0]),
                entry("near", vec![1.0, 0.0]),
                entry("mid", vec![0.0, 4.0]),
            ])
            .unwrap();

        let results = index.search(&[0.0, 0.0], 10).unwrap();
        assert_eq!(texts(&results), vec!["near", "mid", "far"]);
        assert_eq!(results[0].distance, 1.0);
        assert_eq!(results[1].distance, 4.0);
        assert_eq!(results[2].distance, 10.0);
    }

    #[test]
    fn test_k_zero_is_empty() {
        let mut index = VectorIndex::new(1, DimensionPolicy::Fixed);
        index.add(vec![entry("a", vec![1.0])]).unwrap();
        assert!(index.search(&[0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = VectorIndex::new(2, DimensionPolicy::Fixed);
        index
            .add(vec![
                entry("first", vec![1.0, 0.0]),
                entry("second", vec![0.0, 1.0]),
                entry("third", vec![-1.0, 0.0]),
            ])
            .unwrap();

        let results = index.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(texts(&results), vec!["first", "second"]);
    }

    #[test]
    fn test_mismatched_batch_appends_nothing() {
        let mut index = VectorIndex::new(3, DimensionPolicy::Fixed);
        index.add(vec![entry("ok", vec![0.0, 0.0, 0.0])]).unwrap();

        let err = index
            .add(vec![
                entry("fine", vec![1.0, 1.0, 1.0]),
                entry("short", vec![1.0, 1.0]),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
        assert_eq!(index.len(), 1);
        assert_eq!(index.next_id(), 1);
    }

    #[test]
    fn test_non_finite_vector_rejected() {
        let mut index = VectorIndex::new(2, DimensionPolicy::Fixed);
        let err = index.add(vec![entry("nan", vec![f32::NAN, 0.0])]).unwrap_err();
        assert!(matches!(err, Error::InvalidVector(_)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_fixed_policy_rejects_other_width_on_empty_index() {
        let mut index = VectorIndex::new(768, DimensionPolicy::Fixed);
        let err = index.add(vec![entry("a", vec![0.0; 384])]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 768, actual: 384 }));
    }

    #[test]
    fn test_infer_policy_adopts_first_batch_width() {
        let mut index = VectorIndex::new(768, DimensionPolicy::InferFromFirstBatch);
        index.add(vec![entry("a", vec![0.0; 4])]).unwrap();
        assert_eq!(index.dimension(), 4);

        // Once populated the width is locked
        assert!(index.add(vec![entry("b", vec![0.0; 5])]).is_err());
        assert!(index.search(&[0.0; 5], 1).is_err());
    }

    #[test]
    fn test_ids_are_monotonic_and_resolve() {
        let mut index = VectorIndex::new(1, DimensionPolicy::Fixed);
        let first = index.add(vec![entry("a", vec![0.0]), entry("b", vec![1.0])]).unwrap();
        let second = index.add(vec![entry("c", vec![2.0])]).unwrap();
        assert_eq!(first, vec![EntryId(0), EntryId(1)]);
        assert_eq!(second, vec![EntryId(2)]);

        let hit = &index.search(&[2.1], 1).unwrap()[0];
        assert_eq!(hit.id, EntryId(2));
        assert_eq!(hit.metadata.text, "c");
    }

    #[test]
    fn test_unresolvable_ids_are_filtered() {
        let mut metadata = HashMap::new();
        metadata.insert(
            EntryId(1),
            entry("kept", vec![0.0]).metadata(),
        );
        let index = VectorIndex::from_parts(
            1,
            DimensionPolicy::Fixed,
            vec![EntryId(0), EntryId(1)],
            vec![0.0, 5.0],
            metadata,
            2,
        );

        let results = index.search(&[0.0], 2).unwrap();
        assert_eq!(texts(&results), vec!["kept"]);
    }
}
