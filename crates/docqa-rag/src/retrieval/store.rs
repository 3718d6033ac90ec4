//! On-disk persistence of the vector index
//!
//! An index is stored as two files next to each other:
//! - `<base>.index`: bincode, holding the dimension, ids and the flat vector buffer
//! - `<base>_meta.json`: pretty JSON, holding the per-entry metadata
//!
//! Each file is replaced atomically. The pair is only accepted on load when
//! both agree on dimension and id order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::types::{ChunkMetadata, EntryId};

use super::index::{DimensionPolicy, VectorIndex};

const INDEX_MAGIC: [u8; 8] = *b"DOCQAIDX";
const FORMAT_VERSION: u32 = 1;

/// Paths of the two files making up a persisted index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub index: PathBuf,
    pub meta: PathBuf,
}

impl StorePaths {
    /// Derive both paths from a base path such as `processed/vector_store`
    pub fn from_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let name = base
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            index: base.with_file_name(format!("{}.index", name)),
            meta: base.with_file_name(format!("{}_meta.json", name)),
        }
    }

    /// Both files are present
    pub fn exists(&self) -> bool {
        self.index.exists() && self.meta.exists()
    }

    /// At least one file is present
    pub fn any_exists(&self) -> bool {
        self.index.exists() || self.meta.exists()
    }
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    magic: [u8; 8],
    version: u32,
    dimension: u64,
    ids: Vec<u64>,
    vectors: Vec<f32>,
}

#[derive(Serialize, Deserialize)]
struct MetaFile {
    version: u32,
    dimension: usize,
    next_id: u64,
    entries: Vec<MetaEntry>,
}

#[derive(Serialize, Deserialize)]
struct MetaEntry {
    id: EntryId,
    #[serde(flatten)]
    metadata: ChunkMetadata,
}

/// Write both files, each through a temp file renamed into place
pub fn save(index: &VectorIndex, paths: &StorePaths) -> Result<()> {
    let index_file = IndexFile {
        magic: INDEX_MAGIC,
        version: FORMAT_VERSION,
        dimension: index.dimension() as u64,
        ids: index.ids().iter().map(|id| id.0).collect(),
        vectors: index.vectors().to_vec(),
    };
    let encoded = bincode::serde::encode_to_vec(&index_file, bincode::config::standard())
        .map_err(|e| Error::persistence(format!("Failed to encode index: {}", e)))?;

    let mut entries = Vec::with_capacity(index.len());
    for &id in index.ids() {
        let metadata = index.metadata(id).ok_or_else(|| {
            Error::internal(format!("entry {} has no metadata", id))
        })?;
        entries.push(MetaEntry {
            id,
            metadata: metadata.clone(),
        });
    }
    let meta_file = MetaFile {
        version: FORMAT_VERSION,
        dimension: index.dimension(),
        next_id: index.next_id(),
        entries,
    };
    let meta_json = serde_json::to_vec_pretty(&meta_file)?;

    write_atomic(&paths.index, &encoded)?;
    write_atomic(&paths.meta, &meta_json)?;

    tracing::debug!(
        "Saved index with {} entries to {}",
        index.len(),
        paths.index.display()
    );
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| {
        Error::persistence(format!("Failed to create '{}': {}", parent.display(), e))
    })?;

    let mut tmp = NamedTempFile::new_in(parent)
        .map_err(|e| Error::persistence(format!("Failed to create temp file: {}", e)))?;
    tmp.write_all(data)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::persistence(format!("Failed to write '{}': {}", path.display(), e)))?;
    tmp.persist(path).map_err(|e| {
        Error::persistence(format!("Failed to replace '{}': {}", path.display(), e.error))
    })?;
    Ok(())
}

/// Read both files back and check they describe the same index
pub fn load(paths: &StorePaths, policy: DimensionPolicy) -> Result<VectorIndex> {
    if !paths.exists() {
        let missing = if paths.index.exists() { &paths.meta } else { &paths.index };
        return Err(Error::corrupt(missing, "file missing"));
    }

    let bytes = std::fs::read(&paths.index)
        .map_err(|e| Error::persistence(format!("Failed to read '{}': {}", paths.index.display(), e)))?;
    let (index_file, _): (IndexFile, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| Error::corrupt(&paths.index, format!("undecodable: {}", e)))?;

    if index_file.magic != INDEX_MAGIC {
        return Err(Error::corrupt(&paths.index, "not an index file"));
    }
    if index_file.version != FORMAT_VERSION {
        return Err(Error::corrupt(
            &paths.index,
            format!("unsupported format version {}", index_file.version),
        ));
    }

    let raw_meta = std::fs::read(&paths.meta)
        .map_err(|e| Error::persistence(format!("Failed to read '{}': {}", paths.meta.display(), e)))?;
    let meta_file: MetaFile = serde_json::from_slice(&raw_meta)
        .map_err(|e| Error::corrupt(&paths.meta, format!("invalid JSON: {}", e)))?;

    let dimension = usize::try_from(index_file.dimension)
        .map_err(|_| Error::corrupt(&paths.index, "dimension out of range"))?;
    if dimension == 0 {
        return Err(Error::corrupt(&paths.index, "dimension is zero"));
    }
    if meta_file.dimension != dimension {
        return Err(Error::corrupt(
            &paths.meta,
            format!(
                "dimension {} disagrees with index dimension {}",
                meta_file.dimension, dimension
            ),
        ));
    }
    let expected_floats = index_file
        .ids
        .len()
        .checked_mul(dimension)
        .ok_or_else(|| Error::corrupt(&paths.index, "dimension out of range"))?;
    if index_file.vectors.len() != expected_floats {
        return Err(Error::corrupt(
            &paths.index,
            format!(
                "{} floats for {} ids of dimension {}",
                index_file.vectors.len(),
                index_file.ids.len(),
                dimension
            ),
        ));
    }

    let meta_ids = meta_file.entries.iter().map(|e| e.id.0);
    if !index_file.ids.iter().copied().eq(meta_ids) {
        return Err(Error::corrupt(
            &paths.meta,
            "entry ids disagree with the index file",
        ));
    }

    let ids: Vec<EntryId> = index_file.ids.into_iter().map(EntryId).collect();
    let max_id = ids.iter().map(|id| id.0.saturating_add(1)).max().unwrap_or(0);
    let metadata: HashMap<EntryId, ChunkMetadata> = meta_file
        .entries
        .into_iter()
        .map(|e| (e.id, e.metadata))
        .collect();

    tracing::info!(
        "Loaded index with {} entries (dimension {}) from {}",
        ids.len(),
        dimension,
        paths.index.display()
    );

    Ok(VectorIndex::from_parts(
        dimension,
        policy,
        ids,
        index_file.vectors,
        metadata,
        meta_file.next_id.max(max_id),
    ))
}
