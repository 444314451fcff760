//! Durable form of an index/corpus pair.
//!
//! Two artifacts are written together: a binary blob for the vectors and
//! a versioned JSON envelope for the passages. The envelope records a
//! digest of the vector payload; the pair only loads when both halves
//! come from the same build. Loading is all-or-nothing; a missing,
//! corrupt, or mismatched artifact makes the whole pair a cache miss and
//! the caller rebuilds from the raw documents.
//!
//! Index blob layout, all integers little-endian:
//!
//! ```text
//! u32 magic "BIDX" | u32 format version | u32 dim | u32 count
//! count * dim * f32 vector payload
//! ```

use std::fs::{self, File};
use std::hash::Hasher;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;
use twox_hash::XxHash64;

use biblio_core::error::{Error, Result};
use biblio_core::types::Passage;

use crate::flat::FlatIndex;

// "BIDX" in little-endian.
const INDEX_MAGIC: u32 = 0x5844_4942;
const INDEX_FORMAT_VERSION: u32 = 1;
const CORPUS_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct CorpusFile {
    version: u32,
    index_digest: u64,
    passages: Vec<Passage>,
}

/// Write both artifacts. Each file goes through a temp file in its
/// destination directory and is renamed into place, so readers never see
/// a torn artifact. Failure here loses durability, not the in-memory
/// state; callers keep serving from what they built.
pub fn save_pair(
    index: &FlatIndex,
    corpus: &[Passage],
    index_path: &Path,
    corpus_path: &Path,
) -> Result<()> {
    write_index(index, index_path)?;
    write_corpus(corpus, index_digest(index), corpus_path)?;
    debug!(
        vectors = index.len(),
        passages = corpus.len(),
        "persisted index pair"
    );
    Ok(())
}

/// Reload a persisted pair. `None` means cache miss, for any reason:
/// missing files, bad magic or version, torn payload, undecodable JSON,
/// a corpus written against a different index build, or a vector count
/// that disagrees with the passage count. Callers must treat `None` as
/// "rebuild from scratch"; it is never an error.
pub fn load_pair(index_path: &Path, corpus_path: &Path) -> Option<(FlatIndex, Vec<Passage>)> {
    let index = match read_index(index_path) {
        Ok(index) => index,
        Err(e) => {
            debug!(path = %index_path.display(), reason = %e, "index artifact unusable");
            return None;
        }
    };
    let (corpus, stored_digest) = match read_corpus(corpus_path) {
        Ok(parts) => parts,
        Err(e) => {
            debug!(path = %corpus_path.display(), reason = %e, "corpus artifact unusable");
            return None;
        }
    };
    let digest = index_digest(&index);
    if stored_digest != digest {
        debug!(stored = stored_digest, computed = digest, "artifacts come from different builds");
        return None;
    }
    if index.len() != corpus.len() {
        debug!(
            vectors = index.len(),
            passages = corpus.len(),
            "artifact pair out of step"
        );
        return None;
    }
    Some((index, corpus))
}

fn write_index(index: &FlatIndex, path: &Path) -> Result<()> {
    let dim = u32::try_from(index.dim()).map_err(|_| {
        Error::Persistence(format!("dimension {} does not fit the format", index.dim()))
    })?;
    let count = u32::try_from(index.len()).map_err(|_| {
        Error::Persistence(format!("vector count {} does not fit the format", index.len()))
    })?;
    let mut buf = Vec::with_capacity(16 + index.raw().len() * 4);
    buf.extend_from_slice(&INDEX_MAGIC.to_le_bytes());
    buf.extend_from_slice(&INDEX_FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&dim.to_le_bytes());
    buf.extend_from_slice(&count.to_le_bytes());
    for value in index.raw() {
        buf.extend_from_slice(&value.to_le_bytes());
    }
    write_atomic(path, &buf)
}

fn write_corpus(corpus: &[Passage], index_digest: u64, path: &Path) -> Result<()> {
    let file = CorpusFile {
        version: CORPUS_FORMAT_VERSION,
        index_digest,
        passages: corpus.to_vec(),
    };
    let bytes = serde_json::to_vec(&file)
        .map_err(|e| Error::Persistence(format!("encode corpus: {e}")))?;
    write_atomic(path, &bytes)
}

// Digest over the payload bytes as laid out in the blob. The corpus
// envelope stores it so artifacts from different builds never pair.
fn index_digest(index: &FlatIndex) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for value in index.raw() {
        hasher.write(&value.to_le_bytes());
    }
    hasher.finish()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .map_err(|e| Error::Persistence(format!("create {}: {e}", dir.display())))?;
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| Error::Persistence(format!("temp file in {}: {e}", dir.display())))?;
    tmp.write_all(bytes)
        .map_err(|e| Error::Persistence(format!("write {}: {e}", path.display())))?;
    tmp.persist(path)
        .map_err(|e| Error::Persistence(format!("persist {}: {e}", path.display())))?;
    Ok(())
}

fn read_index(path: &Path) -> anyhow::Result<FlatIndex> {
    let mut reader = BufReader::new(File::open(path)?);
    let magic = read_u32(&mut reader)?;
    if magic != INDEX_MAGIC {
        bail!("bad magic 0x{magic:08X}");
    }
    let version = read_u32(&mut reader)?;
    if version != INDEX_FORMAT_VERSION {
        bail!("unsupported index format version {version}");
    }
    let dim = read_u32(&mut reader)? as usize;
    let count = read_u32(&mut reader)? as usize;
    if dim == 0 && count > 0 {
        bail!("zero dimension with {count} vectors");
    }

    let expected = (dim as u64)
        .checked_mul(count as u64)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| anyhow!("header implies an impossible payload size"))?;
    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    if payload.len() as u64 != expected {
        bail!("vector payload is {} bytes, expected {expected}", payload.len());
    }

    let data = payload
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok(FlatIndex::from_raw(dim, data))
}

fn read_corpus(path: &Path) -> anyhow::Result<(Vec<Passage>, u64)> {
    let bytes = fs::read(path)?;
    let file: CorpusFile = serde_json::from_slice(&bytes)?;
    if file.version != CORPUS_FORMAT_VERSION {
        bail!("unsupported corpus format version {}", file.version);
    }
    Ok((file.passages, file.index_digest))
}

fn read_u32(reader: &mut impl Read) -> anyhow::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}
