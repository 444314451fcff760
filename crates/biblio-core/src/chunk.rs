//! Fixed-window chunking of raw document text.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Window geometry for splitting documents into passages.
///
/// Consecutive windows share `overlap` characters, so the window start
/// advances by `chunk_size - overlap` each step. Lengths are counted in
/// characters, not bytes, so a window never splits a UTF-8 sequence.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    /// Reject geometry that cannot terminate. `overlap >= chunk_size`
    /// makes the step non-positive, which would loop forever; it is
    /// refused rather than clamped.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".to_string()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Split `text` into overlapping windows of `chunk_size` characters, the
/// last one clipped to the text length. Each window is trimmed before it
/// is emitted and windows that trim to nothing are dropped, so the result
/// holds only non-empty chunks. Empty input yields an empty vec.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    config.validate()?;
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        start += config.step();
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig { chunk_size, overlap }
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunk_text("", &cfg(1000, 200)).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn window_geometry_is_exact() {
        let chunks = chunk_text("abcdefghij", &cfg(4, 2)).unwrap();
        assert_eq!(chunks, vec!["abcd", "cdef", "efgh", "ghij", "ij"]);
    }

    #[test]
    fn overlapping_windows_reconstruct_the_text() {
        let text: String = ('a'..='z').cycle().take(2500).collect();
        let config = cfg(1000, 200);
        let chunks = chunk_text(&text, &config).unwrap();

        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(config.overlap));
        }
        assert_eq!(rebuilt, text, "chunks minus overlaps cover the text with no gaps");
    }

    #[test]
    fn windows_are_trimmed_and_blank_ones_dropped() {
        let chunks = chunk_text("ab       cd", &cfg(4, 0)).unwrap();
        assert_eq!(chunks, vec!["ab", "cd"]);
    }

    #[test]
    fn windows_count_characters_not_bytes() {
        let chunks = chunk_text("ααββγγ", &cfg(2, 0)).unwrap();
        assert_eq!(chunks, vec!["αα", "ββ", "γγ"]);
    }

    #[test]
    fn overlap_equal_to_chunk_size_is_rejected() {
        let err = chunk_text("anything", &cfg(10, 10)).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(cfg(0, 0).validate().is_err());
    }

    #[test]
    fn final_window_is_clipped() {
        let chunks = chunk_text("abcde", &cfg(3, 1)).unwrap();
        assert_eq!(chunks, vec!["abc", "cde", "e"]);
    }
}
