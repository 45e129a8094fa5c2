//! Index file loader.
//!
//! An index file is a precomputed inverted index: for each public bucket
//! size, a list of `(word, occurrence-string)` pairs. The occurrence string
//! is opaque to the engine — post-hoc lookup of which emails a matched word
//! occurs in happens outside the engine.

use crate::error::EngineError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One indexed word, tagged with its own bucket size and its position
/// within that bucket's list, so outside tooling can correlate a result
/// wire back to an occurrence string without the engine inspecting it.
#[derive(Debug, Clone)]
pub struct IndexWord {
    pub word_share: String,
    pub occurrence_share: String,
    pub bucket_size: usize,
    pub position: usize,
}

/// The loaded index: total email count plus every indexed word, in
/// deterministic order (ascending bucket size, then file-iteration order
/// within a bucket).
#[derive(Debug, Clone)]
pub struct SearchIndex {
    pub num_of_emails: usize,
    pub words: Vec<IndexWord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIndexFile {
    num_of_emails: u32,
    #[serde(rename = "INDEX_BUCKETS")]
    index_buckets: BTreeMap<u32, Vec<BTreeMap<String, String>>>,
}

pub fn load_index(path: &Path, bucket_scheme: &[usize]) -> Result<SearchIndex> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading index file {} @{}:{}", path.display(), file!(), line!()))?;
    let raw: RawIndexFile = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing index file {} @{}:{}", path.display(), file!(), line!()))?;

    let mut words = Vec::new();
    for (bucket_size, entries) in raw.index_buckets {
        let bucket_size = bucket_size as usize;
        if !bucket_scheme.contains(&bucket_size) {
            return Err(EngineError::InvalidBucketScheme {
                bucket_size,
                scheme: bucket_scheme.to_vec(),
            }
            .into());
        }
        for (position, entry) in entries.into_iter().enumerate() {
            let (word_share, occurrence_share) = entry.into_iter().next().ok_or_else(|| {
                EngineError::MalformedShareFile {
                    path: path.display().to_string(),
                    reason: format!("empty index word entry at bucket {bucket_size} position {position}"),
                }
            })?;
            words.push(IndexWord {
                word_share,
                occurrence_share,
                bucket_size,
                position,
            });
        }
    }

    Ok(SearchIndex {
        num_of_emails: raw.num_of_emails as usize,
        words,
    })
}
