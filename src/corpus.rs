//! Corpus loader.
//!
//! Iterates per-mail share files in a directory and assembles a dense,
//! sequence-number-indexed vector of [`Mail`] records, so the builder can
//! enumerate mails in deterministic public order.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One email's decoded share-file contents.
///
/// `subject` and `block_share` are carried through because the file format
/// defines them, but neither participates in circuit construction: the
/// subject is metadata, and `block_share` is not the field the builder
/// searches (that's `truncated_block_share`, the truncated-to-block-length
/// form the comparison actually runs against).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mail {
    pub sequence_number: usize,
    pub subject: String,
    pub block_share: String,
    pub truncated_block_share: String,
    /// `bucket_size -> per-word share strings`, restricted to bucket sizes
    /// present in the public bucket scheme.
    pub bucket_words_share: BTreeMap<usize, Vec<String>>,
}

impl Mail {
    /// An absent sequence number contributes this record: empty shares
    /// decode to zero input wires, so it can never match anything. Keeps the
    /// per-mail output vector's length and ordering stable even when the
    /// corpus directory has gaps.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMailFile {
    sequence_number: u32,
    subject: String,
    secret_share_block: String,
    secret_share_truncated_block: String,
    secret_share_bucket_blocks: BTreeMap<u32, Vec<String>>,
}

/// Load every mail share file directly under `dir`, indexed densely by
/// sequence number. Missing sequence numbers (holes up to the maximum seen)
/// become [`Mail::empty`] records.
pub fn load_corpus(dir: &Path, bucket_scheme: &[usize]) -> Result<Vec<Mail>> {
    let mut parsed: Vec<(std::path::PathBuf, RawMailFile)> = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("reading mail directory {} @{}:{}", dir.display(), file!(), line!()))?
    {
        let entry = entry.with_context(|| format!("@{}:{}", file!(), line!()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading mail file {} @{}:{}", path.display(), file!(), line!()))?;
        let raw: RawMailFile = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing mail file {} @{}:{}", path.display(), file!(), line!()))?;
        parsed.push((path, raw));
    }

    let max_seq = parsed.iter().map(|(_, r)| r.sequence_number as usize).max();
    let len = max_seq.map(|m| m + 1).unwrap_or(0);
    let mut mails = vec![Mail::empty(); len];

    for (path, raw) in parsed {
        let seq = raw.sequence_number as usize;
        let mut bucket_words_share = BTreeMap::new();
        for (bucket_size, words) in raw.secret_share_bucket_blocks {
            let bucket_size = bucket_size as usize;
            if bucket_scheme.contains(&bucket_size) {
                bucket_words_share.insert(bucket_size, words);
            }
        }
        let _ = &path;
        mails[seq] = Mail {
            sequence_number: seq,
            subject: raw.subject,
            block_share: raw.secret_share_block,
            truncated_block_share: raw.secret_share_truncated_block,
            bucket_words_share,
        };
    }

    Ok(mails)
}
