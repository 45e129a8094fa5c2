//! Query loader.
//!
//! Each party reads its own share of the query file: the modifier-chain
//! share, the public bucket scheme, and a list of keywords, each in the
//! four forms the circuit builder needs (original-equivalent, bucket-padded,
//! length-mask, truncated). Unknown keys are a loader error.

use crate::error::EngineError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// One query keyword, with the bucket size validated against the public
/// scheme at load time.
#[derive(Debug, Clone)]
pub struct Keyword {
    /// Informational only; never consumed by the circuit.
    pub keyword: String,
    pub bucket_size: usize,
    pub bucketed_share: String,
    pub length_mask_share: String,
    pub truncated_share: String,
}

/// Loaded query file: the modifier-chain share, the public bucket scheme,
/// and the keyword list.
#[derive(Debug, Clone)]
pub struct QueryFile {
    pub modifier_chain_share: String,
    pub bucket_scheme: Vec<usize>,
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKeywordEntry {
    /// Present only on placeholder entries that carry no keyword — entries
    /// containing only a `field` placeholder are skipped.
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    keyword_bucket_size: Option<u32>,
    #[serde(default)]
    keyword_bucketed: Option<String>,
    #[serde(default)]
    keyword_length_mask: Option<String>,
    #[serde(default)]
    keyword_truncated: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawQueryFile {
    modifier_chain_share: String,
    bucket_scheme: Vec<u32>,
    keywords: Vec<RawKeywordEntry>,
}

impl QueryFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading query file {} @{}:{}", path.display(), file!(), line!()))?;
        Self::parse(&text).with_context(|| format!("parsing query file {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let raw: RawQueryFile = serde_yaml::from_str(text)
            .with_context(|| format!("@{}:{}", file!(), line!()))?;

        let bucket_scheme: Vec<usize> = raw.bucket_scheme.iter().map(|&b| b as usize).collect();

        let mut keywords = Vec::new();
        for entry in raw.keywords {
            let Some(truncated_share) = entry.keyword_truncated else {
                continue;
            };
            let bucket_size = entry.keyword_bucket_size.unwrap_or(0) as usize;
            if !bucket_scheme.contains(&bucket_size) {
                return Err(EngineError::InvalidBucketScheme {
                    bucket_size,
                    scheme: bucket_scheme.clone(),
                }
                .into());
            }
            keywords.push(Keyword {
                keyword: entry.keyword.unwrap_or_default(),
                bucket_size,
                bucketed_share: entry.keyword_bucketed.unwrap_or_default(),
                length_mask_share: entry.keyword_length_mask.unwrap_or_default(),
                truncated_share,
            });
        }

        Ok(QueryFile {
            modifier_chain_share: raw.modifier_chain_share,
            bucket_scheme,
            keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keywords_and_skips_placeholders() {
        let text = r#"
modifier_chain_share: "AA=="
bucket_scheme: [4, 8, 16]
keywords:
  - field: placeholder_only
  - keyword: "world"
    keyword_bucket_size: 8
    keyword_bucketed: "d29ybGQAAAA="
    keyword_length_mask: "+A=="
    keyword_truncated: "d29ybGQ="
"#;
        let q = QueryFile::parse(text).unwrap();
        assert_eq!(q.bucket_scheme, vec![4, 8, 16]);
        assert_eq!(q.keywords.len(), 1);
        assert_eq!(q.keywords[0].keyword, "world");
        assert_eq!(q.keywords[0].bucket_size, 8);
    }

    #[test]
    fn rejects_bucket_size_outside_scheme() {
        let text = r#"
modifier_chain_share: "AA=="
bucket_scheme: [4, 8]
keywords:
  - keyword: "world"
    keyword_bucket_size: 16
    keyword_bucketed: "d29ybGQ="
    keyword_length_mask: "8A=="
    keyword_truncated: "d29ybGQ="
"#;
        assert!(QueryFile::parse(text).is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let text = r#"
modifier_chain_share: "AA=="
bucket_scheme: [4]
extra_key: 1
keywords: []
"#;
        assert!(QueryFile::parse(text).is_err());
    }
}
