//! Statistics report: what the driver prints (or writes as JSON) once a run
//! completes. Every field is derived from public shapes only — nothing here
//! ever depends on a decoded share's value.

use crate::backend::CommStats;
use crate::cli::SearchMode;
use crate::corpus::Mail;
use crate::encoding::base64_char_len;
use crate::query::QueryFile;
use serde::Serialize;
use std::fmt;

/// A finished run's public statistics: identity/scale counters plus the
/// backend's communication/timing counters, flattened into one record.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub project_name: &'static str,
    pub protocol: &'static str,
    pub search_mode: String,
    pub num_of_parties: usize,
    pub num_of_emails: usize,
    pub num_of_emails_in_index: usize,
    pub keyword_characters: usize,
    pub keyword_buckets: usize,
    pub email_characters: usize,
    #[serde(flatten)]
    pub backend: CommStats,
}

impl Stats {
    /// Assemble from the resolved mode/query/corpus plus the backend's own
    /// counters. `num_of_emails_in_index` is 0 outside index mode.
    pub fn new(
        search_mode: SearchMode,
        num_of_parties: usize,
        query: &QueryFile,
        mails: &[Mail],
        num_of_emails_in_index: usize,
        backend: CommStats,
    ) -> Self {
        let keyword_characters = query
            .keywords
            .iter()
            .map(|k| base64_char_len(&k.truncated_share))
            .sum();
        let email_characters = mails
            .iter()
            .map(|m| base64_char_len(&m.truncated_block_share))
            .sum();

        Stats {
            project_name: "PrivMail",
            protocol: "BooleanGMW",
            search_mode: search_mode.to_string(),
            num_of_parties,
            num_of_emails: mails.len(),
            num_of_emails_in_index,
            keyword_characters,
            keyword_buckets: query.keywords.len(),
            email_characters,
            backend,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "project_name: {}", self.project_name)?;
        writeln!(f, "protocol: {}", self.protocol)?;
        writeln!(f, "search_mode: {}", self.search_mode)?;
        writeln!(f, "num_of_parties: {}", self.num_of_parties)?;
        writeln!(f, "num_of_emails: {}", self.num_of_emails)?;
        writeln!(f, "num_of_emails_in_index: {}", self.num_of_emails_in_index)?;
        writeln!(f, "keyword_characters: {}", self.keyword_characters)?;
        writeln!(f, "keyword_buckets: {}", self.keyword_buckets)?;
        writeln!(f, "email_characters: {}", self.email_characters)?;
        writeln!(f, "runtime_ms: {}", self.backend.runtime_ms)?;
        writeln!(f, "bytes_sent: {}", self.backend.bytes_sent)?;
        writeln!(f, "bytes_received: {}", self.backend.bytes_received)?;
        writeln!(f, "and_gates: {}", self.backend.and_gates)?;
        writeln!(f, "rounds: {}", self.backend.rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Keyword;
    use std::collections::BTreeMap;

    #[test]
    fn counts_characters_from_truncated_shares() {
        use base64::Engine as _;
        let b64 = |s: &str| base64::engine::general_purpose::STANDARD.encode(s.as_bytes());

        let query = QueryFile {
            modifier_chain_share: b64("\0"),
            bucket_scheme: vec![8],
            keywords: vec![Keyword {
                keyword: "world".to_string(),
                bucket_size: 8,
                bucketed_share: b64("world\0\0\0"),
                length_mask_share: b64("\xf8"),
                truncated_share: b64("world"),
            }],
        };
        let mails = vec![Mail {
            sequence_number: 0,
            subject: String::new(),
            block_share: String::new(),
            truncated_block_share: b64("hello world"),
            bucket_words_share: BTreeMap::new(),
        }];

        let stats = Stats::new(SearchMode::Normal, 2, &query, &mails, 0, CommStats::default());
        assert_eq!(stats.keyword_characters, 5);
        assert_eq!(stats.keyword_buckets, 1);
        assert_eq!(stats.email_characters, 11);
        assert_eq!(stats.num_of_emails, 1);
    }

    #[test]
    fn display_prints_one_line_per_field() {
        let query = QueryFile {
            modifier_chain_share: String::new(),
            bucket_scheme: vec![],
            keywords: vec![],
        };
        let stats = Stats::new(SearchMode::Index, 3, &query, &[], 42, CommStats::default());
        let text = stats.to_string();
        assert!(text.contains("num_of_emails_in_index: 42"));
        assert!(text.contains("protocol: BooleanGMW"));
    }
}
