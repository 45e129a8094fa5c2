//! Search circuit builder: the engine's core. Given the loaders' outputs and
//! a selected mode, constructs one result wire per mail (normal/hidden/
//! bucket) or per indexed word (index), never branching on a secret value —
//! every `match` on [`SearchMode`] below decides purely on the (public) CLI
//! flag, not on any decoded share.

pub mod chain;
pub mod compare;
pub mod modes;
pub mod reduce;

use crate::cli::SearchMode;
use crate::corpus::Mail;
use crate::error::EngineError;
use crate::index::SearchIndex;
use crate::input::InputBuilder;
use crate::query::{Keyword, QueryFile};
use crate::wire::{split_to_bits, Circuit, WireId};
use anyhow::Result;
use std::collections::BTreeMap;

/// One query keyword, materialised into wires.
struct KeywordWires {
    bucket_size: usize,
    truncated: Vec<WireId>,
    bucketed: Vec<WireId>,
    length_mask: Vec<WireId>,
}

/// One mail, materialised into wires.
struct MailWires {
    truncated: Vec<WireId>,
    buckets: BTreeMap<usize, Vec<Vec<WireId>>>,
}

/// Feed a Base64 share as a bit string rather than a byte string: decode to
/// 8-bit input wires as usual, then split every byte back into its
/// individual bits MSB-first, optionally truncating the trailing padding
/// bits of the last byte (used for the modifier chain and length masks,
/// which are bit strings, not character sequences).
fn feed_bits(
    c: &mut Circuit,
    input: &mut InputBuilder,
    share: &str,
    take: Option<usize>,
) -> Result<Vec<WireId>, EngineError> {
    let bytes = input.feed(c, share)?;
    let mut bits = Vec::new();
    for byte in bytes {
        bits.extend(split_to_bits(c, byte)?);
    }
    if let Some(n) = take {
        bits.truncate(n);
    }
    Ok(bits)
}

fn feed_keyword(c: &mut Circuit, input: &mut InputBuilder, kw: &Keyword) -> Result<KeywordWires, EngineError> {
    let truncated = input.feed(c, &kw.truncated_share)?;
    let bucketed = input.feed(c, &kw.bucketed_share)?;
    let length_mask = feed_bits(c, input, &kw.length_mask_share, Some(kw.bucket_size))?;
    Ok(KeywordWires {
        bucket_size: kw.bucket_size,
        truncated,
        bucketed,
        length_mask,
    })
}

fn feed_mail(c: &mut Circuit, input: &mut InputBuilder, mail: &Mail) -> Result<MailWires, EngineError> {
    let truncated = input.feed(c, &mail.truncated_block_share)?;
    let mut buckets = BTreeMap::new();
    for (&bucket_size, words) in &mail.bucket_words_share {
        let wires: Vec<Vec<WireId>> = words
            .iter()
            .map(|w| input.feed(c, w))
            .collect::<Result<_, _>>()?;
        buckets.insert(bucket_size, wires);
    }
    Ok(MailWires { truncated, buckets })
}

/// Build the search circuit for one party. Returns one 1-bit result wire
/// per mail (normal/hidden/bucket mode) or per indexed word (index mode),
/// in deterministic public order: mail sequence-number order, or index
/// ascending-bucket-size/file-iteration order. This order must be identical
/// across parties, since each party reads it off its own local share files.
pub fn build_search_circuit(
    c: &mut Circuit,
    input: &mut InputBuilder,
    mode: SearchMode,
    query: &QueryFile,
    mails: &[Mail],
    index: Option<&SearchIndex>,
) -> Result<Vec<WireId>> {
    let scheme = &query.bucket_scheme;

    let chain_bits = feed_bits(c, input, &query.modifier_chain_share, None)?;

    let keywords: Vec<KeywordWires> = query
        .keywords
        .iter()
        .map(|kw| feed_keyword(c, input, kw))
        .collect::<Result<Vec<_>, EngineError>>()?;

    if mode == SearchMode::Index {
        let index = index.ok_or_else(|| {
            EngineError::InvalidSearchMode("index mode requires an index file".to_string())
        })?;
        return build_index_targets(c, input, &keywords, &chain_bits, scheme, index);
    }

    let mail_wires: Vec<MailWires> = mails
        .iter()
        .map(|m| feed_mail(c, input, m))
        .collect::<Result<Vec<_>, EngineError>>()?;

    let mut results = Vec::with_capacity(mail_wires.len());
    for mail in &mail_wires {
        let mut matches = Vec::with_capacity(keywords.len());
        for kw in &keywords {
            let m = match mode {
                SearchMode::Normal => modes::normal_match(c, &mail.truncated, &kw.truncated)?,
                SearchMode::Hidden => modes::hidden_match(
                    c,
                    &mail.truncated,
                    &kw.bucketed,
                    &kw.length_mask,
                    scheme,
                    kw.bucket_size,
                )?,
                SearchMode::Bucket => modes::bucket_match(
                    c,
                    &mail.buckets,
                    &kw.bucketed,
                    &kw.length_mask,
                    scheme,
                    kw.bucket_size,
                )?,
                SearchMode::Index => unreachable!("index mode handled above"),
            };
            matches.push(m);
        }
        results.push(chain::chain_keywords(c, &matches, &chain_bits)?);
    }
    Ok(results)
}

fn build_index_targets(
    c: &mut Circuit,
    input: &mut InputBuilder,
    keywords: &[KeywordWires],
    chain_bits: &[WireId],
    scheme: &[usize],
    index: &SearchIndex,
) -> Result<Vec<WireId>> {
    let mut results = Vec::with_capacity(index.words.len());
    for word in &index.words {
        let word_chars = input.feed(c, &word.word_share)?;
        let mut matches = Vec::with_capacity(keywords.len());
        for kw in keywords {
            let m = modes::index_match(
                c,
                &word_chars,
                word.bucket_size,
                &kw.bucketed,
                &kw.length_mask,
                scheme,
                kw.bucket_size,
            )?;
            matches.push(m);
        }
        results.push(chain::chain_keywords(c, &matches, chain_bits)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{declassify, run_circuit_multiparty};
    use crate::corpus::Mail;
    use crate::index::IndexWord;
    use crate::query::Keyword;
    use base64::Engine as _;

    fn b64(s: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(s.as_bytes())
    }

    fn bit_mask_share(bits: &[bool]) -> String {
        let byte = bits
            .iter()
            .fold(0u8, |acc, &b| (acc << 1) | b as u8);
        base64::engine::general_purpose::STANDARD.encode([byte])
    }

    fn run_and_declassify(c: &Circuit, inputs: Vec<bool>, out: WireId) -> bool {
        let zeros = vec![false; inputs.len()];
        let shares = run_circuit_multiparty(c, &[inputs, zeros]);
        declassify(&[shares[0][out as usize].clone(), shares[1][out as usize].clone()])[0]
    }

    #[test]
    fn output_width_is_always_one_bit() {
        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let query = QueryFile {
            modifier_chain_share: b64("\0"),
            bucket_scheme: vec![],
            keywords: vec![Keyword {
                keyword: "world".to_string(),
                bucket_size: 0,
                bucketed_share: String::new(),
                length_mask_share: String::new(),
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

        let results = build_search_circuit(&mut c, &mut input, SearchMode::Normal, &query, &mails, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(c.width(results[0]), 1);

        let inputs = input.into_inputs();
        assert!(run_and_declassify(&c, inputs, results[0]));
    }

    #[test]
    fn index_mode_result_count_matches_indexed_word_count() {
        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let query = QueryFile {
            modifier_chain_share: b64("\0"),
            bucket_scheme: vec![4, 8],
            keywords: vec![Keyword {
                keyword: "java".to_string(),
                bucket_size: 4,
                bucketed_share: b64("java"),
                length_mask_share: bit_mask_share(&[true, true, true, true, false, false, false, false]),
                truncated_share: b64("java"),
            }],
        };
        let index = SearchIndex {
            num_of_emails: 3,
            words: vec![
                IndexWord {
                    word_share: b64("java"),
                    occurrence_share: b64("m1,m3"),
                    bucket_size: 4,
                    position: 0,
                },
                IndexWord {
                    word_share: b64("perl"),
                    occurrence_share: b64("m2"),
                    bucket_size: 4,
                    position: 1,
                },
                IndexWord {
                    word_share: b64("systems"),
                    occurrence_share: b64("m1"),
                    bucket_size: 8,
                    position: 0,
                },
            ],
        };

        let results =
            build_search_circuit(&mut c, &mut input, SearchMode::Index, &query, &[], Some(&index)).unwrap();
        assert_eq!(results.len(), 3);

        let inputs = input.into_inputs();
        let zeros = vec![false; inputs.len()];
        let shares = run_circuit_multiparty(&c, &[inputs, zeros]);
        let clear: Vec<bool> = results
            .iter()
            .map(|&w| declassify(&[shares[0][w as usize].clone(), shares[1][w as usize].clone()])[0])
            .collect();
        assert_eq!(clear, vec![true, false, false]);
    }
}
