//! Per-mode target enumeration: how "text" is windowed and which
//! OR-reductions wrap the batched comparison, for each of
//! normal/hidden/bucket/index.

use crate::circuit::compare::batched_window_matches;
use crate::circuit::reduce::or_reduce;
use crate::error::EngineError;
use crate::wire::{Circuit, WireId};
use std::collections::BTreeMap;

/// `min_len(B)`: one more than the previous bucket size in the ascending
/// scheme, or 1 if `bucket_size` is the smallest. A keyword bucketed at size
/// `B` can never be shorter than this, so hidden mode never needs to slide a
/// window past this floor.
pub fn min_len(scheme: &[usize], bucket_size: usize) -> usize {
    let mut prev = 0usize;
    for &b in scheme {
        if b == bucket_size {
            return prev + 1;
        }
        prev = b;
    }
    1
}

/// Slide a length-`l` keyword over `text`, returning all `max(|text|-l+1, 0)`
/// contiguous, in-bounds windows.
fn sliding_windows(text: &[WireId], l: usize) -> Vec<Vec<WireId>> {
    if l == 0 || text.len() < l {
        return Vec::new();
    }
    (0..=text.len() - l)
        .map(|offset| text[offset..offset + l].to_vec())
        .collect()
}

/// **normal** mode: the keyword length (and so the comparison shape) is
/// public, with no length mask. Returns the public constant 0 when no
/// position is comparable.
pub fn normal_match(c: &mut Circuit, text: &[WireId], keyword: &[WireId]) -> Result<WireId, EngineError> {
    let windows = sliding_windows(text, keyword.len());
    if windows.is_empty() {
        return Ok(c.zero(1));
    }
    let hits = batched_window_matches(c, keyword, &windows, None)?;
    or_reduce(c, &hits)
}

/// **hidden** mode: `keyword_bucketed` (length `bucket_size`) carries a
/// secret `length_mask` marking its true-length prefix. Comparisons run for
/// every offset up to `|text| - min_len(bucket_size) + 1`; a window that
/// would run past the end of `text` is padded with a reusable zero character,
/// and that window's own mask forces the padded positions to "don't care" so
/// the padding never decides the outcome regardless of the secret length
/// mask. Which positions are padding depends only on the public offset and
/// `|text|`, so this per-window adjustment is itself public and every party
/// builds the identical circuit shape. All windows are then compared in one
/// batched pass rather than one scalar comparison per position.
pub fn hidden_match(
    c: &mut Circuit,
    text: &[WireId],
    keyword_bucketed: &[WireId],
    length_mask: &[WireId],
    scheme: &[usize],
    bucket_size: usize,
) -> Result<WireId, EngineError> {
    if keyword_bucketed.len() != bucket_size || length_mask.len() != bucket_size {
        return Err(EngineError::ShapeMismatch {
            expected: bucket_size,
            found: keyword_bucketed.len().min(length_mask.len()),
            context: "hidden_match bucketed keyword / length mask".to_string(),
        });
    }

    let ml = min_len(scheme, bucket_size);
    if text.is_empty() || text.len() < ml {
        return Ok(c.zero(1));
    }

    let num_windows = text.len() - ml + 1;
    let zero_char = c.zero(8);
    let zero_bit = c.zero(1);

    let mut windows = Vec::with_capacity(num_windows);
    let mut masks = Vec::with_capacity(num_windows);
    for offset in 0..num_windows {
        let mut window = Vec::with_capacity(bucket_size);
        let mut mask = Vec::with_capacity(bucket_size);
        for pos in 0..bucket_size {
            if offset + pos < text.len() {
                window.push(text[offset + pos]);
                mask.push(length_mask[pos]);
            } else {
                window.push(zero_char);
                mask.push(zero_bit);
            }
        }
        windows.push(window);
        masks.push(mask);
    }

    let hits = batched_window_matches(c, keyword_bucketed, &windows, Some(&masks))?;
    or_reduce(c, &hits)
}

/// **bucket** mode: only mail buckets whose size is ≥ the keyword's bucket
/// size are searched — strictly smaller buckets cannot contain a match of
/// that length class. Each candidate word is itself treated as the "text"
/// for a hidden-style sliding match of the keyword within it.
pub fn bucket_match(
    c: &mut Circuit,
    mail_buckets: &BTreeMap<usize, Vec<Vec<WireId>>>,
    keyword_bucketed: &[WireId],
    length_mask: &[WireId],
    scheme: &[usize],
    bucket_size: usize,
) -> Result<WireId, EngineError> {
    let mut word_hits = Vec::new();
    for (&b, words) in mail_buckets {
        if b < bucket_size {
            continue;
        }
        for word in words {
            word_hits.push(hidden_match(c, word, keyword_bucketed, length_mask, scheme, bucket_size)?);
        }
    }
    if word_hits.is_empty() {
        return Ok(c.zero(1));
    }
    or_reduce(c, &word_hits)
}

/// **index** mode: one indexed word against one keyword. A word stored in
/// a bucket smaller than the keyword's own bucket size is structurally
/// disqualified — the same bucket-size filter as bucket mode, applied per
/// word instead of per mail.
pub fn index_match(
    c: &mut Circuit,
    index_word_chars: &[WireId],
    index_word_bucket_size: usize,
    keyword_bucketed: &[WireId],
    length_mask: &[WireId],
    scheme: &[usize],
    keyword_bucket_size: usize,
) -> Result<WireId, EngineError> {
    if index_word_bucket_size < keyword_bucket_size {
        return Ok(c.zero(1));
    }
    hidden_match(
        c,
        index_word_chars,
        keyword_bucketed,
        length_mask,
        scheme,
        keyword_bucket_size,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{declassify, run_circuit_multiparty};
    use crate::input::InputBuilder;
    use base64::Engine as _;

    fn b64(s: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(s.as_bytes())
    }

    #[test]
    fn min_len_follows_previous_bucket_size() {
        let scheme = vec![4, 8, 16];
        assert_eq!(min_len(&scheme, 4), 1);
        assert_eq!(min_len(&scheme, 8), 5);
        assert_eq!(min_len(&scheme, 16), 9);
    }

    #[test]
    fn normal_match_end_to_end() {
        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let text_wires = input.feed(&mut c, &b64("hello world")).unwrap();
        let keyword_wires = input.feed(&mut c, &b64("world")).unwrap();
        let out = normal_match(&mut c, &text_wires, &keyword_wires).unwrap();
        let inputs = input.into_inputs();
        let zeros = vec![false; inputs.len()];

        let shares = run_circuit_multiparty(&c, &[inputs, zeros]);
        let clear = declassify(&[shares[0][out as usize].clone(), shares[1][out as usize].clone()]);
        assert_eq!(clear, vec![true]);
    }

    #[test]
    fn normal_match_miss_is_zero_without_error() {
        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let text_wires = input.feed(&mut c, &b64("hello world")).unwrap();
        let keyword_wires = input.feed(&mut c, &b64("xyz")).unwrap();
        let out = normal_match(&mut c, &text_wires, &keyword_wires).unwrap();
        let inputs = input.into_inputs();
        let zeros = vec![false; inputs.len()];

        let shares = run_circuit_multiparty(&c, &[inputs, zeros]);
        let clear = declassify(&[shares[0][out as usize].clone(), shares[1][out as usize].clone()]);
        assert_eq!(clear, vec![false]);
    }

    #[test]
    fn empty_target_is_zero_when_keyword_longer_than_text() {
        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let text_wires = input.feed(&mut c, &b64("hi")).unwrap();
        let keyword_wires = input.feed(&mut c, &b64("hello")).unwrap();
        let out = normal_match(&mut c, &text_wires, &keyword_wires).unwrap();
        let inputs = input.into_inputs();
        let zeros = vec![false; inputs.len()];

        let shares = run_circuit_multiparty(&c, &[inputs, zeros]);
        let clear = declassify(&[shares[0][out as usize].clone(), shares[1][out as usize].clone()]);
        assert_eq!(clear, vec![false]);
    }

    #[test]
    fn hidden_match_length_mask_neutrality() {
        // text "helloworld", keyword bucketed "world\0\0\0" (B=8), mask
        // 11111000 -- the true keyword is "world" (length 5), so hidden-mode
        // must agree with normal-mode matching on the truncated keyword.
        let scheme = vec![8];

        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let text_wires = input.feed(&mut c, &b64("helloworld")).unwrap();
        let keyword_wires = input.feed(&mut c, &b64("world\0\0\0")).unwrap();
        // The length mask is a bit string, not a byte string, so it is fed
        // as individual 1-bit input wires rather than through `input.feed`.
        let mask: Vec<WireId> = (0..8).map(|_| c.input(1)).collect();

        let out = hidden_match(&mut c, &text_wires, &keyword_wires, &mask, &scheme, 8).unwrap();

        let mut party0_inputs = input.into_inputs();
        let mask_bits = [true, true, true, true, true, false, false, false];
        party0_inputs.extend(mask_bits);
        let zeros = vec![false; party0_inputs.len()];

        let shares = run_circuit_multiparty(&c, &[party0_inputs, zeros]);
        let clear = declassify(&[shares[0][out as usize].clone(), shares[1][out as usize].clone()]);
        assert_eq!(clear, vec![true]);
    }

    #[test]
    fn hidden_match_rejects_real_mismatch() {
        let scheme = vec![8];

        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let text_wires = input.feed(&mut c, &b64("helloworld")).unwrap();
        let keyword_wires = input.feed(&mut c, &b64("xorld\0\0\0")).unwrap();
        let mask: Vec<WireId> = (0..8).map(|_| c.input(1)).collect();

        let out = hidden_match(&mut c, &text_wires, &keyword_wires, &mask, &scheme, 8).unwrap();

        let mut party0_inputs = input.into_inputs();
        let mask_bits = [true, true, true, true, true, false, false, false];
        party0_inputs.extend(mask_bits);
        let zeros = vec![false; party0_inputs.len()];

        let shares = run_circuit_multiparty(&c, &[party0_inputs, zeros]);
        let clear = declassify(&[shares[0][out as usize].clone(), shares[1][out as usize].clone()]);
        assert_eq!(clear, vec![false]);
    }

    #[test]
    fn bucket_monotonicity_small_bucket_never_matches() {
        // keyword at bucket_size=8 can never match a B=4 bucket's word.
        let scheme = vec![4, 8];
        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let word = input.feed(&mut c, &b64("java")).unwrap();
        let mut mail_buckets = BTreeMap::new();
        mail_buckets.insert(4usize, vec![word]);

        let keyword = input.feed(&mut c, &b64("java\0\0\0\0")).unwrap();
        let mask: Vec<WireId> = (0..8).map(|_| c.input(1)).collect();

        let out = bucket_match(&mut c, &mail_buckets, &keyword, &mask, &scheme, 8).unwrap();
        let mut party0_inputs = input.into_inputs();
        party0_inputs.extend([true, true, true, true, false, false, false, false]);
        let zeros = vec![false; party0_inputs.len()];

        let shares = run_circuit_multiparty(&c, &[party0_inputs, zeros]);
        let clear = declassify(&[shares[0][out as usize].clone(), shares[1][out as usize].clone()]);
        assert_eq!(clear, vec![false]);
    }

    #[test]
    fn index_match_disqualifies_smaller_bucket() {
        let scheme = vec![4, 8];
        let mut c = Circuit::new();
        let mut input = InputBuilder::new();
        let index_word = input.feed(&mut c, &b64("java")).unwrap();
        let keyword = input.feed(&mut c, &b64("java\0\0\0\0")).unwrap();
        let mask: Vec<WireId> = (0..8).map(|_| c.input(1)).collect();

        let out = index_match(&mut c, &index_word, 4, &keyword, &mask, &scheme, 8).unwrap();
        let mut party0_inputs = input.into_inputs();
        party0_inputs.extend([true, true, true, true, false, false, false, false]);
        let zeros = vec![false; party0_inputs.len()];

        let shares = run_circuit_multiparty(&c, &[party0_inputs, zeros]);
        let clear = declassify(&[shares[0][out as usize].clone(), shares[1][out as usize].clone()]);
        assert_eq!(clear, vec![false]);
    }
}
