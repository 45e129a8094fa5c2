//! Character comparison primitive and the wide-SIMD batching strategy: pack
//! every window's comparison bits across parallel SIMD wires so one AND/OR
//! gate covers all of them at once, instead of paying one gate per
//! character per window.

use crate::circuit::reduce::and_reduce;
use crate::encoding::CHARACTER_BITLEN;
use crate::error::EngineError;
use crate::wire::{simdify, split_to_bits, unsimdify, Circuit, WireId};

/// `NOT(a XOR b)` restricted to the low [`CHARACTER_BITLEN`] bits: the
/// "this character matches" wire for one pair of 8-bit character bundles.
pub fn char_equal(c: &mut Circuit, a: WireId, b: WireId) -> Result<WireId, EngineError> {
    let a_bits = split_to_bits(c, a)?;
    let b_bits = split_to_bits(c, b)?;
    let start = a_bits.len() - CHARACTER_BITLEN;
    let mut per_bit_eq = Vec::with_capacity(CHARACTER_BITLEN);
    for i in start..a_bits.len() {
        let x = c.xor(a_bits[i], b_bits[i])?;
        per_bit_eq.push(c.not(x));
    }
    and_reduce(c, &per_bit_eq)
}

/// Batched match of a length-`L` keyword against `P` same-length windows of
/// 8-bit character wires: zip every window's characters onto `L` SIMD wires
/// of width `P`, AND-reduce the 6 bit-planes pointwise, optionally OR in a
/// per-window length mask, re-group by keyword position and AND-reduce
/// again, then unpack one hit bit per window. `masks`, when given, holds one
/// length-`L` mask per window (normal mode passes `None`; hidden/bucket/index
/// mode each window's out-of-bounds positions need their own neutral mask, so
/// the mask cannot be shared across windows the way the keyword is).
///
/// Returns one 1-bit wire per window, for the caller to OR-reduce across
/// windows (and, for bucket/index, further across words and buckets).
pub fn batched_window_matches(
    c: &mut Circuit,
    keyword_chars: &[WireId],
    windows: &[Vec<WireId>],
    masks: Option<&[Vec<WireId>]>,
) -> Result<Vec<WireId>, EngineError> {
    let l = keyword_chars.len();
    let p = windows.len();
    if p == 0 {
        return Ok(Vec::new());
    }
    for w in windows {
        if w.len() != l {
            return Err(EngineError::ShapeMismatch {
                expected: l,
                found: w.len(),
                context: "batched_window_matches window length".to_string(),
            });
        }
    }

    let keyword_bits: Vec<Vec<WireId>> = keyword_chars
        .iter()
        .map(|&kw| split_to_bits(c, kw))
        .collect::<Result<_, _>>()?;
    let window_bits: Vec<Vec<Vec<WireId>>> = windows
        .iter()
        .map(|win| {
            win.iter()
                .map(|&t| split_to_bits(c, t))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<_, _>>()?;

    // Step 1-2: six width-(P*L) SIMD wires, one per payload bit, lane order
    // (window outer, keyword-position inner).
    let msb_start = 8 - CHARACTER_BITLEN;
    let mut per_bit_simd = Vec::with_capacity(CHARACTER_BITLEN);
    for k in 0..CHARACTER_BITLEN {
        let bit_index = msb_start + k;
        let mut lanes = Vec::with_capacity(p * l);
        for win in window_bits.iter() {
            for pos in 0..l {
                let x = c.xor(win[pos][bit_index], keyword_bits[pos][bit_index])?;
                lanes.push(c.not(x));
            }
        }
        per_bit_simd.push(simdify(c, &lanes)?);
    }

    // Step 3: AND-reduce the 6 bit-planes pointwise -> width P*L.
    let char_match = and_reduce(c, &per_bit_simd)?;

    // Step 4: OR with each window's own negated length mask, so a masked-out
    // position always contributes 1 regardless of the real comparison.
    let combined = match masks {
        Some(masks) => {
            if masks.len() != p {
                return Err(EngineError::ShapeMismatch {
                    expected: p,
                    found: masks.len(),
                    context: "batched_window_matches mask count".to_string(),
                });
            }
            let mut expanded = Vec::with_capacity(p * l);
            for mask in masks {
                if mask.len() != l {
                    return Err(EngineError::ShapeMismatch {
                        expected: l,
                        found: mask.len(),
                        context: "batched_window_matches mask length".to_string(),
                    });
                }
                for &m in mask {
                    expanded.push(c.not(m));
                }
            }
            let expanded_simd = simdify(c, &expanded)?;
            c.or(char_match, expanded_simd)?
        }
        None => char_match,
    };

    // Step 5: re-group by keyword position, AND-reduce across the L
    // per-position SIMD wires (each width P).
    let lanes = unsimdify(c, combined)?;
    let mut per_char_columns: Vec<Vec<WireId>> = vec![Vec::with_capacity(p); l];
    for win in 0..p {
        for pos in 0..l {
            per_char_columns[pos].push(lanes[win * l + pos]);
        }
    }
    let per_char_simd: Vec<WireId> = per_char_columns
        .into_iter()
        .map(|col| simdify(c, &col))
        .collect::<Result<_, _>>()?;
    let window_matches_simd = and_reduce(c, &per_char_simd)?;

    // Step 6 (partial): unpack back into one 1-bit wire per window; the
    // caller OR-reduces across windows (and beyond, for bucket/index).
    unsimdify(c, window_matches_simd)
}
