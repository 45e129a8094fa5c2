//! The secret modifier chain: folds per-keyword match bits together under a
//! secret-shared sequence of AND/OR operators and negations, so the query's
//! boolean structure is never revealed.

use crate::error::EngineError;
use crate::wire::{Circuit, WireId};

/// `CHAIN(r, m, o, n) = ((r XOR o) AND ((m XOR n) XOR o)) XOR o`.
///
/// This identity is AND when `o=0` and OR when `o=1`, optionally negating
/// the new operand `m` via `n`. Because `o` and `n` are secret-shared,
/// neither the combining operator nor the per-keyword negation is ever
/// revealed.
pub fn chain(c: &mut Circuit, r: WireId, m: WireId, o: WireId, n: WireId) -> Result<WireId, EngineError> {
    let r_xor_o = c.xor(r, o)?;
    let m_xor_n = c.xor(m, n)?;
    let inner = c.xor(m_xor_n, o)?;
    let anded = c.and(r_xor_o, inner)?;
    c.xor(anded, o)
}

/// Fold per-keyword match wires (length Q ≥ 1) left-to-right under the
/// modifier-chain bits `m` (length ≥ 2Q−1): keyword 0's result is
/// `match[0] XOR m[0]`; keyword `j ≥ 1` combines via [`chain`] using
/// `o = m[2j-1]`, `n = m[2j]`.
pub fn chain_keywords(c: &mut Circuit, matches: &[WireId], m: &[WireId]) -> Result<WireId, EngineError> {
    assert!(!matches.is_empty(), "chain_keywords needs at least one keyword");
    let required = 2 * matches.len() - 1;
    if m.len() < required {
        return Err(EngineError::ShapeMismatch {
            expected: required,
            found: m.len(),
            context: "modifier chain length".to_string(),
        });
    }

    let mut r = c.xor(matches[0], m[0])?;
    for (j, &m_j) in matches.iter().enumerate().skip(1) {
        let o = m[2 * j - 1];
        let n = m[2 * j];
        r = chain(c, r, m_j, o, n)?;
    }
    Ok(r)
}
