//! The Boolean circuit arena and the bit-layout utilities built on top of it.
//!
//! A [`WireId`] names one gate's output, which is itself a bundle of one or
//! more parallel bits — a width-1 bundle is an ordinary wire, a width-k
//! bundle is a SIMD wire: the backend evaluates `Gate::And`/`Gate::Xor`
//! pointwise across the whole bundle in one pass, so batching k parallel
//! 1-bit comparisons only ever costs one gate, not k.
//!
//! Every method here is purely structural: it appends a gate and returns a
//! handle. No method inspects a secret value, so two parties building the
//! same sequence of calls always end up with bit-for-bit identical circuits.

use crate::error::EngineError;

/// Handle to a gate's output bundle. Stable for the lifetime of the
/// [`Circuit`] it came from.
pub type WireId = u32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Gate {
    /// Consumes the next `width` bits of this party's own input stream.
    /// No communication: every party's GMW share of an input wire is
    /// simply the next bits of the share file it decoded locally — the
    /// secret is already pre-shared before the circuit runs.
    Input { width: u32 },
    /// A public value. Convention: party 0's share is `bits`, every other
    /// party's share is all-zero, so XOR-reconstruction still yields `bits`.
    Const { bits: Vec<bool> },
    Not(WireId),
    Xor(WireId, WireId),
    And(WireId, WireId),
    Concat(Vec<WireId>),
    Slice { src: WireId, start: u32, len: u32 },
}

/// An append-only Boolean circuit. Gate indices double as [`WireId`]s.
#[derive(Default, Clone)]
pub struct Circuit {
    pub(crate) gates: Vec<Gate>,
    widths: Vec<u32>,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of gates built so far.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Width (parallel bit count) of a wire's output bundle.
    pub fn width(&self, w: WireId) -> u32 {
        self.widths[w as usize]
    }

    fn push(&mut self, gate: Gate, width: u32) -> WireId {
        let id = self.gates.len() as u32;
        self.widths.push(width);
        self.gates.push(gate);
        id
    }

    /// Declare an input wire of the given width, fed from this party's own
    /// share stream at `run()` time.
    pub fn input(&mut self, width: u32) -> WireId {
        self.push(Gate::Input { width }, width)
    }

    /// A public constant bundle.
    pub fn constant(&mut self, bits: Vec<bool>) -> WireId {
        let width = bits.len() as u32;
        self.push(Gate::Const { bits }, width)
    }

    /// The public constant 0, `width` bits wide. Used as the no-match result
    /// for structurally-empty comparisons and for padding in
    /// [`concat_to_bytes`].
    pub fn zero(&mut self, width: u32) -> WireId {
        self.constant(vec![false; width as usize])
    }

    /// The public constant 1, 1 bit wide.
    pub fn one(&mut self) -> WireId {
        self.constant(vec![true])
    }

    pub fn not(&mut self, a: WireId) -> WireId {
        let w = self.width(a);
        self.push(Gate::Not(a), w)
    }

    fn require_equal_width(&self, a: WireId, b: WireId, context: &str) -> Result<u32, EngineError> {
        let (wa, wb) = (self.width(a), self.width(b));
        if wa != wb {
            return Err(EngineError::ShapeMismatch {
                expected: wa as usize,
                found: wb as usize,
                context: context.to_string(),
            });
        }
        Ok(wa)
    }

    /// Pointwise XOR, free of charge in GMW: both parties can compute it
    /// locally on their own shares with no communication.
    pub fn xor(&mut self, a: WireId, b: WireId) -> Result<WireId, EngineError> {
        let w = self.require_equal_width(a, b, "xor")?;
        Ok(self.push(Gate::Xor(a, b), w))
    }

    /// Pointwise AND — the only gate that needs a round of communication:
    /// when `a` and `b` are width-k SIMD bundles, one `And` gate here covers
    /// k independent 1-bit ANDs in a single round.
    pub fn and(&mut self, a: WireId, b: WireId) -> Result<WireId, EngineError> {
        let w = self.require_equal_width(a, b, "and")?;
        Ok(self.push(Gate::And(a, b), w))
    }

    /// Pointwise OR, built from AND/XOR/NOT: `a OR b = NOT(NOT a AND NOT b)`.
    pub fn or(&mut self, a: WireId, b: WireId) -> Result<WireId, EngineError> {
        let na = self.not(a);
        let nb = self.not(b);
        let nand = self.and(na, nb)?;
        Ok(self.not(nand))
    }

    /// Concatenate bundles end to end (used to assemble SIMD wires and to
    /// regroup bits into bytes).
    pub fn concat(&mut self, parts: &[WireId]) -> WireId {
        let width = parts.iter().map(|&w| self.width(w)).sum();
        self.push(Gate::Concat(parts.to_vec()), width)
    }

    /// Extract `len` contiguous bits starting at `start` from `src`.
    pub fn slice(&mut self, src: WireId, start: u32, len: u32) -> Result<WireId, EngineError> {
        let width = self.width(src);
        if start + len > width {
            return Err(EngineError::ShapeMismatch {
                expected: (start + len) as usize,
                found: width as usize,
                context: "slice".to_string(),
            });
        }
        Ok(self.push(Gate::Slice { src, start, len }, len))
    }
}

/// Split an 8-bit wire bundle into 8 one-bit wires, most-significant-first.
/// Fails with [`EngineError::ShapeMismatch`] if `w` is not exactly 8 bits
/// wide.
pub fn split_to_bits(c: &mut Circuit, w: WireId) -> Result<Vec<WireId>, EngineError> {
    let width = c.width(w);
    if width != 8 {
        return Err(EngineError::ShapeMismatch {
            expected: 8,
            found: width as usize,
            context: "split_to_bits".to_string(),
        });
    }
    (0..8).map(|i| c.slice(w, i, 1)).collect()
}

/// Group one-bit wires into 8-bit bundles, most-significant-first, padding
/// the final partial group with `zero_wire`.
pub fn concat_to_bytes(
    c: &mut Circuit,
    bits: &[WireId],
    zero_wire: WireId,
) -> Result<Vec<WireId>, EngineError> {
    if c.width(zero_wire) != 1 {
        return Err(EngineError::ShapeMismatch {
            expected: 1,
            found: c.width(zero_wire) as usize,
            context: "concat_to_bytes zero_wire".to_string(),
        });
    }
    for &b in bits {
        if c.width(b) != 1 {
            return Err(EngineError::ShapeMismatch {
                expected: 1,
                found: c.width(b) as usize,
                context: "concat_to_bytes bit".to_string(),
            });
        }
    }

    Ok(bits
        .chunks(8)
        .map(|chunk| {
            if chunk.len() == 8 {
                c.concat(chunk)
            } else {
                let mut padded = chunk.to_vec();
                padded.resize(8, zero_wire);
                c.concat(&padded)
            }
        })
        .collect())
}

/// Pack a list of parallel 1-bit wires into a single width-k SIMD wire.
pub fn simdify(c: &mut Circuit, bits: &[WireId]) -> Result<WireId, EngineError> {
    for &b in bits {
        if c.width(b) != 1 {
            return Err(EngineError::ShapeMismatch {
                expected: 1,
                found: c.width(b) as usize,
                context: "simdify".to_string(),
            });
        }
    }
    Ok(c.concat(bits))
}

/// Inverse of [`simdify`]: unpack a width-k SIMD wire back into k one-bit wires.
pub fn unsimdify(c: &mut Circuit, simd: WireId) -> Result<Vec<WireId>, EngineError> {
    let width = c.width(simd);
    (0..width).map(|i| c.slice(simd, i, 1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{declassify, run_circuit_multiparty};

    #[test]
    fn split_then_concat_roundtrips() {
        let mut c = Circuit::new();
        let byte = c.input(8);
        let bits = split_to_bits(&mut c, byte).unwrap();
        assert_eq!(bits.len(), 8);
        let zero = c.zero(1);
        let back = concat_to_bytes(&mut c, &bits, zero).unwrap();
        assert_eq!(back.len(), 1);

        // party 0 supplies its share of the 8 input bits MSB first for
        // 0b10110010; party 1's share is all-zero so XOR-reconstruction
        // still yields 0b10110010.
        let input_bits: Vec<bool> = (0..8).map(|i| (0b1011_0010u8 >> (7 - i)) & 1 == 1).collect();
        let shares = run_circuit_multiparty(&c, &[input_bits, vec![false; 8]]);

        let clear = declassify(&[
            shares[0][back[0] as usize].clone(),
            shares[1][back[0] as usize].clone(),
        ]);
        let to_byte = |bits: &[bool]| bits.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8);
        assert_eq!(to_byte(&clear), 0b1011_0010);
    }

    #[test]
    fn split_to_bits_rejects_wrong_width() {
        let mut c = Circuit::new();
        let w = c.input(7);
        assert!(matches!(
            split_to_bits(&mut c, w),
            Err(EngineError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn simdify_unsimdify_roundtrip_widths() {
        let mut c = Circuit::new();
        let bits: Vec<WireId> = (0..5).map(|_| c.input(1)).collect();
        let simd = simdify(&mut c, &bits).unwrap();
        assert_eq!(c.width(simd), 5);
        let back = unsimdify(&mut c, simd).unwrap();
        assert_eq!(back.len(), 5);
    }
}
