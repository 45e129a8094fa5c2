//! The input decoder.
//!
//! A secret-shared value arrives pre-shared: this party's own share file
//! already *is* this party's GMW share, so "feeding" a decoded value into
//! the circuit needs no communication (see [`crate::wire::Gate::Input`]).
//! What [`InputBuilder`] does is keep the circuit shape (which only depends
//! on the public byte length) and this party's private input-bit stream
//! growing in lockstep, so that the bits handed to
//! [`Backend::run`](crate::backend::Backend::run) line up with the `Input`
//! gates the loaders created.

use crate::error::EngineError;
use crate::wire::{Circuit, WireId};

/// Base64-decode a share blob. The number and width of the `Input` gates a
/// caller creates from the result is derived from this decoded length, so a
/// byte that fails to decode here must stop circuit construction rather than
/// silently produce a shorter share: letting it through would make this
/// party build a different number of `Input` gates than its peers for the
/// same logical field, desynchronising every gate index downstream.
pub fn decode(share_b64: &str) -> Result<Vec<u8>, EngineError> {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD
        .decode(share_b64)
        .map_err(|e| EngineError::InvalidShareEncoding { reason: e.to_string() })
}

fn msb_first_bits(bytes: &[u8]) -> Vec<bool> {
    bytes
        .iter()
        .flat_map(|b| (0..8).rev().map(move |i| (b >> i) & 1 == 1))
        .collect()
}

/// Accumulates this party's private input-bit stream while growing the
/// (public-shape) circuit. One `InputBuilder` is used for the whole circuit
/// build so every `Input` gate created anywhere (query keywords, corpus
/// mail, index words) is backed by this party's actual bits in the same
/// order the gates were created.
pub struct InputBuilder {
    bits: Vec<bool>,
}

impl InputBuilder {
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Decode this party's own share of a blob and create one 8-bit `Input`
    /// gate per character, in order.
    pub fn feed(&mut self, circuit: &mut Circuit, share_b64: &str) -> Result<Vec<WireId>, EngineError> {
        let bytes = decode(share_b64)?;
        let bits = msb_first_bits(&bytes);
        self.bits.extend_from_slice(&bits);
        Ok(bytes.iter().map(|_| circuit.input(8)).collect())
    }

    /// This party's full input-bit stream, ready for
    /// [`Backend::run`](crate::backend::Backend::run).
    pub fn into_inputs(self) -> Vec<bool> {
        self.bits
    }
}

impl Default for InputBuilder {
    fn default() -> Self {
        Self::new()
    }
}
