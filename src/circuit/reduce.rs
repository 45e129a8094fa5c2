//! Low-depth (balanced binary tree) reduction. A left fold has depth O(n),
//! multiplying GMW round latency by n since each AND costs a round; a
//! balanced tree has depth O(log n) instead.

use crate::error::EngineError;
use crate::wire::{Circuit, WireId};

/// AND-reduce a non-empty list of equal-width wires.
pub fn and_reduce(c: &mut Circuit, wires: &[WireId]) -> Result<WireId, EngineError> {
    reduce_with(c, wires, Circuit::and)
}

/// OR-reduce a non-empty list of equal-width wires.
pub fn or_reduce(c: &mut Circuit, wires: &[WireId]) -> Result<WireId, EngineError> {
    reduce_with(c, wires, Circuit::or)
}

fn reduce_with(
    c: &mut Circuit,
    wires: &[WireId],
    op: fn(&mut Circuit, WireId, WireId) -> Result<WireId, EngineError>,
) -> Result<WireId, EngineError> {
    assert!(!wires.is_empty(), "reduce over no wires");
    let mut level: Vec<WireId> = wires.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            if pair.len() == 2 {
                next.push(op(c, pair[0], pair[1])?);
            } else {
                next.push(pair[0]);
            }
        }
        level = next;
    }
    Ok(level[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{declassify, run_circuit_multiparty};

    #[test]
    fn and_reduce_matches_all_true() {
        let mut c = Circuit::new();
        let wires: Vec<WireId> = (0..5).map(|_| c.input(1)).collect();
        let out = and_reduce(&mut c, &wires).unwrap();

        let shares = run_circuit_multiparty(&c, &[vec![true; 5], vec![false; 5]]);
        let clear = declassify(&[
            shares[0][out as usize].clone(),
            shares[1][out as usize].clone(),
        ]);
        assert_eq!(clear, vec![true]);
    }

    #[test]
    fn or_reduce_matches_any_true() {
        let mut c = Circuit::new();
        let wires: Vec<WireId> = (0..5).map(|_| c.input(1)).collect();
        let out = or_reduce(&mut c, &wires).unwrap();

        let mut bits = vec![false; 5];
        bits[3] = true;
        let shares = run_circuit_multiparty(&c, &[bits, vec![false; 5]]);
        let clear = declassify(&[
            shares[0][out as usize].clone(),
            shares[1][out as usize].clone(),
        ]);
        assert_eq!(clear, vec![true]);
    }

    #[test]
    fn single_wire_reduce_is_identity() {
        let mut c = Circuit::new();
        let w = c.input(1);
        assert_eq!(and_reduce(&mut c, &[w]).unwrap(), w);
        assert_eq!(or_reduce(&mut c, &[w]).unwrap(), w);
    }
}
