//! The Boolean-GMW-style backend: the only part of the engine that talks to
//! other parties.
//!
//! [`Circuit`](crate::wire::Circuit) construction (everywhere else in this
//! crate) never touches a channel. A [`Backend`] takes the finished circuit
//! and *this party's* own input bits, runs the online phase gate by gate in
//! the circuit's deterministic order, and hands back this party's share of
//! every gate's output. The values stay secret-shared; declassification is
//! left to whatever deployment consumes the engine's output.

pub mod gmw;

use crate::wire::Circuit;
use anyhow::Result;

/// Runtime and communication counters merged into the statistics report.
/// Every backend tracks at least these.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct CommStats {
    /// Wall-clock time spent in [`Backend::run`], in milliseconds.
    pub runtime_ms: u128,
    /// Bytes sent over all peer channels.
    pub bytes_sent: u64,
    /// Bytes received over all peer channels.
    pub bytes_received: u64,
    /// Number of AND gates evaluated (the only gate that costs a round).
    pub and_gates: u64,
    /// Number of communication rounds (SIMD-batched AND layers).
    pub rounds: u64,
}

/// One MPC party's view of the Boolean-GMW protocol.
///
/// Implementors own their transport for as long as they exist; dropping a
/// backend must release it regardless of whether `run`/`finish` returned an
/// error.
pub trait Backend {
    /// This party's id, `0..num_parties()`.
    fn my_id(&self) -> usize;

    /// Number of parties in the protocol.
    fn num_parties(&self) -> usize;

    /// Evaluate `circuit`'s online phase, consuming `my_inputs` in gate
    /// order (each `Input` gate of width `w` consumes the next `w` bits).
    /// Returns this party's GMW share for every gate, indexed by
    /// [`WireId`](crate::wire::WireId).
    fn run(&mut self, circuit: &Circuit, my_inputs: &[bool]) -> Result<Vec<Vec<bool>>>;

    /// Final synchronisation barrier. Blocks until every party has reached
    /// this point.
    fn finish(&mut self) -> Result<()>;

    /// Snapshot of runtime/communication counters accumulated so far.
    fn stats(&self) -> CommStats;
}

/// Test-only: XOR per-party share vectors together to recover the cleartext
/// value of one gate's output. Never called from the driver — production
/// code leaves results shared.
#[cfg(test)]
pub(crate) fn declassify(shares: &[Vec<bool>]) -> Vec<bool> {
    let width = shares[0].len();
    (0..width)
        .map(|i| shares.iter().fold(false, |acc, s| acc ^ s[i]))
        .collect()
}

/// Test-only: run the same circuit through a real [`gmw::GmwBackend`] mesh
/// for every party at once, over in-process crossbeam channels. Returns each
/// party's full per-gate share vector, indexed `[party][gate]`.
#[cfg(test)]
pub(crate) fn run_circuit_multiparty(
    circuit: &Circuit,
    party_inputs: &[Vec<bool>],
) -> Vec<Vec<Vec<bool>>> {
    let num_parties = party_inputs.len();
    let (receiver_channels, channels) =
        crate::channel_utils::sync_channel_by_cb::create_crossbeam_channels(num_parties);

    let handles: Vec<_> = channels
        .into_iter()
        .enumerate()
        .map(|(k, chans)| {
            let id = k + 1;
            let circuit = circuit.clone();
            let inputs = party_inputs[id].clone();
            std::thread::spawn(move || {
                let mut backend = gmw::GmwBackend::new(id, num_parties, chans).unwrap();
                backend.run(&circuit, &inputs).unwrap()
            })
        })
        .collect();

    let mut backend0 = gmw::GmwBackend::new(0, num_parties, receiver_channels).unwrap();
    let shares0 = backend0.run(circuit, &party_inputs[0]).unwrap();

    let mut all_shares = vec![shares0];
    for h in handles {
        all_shares.push(h.join().unwrap());
    }
    all_shares
}
