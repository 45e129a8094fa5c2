//! A semi-honest Boolean-GMW backend over an arbitrary [`AbstractChannel`]
//! mesh, generalised to N parties.
//!
//! XOR, NOT, and constants are free (local, no communication). The only
//! gate that costs a round is AND: for every ordered pair of parties we run
//! one 1-out-of-2 OT batch (width = the SIMD gate's width, so one batch
//! covers the whole "parallel k-way" gate in a single round), following the
//! same OT-as-correlated-randomness shape as the VOLE-based preprocessing
//! this backend's OT plumbing is adapted from.
//!
//! For three or more parties the standard two-party "OT multiplication"
//! trick is applied once per unordered pair `{i, j}` to recover shares of
//! both cross terms `x_i & y_j` and `x_j & y_i`; each party locally adds its
//! own diagonal term `x_i & y_i` (no communication needed for that part).

use crate::backend::{Backend, CommStats};
use crate::wire::{Circuit, Gate};
use anyhow::{Context, Result};
use ocelot::ot::{AlszReceiver, AlszSender, Receiver as OtReceiver, Sender as OtSender};
use scuttlebutt::{AbstractChannel, AesRng, Block};
use std::time::Instant;

fn bool_to_block(b: bool) -> Block {
    let mut bytes = [0u8; 16];
    bytes[0] = b as u8;
    Block::from(bytes)
}

fn block_to_bool(b: Block) -> bool {
    let bytes: [u8; 16] = b.into();
    bytes[0] & 1 == 1
}

/// One MPC party's handle on the Boolean-GMW protocol, holding one channel
/// per peer. Owns its transport: dropping it closes every peer channel.
pub struct GmwBackend<C: AbstractChannel> {
    my_id: usize,
    num_parties: usize,
    peers: Vec<(usize, C)>,
    rng: AesRng,
    stats: CommStats,
}

impl<C: AbstractChannel> GmwBackend<C> {
    /// `peers` must contain exactly one channel per party other than
    /// `my_id`, each tagged with that party's id.
    pub fn new(my_id: usize, num_parties: usize, mut peers: Vec<(usize, C)>) -> Result<Self> {
        if peers.len() != num_parties - 1 {
            anyhow::bail!(
                "expected {} peer channels, got {} @{}:{}",
                num_parties - 1,
                peers.len(),
                file!(),
                line!()
            );
        }
        peers.sort_by_key(|(id, _)| *id);

        Ok(Self {
            my_id,
            num_parties,
            peers,
            rng: AesRng::new(),
            stats: CommStats::default(),
        })
    }

    fn and_many(&mut self, a: &[bool], b: &[bool]) -> Result<Vec<bool>> {
        let width = a.len();
        let mut acc: Vec<bool> = a.iter().zip(b.iter()).map(|(x, y)| *x && *y).collect();

        let my_id = self.my_id;
        for idx in 0..self.peers.len() {
            let (peer_id, channel) = {
                let (id, ch) = &mut self.peers[idx];
                (*id, ch)
            };

            if my_id < peer_id {
                let r: Vec<bool> = (0..width).map(|_| self.rng.gen()).collect();
                let messages: Vec<(Block, Block)> = (0..width)
                    .map(|t| {
                        let m0 = bool_to_block(r[t]);
                        let m1 = bool_to_block(r[t] ^ a[t]);
                        (m0, m1)
                    })
                    .collect();
                let mut sender = AlszSender::init(channel, &mut self.rng)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
                sender
                    .send(channel, &messages, &mut self.rng)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
                for t in 0..width {
                    acc[t] ^= r[t];
                }

                let mut receiver = AlszReceiver::init(channel, &mut self.rng)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
                let outs = receiver
                    .receive(channel, b, &mut self.rng)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
                for t in 0..width {
                    acc[t] ^= block_to_bool(outs[t]);
                }
            } else {
                let mut receiver = AlszReceiver::init(channel, &mut self.rng)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
                let outs = receiver
                    .receive(channel, b, &mut self.rng)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
                for t in 0..width {
                    acc[t] ^= block_to_bool(outs[t]);
                }

                let r: Vec<bool> = (0..width).map(|_| self.rng.gen()).collect();
                let messages: Vec<(Block, Block)> = (0..width)
                    .map(|t| {
                        let m0 = bool_to_block(r[t]);
                        let m1 = bool_to_block(r[t] ^ a[t]);
                        (m0, m1)
                    })
                    .collect();
                let mut sender = AlszSender::init(channel, &mut self.rng)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
                sender
                    .send(channel, &messages, &mut self.rng)
                    .with_context(|| format!("@{}:{}", file!(), line!()))?;
                for t in 0..width {
                    acc[t] ^= r[t];
                }
            }
        }

        self.stats.and_gates += width as u64;
        self.stats.rounds += 1;

        Ok(acc)
    }
}

impl<C: AbstractChannel> Backend for GmwBackend<C> {
    fn my_id(&self) -> usize {
        self.my_id
    }

    fn num_parties(&self) -> usize {
        self.num_parties
    }

    fn run(&mut self, circuit: &Circuit, my_inputs: &[bool]) -> Result<Vec<Vec<bool>>> {
        let start = Instant::now();

        let mut shares: Vec<Vec<bool>> = Vec::with_capacity(circuit.len());
        let mut input_cursor = 0usize;

        for gate in circuit.gates.iter() {
            let out = match gate {
                Gate::Input { width } => {
                    let width = *width as usize;
                    let bits = my_inputs
                        .get(input_cursor..input_cursor + width)
                        .with_context(|| {
                            format!(
                                "ran out of input bits at gate {} @{}:{}",
                                shares.len(),
                                file!(),
                                line!()
                            )
                        })?
                        .to_vec();
                    input_cursor += width;
                    bits
                }
                Gate::Const { bits } => {
                    if self.my_id == 0 {
                        bits.clone()
                    } else {
                        vec![false; bits.len()]
                    }
                }
                Gate::Not(a) => {
                    let a = shares[*a as usize].clone();
                    if self.my_id == 0 {
                        a.into_iter().map(|b| !b).collect()
                    } else {
                        a
                    }
                }
                Gate::Xor(a, b) => shares[*a as usize]
                    .iter()
                    .zip(shares[*b as usize].iter())
                    .map(|(x, y)| x ^ y)
                    .collect(),
                Gate::And(a, b) => {
                    let a = shares[*a as usize].clone();
                    let b = shares[*b as usize].clone();
                    self.and_many(&a, &b)?
                }
                Gate::Concat(parts) => parts
                    .iter()
                    .flat_map(|&w| shares[w as usize].clone())
                    .collect(),
                Gate::Slice { src, start, len } => {
                    shares[*src as usize][*start as usize..(*start + *len) as usize].to_vec()
                }
            };
            shares.push(out);
        }

        self.stats.runtime_ms += start.elapsed().as_millis();

        Ok(shares)
    }

    fn finish(&mut self) -> Result<()> {
        for (_, channel) in self.peers.iter_mut() {
            channel
                .flush()
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
        }
        Ok(())
    }

    fn stats(&self) -> CommStats {
        self.stats.clone()
    }
}
