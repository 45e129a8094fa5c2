//! TCP mesh construction for one-process-per-party deployment.
//!
//! Each party is its own process and peers are given explicit `(id, ip,
//! port)` triples from `--parties`. The handshake — bind, staggered connect,
//! 8-byte id exchange, sort by id — follows the same shape this crate uses
//! for its other TCP-based party meshes.

use anyhow::{Context, Result};
use scuttlebutt::SyncChannel;
use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::sleep;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

/// A peer to connect to: its party id and the address it listens on.
#[derive(Clone, Copy, Debug)]
pub struct PeerAddr {
    pub id: usize,
    pub addr: SocketAddr,
}

type Channel = (
    usize,
    SyncChannel<BufReader<TcpStream>, BufWriter<TcpStream>>,
);

/// Connect to every peer with a lower id, accept from every peer with a
/// higher id, and return one channel per peer sorted by peer id.
///
/// `my_addr` is the address this party itself listens on (its own entry
/// from `--parties`).
pub fn connect_mesh(my_id: usize, my_addr: SocketAddr, peers: &[PeerAddr]) -> Result<Vec<Channel>> {
    let listener = TcpListener::bind(my_addr)
        .with_context(|| format!("my_id={} addr={} @{}:{}", my_id, my_addr, file!(), line!()))?;

    // Stagger connects so lower ids are listening before higher ids dial in.
    sleep(Duration::from_millis(50 * my_id as u64));

    let lower: Vec<&PeerAddr> = peers.iter().filter(|p| p.id < my_id).collect();
    let higher_count = peers.iter().filter(|p| p.id > my_id).count();

    let mut streams: Vec<(usize, TcpStream)> = lower
        .into_iter()
        .map(|peer| {
            let mut stream = TcpStream::connect_timeout(&peer.addr, TIMEOUT).with_context(|| {
                format!(
                    "my_id={} peer={} addr={} @{}:{}",
                    my_id,
                    peer.id,
                    peer.addr,
                    file!(),
                    line!()
                )
            })?;
            stream
                .write_all(&my_id.to_be_bytes())
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let mut buf = [0u8; 8];
            stream
                .read_exact(&mut buf)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let peer_id = usize::from_be_bytes(buf);
            Ok((peer_id, stream))
        })
        .collect::<Result<Vec<_>>>()?;

    let accepted: Vec<(usize, TcpStream)> = listener
        .incoming()
        .take(higher_count)
        .map(|s| {
            let mut s = s.with_context(|| format!("@{}:{}", file!(), line!()))?;
            let mut buf = [0u8; 8];
            s.read_exact(&mut buf)
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            let peer_id = usize::from_be_bytes(buf);
            s.write_all(&my_id.to_be_bytes())
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            Ok((peer_id, s))
        })
        .collect::<Result<Vec<_>>>()?;

    streams.extend(accepted);
    streams.sort_by_key(|(id, _)| *id);

    streams
        .into_iter()
        .map(|(id, s)| {
            let reader = s
                .try_clone()
                .with_context(|| format!("@{}:{}", file!(), line!()))?;
            Ok((
                id,
                SyncChannel::new(BufReader::new(reader), BufWriter::new(s)),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::AbstractChannel;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn three_party_mesh_handshake() {
        let base = 30100u16;
        let addrs = [addr(base), addr(base + 1), addr(base + 2)];
        let peers_of = |me: usize| -> Vec<PeerAddr> {
            (0..3)
                .filter(|&id| id != me)
                .map(|id| PeerAddr {
                    id,
                    addr: addrs[id],
                })
                .collect()
        };

        let handles: Vec<_> = (1..3)
            .map(|me| {
                let peers = peers_of(me);
                let my_addr = addrs[me];
                std::thread::spawn(move || -> Result<()> {
                    let mut channels = connect_mesh(me, my_addr, &peers)?;
                    for (id, ch) in channels.iter_mut() {
                        let id = *id;
                        if id < me {
                            ch.write_usize(me)?;
                            let m = ch.read_usize()?;
                            assert_eq!(m, id);
                        } else {
                            let m = ch.read_usize()?;
                            assert_eq!(m, id);
                            ch.write_usize(me)?;
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        let peers = peers_of(0);
        let mut channels = connect_mesh(0, addrs[0], &peers).unwrap();
        for (id, ch) in channels.iter_mut() {
            let id = *id;
            ch.write_usize(0).unwrap();
            let m = ch.read_usize().unwrap();
            assert_eq!(m, id);
        }

        for h in handles {
            h.join().unwrap().unwrap();
        }
    }
}
