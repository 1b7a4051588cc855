//! Reader/writer-locked append-only packet store.
//!
//! Many concurrent readers, one writer at a time. Identifiers are assigned
//! under the write lock, so they are dense and strictly increasing within a
//! session (between store creation or `clear` and the next `clear`), and a
//! reader can never observe a half-inserted packet.

use std::time::SystemTime;

use bytes::Bytes;
use parking_lot::RwLock;
use thiserror::Error;

/// A processed packet, ready for display and retrieval.
///
/// `id` is assigned by the store at insertion; whatever value the processor
/// left in the field is overwritten.
#[derive(Clone, Debug)]
pub struct ParsedPacket {
    /// Dense sequential identifier, starting at 1 per session.
    pub id: u64,

    /// Capture timestamp.
    pub timestamp: SystemTime,

    /// On-wire frame length.
    pub frame_len: usize,

    /// Captured bytes, kept for hex inspection.
    pub data: Bytes,

    /// Source endpoint (MAC, or IP when an IP layer is present).
    pub src: String,

    /// Destination endpoint.
    pub dst: String,

    /// Highest recognized protocol label.
    pub protocol: String,

    /// Short one-line description (ports, ARP operation, ...).
    pub info: String,

    /// One human-readable summary per decoded layer.
    pub layers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("packet id {id} out of range (store holds {count})")]
    OutOfRange { id: u64, count: usize },
}

#[derive(Default)]
struct Inner {
    packets: Vec<ParsedPacket>,
    next_id: u64,
}

/// Thread-safe packet storage shared between the pipeline and its readers.
#[derive(Default)]
pub struct PacketStore {
    inner: RwLock<Inner>,
}

impl PacketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next identifier and appends the packet.
    ///
    /// Identifier order equals write-lock acquisition order, which with
    /// parallel workers is completion order rather than capture order.
    pub fn add_packet(&self, mut packet: ParsedPacket) -> u64 {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        packet.id = inner.next_id;
        let id = packet.id;
        inner.packets.push(packet);
        id
    }

    /// Fetches the packet with identifier `id` (1-based).
    pub fn get(&self, id: u64) -> Result<ParsedPacket, StoreError> {
        let inner = self.inner.read();
        let count = inner.packets.len();
        if id == 0 || id > count as u64 {
            return Err(StoreError::OutOfRange { id, count });
        }
        Ok(inner.packets[(id - 1) as usize].clone())
    }

    /// Number of stored packets.
    pub fn count(&self) -> usize {
        self.inner.read().packets.len()
    }

    /// Copy of the whole sequence, taken under a single read lock.
    pub fn snapshot(&self) -> Vec<ParsedPacket> {
        self.inner.read().packets.clone()
    }

    /// Discards all packets and resets the identifier counter.
    ///
    /// The owning controller must quiesce writers before calling this; the
    /// store's own lock only makes the wipe itself atomic.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.packets.clear();
        inner.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use bytes::Bytes;

    use super::{PacketStore, ParsedPacket, StoreError};

    fn packet(tag: u8) -> ParsedPacket {
        ParsedPacket {
            id: 0,
            timestamp: SystemTime::UNIX_EPOCH,
            frame_len: 64,
            data: Bytes::from(vec![tag]),
            src: String::new(),
            dst: String::new(),
            protocol: "Test".into(),
            info: String::new(),
            layers: Vec::new(),
        }
    }

    #[test]
    fn ids_are_dense_and_start_at_one() {
        let store = PacketStore::new();
        for i in 0..5 {
            assert_eq!(store.add_packet(packet(i)), u64::from(i) + 1);
        }
        assert_eq!(store.count(), 5);
        for id in 1..=5u64 {
            assert_eq!(store.get(id).unwrap().id, id);
        }
    }

    #[test]
    fn lookup_outside_bounds_is_out_of_range() {
        let store = PacketStore::new();
        store.add_packet(packet(0));

        assert_eq!(
            store.get(0).unwrap_err(),
            StoreError::OutOfRange { id: 0, count: 1 }
        );
        assert_eq!(
            store.get(2).unwrap_err(),
            StoreError::OutOfRange { id: 2, count: 1 }
        );
    }

    #[test]
    fn clear_resets_the_session() {
        let store = PacketStore::new();
        store.add_packet(packet(1));
        store.add_packet(packet(2));

        store.clear();
        assert_eq!(store.count(), 0);
        assert!(store.get(1).is_err());

        // Numbering restarts at 1 for the new session.
        assert_eq!(store.add_packet(packet(3)), 1);
        assert_eq!(store.get(1).unwrap().data[0], 3);
    }

    #[test]
    fn concurrent_writers_never_duplicate_ids() {
        let store = PacketStore::new();
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 250;

        crossbeam::thread::scope(|s| {
            for _ in 0..WRITERS {
                s.spawn(|_| {
                    for i in 0..PER_WRITER {
                        store.add_packet(packet(i as u8));
                    }
                });
            }
        })
        .unwrap();

        let mut ids: Vec<u64> = store.snapshot().into_iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=(WRITERS * PER_WRITER) as u64).collect::<Vec<_>>());
    }

    #[test]
    fn readers_never_observe_partial_state() {
        let store = PacketStore::new();

        crossbeam::thread::scope(|s| {
            s.spawn(|_| {
                for i in 0..500 {
                    store.add_packet(packet(i as u8));
                }
            });

            for _ in 0..4 {
                s.spawn(|_| {
                    for _ in 0..200 {
                        let snapshot = store.snapshot();
                        // Every packet in a snapshot is fully inserted: ids
                        // are dense 1..=len in insertion order.
                        for (idx, p) in snapshot.iter().enumerate() {
                            assert_eq!(p.id, idx as u64 + 1);
                        }
                        let seen = snapshot.len();
                        assert!(store.count() >= seen);
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(store.count(), 500);
    }
}
