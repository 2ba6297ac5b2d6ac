use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::record::{CaptureStats, PacketRecord};

/// Default rolling-history capacity.
pub const DEFAULT_MAX_PACKETS: usize = 10_000;

/// Bounded, thread-safe rolling history of decoded packets.
///
/// Insertion order is preserved, oldest first. The internal lock is held only
/// for the insert/snapshot/stats critical section and strictly serializes
/// inserts, so the capacity bound always holds.
pub struct CaptureBuffer {
    packets: Mutex<VecDeque<PacketRecord>>,
    max_packets: usize,
}

impl CaptureBuffer {
    pub fn new(max_packets: usize) -> Self {
        CaptureBuffer {
            packets: Mutex::new(VecDeque::new()),
            // a zero capacity would make every insert a no-op
            max_packets: max_packets.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PacketRecord>> {
        self.packets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record, evicting the oldest entry when full.
    pub fn insert(&self, record: PacketRecord) {
        let mut packets = self.lock();
        if packets.len() >= self.max_packets {
            packets.pop_front();
        }
        packets.push_back(record);
    }

    /// Independent point-in-time copy of the buffer contents.
    pub fn snapshot(&self) -> Vec<PacketRecord> {
        let packets = self.lock();
        packets.iter().cloned().collect()
    }

    /// Aggregate statistics, computed in a single pass under the lock.
    pub fn stats(&self) -> CaptureStats {
        let packets = self.lock();
        let mut stats = CaptureStats {
            total_packets: packets.len(),
            ..Default::default()
        };
        for p in packets.iter() {
            stats.total_bytes += u64::from(p.length);
            match p.protocol.as_str() {
                "TCP" => stats.tcp_packets += 1,
                "UDP" => stats.udp_packets += 1,
                "ICMP" => stats.icmp_packets += 1,
                _ => (),
            }
        }
        stats
    }

    /// Drop all buffered packets, keeping the capacity.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(protocol: &str, length: u32) -> PacketRecord {
        PacketRecord {
            protocol: protocol.to_owned(),
            length,
            ..Default::default()
        }
    }

    #[test]
    fn eviction_keeps_last_capacity_items_in_order() {
        let buffer = CaptureBuffer::new(3);
        for i in 0..7u32 {
            buffer.insert(record("TCP", i));
        }
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), 3);
        let lengths: Vec<u32> = snapshot.iter().map(|p| p.length).collect();
        assert_eq!(lengths, vec![4, 5, 6]);
    }

    #[test]
    fn stats_counts_per_protocol_and_bytes() {
        let buffer = CaptureBuffer::new(DEFAULT_MAX_PACKETS);
        buffer.insert(record("TCP", 10));
        buffer.insert(record("TCP", 20));
        buffer.insert(record("UDP", 30));
        buffer.insert(record("ICMP", 40));
        assert_eq!(
            buffer.stats(),
            CaptureStats {
                total_packets: 4,
                tcp_packets: 2,
                udp_packets: 1,
                icmp_packets: 1,
                total_bytes: 100,
            }
        );
    }

    #[test]
    fn snapshot_is_independent_of_later_inserts() {
        let buffer = CaptureBuffer::new(10);
        buffer.insert(record("UDP", 1));
        let snapshot = buffer.snapshot();
        buffer.insert(record("UDP", 2));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn clear_empties_the_buffer() {
        let buffer = CaptureBuffer::new(10);
        buffer.insert(record("TCP", 1));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.stats(), CaptureStats::default());
    }

    #[test]
    fn unknown_protocols_count_only_in_totals() {
        let buffer = CaptureBuffer::new(10);
        buffer.insert(record("", 5));
        buffer.insert(record("IGMP", 5));
        let stats = buffer.stats();
        assert_eq!(stats.total_packets, 2);
        assert_eq!(stats.total_bytes, 10);
        assert_eq!(stats.tcp_packets, 0);
    }
}
