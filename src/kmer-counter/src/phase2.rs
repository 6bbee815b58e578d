use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use parking_lot::Mutex;

const SENTINEL: u64 = u64::MAX;

const FLAG_FWD_STARTS_READ: u32 = 0b01;
const FLAG_REV_STARTS_READ: u32 = 0b10;

fn pack(fwd_count: u8, rev_count: u8, flags: u32) -> u32 {
    (u32::from(fwd_count)) | (u32::from(rev_count) << 8) | (flags << 16)
}

fn unpack(value: u32) -> (u8, u8, u32) {
    ((value & 0xff) as u8, ((value >> 8) & 0xff) as u8, (value >> 16) & 0b11)
}

/// One phase-2 partition's open-addressing exact-count table: linear
/// probing with CAS insert on the key array (sentinel `u64::MAX` marks an
/// empty slot, same convention `kmer_counter.h`'s `k_sentinel` uses) and a
/// CAS loop on a packed `u32` value (fwd count byte, rev count byte, two
/// start-of-read flag bits). Counts that would overflow the 8-bit fields
/// spill into a shared, mutex-guarded overflow map instead of the
/// original's lock-free CAS overflow table -- a deliberate simplification
/// since this crate has no lock-free hash map in its dependency stack, and
/// the overflow path is cold (only kmers crossing 255 occurrences hit it).
pub struct ExactTable {
    keys: Vec<AtomicU64>,
    values: Vec<AtomicU32>,
    overflow: Mutex<HashMap<u64, (u32, u32)>>,
}

impl ExactTable {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        ExactTable {
            keys: (0..capacity).map(|_| AtomicU64::new(SENTINEL)).collect(),
            values: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            overflow: Mutex::new(HashMap::new()),
        }
    }

    fn find_or_insert_slot(&self, key: u64) -> Option<usize> {
        let cap = self.keys.len();
        let start = (key as usize) % cap;
        for probe in 0..cap {
            let idx = (start + probe) % cap;
            let slot = &self.keys[idx];
            let current = slot.load(Ordering::Relaxed);
            if current == key {
                return Some(idx);
            }
            if current == SENTINEL {
                match slot.compare_exchange(SENTINEL, key, Ordering::Relaxed, Ordering::Relaxed) {
                    Ok(_) => return Some(idx),
                    Err(actual) if actual == key => return Some(idx),
                    Err(_) => continue,
                }
            }
        }
        None
    }

    /// Record one occurrence of `key` in orientation `is_fwd`, optionally
    /// marking it as starting a read in that orientation. Returns `false`
    /// if the table is full and `key` isn't already present (caller should
    /// grow and retry -- mirrors `kmer_counter.h::get_index` throwing when
    /// full, except this returns rather than panicking).
    #[must_use]
    pub fn record(&self, key: u64, is_fwd: bool, starts_read: bool) -> bool {
        let Some(idx) = self.find_or_insert_slot(key) else { return false };
        let value_slot = &self.values[idx];
        let mut current = value_slot.load(Ordering::Relaxed);
        loop {
            let (mut fwd, mut rev, mut flags) = unpack(current);
            let mut overflowed = false;
            if is_fwd {
                if fwd == u8::MAX {
                    overflowed = true;
                } else {
                    fwd += 1;
                }
            } else if rev == u8::MAX {
                overflowed = true;
            } else {
                rev += 1;
            }
            if starts_read {
                flags |= if is_fwd { FLAG_FWD_STARTS_READ } else { FLAG_REV_STARTS_READ };
            }
            if overflowed {
                let mut overflow = self.overflow.lock();
                let entry = overflow.entry(key).or_insert((0, 0));
                if is_fwd {
                    entry.0 += 1;
                } else {
                    entry.1 += 1;
                }
                drop(overflow);
                if starts_read {
                    let new_value = pack(fwd, rev, flags);
                    if value_slot.compare_exchange_weak(current, new_value, Ordering::Relaxed, Ordering::Relaxed).is_err() {
                        current = value_slot.load(Ordering::Relaxed);
                        continue;
                    }
                }
                return true;
            }
            let new_value = pack(fwd, rev, flags);
            match value_slot.compare_exchange_weak(current, new_value, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Iterate every surviving kmer with its combined (table + overflow)
    /// counts and start-of-read flags.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u32, u32, bool, bool)> + '_ {
        let overflow = self.overflow.lock();
        let overflow_snapshot: HashMap<u64, (u32, u32)> = overflow.clone();
        drop(overflow);
        self.keys.iter().enumerate().filter_map(move |(idx, key_slot)| {
            let key = key_slot.load(Ordering::Relaxed);
            if key == SENTINEL {
                return None;
            }
            let (fwd, rev, flags) = unpack(self.values[idx].load(Ordering::Relaxed));
            let (extra_fwd, extra_rev) = overflow_snapshot.get(&key).copied().unwrap_or((0, 0));
            Some((
                key,
                u32::from(fwd) + extra_fwd,
                u32::from(rev) + extra_rev,
                flags & FLAG_FWD_STARTS_READ != 0,
                flags & FLAG_REV_STARTS_READ != 0,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_fwd_and_rev_independently() {
        let table = ExactTable::new(16);
        assert!(table.record(42, true, true));
        assert!(table.record(42, true, false));
        assert!(table.record(42, false, false));
        let (key, fwd, rev, fwd_starts, rev_starts) = table.iter().next().unwrap();
        assert_eq!(key, 42);
        assert_eq!(fwd, 2);
        assert_eq!(rev, 1);
        assert!(fwd_starts);
        assert!(!rev_starts);
    }

    #[test]
    fn distinct_keys_occupy_distinct_slots() {
        let table = ExactTable::new(16);
        table.record(1, true, false);
        table.record(2, true, false);
        let mut seen: Vec<u64> = table.iter().map(|(k, ..)| k).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn overflow_past_u8_max_is_combined_on_iteration() {
        let table = ExactTable::new(4);
        for _ in 0..300 {
            table.record(7, true, false);
        }
        let (_, fwd, _, _, _) = table.iter().next().unwrap();
        assert_eq!(fwd, 300);
    }
}
