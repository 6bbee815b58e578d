//! Packed vectors of fixed-width (`VarBitVec`) and per-vector-adaptive-width
//! (`VarIntVec`) integers, for the dense per-entry arrays the seqset and
//! ref-map formats are built from (`shared`, `sizes`, occurrence counts).
//!
//! `original_source` dispatches across nine specialized byte-width
//! strategies (B=0, 8 exact byte widths, and the 1..=7-bit-into-next-byte
//! case) chosen at construction time, so the per-get/per-set cost is a
//! single indirect call rather than a generic bit-shift loop. That fans out
//! into a lot of near-duplicate code for a port that cannot be benchmarked
//! in this environment; `VarBitVec` here stores `bits: 0..=64` and computes
//! the bit-level get/set generically. See DESIGN.md for the tradeoff.

use std::sync::atomic::{AtomicU8, Ordering};

mod error;
mod varint;

pub use error::VarBitError;
pub use varint::VarIntVec;

/// A packed vector of `len` values, each occupying exactly `bits` bits
/// (0..=64), stored contiguously. `bits == 0` stores nothing: every value
/// reads back as zero.
pub struct VarBitVec {
    bits: u32,
    len: usize,
    data: Vec<AtomicU8>,
}

fn bytes_needed(len: usize, bits: u32) -> usize {
    if bits == 0 || len == 0 {
        return 0;
    }
    let total_bits = len as u128 * u128::from(bits);
    usize::try_from(total_bits.div_ceil(8)).expect("varbit byte count overflowed usize")
}

impl VarBitVec {
    /// # Panics
    /// Panics if `bits > 64`.
    #[must_use]
    pub fn new(len: usize, bits: u32) -> Self {
        assert!(bits <= 64, "varbit width must fit in a u64, got {bits}");
        let data = (0..bytes_needed(len, bits)).map(|_| AtomicU8::new(0)).collect();
        VarBitVec { bits, len, data }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// The largest value this width can hold, i.e. `2^bits - 1`.
    #[must_use]
    pub fn max_value(&self) -> u64 {
        if self.bits == 0 {
            0
        } else if self.bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    fn bit_offset(&self, index: usize) -> u64 {
        index as u64 * u64::from(self.bits)
    }

    /// Non-atomic read: correct for single-threaded use or once all writers
    /// have finished (seqset/ref-map readers, post-construction).
    #[must_use]
    pub fn get(&self, index: usize) -> u64 {
        debug_assert!(index < self.len, "varbit index {index} out of bounds (len {})", self.len);
        if self.bits == 0 {
            return 0;
        }
        let start_bit = self.bit_offset(index);
        let mut value: u64 = 0;
        let mut bits_read = 0u32;
        while bits_read < self.bits {
            let bit = start_bit + u64::from(bits_read);
            let byte_idx = (bit / 8) as usize;
            let bit_in_byte = (bit % 8) as u32;
            let take = (8 - bit_in_byte).min(self.bits - bits_read);
            let byte = self.data[byte_idx].load(Ordering::Relaxed);
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (byte >> bit_in_byte) & mask;
            value |= u64::from(chunk) << bits_read;
            bits_read += take;
        }
        value
    }

    /// Write `value` at `index` using per-byte compare-and-swap so that
    /// concurrent sets to disjoint elements (even ones sharing a byte) are
    /// safe. Concurrent sets to the *same* element race as usual -- only
    /// the individual byte-level store is atomic, not a read-modify-write
    /// across the whole value.
    ///
    /// # Panics
    /// Panics (debug builds) if `value` does not fit in `bits` bits.
    pub fn set(&self, index: usize, value: u64) {
        debug_assert!(index < self.len, "varbit index {index} out of bounds (len {})", self.len);
        debug_assert!(value <= self.max_value(), "value {value} does not fit in {} bits", self.bits);
        if self.bits == 0 {
            return;
        }
        let start_bit = self.bit_offset(index);
        let mut bits_written = 0u32;
        while bits_written < self.bits {
            let bit = start_bit + u64::from(bits_written);
            let byte_idx = (bit / 8) as usize;
            let bit_in_byte = (bit % 8) as u32;
            let take = (8 - bit_in_byte).min(self.bits - bits_written);
            let mask = (((1u16 << take) - 1) as u8) << bit_in_byte;
            let chunk = (((value >> bits_written) as u8) << bit_in_byte) & mask;

            let cell = &self.data[byte_idx];
            let mut current = cell.load(Ordering::Relaxed);
            loop {
                let new_byte = (current & !mask) | chunk;
                if new_byte == current {
                    break;
                }
                match cell.compare_exchange_weak(current, new_byte, Ordering::Relaxed, Ordering::Relaxed) {
                    Ok(_) => break,
                    Err(actual) => current = actual,
                }
            }
            bits_written += take;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    /// Snapshot the packed bytes, for persisting a finished vector to disk
    /// (seqset/ref-map builders write this straight out; [`VarBitView`]
    /// reads it back from an mmap without copying).
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().map(|b| b.load(Ordering::Relaxed)).collect()
    }
}

impl std::fmt::Debug for VarBitVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarBitVec").field("bits", &self.bits).field("len", &self.len).finish()
    }
}

/// A read-only view of a [`VarBitVec`]'s packed bytes, for reading a
/// finished vector straight out of an mmap without copying it into a
/// `Vec<AtomicU8>` first.
#[derive(Clone, Copy)]
pub struct VarBitView<'a> {
    bits: u32,
    len: usize,
    data: &'a [u8],
}

impl<'a> VarBitView<'a> {
    /// # Panics
    /// Panics if `data` is shorter than `bytes_needed(len, bits)`.
    #[must_use]
    pub fn new(data: &'a [u8], len: usize, bits: u32) -> Self {
        let needed = bytes_needed(len, bits);
        assert!(data.len() >= needed, "varbit view needs {needed} bytes, got {}", data.len());
        VarBitView { bits, len, data }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> u64 {
        debug_assert!(index < self.len, "varbit index {index} out of bounds (len {})", self.len);
        if self.bits == 0 {
            return 0;
        }
        let start_bit = index as u64 * u64::from(self.bits);
        let mut value: u64 = 0;
        let mut bits_read = 0u32;
        while bits_read < self.bits {
            let bit = start_bit + u64::from(bits_read);
            let byte_idx = (bit / 8) as usize;
            let bit_in_byte = (bit % 8) as u32;
            let take = (8 - bit_in_byte).min(self.bits - bits_read);
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (self.data[byte_idx] >> bit_in_byte) & mask;
            value |= u64::from(chunk) << bits_read;
            bits_read += take;
        }
        value
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}
