use crate::slice::DnaSlice;

/// Number of bases per symbol the entropy calculation groups bases into,
/// matching the original's `k_kmer_size`.
const KMER_SIZE: usize = 3;
const NUM_SYMBOLS: usize = 1 << (2 * KMER_SIZE);

/// Total Shannon entropy (in bits) of `slice`, computed over overlapping
/// `KMER_SIZE`-base symbols: `sum(-p * log2(p)) * num_symbols_seen`, where
/// `p` is each symbol's observed frequency. Sequences shorter than
/// `KMER_SIZE` contain no complete symbol and have zero entropy.
///
/// This is a low-complexity filter (original: `shannon_entropy.h`): a
/// sequence of `"AAAAAA..."` has entropy 0 regardless of length, while a
/// random sequence's entropy tracks its length closely. Grounded on
/// `original_source/modules/bio_base/shannon_entropy.{h,cpp}`, simplified
/// to a one-shot floating-point calculation over a whole slice rather than
/// the original's incremental fixed-point-integer `push_front`/`pop_back`
/// sliding window (this crate has no streaming read-correction pipeline to
/// wire that window into).
#[must_use]
pub fn shannon_entropy(slice: DnaSlice<'_>) -> f64 {
    if slice.len() < KMER_SIZE {
        return 0.0;
    }
    let mut counts = [0u32; NUM_SYMBOLS];
    let mut symbol_id = 0u32;
    let mut total = 0u32;
    for (i, base) in slice.iter().enumerate() {
        symbol_id = ((symbol_id << 2) | u32::from(base.value())) & (NUM_SYMBOLS as u32 - 1);
        if i + 1 >= KMER_SIZE {
            counts[symbol_id as usize] += 1;
            total += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    let total_f = f64::from(total);
    let mut bits_per_symbol = 0.0f64;
    for &count in &counts {
        if count == 0 {
            continue;
        }
        let p = f64::from(count) / total_f;
        bits_per_symbol -= p * p.log2();
    }
    bits_per_symbol * total_f
}

/// The smallest prefix length of `slice` whose entropy reaches
/// `threshold`, or `None` if even the full slice doesn't reach it.
/// Threshold is expressed on the same scale `shannon_entropy` returns, so a
/// threshold near `slice.len()` corresponds to "close to maximally random".
#[must_use]
pub fn length_needed(slice: DnaSlice<'_>, threshold: f64) -> Option<usize> {
    for len in KMER_SIZE..=slice.len() {
        let prefix = slice.subseq(0, len).expect("len <= slice.len()");
        if shannon_entropy(prefix) >= threshold {
            return Some(len);
        }
    }
    None
}
