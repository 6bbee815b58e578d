use crate::error::VarBitError;
use crate::VarBitVec;

/// A packed vector whose per-value bit width is chosen from the data: the
/// smallest `bits` such that every value fits. Construction is one pass to
/// find the max, then a second pass to pack -- there is no per-value width,
/// unlike a true variable-length (LEB128-style) encoding.
pub struct VarIntVec {
    inner: VarBitVec,
}

fn bits_for_max(max_value: u64) -> u32 {
    if max_value == 0 {
        0
    } else {
        64 - max_value.leading_zeros()
    }
}

impl VarIntVec {
    #[must_use]
    pub fn from_values(values: &[u64]) -> Self {
        let max_value = values.iter().copied().max().unwrap_or(0);
        let bits = bits_for_max(max_value);
        let inner = VarBitVec::new(values.len(), bits);
        for (i, &v) in values.iter().enumerate() {
            inner.set(i, v);
        }
        VarIntVec { inner }
    }

    /// Build an empty vector pre-sized for `len` entries, all of which must
    /// fit within `max_value`.
    #[must_use]
    pub fn with_max(len: usize, max_value: u64) -> Self {
        VarIntVec { inner: VarBitVec::new(len, bits_for_max(max_value)) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn bits(&self) -> u32 {
        self.inner.bits()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> u64 {
        self.inner.get(index)
    }

    pub fn set(&self, index: usize, value: u64) -> Result<(), VarBitError> {
        if value > self.inner.max_value() {
            return Err(VarBitError::ValueTooWide { value, bits: self.inner.bits(), max: self.inner.max_value() });
        }
        self.inner.set(index, value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.inner.iter()
    }
}
