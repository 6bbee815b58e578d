use serde::{Deserialize, Serialize};

pub const FORMAT_VERSION: u32 = 1;

/// `ref_map.json`'s contents: enough to sanity-check a `ref_map.bin`
/// against the seqset it was built from before trusting its bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefMapMeta {
    pub version: u32,
    pub seqset_uuid: [u8; 16],
    pub entry_count: u64,
}

impl RefMapMeta {
    #[must_use]
    pub fn new(seqset_uuid: [u8; 16], entry_count: u64) -> Self {
        RefMapMeta { version: FORMAT_VERSION, seqset_uuid, entry_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_roundtrips_through_json() {
        let meta = RefMapMeta::new([3u8; 16], 9);
        let json = serde_json::to_string(&meta).unwrap();
        let back: RefMapMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
    }
}
