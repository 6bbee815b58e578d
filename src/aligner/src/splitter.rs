use tracer::Assembly;

/// Split `a` at `seq_split_len` bases into its sequence's own offset, and at
/// `ref_split_len` bases into its reference span, producing two
/// sub-assemblies that partition `a` exactly (spec.md 4.I step 4). The left
/// half keeps `a`'s id and left anchor; the right half is assigned `new_id`
/// and keeps `a`'s right anchor. Neither half carries `aligned_variants`
/// forward -- callers reassign `matches_reference` on each half themselves.
#[must_use]
pub fn split_assembly(a: &Assembly, seq_split_len: usize, ref_split_len: u64, new_id: u64) -> (Assembly, Assembly) {
    let mid_offset = a.left_offset.map(|lo| lo + ref_split_len);

    let left_seq = a.seq.subseq(0, seq_split_len).expect("seq_split_len within the assembly's sequence");
    let right_seq = a.seq.subseq(seq_split_len, a.seq.size() - seq_split_len).expect("seq_split_len within the assembly's sequence");

    let left = Assembly {
        id: a.id,
        seq: left_seq,
        left_offset: a.left_offset,
        right_offset: mid_offset,
        matches_reference: a.matches_reference,
        left_anchor_len: a.left_anchor_len,
        right_anchor_len: 0,
        read_ids: a.read_ids.clone(),
        aligned_variants: Vec::new(),
    };
    let right = Assembly {
        id: new_id,
        seq: right_seq,
        left_offset: mid_offset,
        right_offset: a.right_offset,
        matches_reference: a.matches_reference,
        left_anchor_len: 0,
        right_anchor_len: a.right_anchor_len,
        read_ids: a.read_ids.clone(),
        aligned_variants: Vec::new(),
    };
    (left, right)
}

fn set_matches_reference(a: &mut Assembly) {
    a.matches_reference = true;
    a.left_anchor_len = 0;
    a.right_anchor_len = 0;
}

/// The align-splitter (spec.md 4.I step 4): walk an aligned assembly's
/// `aligned_variants` left to right, emitting a reference-matching
/// assembly for each gap between variants (and before the first / after
/// the last), and one assembly per variant. This is the final output stage
/// of the variant pipeline -- every assembly it returns either
/// `matches_reference` or replaces a specific reference span with
/// `a.seq`'s corresponding bases.
///
/// Assemblies with an anchor-dropped offset on either side have no
/// reference span to split against and are returned unchanged.
pub fn split_into_regions(a: &Assembly, mut next_id: impl FnMut() -> u64) -> Vec<Assembly> {
    let (Some(orig_left), Some(orig_right)) = (a.left_offset, a.right_offset) else {
        return vec![a.clone()];
    };

    let mut vars = a.aligned_variants.clone();
    vars.sort_by(|x, y| x.left.cmp(&y.left).then(x.right.cmp(&y.right)));

    let mut ref_offset = orig_left;
    let mut current = a.clone();
    current.aligned_variants.clear();
    let mut out = Vec::new();

    for v in vars {
        debug_assert!(v.left >= ref_offset);
        debug_assert!(v.right <= orig_right);

        if v.left != ref_offset {
            let ref_chunk_size = v.left - ref_offset;
            let (mut ref_piece, rest) = split_assembly(&current, ref_chunk_size as usize, ref_chunk_size, next_id());
            set_matches_reference(&mut ref_piece);
            out.push(ref_piece);
            current = rest;
            ref_offset = v.left;
        }

        let var_span = v.right - v.left;
        let (mut var_piece, rest) = split_assembly(&current, v.seq.size(), var_span, next_id());
        var_piece.matches_reference = false;
        out.push(var_piece);
        current = rest;
        ref_offset = v.right;
    }

    let trailing_is_empty = current.left_offset == current.right_offset && current.seq.is_empty();
    if !trailing_is_empty {
        set_matches_reference(&mut current);
        out.push(current);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dna_core::DnaSequence;
    use tracer::AlignedVariant;

    fn assembly(seq: &str, left_offset: u64, right_offset: u64, variants: Vec<AlignedVariant>) -> Assembly {
        Assembly {
            id: 0,
            seq: DnaSequence::parse(seq).unwrap(),
            left_offset: Some(left_offset),
            right_offset: Some(right_offset),
            matches_reference: false,
            left_anchor_len: 0,
            right_anchor_len: 0,
            read_ids: Vec::new(),
            aligned_variants: variants,
        }
    }

    #[test]
    fn single_middle_variant_yields_three_regions() {
        // spec.md's S6 expectation: ref "ACG" | var "A"->"T" | ref "TACGT".
        let variant = AlignedVariant { left: 3, right: 4, seq: DnaSequence::parse("A").unwrap() };
        let a = assembly("ACGATACGT", 0, 9, vec![variant]);
        let mut next = 100u64;
        let regions = split_into_regions(&a, || {
            next += 1;
            next
        });

        assert_eq!(regions.len(), 3);
        assert!(regions[0].matches_reference);
        assert_eq!(regions[0].seq.as_string(), "ACG");
        assert_eq!((regions[0].left_offset, regions[0].right_offset), (Some(0), Some(3)));

        assert!(!regions[1].matches_reference);
        assert_eq!(regions[1].seq.as_string(), "A");
        assert_eq!((regions[1].left_offset, regions[1].right_offset), (Some(3), Some(4)));

        assert!(regions[2].matches_reference);
        assert_eq!(regions[2].seq.as_string(), "TACGT");
        assert_eq!((regions[2].left_offset, regions[2].right_offset), (Some(4), Some(9)));
    }

    #[test]
    fn no_variants_yields_single_reference_region() {
        let a = assembly("ACGTACGTAC", 0, 10, Vec::new());
        let mut next = 0u64;
        let regions = split_into_regions(&a, || {
            next += 1;
            next
        });
        assert_eq!(regions.len(), 1);
        assert!(regions[0].matches_reference);
        assert_eq!(regions[0].seq.as_string(), "ACGTACGTAC");
    }

    #[test]
    fn anchor_dropped_assembly_returned_unchanged() {
        let mut a = assembly("ACGT", 0, 4, Vec::new());
        a.right_offset = None;
        let regions = split_into_regions(&a, || 0);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].left_offset, Some(0));
        assert_eq!(regions[0].right_offset, None);
    }
}
