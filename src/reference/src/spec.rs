use crate::error::ReferenceError;

/// A parsed `--scaffold` CLI argument: `NAME` or `NAME:START-END` (both ends
/// inclusive-start/exclusive-end, 0-based, matching the rest of the
/// coordinate conventions in this workspace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldSpec {
    pub name: String,
    pub range: Option<(u64, u64)>,
}

pub fn parse_scaffold_spec(spec: &str) -> Result<ScaffoldSpec, ReferenceError> {
    match spec.split_once(':') {
        None => Ok(ScaffoldSpec { name: spec.to_string(), range: None }),
        Some((name, range)) => {
            let (start, end) = range
                .split_once('-')
                .ok_or_else(|| ReferenceError::InvalidScaffoldSpec(spec.to_string()))?;
            let start: u64 = start.parse().map_err(|_| ReferenceError::InvalidScaffoldSpec(spec.to_string()))?;
            let end: u64 = end.parse().map_err(|_| ReferenceError::InvalidScaffoldSpec(spec.to_string()))?;
            if end < start {
                return Err(ReferenceError::InvalidScaffoldSpec(spec.to_string()));
            }
            Ok(ScaffoldSpec { name: name.to_string(), range: Some((start, end)) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_has_no_range() {
        let s = parse_scaffold_spec("chr1").unwrap();
        assert_eq!(s.name, "chr1");
        assert_eq!(s.range, None);
    }

    #[test]
    fn name_with_range_parses_both_ends() {
        let s = parse_scaffold_spec("chr1:100-200").unwrap();
        assert_eq!(s.name, "chr1");
        assert_eq!(s.range, Some((100, 200)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(parse_scaffold_spec("chr1:200-100").is_err());
    }

    #[test]
    fn malformed_range_is_rejected() {
        assert!(parse_scaffold_spec("chr1:abc-def").is_err());
        assert!(parse_scaffold_spec("chr1:100").is_err());
    }
}
