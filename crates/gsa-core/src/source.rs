//! Generation-source identity.
//!
//! A controllable injection point is addressed by a ([`SourceKind`], index)
//! pair. The kind set is closed: synchronous generators, the external grid
//! tie, and static (distributed) generators. Cost assignment, dispatch rows,
//! and solved source results are all keyed by [`SourceRef`], so the three
//! categories share one code path everywhere downstream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of generation-source categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Synchronous generator (voltage-controlled)
    Gen,
    /// External grid tie (the slack injection)
    ExtGrid,
    /// Static generator (fixed or dispatchable PQ injection)
    Sgen,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Gen, SourceKind::ExtGrid, SourceKind::Sgen];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Gen => "gen",
            SourceKind::ExtGrid => "ext_grid",
            SourceKind::Sgen => "sgen",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one generation source within a network.
///
/// `index` is the element's own id value within its category, unique per
/// category in any well-formed network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub index: usize,
}

impl SourceRef {
    pub fn new(kind: SourceKind, index: usize) -> Self {
        Self { kind, index }
    }

    pub fn gen(index: usize) -> Self {
        Self::new(SourceKind::Gen, index)
    }

    pub fn ext_grid(index: usize) -> Self {
        Self::new(SourceKind::ExtGrid, index)
    }

    pub fn sgen(index: usize) -> Self {
        Self::new(SourceKind::Sgen, index)
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.index)
    }
}

/// Accepts `gen0`, `gen:0`, and `gen 0` spellings; used for CLI cost args.
impl FromStr for SourceRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for kind in SourceKind::ALL {
            if let Some(rest) = s.strip_prefix(kind.as_str()) {
                let rest = rest.trim_start_matches([':', ' ']);
                if rest.is_empty() {
                    return Err(format!("missing index in source `{}`", s));
                }
                let index = rest
                    .parse::<usize>()
                    .map_err(|_| format!("bad index `{}` in source `{}`", rest, s))?;
                return Ok(SourceRef::new(kind, index));
            }
        }
        Err(format!(
            "unknown source `{}` (expected gen<N>, ext_grid<N>, or sgen<N>)",
            s
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrip() {
        let src = SourceRef::sgen(4);
        assert_eq!(src.to_string(), "sgen 4");
        assert_eq!("sgen 4".parse::<SourceRef>().unwrap(), src);
    }

    #[test]
    fn test_parse_compact_spellings() {
        assert_eq!("gen0".parse::<SourceRef>().unwrap(), SourceRef::gen(0));
        assert_eq!(
            "ext_grid:1".parse::<SourceRef>().unwrap(),
            SourceRef::ext_grid(1)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("turbine3".parse::<SourceRef>().is_err());
        assert!("gen".parse::<SourceRef>().is_err());
        assert!("genx".parse::<SourceRef>().is_err());
    }

    #[test]
    fn test_ordering_groups_by_kind() {
        let mut refs = vec![SourceRef::sgen(0), SourceRef::gen(2), SourceRef::ext_grid(0)];
        refs.sort();
        assert_eq!(refs[0].kind, SourceKind::Gen);
        assert_eq!(refs[1].kind, SourceKind::ExtGrid);
        assert_eq!(refs[2].kind, SourceKind::Sgen);
    }
}
