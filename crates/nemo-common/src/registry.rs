//! Static registry of known field names and their grid point.
//!
//! The table is written by hand so that a field is never classified from
//! substrings of its name. Fields not listed are left alone by the
//! assembler; output files routinely carry extra diagnostics.

use crate::point::GridPointType;

/// Where a registered field lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPlacement {
    /// Sampled at a grid point.
    Point(GridPointType),
    /// Grid sizes, flags and other values without a position.
    PositionIndependent,
}

use GridPointType::{F, T, U, UW, V, VW, W, FW};

const DOMCFG_POINTS: &[(&str, Option<GridPointType>)] = &[
    ("nav_lon", Some(T)),
    ("nav_lat", Some(T)),
    ("jpiglo", None),
    ("jpjglo", None),
    ("jpkglo", None),
    ("jperio", None),
    ("ln_zco", None),
    ("ln_zps", None),
    ("ln_sco", None),
    ("ln_isfcav", None),
    ("glamt", Some(T)),
    ("glamu", Some(U)),
    ("glamv", Some(V)),
    ("glamf", Some(F)),
    ("gphit", Some(T)),
    ("gphiu", Some(U)),
    ("gphiv", Some(V)),
    ("gphif", Some(F)),
    ("e1t", Some(T)),
    ("e1u", Some(U)),
    ("e1v", Some(V)),
    ("e1f", Some(F)),
    ("e2t", Some(T)),
    ("e2u", Some(U)),
    ("e2v", Some(V)),
    ("e2f", Some(F)),
    ("ff_f", Some(F)),
    ("ff_t", Some(T)),
    ("e3t_1d", Some(T)),
    ("e3w_1d", Some(W)),
    ("e3t_0", Some(T)),
    ("e3u_0", Some(U)),
    ("e3v_0", Some(V)),
    ("e3f_0", Some(F)),
    ("e3w_0", Some(W)),
    ("e3uw_0", Some(UW)),
    ("e3vw_0", Some(VW)),
    ("e3fw_0", Some(FW)),
    ("top_level", Some(T)),
    ("bottom_level", Some(T)),
    ("stiffness", Some(T)),
    ("gdept_0", Some(T)),
    ("gdepw_0", Some(W)),
    ("gdepu", Some(U)),
    ("gdepv", Some(V)),
    ("ht_0", Some(T)),
    ("hu_0", Some(U)),
    ("hv_0", Some(V)),
    ("tmask", Some(T)),
    ("umask", Some(U)),
    ("vmask", Some(V)),
    ("fmask", Some(F)),
    ("tmaskutil", Some(T)),
    ("umaskutil", Some(U)),
    ("vmaskutil", Some(V)),
    ("gdept_1d", Some(T)),
    ("gdepw_1d", Some(W)),
    ("mbathy", Some(T)),
    ("misf", Some(T)),
    ("isfdraft", Some(T)),
];

/// Read-only view over the domain configuration field table.
pub struct PointRegistry;

impl PointRegistry {
    /// Look up a field by its canonical name.
    ///
    /// `None` means the name is not registered and must be skipped, not
    /// treated as an error.
    pub fn lookup(name: &str) -> Option<FieldPlacement> {
        DOMCFG_POINTS
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, point)| match point {
                Some(p) => FieldPlacement::Point(*p),
                None => FieldPlacement::PositionIndependent,
            })
    }

    /// Grid point of a field, if it is registered and has one.
    pub fn point_of(name: &str) -> Option<GridPointType> {
        match Self::lookup(name)? {
            FieldPlacement::Point(p) => Some(p),
            FieldPlacement::PositionIndependent => None,
        }
    }

    /// All registered entries, in table order.
    pub fn entries() -> impl Iterator<Item = (&'static str, FieldPlacement)> {
        DOMCFG_POINTS.iter().map(|(name, point)| {
            let placement = match point {
                Some(p) => FieldPlacement::Point(*p),
                None => FieldPlacement::PositionIndependent,
            };
            (*name, placement)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_known_fields() {
        assert_eq!(PointRegistry::lookup("glamt"), Some(FieldPlacement::Point(T)));
        assert_eq!(PointRegistry::lookup("e3u_0"), Some(FieldPlacement::Point(U)));
        assert_eq!(PointRegistry::lookup("e3uw_0"), Some(FieldPlacement::Point(UW)));
        assert_eq!(
            PointRegistry::lookup("jpiglo"),
            Some(FieldPlacement::PositionIndependent)
        );
    }

    #[test]
    fn test_unknown_field_is_absent() {
        assert_eq!(PointRegistry::lookup("sossheig"), None);
        // no substring guessing
        assert_eq!(PointRegistry::lookup("glamt_extra"), None);
        assert_eq!(PointRegistry::point_of("ln_zco"), None);
    }

    #[test]
    fn test_entries_are_unique() {
        let mut seen = HashSet::new();
        for (name, _) in PointRegistry::entries() {
            assert!(seen.insert(name), "duplicate registry entry {}", name);
        }
    }
}
