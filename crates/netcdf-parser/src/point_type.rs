//! Grid point type of a field output file.
//!
//! NEMO writes one file per grid point, named `<prefix>_grid_<TYPE>.nc`,
//! and usually describes its content as `ocean <TYPE> grid variables`.

use nemo_common::{GridPointType, NemoError, NemoResult};

/// Type named by a `grid_<TYPE>` part of the file name.
///
/// Returns `Ok(None)` when the name has no `grid_` part and
/// `InvalidPointType` when it names something that is not a point type.
pub fn point_type_from_filename(file_name: &str) -> NemoResult<Option<GridPointType>> {
    let Some(start) = file_name.rfind("grid_") else {
        return Ok(None);
    };
    let tail = &file_name[start + "grid_".len()..];
    let token: String = tail
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if token.is_empty() {
        return Ok(None);
    }
    token.parse().map(Some)
}

/// Type named by an `ocean <TYPE> grid` description.
pub fn point_type_from_description(description: &str) -> NemoResult<Option<GridPointType>> {
    let words: Vec<&str> = description.split_whitespace().collect();
    for window in words.windows(3) {
        if window[0].eq_ignore_ascii_case("ocean") && window[2].eq_ignore_ascii_case("grid") {
            return window[1].to_ascii_uppercase().parse().map(Some);
        }
    }
    Ok(None)
}

/// Decide the grid point of a field file.
///
/// An explicit type wins. Otherwise the file name and the description
/// attribute are consulted; when both give a type they must agree.
pub fn infer_point_type(
    file_name: &str,
    description: Option<&str>,
    explicit: Option<GridPointType>,
) -> NemoResult<GridPointType> {
    if let Some(point) = explicit {
        return Ok(point);
    }
    let from_filename = point_type_from_filename(file_name)?;
    let from_description = match description {
        Some(d) => point_type_from_description(d)?,
        None => None,
    };
    match (from_filename, from_description) {
        (Some(a), Some(b)) if a != b => Err(NemoError::ConflictingPointType {
            from_filename: a.to_string(),
            from_description: b.to_string(),
        }),
        (Some(a), _) => Ok(a),
        (None, Some(b)) => Ok(b),
        (None, None) => Err(NemoError::UndeterminedPointType(file_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename() {
        assert_eq!(
            point_type_from_filename("BASIN_grid_T.nc").unwrap(),
            Some(GridPointType::T)
        );
        assert_eq!(
            point_type_from_filename("BASIN_5d_grid_UW.nc").unwrap(),
            Some(GridPointType::UW)
        );
        assert_eq!(
            point_type_from_filename("BASIN_grid_V_0003.nc").unwrap(),
            Some(GridPointType::V)
        );
        assert_eq!(point_type_from_filename("BASIN_icemod.nc").unwrap(), None);
        assert!(matches!(
            point_type_from_filename("BASIN_grid_Q.nc"),
            Err(NemoError::InvalidPointType(_))
        ));
    }

    #[test]
    fn test_from_description() {
        assert_eq!(
            point_type_from_description("ocean V grid variables").unwrap(),
            Some(GridPointType::V)
        );
        assert_eq!(
            point_type_from_description("Ocean uw grid variables").unwrap(),
            Some(GridPointType::UW)
        );
        assert_eq!(point_type_from_description("sea ice variables").unwrap(), None);
    }

    #[test]
    fn test_conflict() {
        let err = infer_point_type("BASIN_grid_U.nc", Some("ocean V grid variables"), None)
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, NemoError::ConflictingPointType { .. }));
        assert!(msg.contains('U') && msg.contains('V'));
    }

    #[test]
    fn test_agreeing_sources() {
        let p = infer_point_type("BASIN_grid_U.nc", Some("ocean U grid variables"), None).unwrap();
        assert_eq!(p, GridPointType::U);
    }

    #[test]
    fn test_description_only() {
        let p = infer_point_type("surface.nc", Some("ocean T grid variables"), None).unwrap();
        assert_eq!(p, GridPointType::T);
    }

    #[test]
    fn test_undetermined() {
        assert!(matches!(
            infer_point_type("surface.nc", None, None),
            Err(NemoError::UndeterminedPointType(_))
        ));
    }

    #[test]
    fn test_explicit_wins() {
        let p = infer_point_type("surface.nc", None, Some(GridPointType::W)).unwrap();
        assert_eq!(p, GridPointType::W);
    }
}
