//! Common test fixtures for nemo-domain tests.
//!
//! Domain sizes, processor decompositions and the variable names the
//! generators write for each grid point.

/// Synthetic domain sizes.
pub mod domain {
    /// Size of a synthetic model domain.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DomainSize {
        pub nx: usize,
        pub ny: usize,
        /// Number of vertical levels; 0 for a surface-only domain.
        pub nz: usize,
    }

    impl DomainSize {
        pub fn has_vertical(&self) -> bool {
            self.nz > 0
        }
    }

    /// 10x10 basin with 5 levels.
    pub const BASIN: DomainSize = DomainSize {
        nx: 10,
        ny: 10,
        nz: 5,
    };

    /// 10x10 basin without vertical levels.
    pub const SURFACE: DomainSize = DomainSize {
        nx: 10,
        ny: 10,
        nz: 0,
    };

    /// Small rectangular domain for quick tests.
    pub const SMALL: DomainSize = DomainSize {
        nx: 4,
        ny: 3,
        nz: 2,
    };
}

/// Processor decompositions as `(tiles along x, tiles along y)`.
pub mod decomposition {
    pub const SINGLE: (usize, usize) = (1, 1);
    pub const FOUR_BY_ONE: (usize, usize) = (4, 1);
    pub const TWO_BY_TWO: (usize, usize) = (2, 2);
}

/// Names used in synthetic files.
pub mod names {
    /// Time dimension of field files.
    pub const TIME: &str = "time_counter";
    /// Time dimension of domain configuration files.
    pub const DOMCFG_TIME: &str = "t";
    /// Vertical dimension of domain configuration files.
    pub const DOMCFG_LEVEL: &str = "nav_lev";
    /// Bounds dimension of `time_counter_bounds`.
    pub const BOUNDS: &str = "axis_nbounds";

    /// Field variable written to a `grid_<TYPE>` file.
    pub fn field_variable(point: &str) -> &'static str {
        match point {
            "T" => "thetao",
            "U" => "uo",
            "V" => "vo",
            "F" => "relvor",
            "W" => "woce",
            "UW" => "avm_u",
            "VW" => "avm_v",
            _ => "avm_f",
        }
    }

    /// Depth dimension of a `grid_<TYPE>` file.
    pub fn depth_dim(point: &str) -> String {
        format!("depth{}", point.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_specs() {
        assert!(domain::BASIN.has_vertical());
        assert!(!domain::SURFACE.has_vertical());
        assert_eq!(domain::SMALL.nx * domain::SMALL.ny, 12);
    }

    #[test]
    fn test_names() {
        assert_eq!(names::field_variable("T"), "thetao");
        assert_eq!(names::depth_dim("UW"), "depthuw");
    }
}
