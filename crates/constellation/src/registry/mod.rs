//! Registries: CRUD over CIs and relationships.
//!
//! Both registries are thin: they validate input, issue one statement through
//! the shared [`GraphStore`](crate::store::GraphStore) handle, and decode the
//! returned rows. They hold no state of their own and are cheap to clone.

mod assets;
mod batch;
mod relationships;

pub use assets::AssetRegistry;
pub use batch::{CiCreationReport, FailedRelationship};
pub use relationships::RelationshipRegistry;

use crate::error::ValidationError;

/// Bounds for `list` and `list_all` page sizes.
pub const LIST_LIMIT_RANGE: (usize, usize) = (1, 1000);

/// Bounds for `search` result sizes.
pub const SEARCH_LIMIT_RANGE: (usize, usize) = (1, 100);

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Default result size for searches.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

fn check_limit(field: &'static str, value: usize, range: (usize, usize)) -> Result<(), ValidationError> {
    let (min, max) = range;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::LimitOutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0, false)]
    #[case::min(1, true)]
    #[case::max(1000, true)]
    #[case::over(1001, false)]
    fn list_limit_bounds(#[case] value: usize, #[case] ok: bool) {
        assert_eq!(check_limit("limit", value, LIST_LIMIT_RANGE).is_ok(), ok);
    }

    #[test]
    fn search_limit_caps_at_100() {
        assert!(check_limit("limit", 100, SEARCH_LIMIT_RANGE).is_ok());
        assert!(check_limit("limit", 101, SEARCH_LIMIT_RANGE).is_err());
    }
}
