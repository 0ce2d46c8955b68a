use proptest::prelude::*;

use super::token::ClaimId;

proptest! {
    /// Numeric and string forms of the same positive id resolve identically.
    #[test]
    fn prop_positive_ids_resolve_in_both_forms(id in 1i64..=i64::MAX) {
        prop_assert_eq!(ClaimId::Int(id).as_id(), Some(id));
        prop_assert_eq!(ClaimId::Str(id.to_string()).as_id(), Some(id));
        prop_assert_eq!(ClaimId::Str(format!(" {id} ")).as_id(), Some(id));
    }

    #[test]
    fn prop_non_positive_ids_are_rejected(id in i64::MIN..=0i64) {
        prop_assert_eq!(ClaimId::Int(id).as_id(), None);
        prop_assert_eq!(ClaimId::Str(id.to_string()).as_id(), None);
    }

    #[test]
    fn prop_non_numeric_strings_are_rejected(raw in "[a-zA-Z][a-zA-Z0-9_-]{0,12}") {
        prop_assert_eq!(ClaimId::Str(raw).as_id(), None);
    }
}
