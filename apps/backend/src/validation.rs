//! Field-level validation shared by the admin API and the database engines.

use std::collections::BTreeMap;

use lazy_regex::regex_is_match;
use serde::Serialize;

/// `field -> messages`, rendered as the `details` of a 422 response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Request bodies that check themselves after deserializing.
pub trait Validate {
    fn validate(&self) -> FieldErrors;
}

/// Database names and users are interpolated into DDL; only `[A-Za-z0-9_]+` is allowed.
pub fn is_identifier(value: &str) -> bool {
    regex_is_match!(r"^[A-Za-z0-9_]+$", value)
}

pub fn is_slug(value: &str) -> bool {
    regex_is_match!(r"^[a-z0-9-]+$", value)
}

pub fn is_email(value: &str) -> bool {
    regex_is_match!(r"^[^@\s]+@[^@\s]+\.[^@\s]+$", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_identifier("tenant_acme"));
        assert!(is_identifier("Acme_01"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("acme-db"));
        assert!(!is_identifier("x\"; DROP DATABASE y; --"));
    }

    #[test]
    fn slugs() {
        assert!(is_slug("acme"));
        assert!(is_slug("acme-corp-2"));
        assert!(!is_slug("Acme"));
        assert!(!is_slug("acme_corp"));
        assert!(!is_slug(""));
    }

    #[test]
    fn field_errors_accumulate() {
        let mut errors = FieldErrors::default();
        assert!(errors.clone().into_result().is_ok());
        errors.add("slug", "first");
        errors.add("slug", "second");
        assert_eq!(errors.get("slug").map(<[String]>::len), Some(2));
        assert!(errors.into_result().is_err());
    }
}

#[cfg(test)]
mod tests_props {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        /// Anything accepted as an identifier is safe to splice into DDL.
        #[test]
        fn prop_identifiers_never_carry_ddl_syntax(value in ".{0,40}") {
            if is_identifier(&value) {
                prop_assert!(!value.is_empty());
                prop_assert!(value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
            }
        }

        #[test]
        fn prop_generated_identifiers_are_accepted(value in "[A-Za-z0-9_]{1,64}") {
            prop_assert!(is_identifier(&value));
        }

        #[test]
        fn prop_slugs_are_lowercase(value in "[a-zA-Z0-9_ -]{1,32}") {
            let expected = value
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
            prop_assert_eq!(is_slug(&value), expected);
        }
    }
}
