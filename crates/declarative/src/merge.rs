//! Attribute merge policy
//!
//! Attributes that are optional in declared configuration but may be
//! assigned by the remote side are resolved after every create and update:
//!
//! 1. a non-blank value in the remote response wins;
//! 2. else a declared value is kept;
//! 3. else a value from prior state is kept;
//! 4. else the attribute is unknown (`None`), never a known empty value.
//!
//! Consecutive no-op reconciliations therefore settle on the same state.

use std::collections::{BTreeMap, HashMap};

/// Values that have an "empty" form the remote may echo back
pub trait Blank {
    /// Whether this is the empty/zero value of its type
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for &str {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl Blank for bool {
    fn is_blank(&self) -> bool {
        !*self
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Blank for BTreeMap<K, V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> Blank for HashMap<K, V, S> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Resolve an optional+computed attribute after a create or update
///
/// `prior` is `None` on the create path.
pub fn resolve<T: Blank>(response: Option<T>, declared: Option<T>, prior: Option<T>) -> Option<T> {
    response
        .filter(|value| !value.is_blank())
        .or(declared)
        .or(prior)
}

/// Value to resend for an attribute on a full-replace update
///
/// Undeclared attributes are resent from prior state, never zeroed.
pub fn fallback<T>(declared: Option<T>, prior: Option<T>) -> Option<T> {
    declared.or(prior)
}

/// Value to resend for an identity attribute (such as the owning org id)
///
/// Like [`fallback`], except that an explicitly blank declared value clears
/// the attribute instead of silently reusing the prior one.
pub fn carry_identity<T: Blank>(declared: Option<T>, prior: Option<T>) -> Option<T> {
    match declared {
        Some(value) if value.is_blank() => None,
        Some(value) => Some(value),
        None => prior,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn test_response_wins() {
        assert_eq!(resolve(s("org-42"), s("org-1"), s("org-0")), s("org-42"));
    }

    #[test]
    fn test_declared_kept_over_empty_response() {
        assert_eq!(resolve(s(""), s("org-1"), s("org-0")), s("org-1"));
        assert_eq!(resolve(None, s("org-1"), None), s("org-1"));
    }

    #[test]
    fn test_prior_preserved_over_empty_response() {
        assert_eq!(resolve(s(""), None, s("X")), s("X"));
    }

    #[test]
    fn test_unknown_when_nothing_known() {
        assert_eq!(resolve(s(""), None::<String>, None), None);
        assert_eq!(resolve(None::<String>, None, None), None);
    }

    #[test]
    fn test_bool_false_is_blank() {
        assert_eq!(resolve(Some(false), None, Some(true)), Some(true));
        assert_eq!(resolve(Some(true), Some(false), None), Some(true));
        assert_eq!(resolve(Some(false), Some(false), None), Some(false));
        assert_eq!(resolve(Some(false), None, None), None);
    }

    #[test]
    fn test_bytes_blank() {
        assert_eq!(resolve(Some(Vec::<u8>::new()), None, Some(vec![1])), Some(vec![1]));
    }

    #[test]
    fn test_fallback() {
        assert_eq!(fallback(None, s("org-42")), s("org-42"));
        assert_eq!(fallback(s("org-7"), s("org-42")), s("org-7"));
        assert_eq!(fallback(s(""), s("org-42")), s(""));
        assert_eq!(fallback(None::<String>, None), None);
    }

    #[test]
    fn test_carry_identity() {
        assert_eq!(carry_identity(None, s("org-42")), s("org-42"));
        assert_eq!(carry_identity(s("org-7"), s("org-42")), s("org-7"));
        assert_eq!(carry_identity(s(""), s("org-42")), None);
    }
}
