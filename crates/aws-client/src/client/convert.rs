//! Conversions between SDK shapes and the wire models
//!
//! SDK getters return `Option<&str>` for optional members and `&str` for required
//! ones, `&[T]` or `Option<&[T]>` for lists depending on the shape, and builders
//! return either the value or `Result<_, BuildError>`. The small traits below let
//! the per-service adapters read and build every shape the same way.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_ecs::error::{BuildError, DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ecs::primitives::DateTime as SmithyDateTime;
use chrono::{DateTime, Utc};

use crate::error::AwsError;

/// Map an SDK error onto [`AwsError`], keeping the service error code
pub(crate) fn sdk_error<E>(err: E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match err.code() {
        Some(code) => AwsError::service(code, err.message().unwrap_or_default()),
        None => AwsError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

/// Value produced by an SDK builder
pub(crate) trait Built<T> {
    fn built(self) -> Result<T, AwsError>;
}

impl<T> Built<T> for T {
    fn built(self) -> Result<T, AwsError> {
        Ok(self)
    }
}

impl<T> Built<T> for Result<T, BuildError> {
    fn built(self) -> Result<T, AwsError> {
        self.map_err(|e| AwsError::InvalidRequest(e.to_string()))
    }
}

/// String-like member (optional or required, plain string or SDK enum)
pub(crate) trait StrField {
    fn owned(self) -> Option<String>;
}

impl<E: AsRef<str> + ?Sized> StrField for Option<&E> {
    fn owned(self) -> Option<String> {
        self.map(|s| s.as_ref().to_string())
    }
}

impl<E: AsRef<str> + ?Sized> StrField for &E {
    fn owned(self) -> Option<String> {
        Some(self.as_ref().to_string())
    }
}

/// Copy scalar member (optional or required)
pub(crate) trait Scalar<T> {
    fn value(self) -> Option<T>;
}

impl<T> Scalar<T> for T {
    fn value(self) -> Option<T> {
        Some(self)
    }
}

impl<T> Scalar<T> for Option<T> {
    fn value(self) -> Option<T> {
        self
    }
}

/// List member (always present or optional)
pub(crate) trait ListField<'a, T> {
    fn items(self) -> &'a [T];
}

impl<'a, T> ListField<'a, T> for &'a [T] {
    fn items(self) -> &'a [T] {
        self
    }
}

impl<'a, T> ListField<'a, T> for Option<&'a [T]> {
    fn items(self) -> &'a [T] {
        self.unwrap_or_default()
    }
}

/// Map member (always present or optional)
pub(crate) trait MapField<'a, V> {
    fn entries(self) -> Option<&'a HashMap<String, V>>;
}

impl<'a, V> MapField<'a, V> for &'a HashMap<String, V> {
    fn entries(self) -> Option<&'a HashMap<String, V>> {
        Some(self)
    }
}

impl<'a, V> MapField<'a, V> for Option<&'a HashMap<String, V>> {
    fn entries(self) -> Option<&'a HashMap<String, V>> {
        self
    }
}

/// Copy a list of strings out of an SDK shape
pub(crate) fn strings<'a, L: ListField<'a, String>>(list: L) -> Vec<String> {
    list.items().to_vec()
}

/// Copy a string map out of an SDK shape, sorted by key
pub(crate) fn string_map<'a, M: MapField<'a, String>>(map: M) -> BTreeMap<String, String> {
    map_values(map, Clone::clone)
}

/// Copy a map out of an SDK shape, converting each value
pub(crate) fn map_values<'a, V: 'a, T, M, F>(map: M, convert: F) -> BTreeMap<String, T>
where
    M: MapField<'a, V>,
    F: Fn(&V) -> T,
{
    map.entries()
        .map(|m| m.iter().map(|(k, v)| (k.clone(), convert(v))).collect())
        .unwrap_or_default()
}

/// Convert a list out of an SDK shape
pub(crate) fn list<'a, V: 'a, T, L, F>(items: L, convert: F) -> Vec<T>
where
    L: ListField<'a, V>,
    F: FnMut(&V) -> T,
{
    items.items().iter().map(convert).collect()
}

/// Convert a list out of an SDK shape where each conversion may fail
pub(crate) fn try_list<V, T, F>(items: &[V], convert: F) -> Result<Option<Vec<T>>, AwsError>
where
    F: FnMut(&V) -> Result<T, AwsError>,
{
    if items.is_empty() {
        return Ok(None);
    }
    items.iter().map(convert).collect::<Result<Vec<_>, _>>().map(Some)
}

/// Convert a map from the wire models into the SDK's `HashMap`, `None` when empty
pub(crate) fn to_hash_map<V: Clone>(map: &BTreeMap<String, V>) -> Option<HashMap<String, V>> {
    (!map.is_empty()).then(|| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

/// `None` for an empty list so optional members are left out of the request
pub(crate) fn non_empty<T: Clone>(list: &[T]) -> Option<Vec<T>> {
    (!list.is_empty()).then(|| list.to_vec())
}

/// Convert an SDK timestamp
pub(crate) fn timestamp(value: Option<&SmithyDateTime>) -> Option<DateTime<Utc>> {
    value.and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_field() {
        let present: Option<&str> = Some("abc");
        assert_eq!(present.owned(), Some("abc".to_string()));
        let absent: Option<&str> = None;
        assert_eq!(absent.owned(), None);
        assert_eq!("required".owned(), Some("required".to_string()));
    }

    #[test]
    fn test_scalar() {
        let a: Option<i32> = 5.value();
        let b: Option<i32> = Some(6).value();
        let c: Option<i32> = None.value();
        assert_eq!((a, b, c), (Some(5), Some(6), None));
    }

    #[test]
    fn test_list_field() {
        let list = vec!["a".to_string()];
        assert_eq!(strings(list.as_slice()), vec!["a".to_string()]);
        let absent: Option<&[String]> = None;
        assert!(strings(absent).is_empty());
    }

    #[test]
    fn test_to_hash_map_skips_empty() {
        assert!(to_hash_map::<String>(&BTreeMap::new()).is_none());
        let map: BTreeMap<String, String> = [("k".to_string(), "v".to_string())].into();
        assert_eq!(to_hash_map(&map).map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_timestamp() {
        let t = SmithyDateTime::from_secs(1_700_000_000);
        assert_eq!(timestamp(Some(&t)).map(|d| d.timestamp()), Some(1_700_000_000));
        assert!(timestamp(None).is_none());
    }
}
