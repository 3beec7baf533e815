//! Tri-state optional for partial updates.
//!
//! `Option<T>` cannot tell "the caller did not mention this field" apart from
//! "the caller cleared this field". `Maybe<T>` can: `Unset` means the field was
//! never supplied, `Set(v)` means it was supplied with `v`. Nullable fields are
//! modelled as `Maybe<Option<T>>`, so `Set(None)` is an explicit null.
//!
//! ## Wire shape
//!
//! Struct fields should be annotated with
//! `#[serde(default, skip_serializing_if = "Maybe::is_unset")]`:
//!
//! - unset fields are omitted from the serialized document,
//! - a present key always deserializes as `Set` (a JSON `null` becomes
//!   `Set(None)` for `Maybe<Option<T>>`),
//! - a missing key falls back to `Default`, which is `Unset`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Maybe<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Maybe<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Maybe::Set(_))
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Maybe::Unset)
    }

    pub fn as_ref(&self) -> Maybe<&T> {
        match self {
            Maybe::Set(v) => Maybe::Set(v),
            Maybe::Unset => Maybe::Unset,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Maybe::Set(v) => Some(v),
            Maybe::Unset => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Maybe<U> {
        match self {
            Maybe::Set(v) => Maybe::Set(f(v)),
            Maybe::Unset => Maybe::Unset,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Maybe::Set(v) => v,
            Maybe::Unset => default,
        }
    }

    /// Overwrite `target` with the supplied value; leave it untouched when unset.
    ///
    /// Returns whether `target` was assigned.
    pub fn assign_to(self, target: &mut T) -> bool {
        match self {
            Maybe::Set(v) => {
                *target = v;
                true
            }
            Maybe::Unset => false,
        }
    }
}

impl<T> From<T> for Maybe<T> {
    fn from(value: T) -> Self {
        Maybe::Set(value)
    }
}

impl<T: Serialize> Serialize for Maybe<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Maybe::Set(v) => v.serialize(serializer),
            // Only reached when the field lacks `skip_serializing_if`.
            Maybe::Unset => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Maybe<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Maybe::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Patch {
        #[serde(default, skip_serializing_if = "Maybe::is_unset")]
        title: Maybe<String>,
        #[serde(default, skip_serializing_if = "Maybe::is_unset")]
        summary: Maybe<Option<String>>,
    }

    #[test]
    fn unset_fields_are_omitted_from_documents() {
        let patch = Patch {
            title: Maybe::Set("Alien".to_string()),
            summary: Maybe::Unset,
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "title": "Alien" }));
    }

    #[test]
    fn explicit_null_is_distinct_from_missing() {
        let cleared: Patch = serde_json::from_value(json!({ "summary": null })).unwrap();
        assert_eq!(cleared.summary, Maybe::Set(None));
        assert_eq!(cleared.title, Maybe::Unset);

        let untouched: Patch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(untouched.summary, Maybe::Unset);
    }

    #[test]
    fn assign_to_only_writes_set_values() {
        let mut title = "Old".to_string();
        assert!(!Maybe::<String>::Unset.assign_to(&mut title));
        assert_eq!(title, "Old");
        assert!(Maybe::Set("New".to_string()).assign_to(&mut title));
        assert_eq!(title, "New");
    }
}
