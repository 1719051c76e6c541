//! Ordered multi-value field maps and `application/x-www-form-urlencoded` parsing.

use crate::error::DecodeError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// The value stored under one field name.
///
/// A name seen once holds `One`; seeing it again turns it into `Many`, which
/// keeps the values in the order they appeared in the body.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> FieldValue<T> {
    /// The first value seen for the name.
    pub fn first(&self) -> Option<&T> {
        match self {
            FieldValue::One(value) => Some(value),
            FieldValue::Many(values) => values.first(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValue::One(_) => 1,
            FieldValue::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let values = match self {
            FieldValue::One(value) => std::slice::from_ref(value),
            FieldValue::Many(values) => values.as_slice(),
        };
        values.iter()
    }

    fn push(&mut self, value: T) {
        *self = match std::mem::replace(self, FieldValue::Many(Vec::new())) {
            FieldValue::One(first) => FieldValue::Many(vec![first, value]),
            FieldValue::Many(mut values) => {
                values.push(value);
                FieldValue::Many(values)
            }
        };
    }
}

/// Field names mapped to their values, in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields<T> {
    entries: Vec<(String, FieldValue<T>)>,
    index: HashMap<String, usize>,
}

/// Decoded `application/x-www-form-urlencoded` data, also used for query strings.
pub type FormData = Fields<String>;

impl<T> Fields<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new(), index: HashMap::new() }
    }

    /// Adds a value, merging it with earlier values of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1.push(value),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, FieldValue::One(value)));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue<T>> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// The first value stored under `name`.
    pub fn first(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(FieldValue::first)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue<T>)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<T> Default for Fields<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Into<String>, T> FromIterator<(N, T)> for Fields<T> {
    fn from_iter<I: IntoIterator<Item = (N, T)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

impl<T: Serialize> Serialize for Fields<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Parses url-encoded `key=value` pairs.
///
/// Pairs with an empty value, including bare keys without `=`, are dropped.
pub fn parse_form(input: &str) -> Result<FormData, DecodeError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(input)?;
    Ok(pairs.into_iter().filter(|(_, value)| !value.is_empty()).collect())
}
