//! Typed in-process bundle for transient screen state

use std::collections::HashMap;

/// A single typed bundle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleValue {
    Long(i64),
    Int(i32),
    Bool(bool),
    Str(String),
}

/// Key → typed value map that lives only as long as the process.
///
/// Getters return the type's zero value when the key is missing or holds a
/// value of another type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bundle {
    values: HashMap<String, BundleValue>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_long(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), BundleValue::Long(value));
    }

    pub fn put_int(&mut self, key: &str, value: i32) {
        self.values.insert(key.to_string(), BundleValue::Int(value));
    }

    pub fn put_bool(&mut self, key: &str, value: bool) {
        self.values.insert(key.to_string(), BundleValue::Bool(value));
    }

    pub fn put_string(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), BundleValue::Str(value.to_string()));
    }

    pub fn get_long(&self, key: &str) -> i64 {
        self.long(key).unwrap_or_default()
    }

    pub fn get_int(&self, key: &str) -> i32 {
        self.int(key).unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.bool(key).unwrap_or_default()
    }

    pub fn get_string(&self, key: &str) -> String {
        self.string(key).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn long(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(BundleValue::Long(v)) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn int(&self, key: &str) -> Option<i32> {
        match self.values.get(key) {
            Some(BundleValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(BundleValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn string(&self, key: &str) -> Option<String> {
        match self.values.get(key) {
            Some(BundleValue::Str(v)) => Some(v.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_default() {
        let bundle = Bundle::new();
        assert_eq!(bundle.get_long("a"), 0);
        assert_eq!(bundle.get_int("a"), 0);
        assert!(!bundle.get_bool("a"));
        assert_eq!(bundle.get_string("a"), "");
        assert!(bundle.is_empty());
    }

    #[test]
    fn mismatched_type_reads_as_default() {
        let mut bundle = Bundle::new();
        bundle.put_string("millis", "12");
        assert_eq!(bundle.get_long("millis"), 0);
        assert_eq!(bundle.get_string("millis"), "12");
    }

    #[test]
    fn put_overwrites() {
        let mut bundle = Bundle::new();
        bundle.put_long("millis", 5);
        bundle.put_long("millis", 9);
        assert_eq!(bundle.get_long("millis"), 9);
        assert_eq!(bundle.len(), 1);
    }
}
