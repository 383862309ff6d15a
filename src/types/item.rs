use super::AttributeValue;

use aws_sdk_dynamodb::types;
use std::collections::HashMap;

/// A single DynamoDB item, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item(HashMap<String, AttributeValue>);

impl Item {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn with<K: Into<String>>(mut self, key: K, value: AttributeValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert<K: Into<String>>(&mut self, key: K, value: AttributeValue) -> Option<AttributeValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw string form of a numeric attribute.
    pub fn number(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_n)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_s)
    }

    /// Projects the item down to the given key attributes.
    pub fn key(&self, attributes: &[&str]) -> Item {
        Item(
            attributes
                .iter()
                .filter_map(|&name| self.get(name).map(|v| (name.to_string(), v.clone())))
                .collect(),
        )
    }
}

impl From<HashMap<String, types::AttributeValue>> for Item {
    fn from(value: HashMap<String, types::AttributeValue>) -> Item {
        Item(
            value
                .into_iter()
                .map(|(key, val)| (key, AttributeValue::from(val)))
                .collect(),
        )
    }
}

impl From<Item> for HashMap<String, types::AttributeValue> {
    fn from(value: Item) -> HashMap<String, types::AttributeValue> {
        value
            .0
            .into_iter()
            .map(|(key, val)| (key, types::AttributeValue::from(val)))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, AttributeValue)> for Item {
    fn from_iter<T: IntoIterator<Item = (K, AttributeValue)>>(iter: T) -> Self {
        Item(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
