use aws_sdk_dynamodb::{primitives::Blob, types};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    B(Vec<u8>),
    Bool(bool),
    Bs(Vec<Vec<u8>>),
    L(Vec<AttributeValue>),
    M(HashMap<String, AttributeValue>),
    N(String),
    Ns(Vec<String>),
    Null(bool),
    S(String),
    Ss(Vec<String>),
    Unknown,
}

impl AttributeValue {
    pub fn number<T: ToString>(value: T) -> Self {
        AttributeValue::N(value.to_string())
    }

    pub fn string<T: Into<String>>(value: T) -> Self {
        AttributeValue::S(value.into())
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl From<types::AttributeValue> for AttributeValue {
    fn from(value: types::AttributeValue) -> AttributeValue {
        match value {
            types::AttributeValue::B(v) => AttributeValue::B(v.into_inner()),
            types::AttributeValue::Bool(v) => AttributeValue::Bool(v),
            types::AttributeValue::Bs(v) => {
                AttributeValue::Bs(v.into_iter().map(Blob::into_inner).collect())
            }
            types::AttributeValue::L(v) => {
                AttributeValue::L(v.into_iter().map(AttributeValue::from).collect())
            }
            types::AttributeValue::M(v) => AttributeValue::M(
                v.into_iter()
                    .map(|(key, val)| (key, AttributeValue::from(val)))
                    .collect(),
            ),
            types::AttributeValue::N(v) => AttributeValue::N(v),
            types::AttributeValue::Ns(v) => AttributeValue::Ns(v),
            types::AttributeValue::Null(v) => AttributeValue::Null(v),
            types::AttributeValue::S(v) => AttributeValue::S(v),
            types::AttributeValue::Ss(v) => AttributeValue::Ss(v),
            _ => AttributeValue::Unknown,
        }
    }
}

impl From<AttributeValue> for types::AttributeValue {
    fn from(value: AttributeValue) -> types::AttributeValue {
        match value {
            AttributeValue::B(v) => types::AttributeValue::B(Blob::new(v)),
            AttributeValue::Bool(v) => types::AttributeValue::Bool(v),
            AttributeValue::Bs(v) => {
                types::AttributeValue::Bs(v.into_iter().map(Blob::new).collect())
            }
            AttributeValue::L(v) => {
                types::AttributeValue::L(v.into_iter().map(types::AttributeValue::from).collect())
            }
            AttributeValue::M(v) => types::AttributeValue::M(
                v.into_iter()
                    .map(|(key, val)| (key, types::AttributeValue::from(val)))
                    .collect(),
            ),
            AttributeValue::N(v) => types::AttributeValue::N(v),
            AttributeValue::Ns(v) => types::AttributeValue::Ns(v),
            AttributeValue::Null(v) => types::AttributeValue::Null(v),
            AttributeValue::S(v) => types::AttributeValue::S(v),
            AttributeValue::Ss(v) => types::AttributeValue::Ss(v),
            // Nothing sensible to send for a value the SDK did not recognize.
            AttributeValue::Unknown => types::AttributeValue::Null(true),
        }
    }
}
