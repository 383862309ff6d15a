use crate::types::{AttributeValue, Item, ATTR_ID};

use std::collections::HashMap;

/// Item covering every DynamoDB attribute type, for exercising readers
/// against a freshly reset table.
pub fn all_types_item(id: u64) -> Item {
    let mut map: HashMap<String, AttributeValue> = HashMap::new();
    map.insert("subkey1".into(), AttributeValue::S("value1".into()));
    map.insert("subkey2".into(), AttributeValue::N("99".into()));

    Item::new()
        .with(ATTR_ID, AttributeValue::number(id))
        .with("myString", AttributeValue::S("Hello, DynamoDB!".into()))
        .with("myNumber", AttributeValue::N("123.45".into()))
        .with("myBinary", AttributeValue::B(b"some_binary_data".to_vec()))
        .with("myBool", AttributeValue::Bool(true))
        .with("myNull", AttributeValue::Null(true))
        .with(
            "myList",
            AttributeValue::L(vec![
                AttributeValue::S("item1".into()),
                AttributeValue::N("2".into()),
                AttributeValue::Bool(false),
            ]),
        )
        .with("myMap", AttributeValue::M(map))
        .with(
            "myStringSet",
            AttributeValue::Ss(vec!["value1".into(), "value2".into(), "value3".into()]),
        )
        .with(
            "myNumberSet",
            AttributeValue::Ns(vec!["1.1".into(), "2.2".into(), "3.3".into()]),
        )
}
