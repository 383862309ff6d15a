mod attribute_value;
mod item;
mod sample;
mod table;

pub use attribute_value::AttributeValue;
pub use item::Item;
pub use sample::{Sample, ATTR_ID, ATTR_SERIES, ATTR_TIMESTAMP, ATTR_VALUE};
pub use table::{BillingMode, KeySchema, ScalarType, TableStatus};
