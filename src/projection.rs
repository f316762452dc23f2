//! Explicit, per-entity serialization.
//!
//! Each entity declares its canonical field list as an enum implementing
//! [`FieldName`] and maps every field to a JSON value in [`Record::value`].
//! Projection is then a matter of picking fields from that list.

use serde_json::{Map, Value};

/// The canonical field names of one entity.
pub trait FieldName: Copy + Eq + 'static {
    /// Every field, in serialization order.
    const ALL: &'static [Self];

    /// The external name of the field.
    fn as_str(self) -> &'static str;

    /// Looks up a field by its external name.
    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.as_str() == name)
    }

    /// The external names of every field.
    fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|field| field.as_str()).collect()
    }
}

/// A stored row that knows how to serialize itself.
pub trait Record {
    /// The entity's field names.
    type Field: FieldName;

    /// The surrogate key of the row.
    fn id(&self) -> i64;

    /// The JSON value of one field.
    fn value(&self, field: Self::Field) -> Value;

    /// Serializes exactly the requested fields.
    fn project(&self, fields: &[Self::Field]) -> Map<String, Value> {
        fields
            .iter()
            .map(|field| (field.as_str().to_string(), self.value(*field)))
            .collect()
    }

    /// Serializes every field.
    fn serialize(&self) -> Map<String, Value> {
        self.project(Self::Field::ALL)
    }

    /// Serializes the requested fields, or every field when none were requested.
    fn serialize_fields(&self, fields: &[Self::Field]) -> Map<String, Value> {
        if fields.is_empty() {
            self.serialize()
        } else {
            self.project(fields)
        }
    }
}
