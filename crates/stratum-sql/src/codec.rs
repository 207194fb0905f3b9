//! Row value codec.
//!
//! Converts field values to and from their storage representation, one
//! column at a time. The encode side collapses relationship fields to the
//! referenced record's hashkey; the decode side materializes them back as
//! unresolved references for the session to chase. Identity hashing is
//! independent of this codec by design.

use stratum_core::{Catalog, Column, Datatype, Error, HashKey, Record, Result, Value, hash_key};

/// Per-column storage conversion.
///
/// Backends supply (or accept the standard) codec; the trait exists so a
/// storage engine with its own representation quirks can swap it out
/// without touching the persistence core.
pub trait RowCodec: Send + Sync {
    /// Encode a field value for storage in the given column.
    fn encode(&self, catalog: &Catalog, column: &Column, value: &Value) -> Result<Value>;

    /// Decode a stored value back into a field value for the given column.
    fn decode(&self, column: &Column, stored: &Value) -> Result<Value>;
}

/// The default storage mapping.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardCodec;

impl RowCodec for StandardCodec {
    fn encode(&self, catalog: &Catalog, column: &Column, value: &Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match &column.datatype {
            Datatype::One { .. } => match value {
                // a reference stores as the referenced row's identity
                Value::Record(inner) => {
                    Ok(Value::Int(hash_key(catalog, inner)?.as_u64() as i64))
                }
                Value::Ref(key) => Ok(Value::Int(key.as_u64() as i64)),
                other => Err(Error::invalid_value(format!(
                    "column '{}' holds a reference, got {}",
                    column.name,
                    other.type_name()
                ))),
            },
            // the owning side of a collection stores nothing; membership
            // lives on the inverse side's reference column
            Datatype::Many { .. } => Ok(Value::Null),
            Datatype::Enum { .. } => match value {
                Value::Enum(index) => Ok(Value::Int(i64::from(*index))),
                other => Err(Error::invalid_value(format!(
                    "column '{}' holds an enum, got {}",
                    column.name,
                    other.type_name()
                ))),
            },
            Datatype::Opaque => match value {
                Value::Opaque(payload) => Ok(Value::Text(payload.to_string())),
                other => Err(Error::invalid_value(format!(
                    "column '{}' holds an opaque payload, got {}",
                    column.name,
                    other.type_name()
                ))),
            },
            Datatype::Boolean => match value.as_bool() {
                Some(flag) => Ok(Value::Int(i64::from(flag))),
                None => Err(Error::invalid_value(format!(
                    "column '{}' holds a boolean, got {}",
                    column.name,
                    value.type_name()
                ))),
            },
            _ => Ok(value.clone()),
        }
    }

    fn decode(&self, column: &Column, stored: &Value) -> Result<Value> {
        if stored.is_null() && !column.datatype.is_collection() {
            return Ok(Value::Null);
        }
        match &column.datatype {
            Datatype::One { .. } => match stored.as_i64() {
                Some(raw) => Ok(Value::Ref(HashKey::new(raw as u64))),
                None => Err(Error::invalid_value(format!(
                    "column '{}' stored a non-integer reference",
                    column.name
                ))),
            },
            Datatype::Many { .. } => Ok(Value::Collection(Vec::new())),
            Datatype::Enum { .. } => match stored.as_i64() {
                Some(raw) => Ok(Value::Enum(raw as u32)),
                None => Err(Error::invalid_value(format!(
                    "column '{}' stored a non-integer enum index",
                    column.name
                ))),
            },
            Datatype::Opaque => match stored {
                Value::Text(text) => serde_json::from_str(text)
                    .map(Value::Opaque)
                    .map_err(|e| Error::invalid_value(format!(
                        "column '{}' stored malformed opaque payload: {e}",
                        column.name
                    ))),
                other => Err(Error::invalid_value(format!(
                    "column '{}' stored {} for an opaque payload",
                    column.name,
                    other.type_name()
                ))),
            },
            Datatype::Boolean => match stored {
                Value::Bool(flag) => Ok(Value::Bool(*flag)),
                other => match other.as_i64() {
                    Some(raw) => Ok(Value::Bool(raw == 1)),
                    None => Err(Error::invalid_value(format!(
                        "column '{}' stored {} for a boolean",
                        column.name,
                        other.type_name()
                    ))),
                },
            },
            _ => Ok(stored.clone()),
        }
    }
}

/// Decode a stored row into a record for `table`, driven by the table's
/// column descriptors. Stored columns missing from the row read as null.
pub fn decode_row(
    codec: &dyn RowCodec,
    table: &stratum_core::Table,
    row: &[(String, Value)],
    mut record: Record,
) -> Result<Record> {
    for column in table.columns().values() {
        let stored = row
            .iter()
            .find(|(name, _)| name == &column.name)
            .map_or(Value::Null, |(_, v)| v.clone());
        let value = codec.decode(column, &stored)?;
        record.set(column.name.clone(), value);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_core::Table;

    fn catalog() -> Catalog {
        let catalog = Catalog::new();
        catalog.register(
            Table::builder("app.Address", "address")
                .column("street", Datatype::Text)
                .primary_key(["street"])
                .build(),
        );
        catalog
    }

    fn column(datatype: Datatype) -> Column {
        Column {
            name: "c".to_string(),
            datatype,
        }
    }

    #[test]
    fn test_reference_encodes_to_hashkey() {
        let catalog = catalog();
        let home = Record::new("app.Address").with("street", "pine");
        let expected = hash_key(&catalog, &home).unwrap();

        let codec = StandardCodec;
        let encoded = codec
            .encode(&catalog, &column(Datatype::one("app.Address")), &home.into())
            .unwrap();

        assert_eq!(encoded, Value::Int(expected.as_u64() as i64));
    }

    #[test]
    fn test_reference_decodes_to_ref() {
        let codec = StandardCodec;
        let decoded = codec
            .decode(&column(Datatype::one("app.Address")), &Value::Int(42))
            .unwrap();
        assert_eq!(decoded, Value::Ref(HashKey::new(42)));
    }

    #[test]
    fn test_collection_stores_nothing_and_decodes_empty() {
        let catalog = catalog();
        let codec = StandardCodec;
        let col = column(Datatype::many("app.Address"));

        let encoded = codec
            .encode(&catalog, &col, &Value::Collection(vec![Record::new("app.Address")]))
            .unwrap();
        assert_eq!(encoded, Value::Null);

        let decoded = codec.decode(&col, &Value::Null).unwrap();
        assert_eq!(decoded, Value::Collection(Vec::new()));
    }

    #[test]
    fn test_enum_round_trip_by_index() {
        let catalog = catalog();
        let codec = StandardCodec;
        let col = column(Datatype::enumeration(["first", "second", "third"]));

        let encoded = codec.encode(&catalog, &col, &Value::Enum(2)).unwrap();
        assert_eq!(encoded, Value::Int(2));

        let decoded = codec.decode(&col, &Value::Int(2)).unwrap();
        assert_eq!(decoded, Value::Enum(2));
    }

    #[test]
    fn test_opaque_round_trip_as_json_text() {
        let catalog = catalog();
        let codec = StandardCodec;
        let col = column(Datatype::Opaque);
        let payload = serde_json::json!({"kind": "note", "pinned": true});

        let encoded = codec
            .encode(&catalog, &col, &Value::Opaque(payload.clone()))
            .unwrap();
        let decoded = codec.decode(&col, &encoded).unwrap();
        assert_eq!(decoded, Value::Opaque(payload));
    }

    #[test]
    fn test_boolean_round_trip_through_integer() {
        let catalog = catalog();
        let codec = StandardCodec;
        let col = column(Datatype::Boolean);

        let encoded = codec.encode(&catalog, &col, &Value::Bool(true)).unwrap();
        assert_eq!(encoded, Value::Int(1));
        assert_eq!(codec.decode(&col, &Value::Int(1)).unwrap(), Value::Bool(true));
        assert_eq!(codec.decode(&col, &Value::Int(0)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_null_passes_through() {
        let catalog = catalog();
        let codec = StandardCodec;
        let col = column(Datatype::one("app.Address"));
        assert_eq!(codec.encode(&catalog, &col, &Value::Null).unwrap(), Value::Null);
        assert_eq!(codec.decode(&col, &Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let catalog = catalog();
        let codec = StandardCodec;
        let result = codec.encode(&catalog, &column(Datatype::Opaque), &Value::Int(3));
        assert!(matches!(result, Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn test_decode_row_reads_missing_columns_as_null() {
        let codec = StandardCodec;
        let table = Table::builder("app.Person", "person")
            .column("name", Datatype::Text)
            .column("age", Datatype::Integer)
            .primary_key(["name"])
            .build();

        let row = vec![("name".to_string(), Value::from("ada"))];
        let record = decode_row(&codec, &table, &row, Record::new("app.Person")).unwrap();

        assert_eq!(record.field_value("name"), Value::from("ada"));
        assert_eq!(record.field_value("age"), Value::Null);
    }
}
