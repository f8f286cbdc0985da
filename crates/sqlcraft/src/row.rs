//! Generic row mapping and decode traits.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::Type;

use crate::error::{CraftError, CraftResult};
use crate::value::Value;

/// An ordered column-name to [`Value`] mapping for one result row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row from (column, value) pairs, preserving order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values) = pairs
            .into_iter()
            .map(|(c, v)| (c.into(), v))
            .unzip();
        Self { columns, values }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values in result order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Value at a positional index.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Decode a column into a concrete type.
    pub fn try_get<T: FromValue>(&self, column: &str) -> CraftResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| CraftError::decode(column, "no such column"))?;
        T::from_value(value, column)
    }

    /// Coerce every `Bytes` value holding valid UTF-8 into `Text`.
    pub fn coerce_text(self) -> Self {
        Self {
            columns: self.columns,
            values: self.values.into_iter().map(Value::coerce_text).collect(),
        }
    }

    /// Consume the row into (column, value) pairs.
    pub fn into_pairs(self) -> Vec<(String, Value)> {
        self.columns.into_iter().zip(self.values).collect()
    }

    /// Convert a driver row into the generic mapping.
    pub(crate) fn from_pg(row: &tokio_postgres::Row) -> CraftResult<Self> {
        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (i, col) in row.columns().iter().enumerate() {
            columns.push(col.name().to_string());
            values.push(pg_value(row, i, col.name(), col.type_())?);
        }
        Ok(Self { columns, values })
    }
}

fn pg_value(
    row: &tokio_postgres::Row,
    idx: usize,
    name: &str,
    ty: &Type,
) -> CraftResult<Value> {
    fn wrap<T>(
        name: &str,
        got: Result<Option<T>, tokio_postgres::Error>,
        into: impl FnOnce(T) -> Value,
    ) -> CraftResult<Value> {
        match got {
            Ok(Some(v)) => Ok(into(v)),
            Ok(None) => Ok(Value::Null),
            Err(e) => Err(CraftError::decode(name, e.to_string())),
        }
    }

    if *ty == Type::BOOL {
        wrap(name, row.try_get::<_, Option<bool>>(idx), Value::Bool)
    } else if *ty == Type::INT2 {
        wrap(name, row.try_get::<_, Option<i16>>(idx), |v| {
            Value::Int(i64::from(v))
        })
    } else if *ty == Type::INT4 {
        wrap(name, row.try_get::<_, Option<i32>>(idx), |v| {
            Value::Int(i64::from(v))
        })
    } else if *ty == Type::INT8 {
        wrap(name, row.try_get::<_, Option<i64>>(idx), Value::Int)
    } else if *ty == Type::FLOAT4 {
        wrap(name, row.try_get::<_, Option<f32>>(idx), |v| {
            Value::Float(f64::from(v))
        })
    } else if *ty == Type::FLOAT8 {
        wrap(name, row.try_get::<_, Option<f64>>(idx), Value::Float)
    } else if *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
        || *ty == Type::UNKNOWN
    {
        wrap(name, row.try_get::<_, Option<String>>(idx), Value::Text)
    } else if *ty == Type::BYTEA {
        wrap(name, row.try_get::<_, Option<Vec<u8>>>(idx), Value::Bytes)
    } else if *ty == Type::TIMESTAMPTZ {
        wrap(
            name,
            row.try_get::<_, Option<DateTime<Utc>>>(idx),
            Value::Timestamp,
        )
    } else if *ty == Type::TIMESTAMP {
        wrap(name, row.try_get::<_, Option<NaiveDateTime>>(idx), |v| {
            Value::Timestamp(v.and_utc())
        })
    } else if *ty == Type::DATE {
        wrap(name, row.try_get::<_, Option<NaiveDate>>(idx), Value::from)
    } else if *ty == Type::UUID {
        wrap(name, row.try_get::<_, Option<uuid::Uuid>>(idx), Value::Uuid)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        wrap(
            name,
            row.try_get::<_, Option<serde_json::Value>>(idx),
            Value::Json,
        )
    } else {
        Err(CraftError::decode(
            name,
            format!("unsupported column type {ty}"),
        ))
    }
}

/// Decode a single [`Value`] into a concrete type.
pub trait FromValue: Sized {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value, _column: &str) -> CraftResult<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Int(i) => Ok(*i),
            // Some drivers hand numeric results back as text.
            Value::Text(s) => s
                .parse()
                .map_err(|_| CraftError::decode(column, format!("'{s}' is not an integer"))),
            other => Err(CraftError::decode(column, format!("expected integer, got {other:?}"))),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        let v = i64::from_value(value, column)?;
        i32::try_from(v).map_err(|_| CraftError::decode(column, format!("{v} out of i32 range")))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Text(s) => s
                .parse()
                .map_err(|_| CraftError::decode(column, format!("'{s}' is not a number"))),
            other => Err(CraftError::decode(column, format!("expected number, got {other:?}"))),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            // MySQL-style drivers report booleans as tiny integers.
            Value::Int(i) => Ok(*i != 0),
            other => Err(CraftError::decode(column, format!("expected bool, got {other:?}"))),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Bytes(b) => String::from_utf8(b.clone())
                .map_err(|_| CraftError::decode(column, "bytes are not valid UTF-8")),
            other => Err(CraftError::decode(column, format!("expected text, got {other:?}"))),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.clone().into_bytes()),
            other => Err(CraftError::decode(column, format!("expected bytes, got {other:?}"))),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Timestamp(t) => Ok(*t),
            other => Err(CraftError::decode(column, format!("expected timestamp, got {other:?}"))),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Uuid(u) => Ok(*u),
            Value::Text(s) => uuid::Uuid::parse_str(s)
                .map_err(|e| CraftError::decode(column, e.to_string())),
            other => Err(CraftError::decode(column, format!("expected uuid, got {other:?}"))),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Json(j) => Ok(j.clone()),
            other => Err(CraftError::decode(column, format!("expected json, got {other:?}"))),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value, column: &str) -> CraftResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, column).map(Some),
        }
    }
}

/// Decode a [`Row`] into a typed record.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> CraftResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> CraftResult<Self> {
        Ok(row.clone())
    }
}
