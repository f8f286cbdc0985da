//! Closed sum type for SQL argument values.
//!
//! Builders accumulate arguments as [`Value`] rather than trait objects so
//! that argument lists are cloneable, comparable in tests, and bindable
//! through any executor backend. The variants cover the value kinds the
//! supported drivers accept; anything else must be converted by the caller.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::error::CraftResult;

/// A single SQL argument value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Uuid(uuid::Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// Serialize any `Serialize` type into a `Value::Json`.
    pub fn json<T: Serialize>(value: &T) -> CraftResult<Self> {
        Ok(Value::Json(serde_json::to_value(value)?))
    }

    /// Whether this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce `Bytes` holding valid UTF-8 into `Text`; other values pass through.
    pub fn coerce_text(self) -> Self {
        match self {
            Value::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => Value::Text(s),
                Err(e) => Value::Bytes(e.into_bytes()),
            },
            other => other,
        }
    }

    /// Render the value as an inline SQL literal for debug output.
    ///
    /// Only for logs and `debug_sql()`; execution always binds parameters.
    pub fn to_debug_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Bytes(b) => format!("<{} bytes>", b.len()),
            Value::Timestamp(t) => format!("'{}'", t.to_rfc3339()),
            Value::Uuid(u) => format!("'{u}'"),
            Value::Json(j) => format!("'{j}'"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Timestamp(v.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => {
                // Narrow to the column's integer width when the driver asks for it.
                if *ty == Type::INT2 {
                    (*i as i16).to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    (*i as i32).to_sql(ty, out)
                } else {
                    i.to_sql(ty, out)
                }
            }
            Value::Float(f) => {
                if *ty == Type::FLOAT4 {
                    (*f as f32).to_sql(ty, out)
                } else {
                    f.to_sql(ty, out)
                }
            }
            Value::Text(s) => s.to_sql(ty, out),
            Value::Bytes(b) => b.to_sql(ty, out),
            Value::Timestamp(t) => {
                if *ty == Type::TIMESTAMP {
                    t.naive_utc().to_sql(ty, out)
                } else {
                    t.to_sql(ty, out)
                }
            }
            Value::Uuid(u) => u.to_sql(ty, out),
            Value::Json(j) => j.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The variant is only known at runtime; type mismatches surface from to_sql.
        true
    }

    to_sql_checked!();
}

/// Conversion of a positional row of arguments into `Vec<Value>`.
///
/// Implemented for tuples up to arity 12 and for `Vec<Value>`, so callers
/// can write `.values(("A", "a@x.com"))` without building the vector by hand.
pub trait IntoValues {
    fn into_values(self) -> Vec<Value>;
}

impl IntoValues for Vec<Value> {
    fn into_values(self) -> Vec<Value> {
        self
    }
}

macro_rules! impl_into_values_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Value>),+> IntoValues for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_values_tuple!(A);
impl_into_values_tuple!(A, B);
impl_into_values_tuple!(A, B, C);
impl_into_values_tuple!(A, B, C, D);
impl_into_values_tuple!(A, B, C, D, E);
impl_into_values_tuple!(A, B, C, D, E, F);
impl_into_values_tuple!(A, B, C, D, E, F, G);
impl_into_values_tuple!(A, B, C, D, E, F, G, H);
impl_into_values_tuple!(A, B, C, D, E, F, G, H, I);
impl_into_values_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_into_values_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_into_values_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);

/// A record type with a static column descriptor.
///
/// This replaces runtime field reflection: a record names its columns once
/// and yields its values in the same order. Insert, update, and upsert
/// builders consume records through this trait.
///
/// # Example
/// ```ignore
/// struct User { name: String, email: String }
///
/// impl Record for User {
///     fn columns() -> &'static [&'static str] {
///         &["name", "email"]
///     }
///     fn values(&self) -> Vec<Value> {
///         vec![self.name.clone().into(), self.email.clone().into()]
///     }
/// }
/// ```
pub trait Record {
    /// Column names, in the order `values` yields them.
    fn columns() -> &'static [&'static str];

    /// Field values, parallel to `columns`.
    fn values(&self) -> Vec<Value>;
}

/// Inline arguments into a rendered statement for debug display.
///
/// Replaces each canonical `?` placeholder with the matching argument
/// literal, left to right. Surplus placeholders are left untouched.
pub(crate) fn inline_args(sql: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut next = 0usize;
    for ch in sql.chars() {
        if ch == '?' && next < args.len() {
            out.push_str(&args[next].to_debug_literal());
            next += 1;
        } else {
            out.push(ch);
        }
    }
    out
}
