//! Decodes Postgres rows into JSON records by column type.

use crate::datasource::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::Value as Json;
use std::error::Error;
use tokio_postgres::{
    Row,
    types::{FromSql, Kind, Type},
};
use tracing::warn;
use uuid::Uuid;

pub fn decode_row(row: &Row) -> Result<Record, tokio_postgres::Error> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = decode_column(row, idx, column.type_())?;
        record.insert(column.name().to_string(), value);
    }
    Ok(record)
}

/// Raw UTF-8 text for enum labels and the textual types.
#[derive(Debug, PartialEq)]
struct Text(String);

impl<'a> FromSql<'a> for Text {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Text(<String as FromSql>::from_sql(ty, raw)?))
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Enum(_)) || <String as FromSql>::accepts(ty)
    }
}

fn get<'a, T, F>(row: &'a Row, idx: usize, to_json: F) -> Result<Json, tokio_postgres::Error>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> Json,
{
    Ok(row
        .try_get::<_, Option<T>>(idx)?
        .map(to_json)
        .unwrap_or(Json::Null))
}

fn decode_column(row: &Row, idx: usize, ty: &Type) -> Result<Json, tokio_postgres::Error> {
    match *ty {
        Type::BOOL => get(row, idx, Json::Bool),
        Type::INT2 => get(row, idx, |v: i16| Json::from(v)),
        Type::INT4 => get(row, idx, |v: i32| Json::from(v)),
        Type::INT8 => get(row, idx, |v: i64| Json::from(v)),
        Type::FLOAT4 => get(row, idx, |v: f32| Json::from(f64::from(v))),
        Type::FLOAT8 => get(row, idx, |v: f64| Json::from(v)),
        Type::NUMERIC => get(row, idx, |v: Decimal| Json::String(v.to_string())),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => get(row, idx, Json::String),
        Type::UUID => get(row, idx, |v: Uuid| Json::String(v.to_string())),
        Type::DATE => get(row, idx, |v: NaiveDate| Json::String(v.to_string())),
        Type::TIMESTAMP => get(row, idx, |v: NaiveDateTime| {
            Json::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        Type::TIMESTAMPTZ => get(row, idx, |v: DateTime<Utc>| {
            Json::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }),
        Type::JSON | Type::JSONB => get(row, idx, |v: Json| v),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => {
            get(row, idx, |v: Vec<String>| Json::from(v))
        }
        Type::BOOL_ARRAY => get(row, idx, |v: Vec<bool>| Json::from(v)),
        Type::INT2_ARRAY => get(row, idx, |v: Vec<i16>| Json::from(v)),
        Type::INT4_ARRAY => get(row, idx, |v: Vec<i32>| Json::from(v)),
        Type::INT8_ARRAY => get(row, idx, |v: Vec<i64>| Json::from(v)),
        Type::FLOAT4_ARRAY => get(row, idx, |v: Vec<f32>| {
            Json::from(v.into_iter().map(f64::from).collect::<Vec<_>>())
        }),
        Type::FLOAT8_ARRAY => get(row, idx, |v: Vec<f64>| Json::from(v)),
        Type::UUID_ARRAY => get(row, idx, |v: Vec<Uuid>| {
            Json::Array(v.into_iter().map(|id| Json::String(id.to_string())).collect())
        }),
        _ if matches!(ty.kind(), Kind::Enum(_)) => get(row, idx, |v: Text| Json::String(v.0)),
        _ => {
            warn!(column = %row.columns()[idx].name(), column_type = %ty, "Unsupported column type, decoding as text");
            get(row, idx, |v: Text| Json::String(v.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mood() -> Type {
        Type::new(
            "mood".into(),
            16_384,
            Kind::Enum(vec!["happy".into(), "sad".into()]),
            "public".into(),
        )
    }

    #[test]
    fn test_enum_labels_decode_as_text() {
        let ty = mood();
        assert!(<Text as FromSql>::accepts(&ty));
        assert_eq!(
            <Text as FromSql>::from_sql(&ty, b"happy").unwrap(),
            Text("happy".into())
        );
    }

    #[test]
    fn test_text_refuses_binary_types() {
        assert!(<Text as FromSql>::accepts(&Type::VARCHAR));
        assert!(!<Text as FromSql>::accepts(&Type::INT4));
        assert!(!<Text as FromSql>::accepts(&Type::BOOL_ARRAY));
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        assert!(<Text as FromSql>::from_sql(&mood(), &[0xff, 0xfe]).is_err());
    }
}
