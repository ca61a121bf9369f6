use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use model::core::value::Value;
use rust_decimal::Decimal;
use std::{error::Error, str::FromStr};
use tokio_postgres::types::{IsNull, Json as PgJson, Kind, ToSql, Type, to_sql_checked};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// A bound parameter. The wire encoding is picked from the type Postgres
/// expects for the placeholder, so an `Int` can feed an `int4` column and a
/// `String` can feed a `uuid` or `timestamptz` column.
#[derive(Debug, Clone)]
pub struct PgParam(Value);

impl PgParam {
    pub fn from_value(value: Value) -> Self {
        PgParam(value)
    }
}

impl ToSql for PgParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match &self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Boolean(v) => v.to_sql(ty, out),
            Value::Int(v) => int_to_sql(*v, ty, out),
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => v.to_string().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::String(v) => string_to_sql(v, ty, out),
            Value::List(items) => match ty.kind() {
                Kind::Array(_) => items
                    .iter()
                    .cloned()
                    .map(PgParam)
                    .collect::<Vec<_>>()
                    .to_sql(ty, out),
                _ => PgJson(self.0.to_json()).to_sql(ty, out),
            },
            Value::Uuid(v) => match *ty {
                Type::TEXT | Type::VARCHAR => v.to_string().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Date(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Json(v) => match *ty {
                Type::TEXT | Type::VARCHAR => v.to_string().to_sql(ty, out),
                _ => PgJson(v).to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(v).to_sql(ty, out),
        Type::TEXT | Type::VARCHAR => v.to_string().to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

fn string_to_sql(v: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::UUID => Uuid::parse_str(v)?.to_sql(ty, out),
        Type::DATE => NaiveDate::from_str(v)?.to_sql(ty, out),
        Type::TIMESTAMP => NaiveDateTime::from_str(v)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => DateTime::parse_from_rfc3339(v)?
            .with_timezone(&Utc)
            .to_sql(ty, out),
        Type::NUMERIC => Decimal::from_str(v)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => PgJson(v).to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

pub struct PgParamStore {
    pub params: Vec<PgParam>,
}

impl PgParamStore {
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            params: values.into_iter().map(PgParam::from_value).collect(),
        }
    }

    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param as &(dyn ToSql + Sync))
            .collect::<Vec<_>>()
    }
}
