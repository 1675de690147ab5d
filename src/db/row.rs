//! Row representation with explicit column ordering
//!
//! Rows are an ordered list of (name, value) pairs rather than an open-ended
//! mapping, so positional consumers like the chart shaper have well-defined
//! column ordering semantics.

use tokio_postgres::types::Type;
use tokio_postgres::Row;

/// Scalar value for the column types the dataset table can produce.
/// Temporal values are rendered as text; anything unrecognized falls back to
/// a text read and then to null.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
}

impl SqlValue {
    /// JSON rendering for the text-mode response body
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Json(v) => v.clone(),
        }
    }

    /// Numeric coercion for chart values; `None` when the value has no
    /// numeric reading
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Json(v) => v.as_f64(),
            Self::Null => None,
        }
    }

    /// Text coercion for chart labels
    pub fn to_label(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Json(v) => v.to_string(),
        }
    }
}

/// One result row: column names and values in result-set order
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    pub columns: Vec<(String, SqlValue)>,
}

impl ResultRow {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Convert a driver row, mapping each column by its reported type
    pub fn from_row(row: &Row) -> Self {
        let columns = row
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.name().to_string(), read_value(row, idx, col.type_())))
            .collect();
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, value)| value)
    }

    pub fn value_at(&self, idx: usize) -> Option<&SqlValue> {
        self.columns.get(idx).map(|(_, value)| value)
    }

    /// JSON object preserving column order
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.columns {
            map.insert(name.clone(), value.to_json());
        }
        serde_json::Value::Object(map)
    }
}

fn read_value(row: &Row, idx: usize, ty: &Type) -> SqlValue {
    fn opt<T>(v: Result<Option<T>, tokio_postgres::Error>, f: impl FnOnce(T) -> SqlValue) -> SqlValue {
        match v {
            Ok(Some(inner)) => f(inner),
            _ => SqlValue::Null,
        }
    }

    if *ty == Type::BOOL {
        opt(row.try_get::<_, Option<bool>>(idx), SqlValue::Bool)
    } else if *ty == Type::INT2 {
        opt(row.try_get::<_, Option<i16>>(idx), |v| SqlValue::Int(v as i64))
    } else if *ty == Type::INT4 {
        opt(row.try_get::<_, Option<i32>>(idx), |v| SqlValue::Int(v as i64))
    } else if *ty == Type::INT8 {
        opt(row.try_get::<_, Option<i64>>(idx), SqlValue::Int)
    } else if *ty == Type::FLOAT4 {
        opt(row.try_get::<_, Option<f32>>(idx), |v| {
            SqlValue::Float(v as f64)
        })
    } else if *ty == Type::FLOAT8 {
        opt(row.try_get::<_, Option<f64>>(idx), SqlValue::Float)
    } else if *ty == Type::DATE {
        opt(row.try_get::<_, Option<chrono::NaiveDate>>(idx), |v| {
            SqlValue::Text(v.to_string())
        })
    } else if *ty == Type::TIMESTAMP {
        opt(row.try_get::<_, Option<chrono::NaiveDateTime>>(idx), |v| {
            SqlValue::Text(v.to_string())
        })
    } else if *ty == Type::TIMESTAMPTZ {
        opt(
            row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx),
            |v| SqlValue::Text(v.to_rfc3339()),
        )
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        opt(row.try_get::<_, Option<serde_json::Value>>(idx), SqlValue::Json)
    } else {
        // TEXT, VARCHAR, NAME and anything else with a text reading
        opt(row.try_get::<_, Option<String>>(idx), SqlValue::Text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ResultRow {
        ResultRow::new(vec![
            ("name".to_string(), SqlValue::Text("Hades".to_string())),
            ("metacritic".to_string(), SqlValue::Int(93)),
            ("rating".to_string(), SqlValue::Float(4.45)),
        ])
    }

    #[test]
    fn test_get_by_name() {
        let r = row();
        assert_eq!(r.get("metacritic"), Some(&SqlValue::Int(93)));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn test_positional_access() {
        let r = row();
        assert_eq!(r.value_at(0), Some(&SqlValue::Text("Hades".to_string())));
        assert_eq!(r.value_at(3), None);
    }

    #[test]
    fn test_json_preserves_column_order() {
        let json = row().to_json();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["name", "metacritic", "rating"]);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(SqlValue::Int(7).as_number(), Some(7.0));
        assert_eq!(SqlValue::Float(2.5).as_number(), Some(2.5));
        assert_eq!(SqlValue::Text("12.5".to_string()).as_number(), Some(12.5));
        assert_eq!(SqlValue::Text("twelve".to_string()).as_number(), None);
        assert_eq!(SqlValue::Bool(true).as_number(), Some(1.0));
        assert_eq!(SqlValue::Null.as_number(), None);
    }

    #[test]
    fn test_label_coercion() {
        assert_eq!(SqlValue::Text("2020".to_string()).to_label(), "2020");
        assert_eq!(SqlValue::Int(2020).to_label(), "2020");
        assert_eq!(SqlValue::Null.to_label(), "");
    }

    #[test]
    fn test_float_json_nan_becomes_null() {
        assert_eq!(SqlValue::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }
}
