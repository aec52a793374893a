//! Values produced by expression evaluation

use crate::odx::indirect::IndirectVirtual;
use chrono::NaiveDate;
use serde_json::Value as Json;

/// The result of evaluating one expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null` or undefined
    Missing,
    /// Any JSON value except `null`
    Data(Json),
    Date(NaiveDate),
    /// A request to insert a sub-document here
    Indirect(IndirectVirtual),
    /// A value carrying diagnostics of its own, merged into the enclosing evaluation
    Result(Box<NestedResult>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestedResult {
    pub value: Value,
    pub missing: Vec<String>,
    pub errors: Vec<String>,
}

impl Value {
    /// Wrap JSON, mapping `null` to [`Value::Missing`]
    pub fn from_json(json: Json) -> Self {
        match json {
            Json::Null => Value::Missing,
            other => Value::Data(other),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Value::Data(Json::String(text.into()))
    }

    pub fn bool(value: bool) -> Self {
        Value::Data(Json::Bool(value))
    }

    pub fn nested(value: Value, missing: Vec<String>, errors: Vec<String>) -> Self {
        Value::Result(Box::new(NestedResult {
            value,
            missing,
            errors,
        }))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Truthiness used by conditionals
    ///
    /// Arrays are true only when non-empty. Everything else follows ordinary scalar
    /// coercion: `false`, `0`, `""` and missing are false, while `"0"`, objects, dates and
    /// indirects are true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Missing => false,
            Value::Data(json) => match json {
                Json::Null => false,
                Json::Bool(b) => *b,
                Json::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
                Json::String(s) => !s.is_empty(),
                Json::Array(items) => !items.is_empty(),
                Json::Object(_) => true,
            },
            Value::Date(_) | Value::Indirect(_) => true,
            Value::Result(nested) => nested.value.truthy(),
        }
    }

    /// A JSON view, used for comparisons
    pub fn to_json(&self) -> Json {
        match self {
            Value::Missing => Json::Null,
            Value::Data(json) => json.clone(),
            Value::Date(date) => Json::String(date.format("%Y-%m-%d").to_string()),
            Value::Indirect(indirect) => serde_json::to_value(indirect).unwrap_or(Json::Null),
            Value::Result(nested) => nested.value.to_json(),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        Value::from_json(json)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl From<IndirectVirtual> for Value {
    fn from(indirect: IndirectVirtual) -> Self {
        Value::Indirect(indirect)
    }
}
