// src/memory/filter.rs
// Caller-facing filter grammar over metadata fields.
//
// The wire shape is a JSON object mapping a field name to either a scalar
// (equality), `{"any": [..]}` (membership), or a range object built from
// `gt`/`gte`/`lt`/`lte`. Each parsed predicate maps 1:1 onto a construct the
// storage backend natively supports; anything else fails fast instead of
// being silently dropped.

use crate::error::{EngramError, Result};
use serde_json::Value;

const RANGE_OPS: [&str; 4] = ["gt", "gte", "lt", "lte"];

/// Scalar values usable in equality and membership predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

/// Numeric range bounds; at least one bound is set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeBounds {
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(ScalarValue),
    AnyOf(Vec<ScalarValue>),
    Range(RangeBounds),
}

/// One predicate applied to one metadata field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    pub predicate: Predicate,
}

/// Conjunction of field conditions. An empty expression matches everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterExpr {
    pub conditions: Vec<FieldCondition>,
}

impl FilterExpr {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Parse the caller's filter object into the grammar.
    pub fn parse(raw: &serde_json::Map<String, Value>) -> Result<Self> {
        let mut conditions = Vec::with_capacity(raw.len());
        for (field, value) in raw {
            conditions.push(FieldCondition {
                field: field.clone(),
                predicate: parse_predicate(field, value)?,
            });
        }
        Ok(Self { conditions })
    }
}

fn parse_scalar(field: &str, value: &Value) -> Result<ScalarValue> {
    match value {
        Value::String(s) => Ok(ScalarValue::Text(s.clone())),
        Value::Bool(b) => Ok(ScalarValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ScalarValue::Integer(i))
            } else {
                // Approximate float equality would silently return wrong results.
                Err(EngramError::UnsupportedFilter(format!(
                    "float equality on field '{}' (use a range instead)",
                    field
                )))
            }
        }
        Value::Null => Err(EngramError::UnsupportedFilter(format!(
            "null match on field '{}'",
            field
        ))),
        Value::Array(_) | Value::Object(_) => Err(EngramError::UnsupportedFilter(format!(
            "non-scalar match value on field '{}'",
            field
        ))),
    }
}

fn parse_predicate(field: &str, value: &Value) -> Result<Predicate> {
    let obj = match value {
        Value::Object(obj) => obj,
        scalar => return Ok(Predicate::Equals(parse_scalar(field, scalar)?)),
    };

    let has_any = obj.contains_key("any");
    let has_range = obj.keys().any(|k| RANGE_OPS.contains(&k.as_str()));

    if has_any && has_range {
        return Err(EngramError::Validation(format!(
            "filter on field '{}' mixes 'any' with range operators",
            field
        )));
    }

    if has_any {
        if obj.len() != 1 {
            return Err(EngramError::Validation(format!(
                "filter on field '{}' mixes 'any' with other keys",
                field
            )));
        }
        let values = obj["any"].as_array().ok_or_else(|| {
            EngramError::Validation(format!("'any' on field '{}' must be an array", field))
        })?;
        if values.is_empty() {
            return Err(EngramError::Validation(format!(
                "'any' on field '{}' must not be empty",
                field
            )));
        }
        let scalars = values
            .iter()
            .map(|v| parse_scalar(field, v))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Predicate::AnyOf(scalars));
    }

    if has_range {
        let mut bounds = RangeBounds::default();
        for (op, bound) in obj {
            let num = bound.as_f64().ok_or_else(|| {
                EngramError::Validation(format!(
                    "range bound '{}' on field '{}' must be a number",
                    op, field
                ))
            })?;
            match op.as_str() {
                "gt" => bounds.gt = Some(num),
                "gte" => bounds.gte = Some(num),
                "lt" => bounds.lt = Some(num),
                "lte" => bounds.lte = Some(num),
                other => {
                    return Err(EngramError::UnsupportedFilter(format!(
                        "operator '{}' on field '{}'",
                        other, field
                    )));
                }
            }
        }
        return Ok(Predicate::Range(bounds));
    }

    let ops: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
    Err(EngramError::UnsupportedFilter(format!(
        "operator(s) {:?} on field '{}'",
        ops, field
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngramError;
    use serde_json::json;

    fn parse(filter: Value) -> Result<FilterExpr> {
        FilterExpr::parse(filter.as_object().unwrap())
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let expr = parse(json!({})).unwrap();
        assert!(expr.is_empty());
    }

    #[test]
    fn test_scalar_equality() {
        let expr = parse(json!({"author": "peter", "year": 2024, "draft": false})).unwrap();
        assert_eq!(expr.conditions.len(), 3);
        let author = expr.conditions.iter().find(|c| c.field == "author").unwrap();
        assert_eq!(
            author.predicate,
            Predicate::Equals(ScalarValue::Text("peter".into()))
        );
        let year = expr.conditions.iter().find(|c| c.field == "year").unwrap();
        assert_eq!(year.predicate, Predicate::Equals(ScalarValue::Integer(2024)));
        let draft = expr.conditions.iter().find(|c| c.field == "draft").unwrap();
        assert_eq!(draft.predicate, Predicate::Equals(ScalarValue::Bool(false)));
    }

    #[test]
    fn test_membership() {
        let expr = parse(json!({"tag": {"any": ["rust", "mcp"]}})).unwrap();
        assert_eq!(
            expr.conditions[0].predicate,
            Predicate::AnyOf(vec![
                ScalarValue::Text("rust".into()),
                ScalarValue::Text("mcp".into())
            ])
        );
    }

    #[test]
    fn test_range() {
        let expr = parse(json!({"year": {"gte": 2020, "lt": 2025}})).unwrap();
        assert_eq!(
            expr.conditions[0].predicate,
            Predicate::Range(RangeBounds {
                gte: Some(2020.0),
                lt: Some(2025.0),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_float_equality_is_unsupported() {
        let err = parse(json!({"score": 0.5})).unwrap_err();
        assert!(matches!(err, EngramError::UnsupportedFilter(_)));
    }

    #[test]
    fn test_null_match_is_unsupported() {
        let err = parse(json!({"owner": null})).unwrap_err();
        assert!(matches!(err, EngramError::UnsupportedFilter(_)));
    }

    #[test]
    fn test_unknown_operator_is_unsupported() {
        let err = parse(json!({"name": {"prefix": "pe"}})).unwrap_err();
        assert!(matches!(err, EngramError::UnsupportedFilter(_)));
    }

    #[test]
    fn test_nested_object_match_is_unsupported() {
        let err = parse(json!({"tag": {"any": [{"deep": 1}]}})).unwrap_err();
        assert!(matches!(err, EngramError::UnsupportedFilter(_)));
    }

    #[test]
    fn test_empty_any_is_malformed() {
        let err = parse(json!({"tag": {"any": []}})).unwrap_err();
        assert!(matches!(err, EngramError::Validation(_)));
    }

    #[test]
    fn test_mixed_any_and_range_is_malformed() {
        let err = parse(json!({"year": {"any": [2024], "gte": 2020}})).unwrap_err();
        assert!(matches!(err, EngramError::Validation(_)));
    }

    #[test]
    fn test_non_numeric_range_bound_is_malformed() {
        let err = parse(json!({"year": {"gte": "2020"}})).unwrap_err();
        assert!(matches!(err, EngramError::Validation(_)));
    }
}
