// src/memory/qdrant/search.rs
// Similarity search and the Qdrant filter translation function.

use super::{QdrantConnector, map_store_err, mapping};
use crate::error::{EngramError, Result};
use crate::memory::filter::{FilterExpr, Predicate, ScalarValue};
use crate::memory::types::{Metadata, PAYLOAD_CONTENT_KEY, SearchResult};
use qdrant_client::qdrant::{Condition, Filter, Range, SearchPointsBuilder};

impl QdrantConnector {
    pub(crate) async fn search_impl(
        &self,
        name: &str,
        vector: Vec<f32>,
        filter: Option<&FilterExpr>,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        let mut request =
            SearchPointsBuilder::new(name, vector, limit as u64).with_payload(true);

        if let Some(expr) = filter.filter(|f| !f.is_empty()) {
            request = request.filter(to_qdrant_filter(expr)?);
        }
        if let Some(threshold) = score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = self
            .client()
            .search_points(request)
            .await
            .map_err(map_store_err)?;

        let results = response
            .result
            .into_iter()
            .filter_map(|point| {
                let content = point.payload.get(PAYLOAD_CONTENT_KEY)?.as_str()?.to_string();
                let metadata: Metadata = point
                    .payload
                    .iter()
                    .filter(|(key, _)| key.as_str() != PAYLOAD_CONTENT_KEY)
                    .map(|(key, value)| (key.clone(), mapping::payload_value_to_json(value)))
                    .collect();

                Some(SearchResult {
                    content,
                    metadata,
                    score: point.score,
                })
            })
            .collect();

        Ok(results)
    }
}

/// Translate the caller's filter grammar into a Qdrant filter. Each predicate
/// maps onto exactly one Qdrant condition; predicates Qdrant cannot express
/// are rejected rather than dropped.
pub(crate) fn to_qdrant_filter(expr: &FilterExpr) -> Result<Filter> {
    let conditions = expr
        .conditions
        .iter()
        .map(|cond| {
            let field = cond.field.clone();
            match &cond.predicate {
                Predicate::Equals(ScalarValue::Text(s)) => Ok(Condition::matches(field, s.clone())),
                Predicate::Equals(ScalarValue::Integer(i)) => Ok(Condition::matches(field, *i)),
                Predicate::Equals(ScalarValue::Bool(b)) => Ok(Condition::matches(field, *b)),
                Predicate::AnyOf(values) => any_of_condition(&field, values),
                Predicate::Range(bounds) => Ok(Condition::range(
                    field,
                    Range {
                        gt: bounds.gt,
                        gte: bounds.gte,
                        lt: bounds.lt,
                        lte: bounds.lte,
                    },
                )),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Filter::must(conditions))
}

/// Qdrant set matches are homogeneous keyword or integer lists.
fn any_of_condition(field: &str, values: &[ScalarValue]) -> Result<Condition> {
    if values.iter().all(|v| matches!(v, ScalarValue::Text(_))) {
        let keywords: Vec<String> = values
            .iter()
            .filter_map(|v| match v {
                ScalarValue::Text(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        return Ok(Condition::matches(field.to_string(), keywords));
    }
    if values.iter().all(|v| matches!(v, ScalarValue::Integer(_))) {
        let integers: Vec<i64> = values
            .iter()
            .filter_map(|v| match v {
                ScalarValue::Integer(i) => Some(*i),
                _ => None,
            })
            .collect();
        return Ok(Condition::matches(field.to_string(), integers));
    }
    Err(EngramError::UnsupportedFilter(format!(
        "'any' on field '{}' must be all-string or all-integer",
        field
    )))
}
