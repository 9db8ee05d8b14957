//! Search Emitter
//!
//! Renders the composed clause as an OpenSearch-style boolean query
//! tree. Leaf predicates map to `term`/`terms`, `wildcard`, `range`,
//! `exists` and `nested` queries.
//!
//! # Output shape
//!
//! ```json
//! {"bool": {
//!     "must": [...],
//!     "must_not": [...],
//!     "should": [...],
//!     "minimum_should_match": 1
//! }}
//! ```

use serde_json::{json, Map, Value};

use crate::predicate::{BoolClause, Predicate, RangeBound, WildcardKind};

/// Search query renderer.
pub struct SearchEmitter;

impl SearchEmitter {
    /// Render a composed clause. An empty clause renders as match-all.
    pub fn render(clause: &BoolClause) -> Value {
        crate::metrics::record_emit("search");
        if clause.is_empty() {
            return json!({"match_all": {}});
        }

        let mut bool_body = Map::new();
        if !clause.must.is_empty() {
            bool_body.insert("must".into(), Self::render_list(&clause.must));
        }
        if !clause.must_not.is_empty() {
            bool_body.insert("must_not".into(), Self::render_list(&clause.must_not));
        }
        if !clause.should.is_empty() {
            bool_body.insert("should".into(), Self::render_list(&clause.should));
            if let Some(minimum) = clause.minimum_should_match {
                bool_body.insert("minimum_should_match".into(), json!(minimum));
            }
        }
        json!({ "bool": bool_body })
    }

    fn render_list(predicates: &[Predicate]) -> Value {
        Value::Array(predicates.iter().map(Self::render_predicate).collect())
    }

    fn render_predicate(predicate: &Predicate) -> Value {
        match predicate {
            Predicate::Term {
                field,
                value,
                case_insensitive,
            } => {
                if *case_insensitive {
                    json!({"term": {field: {"value": value.to_json(), "case_insensitive": true}}})
                } else {
                    json!({"term": {field: value.to_json()}})
                }
            }
            Predicate::Terms { field, values } => {
                let rendered: Vec<Value> = values.iter().map(|v| v.to_json()).collect();
                json!({"terms": {field: rendered}})
            }
            Predicate::Wildcard { field, value, kind } => {
                let escaped = escape_wildcard(value);
                let pattern = match kind {
                    WildcardKind::Contains => format!("*{escaped}*"),
                    WildcardKind::Prefix => format!("{escaped}*"),
                };
                json!({"wildcard": {field: {"value": pattern}}})
            }
            Predicate::Range {
                field,
                lower,
                upper,
            } => {
                let mut body = Map::new();
                if let Some(bound) = lower {
                    body.insert(bound_key(bound, true).into(), bound.value.to_json());
                }
                if let Some(bound) = upper {
                    body.insert(bound_key(bound, false).into(), bound.value.to_json());
                }
                json!({"range": {field: body}})
            }
            Predicate::Exists { field } => json!({"exists": {"field": field}}),
            Predicate::Nested {
                path,
                key_field,
                key,
                inner,
            } => {
                json!({"nested": {
                    "path": path,
                    "query": {"bool": {"must": [
                        {"term": {key_field: key}},
                        Self::render_predicate(inner),
                    ]}}
                }})
            }
            Predicate::AnyOf(inner) => {
                json!({"bool": {
                    "should": Self::render_list(inner),
                    "minimum_should_match": 1,
                }})
            }
            Predicate::Not(inner) => {
                json!({"bool": {"must_not": [Self::render_predicate(inner)]}})
            }
        }
    }
}

fn bound_key(bound: &RangeBound, lower: bool) -> &'static str {
    match (lower, bound.inclusive) {
        (true, true) => "gte",
        (true, false) => "gt",
        (false, true) => "lte",
        (false, false) => "lt",
    }
}

/// Escape wildcard metacharacters in untrusted pattern text.
fn escape_wildcard(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '*' | '?' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
