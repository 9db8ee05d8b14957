//! SQL Emitter
//!
//! Renders the composed clause as a parameterized `WHERE` predicate.
//! Values are always bound through `?` placeholders; the only inlined
//! text is identifier-quoted column names, which come from the catalog
//! (pre-validated configuration), never from the request.
//!
//! # SQL generated
//!
//! ```sql
//! "status" IN (?, ?)                       -- terms
//! "hostname" LIKE ? ESCAPE '\'             -- contains / prefix
//! ("severity" >= ? AND "severity" <= ?)    -- range
//! "owner" IS NOT NULL                      -- exists
//! EXISTS (SELECT 1 FROM "tags" WHERE ...)  -- nested key/value
//! ```

use crate::filter::ScalarValue;
use crate::predicate::{BoolClause, Predicate, RangeBound, WildcardKind};

/// SQL predicate renderer.
pub struct SqlEmitter;

/// A rendered predicate with its bind parameters in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    /// The WHERE clause (without the `WHERE` keyword).
    pub clause: String,
    pub params: Vec<SqlParam>,
}

/// A bind parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Numeric(f64),
    Boolean(bool),
}

impl From<&ScalarValue> for SqlParam {
    fn from(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::Text(s) => Self::Text(s.clone()),
            ScalarValue::Number(n) => Self::Numeric(*n),
            ScalarValue::Bool(b) => Self::Boolean(*b),
        }
    }
}

impl SqlEmitter {
    /// Render a composed clause. An empty clause renders as the always
    /// true predicate.
    pub fn render(clause: &BoolClause) -> SqlFragment {
        crate::metrics::record_emit("sql");
        let mut params = Vec::new();
        let mut segments: Vec<String> = Vec::new();

        for predicate in &clause.must {
            segments.push(Self::render_predicate(predicate, &mut params));
        }
        for predicate in &clause.must_not {
            segments.push(format!(
                "NOT ({})",
                Self::render_predicate(predicate, &mut params)
            ));
        }
        if !clause.should.is_empty() {
            let parts: Vec<String> = clause
                .should
                .iter()
                .map(|p| Self::render_predicate(p, &mut params))
                .collect();
            segments.push(join_or(parts));
        }

        let clause = match segments.len() {
            0 => "1=1".to_string(),
            1 => segments.into_iter().next().unwrap(),
            _ => format!("({})", segments.join(" AND ")),
        };
        SqlFragment { clause, params }
    }

    fn render_predicate(predicate: &Predicate, params: &mut Vec<SqlParam>) -> String {
        match predicate {
            Predicate::Term {
                field,
                value,
                case_insensitive,
            } => {
                params.push(SqlParam::from(value));
                if *case_insensitive {
                    format!("LOWER({}) = LOWER(?)", quote_ident(field))
                } else {
                    format!("{} = ?", quote_ident(field))
                }
            }
            Predicate::Terms { field, values } => {
                let placeholders: Vec<&str> = values
                    .iter()
                    .map(|value| {
                        params.push(SqlParam::from(value));
                        "?"
                    })
                    .collect();
                format!("{} IN ({})", quote_ident(field), placeholders.join(", "))
            }
            Predicate::Wildcard { field, value, kind } => {
                let escaped = escape_like(value);
                let pattern = match kind {
                    WildcardKind::Contains => format!("%{escaped}%"),
                    WildcardKind::Prefix => format!("{escaped}%"),
                };
                params.push(SqlParam::Text(pattern));
                format!("{} LIKE ? ESCAPE '\\'", quote_ident(field))
            }
            Predicate::Range {
                field,
                lower,
                upper,
            } => {
                let column = quote_ident(field);
                let mut parts = Vec::new();
                if let Some(bound) = lower {
                    parts.push(Self::render_bound(&column, bound, true, params));
                }
                if let Some(bound) = upper {
                    parts.push(Self::render_bound(&column, bound, false, params));
                }
                match parts.len() {
                    0 => "1=1".to_string(),
                    1 => parts.into_iter().next().unwrap(),
                    _ => format!("({})", parts.join(" AND ")),
                }
            }
            Predicate::Exists { field } => format!("{} IS NOT NULL", quote_ident(field)),
            Predicate::Nested {
                path,
                key_field,
                key,
                inner,
            } => {
                params.push(SqlParam::Text(key.clone()));
                let inner_sql = Self::render_predicate(inner, params);
                format!(
                    "EXISTS (SELECT 1 FROM {} WHERE {} = ? AND {})",
                    quote_ident(path),
                    quote_ident(key_field),
                    inner_sql
                )
            }
            Predicate::AnyOf(inner) => {
                let parts: Vec<String> = inner
                    .iter()
                    .map(|p| Self::render_predicate(p, params))
                    .collect();
                join_or(parts)
            }
            Predicate::Not(inner) => {
                format!("NOT ({})", Self::render_predicate(inner, params))
            }
        }
    }

    fn render_bound(
        column: &str,
        bound: &RangeBound,
        lower: bool,
        params: &mut Vec<SqlParam>,
    ) -> String {
        params.push(SqlParam::from(&bound.value));
        let op = match (lower, bound.inclusive) {
            (true, true) => ">=",
            (true, false) => ">",
            (false, true) => "<=",
            (false, false) => "<",
        };
        format!("{column} {op} ?")
    }
}

fn join_or(parts: Vec<String>) -> String {
    if parts.len() == 1 {
        parts.into_iter().next().unwrap()
    } else {
        format!("({})", parts.join(" OR "))
    }
}

/// Quote a pre-validated identifier. Dotted names quote each segment so
/// nested specs like `tags.value` render as `"tags"."value"`.
pub(crate) fn quote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|segment| format!("\"{}\"", segment.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Escape LIKE metacharacters in untrusted pattern text.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' | '_' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::LogicOperator;
    use crate::predicate::ClauseSet;

    fn term(field: &str, value: &str) -> Predicate {
        Predicate::Term {
            field: field.into(),
            value: ScalarValue::Text(value.into()),
            case_insensitive: false,
        }
    }

    #[test]
    fn test_empty_clause_is_always_true() {
        let sql = SqlEmitter::render(&BoolClause::default());
        assert_eq!(sql.clause, "1=1");
        assert!(sql.params.is_empty());
    }

    #[test]
    fn test_terms_in_list() {
        let clause = ClauseSet {
            must: vec![Predicate::Terms {
                field: "status".into(),
                values: vec![
                    ScalarValue::Text("open".into()),
                    ScalarValue::Text("new".into()),
                ],
            }],
            must_not: vec![],
        }
        .compose(LogicOperator::And);
        let sql = SqlEmitter::render(&clause);
        assert_eq!(sql.clause, "\"status\" IN (?, ?)");
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Text("open".into()),
                SqlParam::Text("new".into())
            ]
        );
    }

    #[test]
    fn test_and_with_must_not() {
        let clause = ClauseSet {
            must: vec![term("a", "1")],
            must_not: vec![term("b", "2")],
        }
        .compose(LogicOperator::And);
        let sql = SqlEmitter::render(&clause);
        assert_eq!(sql.clause, "(\"a\" = ? AND NOT (\"b\" = ?))");
    }

    #[test]
    fn test_or_with_negation() {
        // a = 1 OR b <> 2, never NOT(a = 1 AND b = 2)
        let clause = ClauseSet {
            must: vec![term("a", "1")],
            must_not: vec![term("b", "2")],
        }
        .compose(LogicOperator::Or);
        let sql = SqlEmitter::render(&clause);
        assert_eq!(sql.clause, "(\"a\" = ? OR NOT (\"b\" = ?))");
    }

    #[test]
    fn test_case_insensitive_term() {
        let mut params = Vec::new();
        let predicate = Predicate::Term {
            field: "name".into(),
            value: ScalarValue::Text("Alice".into()),
            case_insensitive: true,
        };
        let sql = SqlEmitter::render_predicate(&predicate, &mut params);
        assert_eq!(sql, "LOWER(\"name\") = LOWER(?)");
        assert_eq!(params, vec![SqlParam::Text("Alice".into())]);
    }

    #[test]
    fn test_like_escaping() {
        let mut params = Vec::new();
        let predicate = Predicate::Wildcard {
            field: "note".into(),
            value: "50%_done".into(),
            kind: WildcardKind::Contains,
        };
        let sql = SqlEmitter::render_predicate(&predicate, &mut params);
        assert_eq!(sql, "\"note\" LIKE ? ESCAPE '\\'");
        assert_eq!(params, vec![SqlParam::Text("%50\\%\\_done%".into())]);
    }

    #[test]
    fn test_prefix_pattern() {
        let mut params = Vec::new();
        let predicate = Predicate::Wildcard {
            field: "host".into(),
            value: "web".into(),
            kind: WildcardKind::Prefix,
        };
        SqlEmitter::render_predicate(&predicate, &mut params);
        assert_eq!(params, vec![SqlParam::Text("web%".into())]);
    }

    #[test]
    fn test_range_both_bounds() {
        let mut params = Vec::new();
        let predicate = Predicate::Range {
            field: "severity".into(),
            lower: Some(RangeBound::inclusive(ScalarValue::Number(4.0))),
            upper: Some(RangeBound::exclusive(ScalarValue::Number(7.0))),
        };
        let sql = SqlEmitter::render_predicate(&predicate, &mut params);
        assert_eq!(sql, "(\"severity\" >= ? AND \"severity\" < ?)");
        assert_eq!(
            params,
            vec![SqlParam::Numeric(4.0), SqlParam::Numeric(7.0)]
        );
    }

    #[test]
    fn test_exists_is_not_null() {
        let mut params = Vec::new();
        let sql = SqlEmitter::render_predicate(
            &Predicate::Exists {
                field: "owner".into(),
            },
            &mut params,
        );
        assert_eq!(sql, "\"owner\" IS NOT NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn test_nested_exists_subquery() {
        let mut params = Vec::new();
        let predicate = Predicate::Nested {
            path: "tags".into(),
            key_field: "tags.name".into(),
            key: "env".into(),
            inner: Box::new(term("tags.value", "prod")),
        };
        let sql = SqlEmitter::render_predicate(&predicate, &mut params);
        assert_eq!(
            sql,
            "EXISTS (SELECT 1 FROM \"tags\" WHERE \"tags\".\"name\" = ? AND \"tags\".\"value\" = ?)"
        );
        assert_eq!(
            params,
            vec![SqlParam::Text("env".into()), SqlParam::Text("prod".into())]
        );
    }

    #[test]
    fn test_quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
