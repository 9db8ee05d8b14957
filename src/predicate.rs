// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Backend-agnostic predicate IR.
//!
//! The compiler accumulates [`Predicate`] leaves into a [`ClauseSet`]
//! (must / must-not), then composes them into one [`BoolClause`] per the
//! request's logic operator. Both emitters render the same composed
//! structure and never see the original request.

use crate::filter::{LogicOperator, ScalarValue};

/// Pattern placement for wildcard predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WildcardKind {
    /// Substring match: `*value*` / `LIKE '%value%'`.
    Contains,
    /// Prefix match: `value*` / `LIKE 'value%'`.
    Prefix,
}

/// One bound of a range predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeBound {
    pub value: ScalarValue,
    pub inclusive: bool,
}

impl RangeBound {
    pub fn inclusive(value: ScalarValue) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    pub fn exclusive(value: ScalarValue) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

/// A leaf (or locally composed) predicate, renderable by every emitter.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Exact match of one value.
    Term {
        field: String,
        value: ScalarValue,
        case_insensitive: bool,
    },
    /// Membership in a value list.
    Terms {
        field: String,
        values: Vec<ScalarValue>,
    },
    /// Substring or prefix match. `value` is the raw (unescaped) pattern
    /// text; emitters escape their own metacharacters.
    Wildcard {
        field: String,
        value: String,
        kind: WildcardKind,
    },
    /// Numeric or date interval with optional bounds.
    Range {
        field: String,
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    },
    /// Field presence.
    Exists { field: String },
    /// Nested key/value scope: the entry at `path` whose `key_field`
    /// equals `key` must also satisfy `inner`.
    Nested {
        path: String,
        key_field: String,
        key: String,
        inner: Box<Predicate>,
    },
    /// At least one of the inner predicates matches
    /// (minimum_should_match = 1).
    AnyOf(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }
}

/// Accumulated clauses before boolean composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClauseSet {
    pub must: Vec<Predicate>,
    pub must_not: Vec<Predicate>,
}

impl ClauseSet {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }

    /// Compose per the request's logic operator.
    ///
    /// AND is the flat conjunction: all of `must`, none of `must_not`.
    /// OR cannot stay flat: each `must_not` entry is individually
    /// negation-wrapped and folded into the should list with
    /// minimum_should_match = 1, because "a OR NOT b" is not expressible
    /// as a flat should list without negating `b` itself.
    pub fn compose(self, operator: LogicOperator) -> BoolClause {
        match operator {
            LogicOperator::And => BoolClause {
                must: self.must,
                must_not: self.must_not,
                should: Vec::new(),
                minimum_should_match: None,
            },
            LogicOperator::Or => {
                let mut should = self.must;
                should.extend(self.must_not.into_iter().map(Predicate::negate));
                BoolClause {
                    must: Vec::new(),
                    must_not: Vec::new(),
                    should,
                    minimum_should_match: Some(1),
                }
            }
        }
    }
}

/// The composed boolean structure both emitters consume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolClause {
    pub must: Vec<Predicate>,
    pub must_not: Vec<Predicate>,
    pub should: Vec<Predicate>,
    pub minimum_should_match: Option<u32>,
}

impl BoolClause {
    /// An empty clause is a no-op filter (matches everything).
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.should.is_empty()
    }
}
