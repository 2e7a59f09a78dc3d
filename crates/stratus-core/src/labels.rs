//! Labels and label selectors.
//!
//! A [`LabelSelector`] is the declarative form carried on API objects
//! (match-labels plus match-expressions). Before it can answer queries it
//! is compiled into a [`Selector`], which validates the requirements once;
//! a malformed selector surfaces as [`SelectorError`] at compile time
//! rather than silently matching nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Arbitrary key/value labels attached to workloads, nodes, and budgets.
pub type Labels = BTreeMap<String, String>;

/// Declarative label selector, as carried on API objects.
///
/// `match_labels` entries are exact-equality requirements; they are ANDed
/// with `match_expressions`. A selector with neither matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default)]
    pub match_expressions: Vec<SelectorRequirement>,
}

impl LabelSelector {
    /// Selector with a single exact-match label requirement.
    pub fn matching(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            match_labels: BTreeMap::from([(key.into(), value.into())]),
            match_expressions: Vec::new(),
        }
    }
}

/// One expression inside a [`LabelSelector`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Relationship between a label key and a value set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// Errors raised while compiling a [`LabelSelector`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector requirement has an empty key")]
    EmptyKey,

    #[error("operator {operator:?} on key {key:?} requires at least one value")]
    MissingValues { key: String, operator: SelectorOperator },

    #[error("operator {operator:?} on key {key:?} must not carry values")]
    UnexpectedValues { key: String, operator: SelectorOperator },
}

/// A compiled, validated selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    requirements: Vec<SelectorRequirement>,
}

impl Selector {
    /// A selector that matches every label set.
    pub fn everything() -> Self {
        Self::default()
    }

    /// True if this selector carries no requirements at all.
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// True if `labels` satisfies every requirement.
    pub fn matches(&self, labels: &Labels) -> bool {
        self.requirements.iter().all(|req| req_matches(req, labels))
    }
}

fn req_matches(req: &SelectorRequirement, labels: &Labels) -> bool {
    match req.operator {
        SelectorOperator::In => labels
            .get(&req.key)
            .is_some_and(|v| req.values.iter().any(|candidate| candidate == v)),
        SelectorOperator::NotIn => labels
            .get(&req.key)
            .map_or(true, |v| !req.values.iter().any(|candidate| candidate == v)),
        SelectorOperator::Exists => labels.contains_key(&req.key),
        SelectorOperator::DoesNotExist => !labels.contains_key(&req.key),
    }
}

impl TryFrom<&LabelSelector> for Selector {
    type Error = SelectorError;

    fn try_from(selector: &LabelSelector) -> Result<Self, Self::Error> {
        let mut requirements =
            Vec::with_capacity(selector.match_labels.len() + selector.match_expressions.len());

        for (key, value) in &selector.match_labels {
            if key.is_empty() {
                return Err(SelectorError::EmptyKey);
            }
            requirements.push(SelectorRequirement {
                key: key.clone(),
                operator: SelectorOperator::In,
                values: vec![value.clone()],
            });
        }

        for expr in &selector.match_expressions {
            if expr.key.is_empty() {
                return Err(SelectorError::EmptyKey);
            }
            match expr.operator {
                SelectorOperator::In | SelectorOperator::NotIn => {
                    if expr.values.is_empty() {
                        return Err(SelectorError::MissingValues {
                            key: expr.key.clone(),
                            operator: expr.operator,
                        });
                    }
                }
                SelectorOperator::Exists | SelectorOperator::DoesNotExist => {
                    if !expr.values.is_empty() {
                        return Err(SelectorError::UnexpectedValues {
                            key: expr.key.clone(),
                            operator: expr.operator,
                        });
                    }
                }
            }
            requirements.push(expr.clone());
        }

        Ok(Selector { requirements })
    }
}
