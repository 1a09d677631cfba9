//! Predicate composition for member searches.
//!
//! A [`SearchCondition`] is turned into a single [`Predicate`] by running a
//! fixed list of clause functions over it. Each clause yields a predicate
//! only when its filter is present; the present ones are AND-ed together.
//! An all-absent condition composes to [`Predicate::MatchAll`].

use sea_query::{Alias, Cond, Expr, SimpleExpr};
use serde::{Deserialize, Serialize};

use super::types::SearchCondition;
use crate::models::MemberTeamRow;

pub(crate) const MEMBER_TABLE: &str = "member";
pub(crate) const TEAM_TABLE: &str = "team";

/// Filterable member/team columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterField {
    Username,
    TeamName,
    Age,
}

impl FilterField {
    /// `(table, column)` this field lives in.
    pub fn column(self) -> (&'static str, &'static str) {
        match self {
            FilterField::Username => (MEMBER_TABLE, "username"),
            FilterField::TeamName => (TEAM_TABLE, "name"),
            FilterField::Age => (MEMBER_TABLE, "age"),
        }
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Exact match.
    Equals,
    /// Substring match (LIKE %value%).
    Contains,
    /// Greater than or equal.
    GreaterOrEqual,
    /// Less than or equal.
    LessOrEqual,
}

/// Filter value types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum FilterValue {
    String(String),
    Integer(i64),
}

impl From<&FilterValue> for sea_query::Value {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::String(s) => s.as_str().into(),
            FilterValue::Integer(i) => (*i).into(),
        }
    }
}

/// Boolean condition tree over member/team columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Neutral element: no constraint.
    MatchAll,
    Compare {
        field: FilterField,
        operator: FilterOperator,
        value: FilterValue,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn compare(field: FilterField, operator: FilterOperator, value: FilterValue) -> Self {
        Predicate::Compare {
            field,
            operator,
            value,
        }
    }

    /// Conjunction. `MatchAll` is the identity; nested `And`s are flattened.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::MatchAll, p) | (p, Predicate::MatchAll) => p,
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), p) => {
                left.push(p);
                Predicate::And(left)
            }
            (p, Predicate::And(mut right)) => {
                right.insert(0, p);
                Predicate::And(right)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Disjunction. `MatchAll` absorbs; nested `Or`s are flattened.
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::MatchAll, _) | (_, Predicate::MatchAll) => Predicate::MatchAll,
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), p) => {
                left.push(p);
                Predicate::Or(left)
            }
            (p, Predicate::Or(mut right)) => {
                right.insert(0, p);
                Predicate::Or(right)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }

    pub fn is_match_all(&self) -> bool {
        matches!(self, Predicate::MatchAll)
    }

    /// Whether any comparison in the tree reads `field`.
    pub fn references(&self, field: FilterField) -> bool {
        match self {
            Predicate::MatchAll => false,
            Predicate::Compare { field: f, .. } => *f == field,
            Predicate::And(preds) | Predicate::Or(preds) => {
                preds.iter().any(|p| p.references(field))
            }
        }
    }

    /// Evaluate against a row with SQL semantics: comparisons against a NULL
    /// team name are false.
    pub fn matches(&self, row: &MemberTeamRow) -> bool {
        match self {
            Predicate::MatchAll => true,
            Predicate::And(preds) => preds.iter().all(|p| p.matches(row)),
            Predicate::Or(preds) => preds.iter().any(|p| p.matches(row)),
            Predicate::Compare {
                field,
                operator,
                value,
            } => match field {
                FilterField::Username => compare_text(Some(row.username.as_str()), *operator, value),
                FilterField::TeamName => compare_text(row.team_name.as_deref(), *operator, value),
                FilterField::Age => compare_int(i64::from(row.age), *operator, value),
            },
        }
    }

    /// Render as a SeaQuery condition. `None` means no WHERE clause is needed.
    pub fn to_condition(&self) -> Option<Cond> {
        match self {
            Predicate::MatchAll => None,
            Predicate::Compare {
                field,
                operator,
                value,
            } => Some(Cond::all().add(compare_expr(*field, *operator, value))),
            Predicate::And(preds) => Some(
                preds
                    .iter()
                    .fold(Cond::all(), |cond, p| cond.add_option(p.to_condition())),
            ),
            Predicate::Or(preds) => {
                let mut cond = Cond::any();
                for p in preds {
                    // A match-all disjunct makes the whole disjunction match-all.
                    cond = cond.add(p.to_condition()?);
                }
                Some(cond)
            }
        }
    }
}

fn compare_expr(field: FilterField, operator: FilterOperator, value: &FilterValue) -> SimpleExpr {
    let (table, column) = field.column();
    let col = Expr::col((Alias::new(table), Alias::new(column)));
    let bound = sea_query::Value::from(value);

    match (operator, value) {
        (FilterOperator::Equals, _) => col.eq(bound),
        (FilterOperator::GreaterOrEqual, _) => col.gte(bound),
        (FilterOperator::LessOrEqual, _) => col.lte(bound),
        (FilterOperator::Contains, FilterValue::String(text)) => {
            col.like(format!("%{}%", escape_like_wildcards(text)))
        }
        // Substring match on a number never matches; restrict rather than widen.
        (FilterOperator::Contains, FilterValue::Integer(_)) => Expr::cust("FALSE"),
    }
}

fn compare_text(actual: Option<&str>, operator: FilterOperator, value: &FilterValue) -> bool {
    let (Some(actual), FilterValue::String(expected)) = (actual, value) else {
        return false;
    };
    match operator {
        FilterOperator::Equals => actual == expected.as_str(),
        FilterOperator::Contains => actual.contains(expected.as_str()),
        FilterOperator::GreaterOrEqual => actual >= expected.as_str(),
        FilterOperator::LessOrEqual => actual <= expected.as_str(),
    }
}

fn compare_int(actual: i64, operator: FilterOperator, value: &FilterValue) -> bool {
    let FilterValue::Integer(expected) = value else {
        return false;
    };
    match operator {
        FilterOperator::Equals => actual == *expected,
        FilterOperator::GreaterOrEqual => actual >= *expected,
        FilterOperator::LessOrEqual => actual <= *expected,
        FilterOperator::Contains => false,
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

type Clause = fn(&SearchCondition) -> Option<Predicate>;

/// One entry per optional filter of [`SearchCondition`].
const CLAUSES: [Clause; 4] = [username_eq, team_name_eq, age_goe, age_loe];

/// Compose a search condition into one predicate.
pub fn compose(condition: &SearchCondition) -> Predicate {
    CLAUSES
        .iter()
        .filter_map(|clause| clause(condition))
        .reduce(Predicate::and)
        .unwrap_or(Predicate::MatchAll)
}

/// Blank strings count as absent.
fn has_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn username_eq(condition: &SearchCondition) -> Option<Predicate> {
    let username = has_text(&condition.username)?;
    Some(Predicate::compare(
        FilterField::Username,
        FilterOperator::Equals,
        FilterValue::String(username.to_string()),
    ))
}

fn team_name_eq(condition: &SearchCondition) -> Option<Predicate> {
    let team_name = has_text(&condition.team_name)?;
    Some(Predicate::compare(
        FilterField::TeamName,
        FilterOperator::Equals,
        FilterValue::String(team_name.to_string()),
    ))
}

fn age_goe(condition: &SearchCondition) -> Option<Predicate> {
    Some(Predicate::compare(
        FilterField::Age,
        FilterOperator::GreaterOrEqual,
        FilterValue::Integer(i64::from(condition.age_goe?)),
    ))
}

fn age_loe(condition: &SearchCondition) -> Option<Predicate> {
    Some(Predicate::compare(
        FilterField::Age,
        FilterOperator::LessOrEqual,
        FilterValue::Integer(i64::from(condition.age_loe?)),
    ))
}
