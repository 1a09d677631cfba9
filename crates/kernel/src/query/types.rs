//! Query layer types.
//!
//! - SearchCondition: sparse, independently optional member filters
//! - PageSpec: validated offset/size/sort for one page
//! - PageResult: one page of content plus its total
//! - Nested: a parent with its loaded children

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::predicate::{MEMBER_TABLE, TEAM_TABLE};
use crate::error::{QueryError, QueryResult};

/// Member search filters. Every field is optional; `None` means no constraint.
///
/// Blank strings are treated the same as `None` by the predicate composer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCondition {
    /// Exact username.
    pub username: Option<String>,

    /// Exact team name.
    #[serde(default, alias = "teamName")]
    pub team_name: Option<String>,

    /// Minimum age, inclusive.
    #[serde(default, alias = "ageGoe")]
    pub age_goe: Option<i32>,

    /// Maximum age, inclusive.
    #[serde(default, alias = "ageLoe")]
    pub age_loe: Option<i32>,
}

impl SearchCondition {
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_team_name(mut self, team_name: impl Into<String>) -> Self {
        self.team_name = Some(team_name.into());
        self
    }

    pub fn with_age_goe(mut self, age: i32) -> Self {
        self.age_goe = Some(age);
        self
    }

    pub fn with_age_loe(mut self, age: i32) -> Self {
        self.age_loe = Some(age);
        self
    }
}

/// Member columns that can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    MemberId,
    Username,
    Age,
    TeamName,
}

impl SortField {
    /// `(table, column)` used in ORDER BY.
    pub fn column(self) -> (&'static str, &'static str) {
        match self {
            SortField::MemberId => (MEMBER_TABLE, "member_id"),
            SortField::Username => (MEMBER_TABLE, "username"),
            SortField::Age => (MEMBER_TABLE, "age"),
            SortField::TeamName => (TEAM_TABLE, "name"),
        }
    }
}

impl FromStr for SortField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" | "member_id" | "memberId" => Ok(SortField::MemberId),
            "username" => Ok(SortField::Username),
            "age" => Ok(SortField::Age),
            "team_name" | "teamName" => Ok(SortField::TeamName),
            other => Err(QueryError::InvalidSortKey(format!(
                "unknown sort field '{other}'"
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(QueryError::InvalidSortKey(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,

    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    /// Parse a web-style sort parameter: `"username"` or `"username,desc"`.
    pub fn parse(raw: &str) -> QueryResult<Self> {
        let (field, direction) = match raw.split_once(',') {
            Some((field, direction)) => (field, direction.parse()?),
            None => (raw, SortDirection::Asc),
        };
        Ok(Self {
            field: field.parse()?,
            direction,
        })
    }
}

/// Validated page request.
///
/// Only constructible through [`PageSpec::new`] and [`PageSpec::of_page`],
/// which reject negative offsets and non-positive sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSpec {
    offset: u64,
    size: u32,
    sort: Vec<SortKey>,
}

impl PageSpec {
    /// Page starting at row `offset` holding at most `size` rows.
    pub fn new(offset: i64, size: i64, sort: Vec<SortKey>) -> QueryResult<Self> {
        if offset < 0 {
            return Err(QueryError::InvalidPageSpec(format!(
                "offset must be >= 0, got {offset}"
            )));
        }
        if size <= 0 {
            return Err(QueryError::InvalidPageSpec(format!(
                "size must be > 0, got {size}"
            )));
        }
        let size = u32::try_from(size)
            .map_err(|_| QueryError::InvalidPageSpec(format!("size {size} is too large")))?;

        Ok(Self {
            offset: offset as u64,
            size,
            sort,
        })
    }

    /// Zero-based page number `page` of `size` rows.
    pub fn of_page(page: i64, size: i64, sort: Vec<SortKey>) -> QueryResult<Self> {
        if page < 0 {
            return Err(QueryError::InvalidPageSpec(format!(
                "page must be >= 0, got {page}"
            )));
        }
        let offset = page
            .checked_mul(size.max(0))
            .ok_or_else(|| QueryError::InvalidPageSpec("page offset overflows".to_string()))?;
        Self::new(offset, size, sort)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn is_first(&self) -> bool {
        self.offset == 0
    }

    /// Same page with its size lowered to `max` if it exceeds it.
    pub(crate) fn capped(&self, max: u32) -> Self {
        Self {
            offset: self.offset,
            size: self.size.min(max.max(1)),
            sort: self.sort.clone(),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult<T> {
    /// Page content in sort order (at most `size` entries).
    pub content: Vec<T>,

    /// Total matching rows across all pages.
    pub total: u64,

    /// Row offset of the first entry.
    pub offset: u64,

    /// Requested page size.
    pub size: u32,
}

impl<T> PageResult<T> {
    pub fn new(content: Vec<T>, total: u64, page: &PageSpec) -> Self {
        Self {
            content,
            total,
            offset: page.offset(),
            size: page.size(),
        }
    }

    /// Zero-based page number.
    pub fn page_number(&self) -> u64 {
        self.offset / u64::from(self.size.max(1))
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.size.max(1)))
    }

    pub fn has_next(&self) -> bool {
        self.offset + (self.content.len() as u64) < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.offset > 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Convert the content while keeping the paging metadata.
    pub fn map<U, F>(self, f: F) -> PageResult<U>
    where
        F: FnMut(T) -> U,
    {
        PageResult {
            content: self.content.into_iter().map(f).collect(),
            total: self.total,
            offset: self.offset,
            size: self.size,
        }
    }
}

/// A parent record with its children attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nested<P, C> {
    pub parent: P,
    pub children: Vec<C>,
}

impl<P, C> Nested<P, C> {
    pub fn new(parent: P, children: Vec<C>) -> Self {
        Self { parent, children }
    }
}
