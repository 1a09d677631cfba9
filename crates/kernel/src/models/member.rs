//! Member model: a member row left-joined with its (optional) team.
//!
//! Tables:
//! - `member(member_id, username, age, team_id)`
//! - `team(team_id, name)`

use serde::{Deserialize, Serialize};

/// Member projection with its team, one row per member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberTeamRow {
    /// Member primary key.
    pub member_id: i64,

    /// Login name.
    pub username: String,

    /// Age in years.
    pub age: i32,

    /// Team foreign key (NULL when the member has no team).
    pub team_id: Option<i64>,

    /// Team name from the left join.
    pub team_name: Option<String>,
}
