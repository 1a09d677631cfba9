//! Member query builder using SeaQuery.
//!
//! Generates PostgreSQL for:
//! - the member/team content page
//! - the total count (team join dropped when no filter needs it)
//! - the batched order lookup
//! - the member × team × order × item flat join

use sea_query::{
    Alias, Asterisk, Expr, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement,
};

use super::predicate::{FilterField, MEMBER_TABLE, Predicate, TEAM_TABLE};
use super::types::{SortDirection, SortKey};

const ORDERS_TABLE: &str = "orders";
const ITEM_TABLE: &str = "item";

/// Query builder for member searches.
pub struct MemberQueryBuilder<'a> {
    predicate: &'a Predicate,
}

impl<'a> MemberQueryBuilder<'a> {
    pub fn new(predicate: &'a Predicate) -> Self {
        Self { predicate }
    }

    /// Build the content query for one page.
    pub fn build_page(&self, sorts: &[SortKey], offset: u64, limit: u64) -> String {
        let mut query = Query::select();

        self.add_member_columns(&mut query);
        query.from(Alias::new(MEMBER_TABLE));
        add_team_join(&mut query);
        self.add_filters(&mut query);
        add_sorts(&mut query, sorts);

        query.limit(limit);
        query.offset(offset);

        query.to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT query for total results.
    ///
    /// The team join is to-one and cannot change the member count, so it is
    /// only kept when a filter reads a team column.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();

        query.expr(Expr::col(Asterisk).count());
        query.from(Alias::new(MEMBER_TABLE));
        if self.predicate.references(FilterField::TeamName) {
            add_team_join(&mut query);
        }
        self.add_filters(&mut query);

        query.to_string(PostgresQueryBuilder)
    }

    /// Build the flat join of members, teams, orders and items.
    ///
    /// Every join is a LEFT JOIN so members without orders still produce one
    /// row. No LIMIT/OFFSET is emitted: the join multiplies member rows by
    /// their order count, so paging must happen after aggregation.
    pub fn build_flat(&self, sorts: &[SortKey]) -> String {
        let mut query = Query::select();

        self.add_member_columns(&mut query);
        add_order_columns(&mut query);
        query.from(Alias::new(MEMBER_TABLE));
        add_team_join(&mut query);
        query.join(
            JoinType::LeftJoin,
            Alias::new(ORDERS_TABLE),
            Expr::col((Alias::new(MEMBER_TABLE), Alias::new("member_id")))
                .equals((Alias::new(ORDERS_TABLE), Alias::new("member_id"))),
        );
        add_item_join(&mut query);
        self.add_filters(&mut query);
        add_sorts(&mut query, sorts);
        query.order_by(
            (Alias::new(ORDERS_TABLE), Alias::new("order_id")),
            Order::Asc,
        );

        query.to_string(PostgresQueryBuilder)
    }

    fn add_member_columns(&self, query: &mut SelectStatement) {
        for column in ["member_id", "username", "age", "team_id"] {
            query.column((Alias::new(MEMBER_TABLE), Alias::new(column)));
        }
        query.expr_as(
            Expr::col((Alias::new(TEAM_TABLE), Alias::new("name"))),
            Alias::new("team_name"),
        );
    }

    fn add_filters(&self, query: &mut SelectStatement) {
        if let Some(cond) = self.predicate.to_condition() {
            query.cond_where(cond);
        }
    }
}

/// Build the batched order lookup for a set of member ids.
pub fn build_orders_batch(member_ids: &[i64]) -> String {
    let mut query = Query::select();

    query.column((Alias::new(ORDERS_TABLE), Alias::new("order_id")));
    query.column((Alias::new(ORDERS_TABLE), Alias::new("member_id")));
    add_order_detail_columns(&mut query);
    query.from(Alias::new(ORDERS_TABLE));
    add_item_join(&mut query);
    query.and_where(
        Expr::col((Alias::new(ORDERS_TABLE), Alias::new("member_id")))
            .is_in(member_ids.iter().copied()),
    );
    query.order_by(
        (Alias::new(ORDERS_TABLE), Alias::new("order_id")),
        Order::Asc,
    );

    query.to_string(PostgresQueryBuilder)
}

fn add_team_join(query: &mut SelectStatement) {
    query.join(
        JoinType::LeftJoin,
        Alias::new(TEAM_TABLE),
        Expr::col((Alias::new(MEMBER_TABLE), Alias::new("team_id")))
            .equals((Alias::new(TEAM_TABLE), Alias::new("team_id"))),
    );
}

fn add_item_join(query: &mut SelectStatement) {
    query.join(
        JoinType::LeftJoin,
        Alias::new(ITEM_TABLE),
        Expr::col((Alias::new(ORDERS_TABLE), Alias::new("item_id")))
            .equals((Alias::new(ITEM_TABLE), Alias::new("item_id"))),
    );
}

fn add_order_columns(query: &mut SelectStatement) {
    query.column((Alias::new(ORDERS_TABLE), Alias::new("order_id")));
    add_order_detail_columns(query);
}

fn add_order_detail_columns(query: &mut SelectStatement) {
    query.expr_as(
        Expr::col((Alias::new(ITEM_TABLE), Alias::new("name"))),
        Alias::new("item_name"),
    );
    for column in ["order_price", "count", "ordered_at"] {
        query.column((Alias::new(ORDERS_TABLE), Alias::new(column)));
    }
}

fn add_sorts(query: &mut SelectStatement, sorts: &[SortKey]) {
    for sort in sorts {
        let order = match sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        let (table, column) = sort.field.column();
        query.order_by((Alias::new(table), Alias::new(column)), order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::compose;
    use crate::query::types::{SearchCondition, SortField};

    #[test]
    fn page_query_build() {
        let predicate = compose(&SearchCondition::default().with_age_goe(20));
        let sorts = [
            SortKey::desc(SortField::Username),
            SortKey::asc(SortField::MemberId),
        ];
        let sql = MemberQueryBuilder::new(&predicate).build_page(&sorts, 20, 10);

        assert!(sql.contains("FROM \"member\""));
        assert!(sql.contains("LEFT JOIN \"team\""));
        assert!(sql.contains("\"team\".\"name\" AS \"team_name\""));
        assert!(sql.contains("\"member\".\"age\" >= 20"));
        assert!(sql.contains("ORDER BY \"member\".\"username\" DESC, \"member\".\"member_id\" ASC"));
        assert!(sql.contains("LIMIT 10"));
        assert!(sql.contains("OFFSET 20"));
    }

    #[test]
    fn match_all_page_has_no_where() {
        let sql = MemberQueryBuilder::new(&Predicate::MatchAll).build_page(&[], 0, 5);
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn count_query_drops_unneeded_team_join() {
        let predicate = compose(&SearchCondition::default().with_username("member1"));
        let sql = MemberQueryBuilder::new(&predicate).build_count();

        assert!(sql.contains("COUNT(*)"));
        assert!(!sql.contains("JOIN"));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn count_query_keeps_team_join_for_team_filter() {
        let predicate = compose(&SearchCondition::default().with_team_name("teamA"));
        let sql = MemberQueryBuilder::new(&predicate).build_count();

        assert!(sql.contains("LEFT JOIN \"team\""));
        assert!(sql.contains("\"team\".\"name\" = 'teamA'"));
    }

    #[test]
    fn orders_batch_uses_in_list() {
        let sql = build_orders_batch(&[3, 1, 2]);

        assert!(sql.contains("FROM \"orders\""));
        assert!(sql.contains("\"orders\".\"member_id\" IN (3, 1, 2)"));
        assert!(sql.contains("LEFT JOIN \"item\""));
        assert!(sql.contains("ORDER BY \"orders\".\"order_id\" ASC"));
    }

    #[test]
    fn flat_join_is_outer_and_unpaged() {
        let predicate = compose(&SearchCondition::default().with_team_name("teamA"));
        let sql = MemberQueryBuilder::new(&predicate).build_flat(&[SortKey::asc(SortField::MemberId)]);

        assert!(sql.contains("LEFT JOIN \"team\""));
        assert!(sql.contains("LEFT JOIN \"orders\""));
        assert!(sql.contains("LEFT JOIN \"item\""));
        assert!(!sql.contains("INNER JOIN"));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("OFFSET"));
        assert!(sql.contains("\"item\".\"name\" AS \"item_name\""));
    }
}
