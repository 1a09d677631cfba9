//! Order models: the one-to-many child of a member.
//!
//! Tables:
//! - `orders(order_id, member_id, item_id, order_price, count, ordered_at)`
//! - `item(item_id, name)`

use serde::{Deserialize, Serialize};

use super::member::MemberTeamRow;
use crate::query::flat_join::FlatRow;
use crate::query::types::Nested;

/// An order with its item name, as returned by the batch lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderRow {
    /// Order primary key.
    pub order_id: i64,

    /// Owning member.
    pub member_id: i64,

    /// Name of the ordered item (NULL if the item row is gone).
    pub item_name: Option<String>,

    /// Unit price at the time of ordering.
    pub order_price: i64,

    /// Quantity.
    pub count: i32,

    /// Unix timestamp when the order was placed.
    pub ordered_at: i64,
}

impl OrderRow {
    /// Price times quantity.
    pub fn total_price(&self) -> i64 {
        self.order_price * i64::from(self.count)
    }
}

/// One row of `member LEFT JOIN team LEFT JOIN orders LEFT JOIN item`.
///
/// Member and team columns repeat for every order of the member. Order columns
/// are all NULL for members without orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberOrderFlatRow {
    pub member_id: i64,
    pub username: String,
    pub age: i32,
    pub team_id: Option<i64>,
    pub team_name: Option<String>,
    pub order_id: Option<i64>,
    pub item_name: Option<String>,
    pub order_price: Option<i64>,
    pub count: Option<i32>,
    pub ordered_at: Option<i64>,
}

impl FlatRow for MemberOrderFlatRow {
    type Key = i64;
    type Parent = MemberTeamRow;
    type Child = OrderRow;

    fn parent_key(&self) -> i64 {
        self.member_id
    }

    fn parent(&self) -> MemberTeamRow {
        MemberTeamRow {
            member_id: self.member_id,
            username: self.username.clone(),
            age: self.age,
            team_id: self.team_id,
            team_name: self.team_name.clone(),
        }
    }

    fn into_child(self) -> Option<OrderRow> {
        let order_id = self.order_id?;
        Some(OrderRow {
            order_id,
            member_id: self.member_id,
            item_name: self.item_name,
            order_price: self.order_price.unwrap_or_default(),
            count: self.count.unwrap_or_default(),
            ordered_at: self.ordered_at.unwrap_or_default(),
        })
    }
}

/// Member with its orders attached: the result of `search` and `search_page`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberOrders {
    #[serde(flatten)]
    pub member: MemberTeamRow,

    pub orders: Vec<OrderRow>,
}

impl MemberOrders {
    /// Sum of all order totals.
    pub fn total_spent(&self) -> i64 {
        self.orders.iter().map(OrderRow::total_price).sum()
    }
}

impl From<Nested<MemberTeamRow, OrderRow>> for MemberOrders {
    fn from(nested: Nested<MemberTeamRow, OrderRow>) -> Self {
        Self {
            member: nested.parent,
            orders: nested.children,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn flat(member_id: i64, order_id: Option<i64>) -> MemberOrderFlatRow {
        MemberOrderFlatRow {
            member_id,
            username: format!("member{member_id}"),
            age: 20,
            team_id: Some(1),
            team_name: Some("teamA".to_string()),
            order_id,
            item_name: order_id.map(|_| "book".to_string()),
            order_price: order_id.map(|_| 1000),
            count: order_id.map(|_| 2),
            ordered_at: order_id.map(|_| 1_700_000_000),
        }
    }

    #[test]
    fn flat_row_without_order_has_no_child() {
        assert!(flat(1, None).into_child().is_none());
    }

    #[test]
    fn flat_row_splits_into_parent_and_child() {
        let row = flat(7, Some(70));
        let parent = row.parent();
        assert_eq!(parent.member_id, 7);
        assert_eq!(parent.team_name.as_deref(), Some("teamA"));

        let child = row.into_child().unwrap();
        assert_eq!(child.order_id, 70);
        assert_eq!(child.member_id, 7);
        assert_eq!(child.total_price(), 2000);
    }

    #[test]
    fn member_orders_serializes_flattened() {
        let dto = MemberOrders {
            member: flat(3, None).parent(),
            orders: vec![],
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["member_id"], 3);
        assert_eq!(json["orders"], serde_json::json!([]));
        assert_eq!(dto.total_spent(), 0);
    }
}
