//! pagewise test utilities.
//!
//! Fixture builders for members, teams and orders, and a `Dataset` that turns
//! them into a call-recording `MemoryStore` or a ready `MemberSearchService`.

use std::sync::Arc;

use pagewise_kernel::models::{MemberTeamRow, OrderRow};
use pagewise_kernel::query::{MemberSearchService, SearchOptions};
use pagewise_kernel::store::MemoryStore;

/// Create a test member with default values.
pub fn test_member(member_id: i64, username: &str) -> TestMember {
    TestMember {
        member_id,
        username: username.to_string(),
        age: 20,
        team: None,
    }
}

/// A test member builder.
#[derive(Debug, Clone)]
pub struct TestMember {
    pub member_id: i64,
    pub username: String,
    pub age: i32,
    pub team: Option<(i64, String)>,
}

impl TestMember {
    /// Set the age.
    pub fn with_age(mut self, age: i32) -> Self {
        self.age = age;
        self
    }

    /// Put the member in a team.
    pub fn in_team(mut self, team_id: i64, name: &str) -> Self {
        self.team = Some((team_id, name.to_string()));
        self
    }

    /// Row as returned by the member/team join.
    pub fn row(&self) -> MemberTeamRow {
        MemberTeamRow {
            member_id: self.member_id,
            username: self.username.clone(),
            age: self.age,
            team_id: self.team.as_ref().map(|(id, _)| *id),
            team_name: self.team.as_ref().map(|(_, name)| name.clone()),
        }
    }
}

/// Create a test order with default values.
pub fn test_order(order_id: i64, member_id: i64) -> TestOrder {
    TestOrder {
        order_id,
        member_id,
        item_name: Some(format!("item{order_id}")),
        order_price: 1000,
        count: 1,
        ordered_at: 1_700_000_000 + order_id,
    }
}

/// A test order builder.
#[derive(Debug, Clone)]
pub struct TestOrder {
    pub order_id: i64,
    pub member_id: i64,
    pub item_name: Option<String>,
    pub order_price: i64,
    pub count: i32,
    pub ordered_at: i64,
}

impl TestOrder {
    /// Set the item name.
    pub fn with_item(mut self, name: &str) -> Self {
        self.item_name = Some(name.to_string());
        self
    }

    /// Set price and quantity.
    pub fn priced(mut self, order_price: i64, count: i32) -> Self {
        self.order_price = order_price;
        self.count = count;
        self
    }

    pub fn row(&self) -> OrderRow {
        OrderRow {
            order_id: self.order_id,
            member_id: self.member_id,
            item_name: self.item_name.clone(),
            order_price: self.order_price,
            count: self.count,
            ordered_at: self.ordered_at,
        }
    }
}

/// A set of members and orders.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub members: Vec<TestMember>,
    pub orders: Vec<TestOrder>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member.
    pub fn member(mut self, member: TestMember) -> Self {
        self.members.push(member);
        self
    }

    /// Add an order.
    pub fn order(mut self, order: TestOrder) -> Self {
        self.orders.push(order);
        self
    }

    /// Add `count` orders for `member_id`, numbered from `first_order_id`.
    pub fn orders_for(mut self, member_id: i64, first_order_id: i64, count: usize) -> Self {
        for order_id in (first_order_id..).take(count) {
            self.orders.push(test_order(order_id, member_id));
        }
        self
    }

    /// Member rows in insertion order.
    pub fn member_rows(&self) -> Vec<MemberTeamRow> {
        self.members.iter().map(TestMember::row).collect()
    }

    /// Order rows belonging to `member_id`, by order id.
    pub fn orders_of(&self, member_id: i64) -> Vec<OrderRow> {
        let mut orders: Vec<OrderRow> = self
            .orders
            .iter()
            .filter(|o| o.member_id == member_id)
            .map(TestOrder::row)
            .collect();
        orders.sort_by_key(|o| o.order_id);
        orders
    }

    /// A call-recording in-memory store holding this dataset.
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::new(self.memory_store())
    }

    /// The in-memory store by value, for further configuration.
    pub fn memory_store(&self) -> MemoryStore {
        MemoryStore::new(
            self.member_rows(),
            self.orders.iter().map(TestOrder::row).collect(),
        )
    }

    /// A service over `store` with the given options.
    pub fn service(store: &Arc<MemoryStore>, options: SearchOptions) -> MemberSearchService {
        MemberSearchService::new(store.clone(), options)
    }
}

/// Members A, B, C, D (ids 1-4) with two orders each.
///
/// Ages are 10, 20, 30, 40; A and B are in teamA, C and D in teamB.
pub fn four_members_two_orders_each() -> Dataset {
    Dataset::new()
        .member(test_member(1, "A").with_age(10).in_team(1, "teamA"))
        .member(test_member(2, "B").with_age(20).in_team(1, "teamA"))
        .member(test_member(3, "C").with_age(30).in_team(2, "teamB"))
        .member(test_member(4, "D").with_age(40).in_team(2, "teamB"))
        .orders_for(1, 11, 2)
        .orders_for(2, 21, 2)
        .orders_for(3, 31, 2)
        .orders_for(4, 41, 2)
}

/// `count` members `member1..memberN` with ages `1..=count`, alternating
/// between teamA and teamB, every third member without a team, and member
/// `i` owning `i % 4` orders.
pub fn mixed_members(count: i64) -> Dataset {
    let mut dataset = Dataset::new();
    let mut next_order = 1000;
    for i in 1..=count {
        let mut member = test_member(i, &format!("member{i}")).with_age(i as i32);
        if i % 3 != 0 {
            member = if i % 2 == 0 {
                member.in_team(1, "teamA")
            } else {
                member.in_team(2, "teamB")
            };
        }
        let orders = (i % 4) as usize;
        dataset = dataset.member(member).orders_for(i, next_order, orders);
        next_order += 10;
    }
    dataset
}
