//! Row models for the member/team/order graph.

pub mod member;
pub mod order;

pub use member::MemberTeamRow;
pub use order::{MemberOrderFlatRow, MemberOrders, OrderRow};
