//! Statement builders

pub mod common;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use common::{JoinType, Order, Ordering, QueryBuilder};
pub use delete::{Delete, DeleteInitial};
pub use insert::{Insert, InsertRow};
pub use select::{JoinOn, Select, SelectCore, SelectFrom, SelectInto};
pub use update::Update;
