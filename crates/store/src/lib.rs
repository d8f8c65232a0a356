pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{Money, OrderId, OrderItemId, OrderStatus, ProductId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{NewProduct, Order, OrderItem, Product};
pub use postgres::PostgresStore;
pub use store::Store;
