use async_trait::async_trait;

use crate::{
    Money, NewProduct, Order, OrderId, OrderItem, OrderItemId, OrderStatus, Product, ProductId,
    Result,
};

/// Core trait for catalog and order persistence.
///
/// Lookups report a missing row as `Ok(None)` (or `Ok(false)` for
/// mutations); deciding whether that is an error belongs to the caller.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait Store: Send + Sync {
    /// Lists every product in the catalog, ordered by id.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Retrieves a single product.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Adds a product to the catalog.
    ///
    /// The ordering flow never calls this; it exists for seeding.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Creates an empty order in the `pending` status.
    async fn create_order(&self) -> Result<Order>;

    /// Retrieves an order header.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Overwrites the status of an order.
    ///
    /// Returns false if the order does not exist.
    async fn set_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool>;

    /// Deletes an order together with all of its items.
    ///
    /// Returns false if the order does not exist.
    async fn delete_order(&self, order_id: OrderId) -> Result<bool>;

    /// Lists the items of an order, ordered by id.
    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>>;

    /// Finds the item linking `order_id` to `product_id`, if any.
    async fn find_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<Option<OrderItem>>;

    /// Inserts a new item. No uniqueness check is performed.
    async fn create_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<OrderItem>;

    /// Sets the quantity of an existing item.
    ///
    /// Returns false if the item does not exist.
    async fn update_order_item_quantity(&self, item_id: OrderItemId, quantity: u32)
    -> Result<bool>;

    /// Deletes an item.
    ///
    /// Returns false if the item does not exist.
    async fn delete_order_item(&self, item_id: OrderItemId) -> Result<bool>;

    /// Counts the items of an order.
    async fn count_order_items(&self, order_id: OrderId) -> Result<u64>;

    /// Sums quantity × product price over the items of an order.
    ///
    /// Zero for an order without items or an unknown order.
    async fn order_total(&self, order_id: OrderId) -> Result<Money>;
}
