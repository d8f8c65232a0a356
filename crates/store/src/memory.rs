use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Money, NewProduct, Order, OrderId, OrderItem, OrderItemId, OrderStatus, Product, ProductId,
    Result, store::Store,
};

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    items: BTreeMap<OrderItemId, OrderItem>,
    last_product_id: i64,
    last_order_id: i64,
    last_item_id: i64,
}

/// In-memory store implementation for tests and local runs.
///
/// Ids are handed out sequentially per table, starting at 1, the same
/// way the PostgreSQL implementation's `BIGSERIAL` columns do. Clones
/// share the same tables.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of order items stored across all orders.
    pub async fn order_item_count(&self) -> usize {
        self.tables.read().await.items.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        Ok(self.tables.read().await.products.values().cloned().collect())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&product_id).cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let mut tables = self.tables.write().await;
        tables.last_product_id += 1;
        let product = Product {
            id: ProductId::new(tables.last_product_id),
            name: product.name,
            description: product.description,
            price: product.price,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn create_order(&self) -> Result<Order> {
        let mut tables = self.tables.write().await;
        tables.last_order_id += 1;
        let order = Order {
            id: OrderId::new(tables.last_order_id),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        tables.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&order_id).cloned())
    }

    async fn set_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.orders.get_mut(&order_id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.orders.remove(&order_id).is_none() {
            return Ok(false);
        }
        tables.items.retain(|_, item| item.order_id != order_id);
        Ok(true)
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<Option<OrderItem>> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .find(|item| item.order_id == order_id && item.product_id == product_id)
            .cloned())
    }

    async fn create_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<OrderItem> {
        let mut tables = self.tables.write().await;
        tables.last_item_id += 1;
        let item = OrderItem {
            id: OrderItemId::new(tables.last_item_id),
            order_id,
            product_id,
            quantity,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_order_item_quantity(
        &self,
        item_id: OrderItemId,
        quantity: u32,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables.items.get_mut(&item_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_order_item(&self, item_id: OrderItemId) -> Result<bool> {
        Ok(self.tables.write().await.items.remove(&item_id).is_some())
    }

    async fn count_order_items(&self, order_id: OrderId) -> Result<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .items
            .values()
            .filter(|item| item.order_id == order_id)
            .count() as u64)
    }

    async fn order_total(&self, order_id: OrderId) -> Result<Money> {
        let tables = self.tables.read().await;
        let lines = tables
            .items
            .values()
            .filter(|item| item.order_id == order_id)
            .filter_map(|item| {
                tables
                    .products
                    .get(&item.product_id)
                    .map(|product| product.price.checked_multiply(item.quantity))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Money::checked_sum(lines)?)
    }
}
