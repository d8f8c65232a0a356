use async_trait::async_trait;
use common::AmountOverflow;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Money, NewProduct, Order, OrderId, OrderItem, OrderItemId, OrderStatus, Product, ProductId,
    Result, StoreError, store::Store,
};

/// SQLSTATE raised when `SUM(...)::BIGINT` leaves the bigint range.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::CorruptRow {
                table: "orders",
                reason: e.to_string(),
            })?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            status,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::CorruptRow {
            table: "order_items",
            reason: format!("quantity {quantity} out of range"),
        })?;

        Ok(OrderItem {
            id: OrderItemId::new(row.try_get("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity,
        })
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, price_cents
            FROM products
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price_cents
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, description, price_cents)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, price_cents
            "#,
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(row)
    }

    async fn create_order(&self) -> Result<Order> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (status)
            VALUES ($1)
            RETURNING id, status, created_at
            "#,
        )
        .bind(OrderStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_order(row)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT id, status, created_at FROM orders WHERE id = $1")
            .bind(order_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn set_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order_id.as_i64())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        // order_items rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn find_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
    ) -> Result<Option<OrderItem>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity
            FROM order_items
            WHERE order_id = $1 AND product_id = $2
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(order_id.as_i64())
        .bind(product_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn create_order_item(
        &self,
        order_id: OrderId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<OrderItem> {
        let row = sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, order_id, product_id, quantity
            "#,
        )
        .bind(order_id.as_i64())
        .bind(product_id.as_i64())
        .bind(i64::from(quantity))
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_item(row)
    }

    async fn update_order_item_quantity(
        &self,
        item_id: OrderItemId,
        quantity: u32,
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE order_items SET quantity = $2 WHERE id = $1")
            .bind(item_id.as_i64())
            .bind(i64::from(quantity))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_order_item(&self, item_id: OrderItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM order_items WHERE id = $1")
            .bind(item_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_order_items(&self, order_id: OrderId) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
            .bind(order_id.as_i64())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }

    async fn order_total(&self, order_id: OrderId) -> Result<Money> {
        let cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(oi.quantity * p.price_cents), 0)::BIGINT
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e
                && db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE)
            {
                return StoreError::AmountOverflow(AmountOverflow);
            }
            StoreError::Database(e)
        })?;

        Ok(Money::from_cents(cents))
    }
}
