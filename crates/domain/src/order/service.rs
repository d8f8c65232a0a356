//! Order lifecycle service.

use std::collections::HashMap;

use common::{Money, OrderId, OrderStatus, ProductId};
use payment::{CheckoutRequest, PaymentGateway};
use store::{Order, Store};

use super::{
    CartSession, Catalog, CatalogEntry, OrderDetails, OrderLine, OrderSummary, PaymentRedirect,
};
use crate::error::DomainError;

/// What `upsert_item` did to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    /// A new item was added (creating and binding an order if needed).
    Created { order_id: OrderId },
    /// An existing item got a new quantity.
    Updated { order_id: OrderId },
    /// An item was removed; `order_deleted` is set when it was the last one.
    Removed {
        order_id: OrderId,
        order_deleted: bool,
    },
    /// Quantity 0 for a product that is not in the cart.
    Unchanged,
}

/// Service driving the cart and checkout lifecycle.
///
/// Session state is never held here: every operation that needs the
/// caller's current order receives the caller's `CartSession`.
pub struct OrderingService<S: Store, G: PaymentGateway> {
    store: S,
    gateway: G,
    base_url: String,
}

impl<S: Store, G: PaymentGateway> OrderingService<S, G> {
    /// Creates a service. `base_url` is the public address the gateway
    /// redirects customers back to.
    pub fn new(store: S, gateway: G, base_url: impl Into<String>) -> Self {
        Self {
            store,
            gateway,
            base_url: base_url.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Loads the order the session points at.
    ///
    /// A binding to an order that no longer exists is treated as no binding.
    async fn bound_order(&self, session: &CartSession) -> Result<Option<Order>, DomainError> {
        match session.order_id() {
            Some(order_id) => Ok(self.store.get_order(order_id).await?),
            None => Ok(None),
        }
    }

    /// Lists every product, annotated with quantities from the bound order.
    #[tracing::instrument(skip(self))]
    pub async fn list_catalog(&self, session: &CartSession) -> Result<Catalog, DomainError> {
        let products = self.store.list_products().await?;

        let (summary, quantities) = match self.bound_order(session).await? {
            Some(order) => {
                let items = self.store.list_order_items(order.id).await?;
                let total = self.store.order_total(order.id).await?;
                let quantities: HashMap<ProductId, u32> = items
                    .iter()
                    .map(|item| (item.product_id, item.quantity))
                    .collect();
                let summary = OrderSummary {
                    order,
                    item_count: items.len(),
                    total,
                };
                (Some(summary), quantities)
            }
            None => (None, HashMap::new()),
        };

        let products = products
            .into_iter()
            .map(|product| CatalogEntry {
                quantity: quantities.get(&product.id).copied(),
                product,
            })
            .collect();

        Ok(Catalog {
            products,
            order: summary,
        })
    }

    /// Adds, updates or removes the cart line for `product_id`.
    ///
    /// Creates and binds an order on the first positive add, and deletes
    /// the order (clearing the binding) when its last item is removed.
    #[tracing::instrument(skip(self))]
    pub async fn upsert_item(
        &self,
        session: &mut CartSession,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<ItemChange, DomainError> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound(product_id))?;

        let order = self.bound_order(session).await?;
        if order.is_none() && session.is_bound() {
            tracing::warn!(order_id = ?session.order_id(), "session bound to a missing order, dropping binding");
            session.clear();
        }

        let existing = match &order {
            Some(order) => self.store.find_order_item(order.id, product.id).await?,
            None => None,
        };

        // the new total has to stay representable before anything is written
        if quantity > 0 {
            let line = product.price.checked_multiply(quantity)?;
            if let Some(order) = &order {
                let replaced = match &existing {
                    Some(item) => product.price.checked_multiply(item.quantity)?,
                    None => Money::zero(),
                };
                let others = self.store.order_total(order.id).await?.cents() - replaced.cents();
                Money::from_cents(others).checked_add(line)?;
            }
        }

        let change = match (order, existing) {
            (Some(order), Some(item)) if quantity > 0 => {
                self.store
                    .update_order_item_quantity(item.id, quantity)
                    .await?;
                ItemChange::Updated { order_id: order.id }
            }
            (Some(order), Some(item)) => {
                self.store.delete_order_item(item.id).await?;
                let order_deleted = self.store.count_order_items(order.id).await? == 0;
                if order_deleted {
                    self.store.delete_order(order.id).await?;
                    session.clear();
                    metrics::counter!("orders_deleted_total").increment(1);
                    tracing::info!(order_id = %order.id, "last item removed, order deleted");
                }
                ItemChange::Removed {
                    order_id: order.id,
                    order_deleted,
                }
            }
            (_, None) if quantity == 0 => ItemChange::Unchanged,
            (order, _) => {
                let order = match order {
                    Some(order) => order,
                    None => {
                        let order = self.store.create_order().await?;
                        session.bind(order.id);
                        metrics::counter!("orders_created_total").increment(1);
                        tracing::info!(order_id = %order.id, "order created");
                        order
                    }
                };
                self.store
                    .create_order_item(order.id, product.id, quantity)
                    .await?;
                ItemChange::Created { order_id: order.id }
            }
        };

        if change != ItemChange::Unchanged {
            metrics::counter!("order_items_upserted_total").increment(1);
        }
        Ok(change)
    }

    /// Loads an order with its items and total.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<OrderDetails, DomainError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;

        let items = self.store.list_order_items(order_id).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .store
                .get_product(item.product_id)
                .await?
                .ok_or(DomainError::ProductNotFound(item.product_id))?;
            lines.push(OrderLine {
                line_total: product.price.checked_multiply(item.quantity)?,
                item,
                product,
            });
        }
        let total = self.store.order_total(order_id).await?;

        Ok(OrderDetails {
            order,
            lines,
            total,
        })
    }

    /// Marks the bound order active and opens a hosted checkout for its total.
    ///
    /// Without gateway credentials the order is left untouched and the
    /// caller is sent to the order details instead.
    #[tracing::instrument(skip(self))]
    pub async fn initiate_payment(
        &self,
        session: &CartSession,
    ) -> Result<PaymentRedirect, DomainError> {
        let order_id = session.order_id().ok_or(DomainError::NoActiveOrder)?;

        if !self.gateway.is_configured() {
            tracing::warn!(%order_id, "payment gateway not configured, showing order details");
            return Ok(PaymentRedirect::OrderDetails(order_id));
        }

        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(DomainError::OrderNotFound(order_id))?;
        if !order.status.can_transition_to(OrderStatus::Active) {
            tracing::warn!(%order_id, from = %order.status, "re-entering payment");
        }
        self.store
            .set_order_status(order_id, OrderStatus::Active)
            .await?;

        let total = self.store.order_total(order_id).await?;
        let request = CheckoutRequest::for_order(order_id, total, &self.base_url);
        let checkout = self.gateway.create_checkout_session(request).await?;

        metrics::counter!("payments_initiated_total").increment(1);
        tracing::info!(%order_id, %total, checkout_id = %checkout.id, "payment initiated");
        Ok(PaymentRedirect::Gateway(checkout.url))
    }

    /// Marks the bound order completed and clears the binding.
    ///
    /// Returns the order id that was bound, if any.
    #[tracing::instrument(skip(self))]
    pub async fn complete_payment(
        &self,
        session: &mut CartSession,
    ) -> Result<Option<OrderId>, DomainError> {
        let order_id = session.take();

        if let Some(order_id) = order_id
            && let Some(order) = self.store.get_order(order_id).await?
        {
            if !order.status.can_transition_to(OrderStatus::Completed) {
                tracing::warn!(%order_id, from = %order.status, "completing order outside checkout");
            }
            self.store
                .set_order_status(order_id, OrderStatus::Completed)
                .await?;
            metrics::counter!("payments_completed_total").increment(1);
            tracing::info!(%order_id, "payment completed");
        }

        Ok(order_id)
    }

    /// Clears the binding without touching the order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_payment(
        &self,
        session: &mut CartSession,
    ) -> Result<Option<OrderId>, DomainError> {
        let order_id = session.take();
        if let Some(order_id) = order_id {
            metrics::counter!("payments_cancelled_total").increment(1);
            tracing::info!(%order_id, "payment cancelled, binding cleared");
        }
        Ok(order_id)
    }
}
