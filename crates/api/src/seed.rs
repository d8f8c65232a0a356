//! Demo catalog used when running without a database.

use common::Money;
use store::{NewProduct, Store, StoreError};

/// Products inserted by `seed_demo_catalog`.
pub fn demo_products() -> Vec<NewProduct> {
    vec![
        NewProduct::new(
            "Espresso Cup",
            "Double-walled glass cup, 80 ml.",
            Money::from_cents(1200),
        ),
        NewProduct::new(
            "Pour-Over Kettle",
            "Gooseneck kettle with built-in thermometer.",
            Money::from_cents(4599),
        ),
        NewProduct::new(
            "Single-Origin Beans",
            "250 g of washed Ethiopian beans, light roast.",
            Money::from_cents(1650),
        ),
        NewProduct::new(
            "Paper Filters",
            "Pack of 100 unbleached cone filters.",
            Money::from_cents(599),
        ),
    ]
}

/// Inserts the demo products if the catalog is empty.
///
/// Returns the number of products inserted.
pub async fn seed_demo_catalog<S: Store>(store: &S) -> Result<usize, StoreError> {
    if !store.list_products().await?.is_empty() {
        return Ok(0);
    }

    let products = demo_products();
    let count = products.len();
    for product in products {
        store.create_product(product).await?;
    }
    tracing::info!(count, "seeded demo catalog");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use store::InMemoryStore;

    use super::*;

    #[tokio::test]
    async fn seeds_only_an_empty_catalog() {
        let store = InMemoryStore::new();

        let inserted = seed_demo_catalog(&store).await.unwrap();
        assert_eq!(inserted, demo_products().len());

        let again = seed_demo_catalog(&store).await.unwrap();
        assert_eq!(again, 0);
        assert_eq!(
            store.list_products().await.unwrap().len(),
            demo_products().len()
        );
    }
}
