//! Per-item validation against the catalog and the stock check.

use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::ItemFailure;
use crate::services::{CatalogService, StockService};

/// A line item as supplied by the caller or sourced from the cart.
///
/// Deliberately carries no price: unit prices are resolved from the catalog
/// at validation time and cannot be influenced by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A line item whose price has been resolved and availability confirmed.
///
/// Lives only for the duration of one order-creation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Validates one line item.
///
/// The price lookup and the availability check run concurrently against the
/// same product. If either sub-operation fails, the item fails and the
/// partner's result is discarded; an explicit "not available" answer fails
/// the item too. There are no retries here — one failed attempt fails the
/// item, and the shared fan-out deadline is enforced by the caller.
pub async fn validate_item<C, S>(
    catalog: &C,
    stock: &S,
    item: &LineItem,
) -> Result<ValidatedItem, ItemFailure>
where
    C: CatalogService + ?Sized,
    S: StockService + ?Sized,
{
    if item.quantity == 0 {
        return Err(ItemFailure::InvalidQuantity(item.product_id));
    }

    let (product, availability) = tokio::join!(
        catalog.get_product(item.product_id),
        stock.check_availability(item.product_id, item.quantity),
    );

    let product =
        product.map_err(|e| ItemFailure::PriceLookup(item.product_id, e.to_string()))?;
    let available =
        availability.map_err(|e| ItemFailure::StockCheck(item.product_id, e.to_string()))?;

    if !available {
        return Err(ItemFailure::Unavailable(item.product_id));
    }

    Ok(ValidatedItem {
        product_id: product.id,
        quantity: item.quantity,
        unit_price: product.price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryCatalogService, InMemoryStockService};

    fn item(product_id: i64, quantity: u32) -> LineItem {
        LineItem {
            product_id: ProductId::new(product_id),
            quantity,
        }
    }

    #[tokio::test]
    async fn merges_price_and_availability() {
        let catalog = InMemoryCatalogService::new();
        let stock = InMemoryStockService::new();
        let product = ProductId::new(1);
        catalog.set_price(product, Money::from_cents(1000));
        stock.set_quantity(product, 10);

        let validated = validate_item(&catalog, &stock, &item(1, 2)).await.unwrap();
        assert_eq!(validated.product_id, product);
        assert_eq!(validated.quantity, 2);
        assert_eq!(validated.unit_price.cents(), 1000);
    }

    #[tokio::test]
    async fn unavailable_item_fails() {
        let catalog = InMemoryCatalogService::new();
        let stock = InMemoryStockService::new();
        let product = ProductId::new(1);
        catalog.set_price(product, Money::from_cents(1000));
        stock.set_quantity(product, 1);

        let result = validate_item(&catalog, &stock, &item(1, 2)).await;
        assert_eq!(result, Err(ItemFailure::Unavailable(product)));
    }

    #[tokio::test]
    async fn price_lookup_error_discards_availability() {
        let catalog = InMemoryCatalogService::new();
        let stock = InMemoryStockService::new();
        stock.set_quantity(ProductId::new(1), 10);

        // Stock says yes, but the catalog has no such product.
        let result = validate_item(&catalog, &stock, &item(1, 2)).await;
        assert!(matches!(result, Err(ItemFailure::PriceLookup(_, _))));
    }

    #[tokio::test]
    async fn stock_check_error_discards_price() {
        let catalog = InMemoryCatalogService::new();
        let stock = InMemoryStockService::new();
        let product = ProductId::new(1);
        catalog.set_price(product, Money::from_cents(1000));
        stock.set_fail_on_check(true);

        let result = validate_item(&catalog, &stock, &item(1, 2)).await;
        assert!(matches!(result, Err(ItemFailure::StockCheck(_, _))));
    }

    #[tokio::test]
    async fn zero_quantity_rejected_without_remote_calls() {
        let catalog = InMemoryCatalogService::new();
        let stock = InMemoryStockService::new();

        let result = validate_item(&catalog, &stock, &item(1, 0)).await;
        assert_eq!(result, Err(ItemFailure::InvalidQuantity(ProductId::new(1))));
    }
}
