use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Transitions are caller-directed; the store performs no legality check
/// beyond "the order must exist to be updated".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Returns the status as its stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Parses a stored string form back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "cancelled" => Some(OrderStatus::Cancelled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipping address attached to an order. All fields are required.
///
/// Persisted as a JSONB blob on the order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: String,
}

/// A persisted order line item.
///
/// Owned exclusively by its order; it has no identity outside one.
/// The unit price is resolved at validation time, never caller-supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Row identifier assigned by the store.
    pub id: i64,
    /// The owning order.
    pub order_id: OrderId,
    /// The product ordered.
    pub product_id: ProductId,
    /// Units ordered. Always positive.
    pub quantity: u32,
    /// Price per unit at the moment of validation.
    pub unit_price: Money,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Identifier assigned by the store at commit.
    pub id: OrderId,
    /// The user who placed the order.
    pub user_id: UserId,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Sum of unit price times quantity over all items.
    pub total_price: Money,
    /// Where the order ships to.
    pub shipping_address: Address,
    /// The order's line items. Empty on list reads; populated on point reads.
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item awaiting persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// An order awaiting persistence. Carries no ids; the store assigns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub shipping_address: Address,
    pub items: Vec<DraftItem>,
}

impl OrderDraft {
    /// Creates a pending draft, the shape handed over by the orchestrator.
    pub fn pending(
        user_id: UserId,
        total_price: Money,
        shipping_address: Address,
        items: Vec<DraftItem>,
    ) -> Self {
        Self {
            user_id,
            status: OrderStatus::Pending,
            total_price,
            shipping_address,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            country: "US".to_string(),
            postal_code: "62701".to_string(),
        }
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("bogus"), None);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn draft_pending_sets_status() {
        let draft = OrderDraft::pending(UserId::new(), Money::from_cents(1000), address(), vec![]);
        assert_eq!(draft.status, OrderStatus::Pending);
    }

    #[test]
    fn address_serialization_roundtrip() {
        let addr = address();
        let json = serde_json::to_value(&addr).unwrap();
        let back: Address = serde_json::from_value(json).unwrap();
        assert_eq!(addr, back);
    }
}
