//! Catalog pages, orders, addresses and payments.
//!
//! Orders are created from the server-side cart of a [`CartOwner`]; the
//! client never sends line items itself.
//!
//! [`CartOwner`]: super::CartOwner

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopper_core::{AddressId, OrderId, ProductId};

use super::Product;

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    /// Products on this page.
    pub products: Vec<Product>,
    /// 1-based page number that was requested.
    pub page: u32,
    /// Total number of pages reported by the backend.
    pub total_pages: u32,
}

impl ProductPage {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

/// An order created from a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Sum of the line totals at checkout.
    pub total_price: Decimal,
    /// Backend status, e.g. `pending` or `paid`.
    pub status: String,
    #[serde(rename = "Order_items", default)]
    pub items: Vec<OrderItem>,
}

/// A line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Only present in the order history.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price when the order was placed.
    pub price: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A paid order as listed in the order history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub status: String,
    /// Amount charged, delivery included.
    pub total_amount_paid: Decimal,
    pub date: DateTime<Utc>,
    /// Reference of the payment transaction.
    pub transaction_ref: String,
    #[serde(rename = "Order_items", default)]
    pub items: Vec<OrderItem>,
}

/// A delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Set once the backend has stored the address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    /// Recipient name.
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Street address as one line.
    pub address: String,
}

impl Address {
    /// Names of the fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

/// A started payment; the shopper completes it at `redirect_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    /// Payment record ID.
    pub id: i64,
    /// Order amount.
    pub amount: Decimal,
    #[serde(rename = "deliveryamount", default)]
    pub delivery_amount: Decimal,
    /// Hosted checkout page of the payment processor.
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
}

impl PaymentInitiation {
    /// Amount the shopper will be charged.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.amount + self.delivery_amount
    }
}

/// Receipt for a confirmed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub id: i64,
    pub amount: Decimal,
    pub status: String,
    pub order_id: OrderId,
    pub user_email: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub processor_reference: Option<String>,
    pub transaction_reference: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(rename = "deliveryamount", default)]
    pub delivery_amount: Decimal,
}
