//! Wire types for the storefront HTTP API.
//!
//! Field names follow the backend's JSON exactly; the backend mixes
//! `snake_case` (cart) and `camelCase` (guest bodies, catalog flags).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};

use shopper_core::{GuestId, ProductId, UserId};

use crate::models::{AuthenticatedUser, PaymentReceipt};

/// `GET /cart/getcart` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteCart {
    /// Cart lines; absent or null means empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cart_items: Vec<RemoteCartItem>,
}

/// A line in the server cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteCartItem {
    /// Referenced product.
    pub product_id: ProductId,
    /// Units on the line.
    pub quantity: i64,
    /// Joined product row; `None` when the product no longer exists.
    #[serde(default)]
    pub product: Option<RemoteProduct>,
}

/// Product columns joined onto a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteProduct {
    /// Display name.
    pub name: String,
    /// Unit price (number or decimal string).
    pub price: Decimal,
    /// Primary image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Stock row.
    #[serde(default)]
    pub inventory: Option<RemoteInventory>,
}

/// Stock row joined onto a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteInventory {
    /// Units available for sale.
    #[serde(default)]
    pub quantity_available: i64,
}

/// `POST /cart/addItem` body.
#[derive(Debug, Serialize)]
pub(crate) struct AddItemBody<'a> {
    #[serde(serialize_with = "user_id_as_issued")]
    pub user_id: Option<&'a UserId>,
    pub guest_id: Option<&'a GuestId>,
    pub product_id: ProductId,
    pub quantity: u32,
}

/// `PATCH` body for a line quantity.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateItemBody<'a> {
    pub quantity: u32,
    #[serde(rename = "guestId", skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<&'a GuestId>,
}

/// Body carrying only the guest token (guest delete, merge).
#[derive(Debug, Serialize)]
pub(crate) struct GuestBody<'a> {
    #[serde(rename = "guestId", skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<&'a GuestId>,
}

/// `POST /user/signin` body.
#[derive(Serialize)]
pub(crate) struct SignInBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /user/` body.
#[derive(Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// `{ user }` envelope returned by sign-in and registration.
#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: AuthenticatedUser,
}

/// `{ message }` or `{ error }` error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}

/// `GET /product/:id` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub data: CatalogProduct,
}

/// Catalog product payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "image_url")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub out_of_stock: bool,
    #[serde(default)]
    pub inventory: Option<RemoteInventory>,
}

/// `POST /product/search` body.
#[derive(Serialize)]
pub(crate) struct SearchBody<'a> {
    #[serde(rename = "productName")]
    pub product_name: &'a str,
}

/// Search hit payload.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchHit {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `GET /product/paginate` response.
#[derive(Debug, Deserialize)]
pub(crate) struct ProductListing {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub products: Vec<ListedProduct>,
    #[serde(rename = "totalPages", default)]
    pub total_pages: u32,
}

/// Product row of a listing page.
#[derive(Debug, Deserialize)]
pub(crate) struct ListedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(rename = "maxQuantity", default)]
    pub max_quantity: i64,
}

/// `POST /address` body.
#[derive(Debug, Serialize)]
pub(crate) struct AddressBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
    #[serde(serialize_with = "user_id_as_issued")]
    pub user_id: Option<&'a UserId>,
    pub guest_id: Option<&'a GuestId>,
}

/// `POST /order/pay/:id/payment` body.
#[derive(Debug, Serialize)]
pub(crate) struct PaymentBody<'a> {
    pub email: &'a str,
}

/// `GET /order/confirmpayment` response; a rejected payment comes back as
/// `{ error }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ConfirmPaymentResponse {
    Rejected { error: String },
    Confirmed(Box<PaymentReceipt>),
}

/// Serialize a user id as a JSON number when its text is a canonical integer.
#[allow(clippy::ref_option)]
fn user_id_as_issued<S>(user_id: &Option<&UserId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let Some(user_id) = user_id else {
        return serializer.serialize_none();
    };
    match user_id.as_str().parse::<i64>() {
        Ok(number) if number.to_string() == user_id.as_str() => serializer.serialize_i64(number),
        _ => serializer.serialize_str(user_id.as_str()),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
