//! Catalog listing, orders, addresses and payments.
//!
//! None of these calls touch the local cart. An order is built server-side
//! from the owner's remote cart, so callers should let pending cart
//! mutations settle before [`ShopperClient::create_order`].

use reqwest::Method;
use tracing::{debug, info, instrument};

use shopper_core::{Email, OrderId, UserId};

use crate::models::{
    Address, CartOwner, Order, OrderSummary, PaymentInitiation, PaymentReceipt, ProductPage,
};

use super::ApiError;
use super::cache::{CacheKey, CacheValue};
use super::client::ShopperClient;
use super::conversions::convert_listed_product;
use super::types::{AddressBody, ConfirmPaymentResponse, PaymentBody, ProductListing};

impl ShopperClient {
    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get one page of the product listing (`GET /product/paginate`).
    ///
    /// `page` is 1-based; page 0 is treated as page 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, page: u32, limit: u32) -> Result<ProductPage, ApiError> {
        let page = page.max(1);
        let cache_key = CacheKey::Page { page, limit };

        if let Some(CacheValue::Page(listing)) = self.cache().get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(listing);
        }

        let mut url = self.endpoint(&["product", "paginate"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());

        let listing: ProductListing = self.send_json(self.request(Method::GET, url)).await?;
        let listing = ProductPage {
            products: listing
                .products
                .into_iter()
                .map(convert_listed_product)
                .collect(),
            page,
            total_pages: listing.total_pages,
        };

        self.cache()
            .insert(cache_key, CacheValue::Page(listing.clone()))
            .await;

        Ok(listing)
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Turn the owner's server cart into an order.
    ///
    /// Users go through `POST /order/:userId`, guests through
    /// `POST /order?guestId=`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty, the backend rejects the order
    /// or the request fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn create_order(&self, owner: &CartOwner) -> Result<Order, ApiError> {
        let url = match owner {
            CartOwner::User(user_id) => self.endpoint(&["order", user_id.as_str()])?,
            CartOwner::Guest(guest_id) => {
                let mut url = self.endpoint(&["order"])?;
                url.query_pairs_mut().append_pair("guestId", guest_id.as_str());
                url
            }
        };

        let order: Order = self.send_json(self.request(Method::POST, url)).await?;
        info!(order_id = %order.id, total = %order.total_price, "order created");
        Ok(order)
    }

    /// Paid orders of a user (`GET /order/history/:userId`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn order_history(&self, user_id: &UserId) -> Result<Vec<OrderSummary>, ApiError> {
        let url = self.endpoint(&["order", "history", user_id.as_str()])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    // =========================================================================
    // Address Methods
    // =========================================================================

    /// The saved delivery address of a user, if any (`GET /address`).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_address(&self, user_id: &UserId) -> Result<Option<Address>, ApiError> {
        let mut url = self.endpoint(&["address"])?;
        url.query_pairs_mut().append_pair("userId", user_id.as_str());

        match self.send_json(self.request(Method::GET, url)).await {
            Ok(address) => Ok(address),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store a delivery address for the owner (`POST /address`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the address or the request
    /// fails.
    #[instrument(skip(self, address), fields(owner = %owner))]
    pub async fn save_address(
        &self,
        owner: &CartOwner,
        address: &Address,
    ) -> Result<Address, ApiError> {
        let url = self.endpoint(&["address"])?;
        let (user_id, guest_id) = match owner {
            CartOwner::User(user_id) => (Some(user_id), None),
            CartOwner::Guest(guest_id) => (None, Some(guest_id)),
        };
        let body = AddressBody {
            name: &address.name,
            email: &address.email,
            phone: &address.phone,
            address: &address.address,
            user_id,
            guest_id,
        };

        self.send_json(self.request(Method::POST, url).json(&body)).await
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Start paying for an order (`POST /order/pay/:id/payment`).
    ///
    /// The returned redirect URL is the processor's hosted checkout page.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the request fails.
    #[instrument(skip(self), fields(order_id = %order_id, email = %email))]
    pub async fn initiate_payment(
        &self,
        order_id: OrderId,
        email: &Email,
    ) -> Result<PaymentInitiation, ApiError> {
        let url = self.endpoint(&["order", "pay", &order_id.to_string(), "payment"])?;
        let body = PaymentBody {
            email: email.as_str(),
        };

        self.send_json(self.request(Method::POST, url).json(&body)).await
    }

    /// Confirm a payment by the processor's transaction reference
    /// (`GET /order/confirmpayment`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::PaymentRejected`] when the backend reports the
    /// transaction as failed, or another error if the request fails.
    #[instrument(skip(self))]
    pub async fn confirm_payment(&self, tx_ref: &str) -> Result<PaymentReceipt, ApiError> {
        let mut url = self.endpoint(&["order", "confirmpayment"])?;
        url.query_pairs_mut().append_pair("tx_ref", tx_ref);

        match self.send_json(self.request(Method::GET, url)).await? {
            ConfirmPaymentResponse::Confirmed(receipt) => {
                info!(order_id = %receipt.order_id, "payment confirmed");
                Ok(*receipt)
            }
            ConfirmPaymentResponse::Rejected { error } => Err(ApiError::PaymentRejected(error)),
        }
    }
}
