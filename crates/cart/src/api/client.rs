//! HTTP implementation of [`CartApi`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};
use url::Url;

use shopper_core::{Email, GuestId, ProductId};

use crate::config::ShopperConfig;
use crate::models::{AuthenticatedUser, CartOwner, Product, ProductSummary};

use super::cache::{CacheKey, CacheValue};
use super::conversions::{convert_product, convert_search_hit};
use super::types::{
    AddItemBody, ErrorBody, GuestBody, ProductEnvelope, RegisterBody, RemoteCart, SearchBody,
    SearchHit, SignInBody, UpdateItemBody, UserEnvelope,
};
use super::{ApiError, CartApi, Credentials};

/// Client for the storefront HTTP API.
///
/// Cart calls are never cached. Product lookups and searches are cached for
/// 5 minutes.
#[derive(Clone)]
pub struct ShopperClient {
    inner: Arc<ShopperClientInner>,
}

struct ShopperClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ShopperClient {
    /// Create a new client for the configured backend.
    ///
    /// The client keeps a cookie jar so the session cookie issued by sign-in
    /// is sent on later credentialed calls.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ShopperConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ShopperClientInner {
                client,
                base_url: config.backend_url.clone(),
                cache,
            }),
        })
    }

    /// Build an endpoint URL from path segments under the base URL.
    ///
    /// An empty final segment produces a trailing slash.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    pub(super) async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| body.chars().take(200).collect());

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound(message)),
            _ => {
                warn!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Storefront API returned non-success status"
                );
                Err(ApiError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Send a request and parse the JSON response body.
    pub(super) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e)
        })
    }

    pub(super) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }

    pub(super) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner.client.request(method, url)
    }

    /// Path of a single cart line for `owner`.
    pub(super) fn line_url(&self, owner: &CartOwner, product_id: ProductId) -> Result<Url, ApiError> {
        let product_id = product_id.to_string();
        match owner {
            CartOwner::User(user_id) => {
                self.endpoint(&["cart", user_id.as_str(), "items", &product_id])
            }
            CartOwner::Guest(_) => self.endpoint(&["cart", "guest", "item", &product_id]),
        }
    }

    // =========================================================================
    // Account Methods
    // =========================================================================

    /// Create an account (`POST /user/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration or the
    /// request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        username: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthenticatedUser, ApiError> {
        let url = self.endpoint(&["user", ""])?;
        let body = RegisterBody {
            username,
            email: email.as_str(),
            password: password.expose_secret(),
        };

        let envelope: UserEnvelope = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        Ok(envelope.user)
    }

    // =========================================================================
    // Catalog Methods
    // =========================================================================

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(product_id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["product", &product_id.to_string()])?;
        let envelope: ProductEnvelope = self.send_json(self.request(Method::GET, url)).await?;
        let product = convert_product(envelope.data);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Search products by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<ProductSummary>, ApiError> {
        let cache_key = CacheKey::search(query);

        if let Some(CacheValue::Search(hits)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product search");
            return Ok(hits);
        }

        let url = self.endpoint(&["product", "search"])?;
        let body = SearchBody {
            product_name: query.trim(),
        };
        let hits: Vec<SearchHit> = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        let hits: Vec<ProductSummary> = hits.into_iter().map(convert_search_hit).collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Search(hits.clone()))
            .await;

        Ok(hits)
    }
}

#[async_trait]
impl CartApi for ShopperClient {
    #[instrument(skip(self))]
    async fn resolve_identity(&self) -> Result<AuthenticatedUser, ApiError> {
        let url = self.endpoint(&["user", "decode"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthenticatedUser, ApiError> {
        let url = self.endpoint(&["user", "signin"])?;
        let body = SignInBody {
            email: credentials.email.as_str(),
            password: credentials.password.expose_secret(),
        };

        let envelope: UserEnvelope = self
            .send_json(self.request(Method::POST, url).json(&body))
            .await?;
        Ok(envelope.user)
    }

    #[instrument(skip(self), fields(owner = %owner))]
    async fn get_cart(&self, owner: &CartOwner) -> Result<RemoteCart, ApiError> {
        let mut url = self.endpoint(&["cart", "getcart"])?;
        let (key, value) = match owner {
            CartOwner::User(user_id) => ("userId", user_id.as_str()),
            CartOwner::Guest(guest_id) => ("guestId", guest_id.as_str()),
        };
        url.query_pairs_mut().append_pair(key, value);

        self.send_json(self.request(Method::GET, url)).await
    }

    #[instrument(skip(self), fields(owner = %owner, product_id = %product_id))]
    async fn add_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&["cart", "addItem"])?;
        let body = match owner {
            CartOwner::User(user_id) => AddItemBody {
                user_id: Some(user_id),
                guest_id: None,
                product_id,
                quantity,
            },
            CartOwner::Guest(guest_id) => AddItemBody {
                user_id: None,
                guest_id: Some(guest_id),
                product_id,
                quantity,
            },
        };

        self.send(self.request(Method::POST, url).json(&body))
            .await
            .map(drop)
    }

    #[instrument(skip(self), fields(owner = %owner, product_id = %product_id))]
    async fn remove_item(&self, owner: &CartOwner, product_id: ProductId) -> Result<(), ApiError> {
        let url = self.line_url(owner, product_id)?;
        let body = GuestBody {
            guest_id: owner_guest(owner),
        };

        self.send(self.request(Method::DELETE, url).json(&body))
            .await
            .map(drop)
    }

    #[instrument(skip(self), fields(owner = %owner, product_id = %product_id))]
    async fn update_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        let url = self.line_url(owner, product_id)?;
        let body = UpdateItemBody {
            quantity,
            guest_id: owner_guest(owner),
        };

        self.send(self.request(Method::PATCH, url).json(&body))
            .await
            .map(drop)
    }

    #[instrument(skip(self), fields(owner = %owner))]
    async fn clear_cart(&self, owner: &CartOwner) -> Result<(), ApiError> {
        let url = match owner {
            CartOwner::User(user_id) => self.endpoint(&["cart", "remove", user_id.as_str()])?,
            CartOwner::Guest(guest_id) => {
                let mut url = self.endpoint(&["cart", "clear", "guest"])?;
                url.query_pairs_mut().append_pair("guestId", guest_id.as_str());
                url
            }
        };

        self.send(self.request(Method::DELETE, url)).await.map(drop)
    }

    #[instrument(skip(self), fields(guest_id = %guest_id))]
    async fn merge_guest_cart(&self, guest_id: &GuestId) -> Result<(), ApiError> {
        let mut url = self.endpoint(&["cart", "merge", ""])?;
        url.query_pairs_mut().append_pair("guestId", guest_id.as_str());
        let body = GuestBody {
            guest_id: Some(guest_id),
        };

        self.send(self.request(Method::POST, url).json(&body))
            .await
            .map(drop)
    }
}

const fn owner_guest(owner: &CartOwner) -> Option<&GuestId> {
    match owner {
        CartOwner::Guest(guest_id) => Some(guest_id),
        CartOwner::User(_) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ShopperClient {
        ShopperClient::new(&ShopperConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let client = client("http://localhost:5000");
        let url = client.endpoint(&["cart", "getcart"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/cart/getcart");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://api.example.com/v1/");
        let url = client.endpoint(&["user", "decode"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/user/decode");
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let client = client("http://localhost:5000");
        let url = client.endpoint(&["cart", "merge", ""]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/cart/merge/");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = client("http://localhost:5000");
        let url = client.endpoint(&["cart", "a b/c", "items", "1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/cart/a%20b%2Fc/items/1");
    }

    #[test]
    fn test_line_url_by_owner() {
        let client = client("http://localhost:5000");
        let user = CartOwner::User("u-1".parse().unwrap());
        let guest = CartOwner::Guest("g-1".parse().unwrap());

        assert_eq!(
            client.line_url(&user, ProductId::new(7)).unwrap().as_str(),
            "http://localhost:5000/cart/u-1/items/7"
        );
        assert_eq!(
            client.line_url(&guest, ProductId::new(7)).unwrap().as_str(),
            "http://localhost:5000/cart/guest/item/7"
        );
    }
}
