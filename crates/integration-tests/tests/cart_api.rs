//! Request/response contract of `ShopperClient` against the mock backend.
//!
//! Run with: cargo test -p shopper-integration-tests --test cart_api

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::Method;
use secrecy::SecretString;
use serde_json::{Value, json};
use shopper_cart::api::conversions::convert_cart;
use shopper_cart::api::{ApiError, CartApi, Credentials};
use shopper_cart::models::{Address, CartOwner};
use shopper_core::{Email, GuestId, OrderId, ProductId, UserId};
use shopper_integration_tests::{CartKey, CatalogEntry, MockBackend};

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: Email::parse(email).unwrap(),
        password: SecretString::from(password),
    }
}

fn guest(id: &str) -> CartOwner {
    CartOwner::Guest(GuestId::parse(id).unwrap())
}

fn member(id: &str) -> CartOwner {
    CartOwner::User(UserId::parse(id).unwrap())
}

async fn backend_with_catalog() -> MockBackend {
    let backend = MockBackend::spawn().await;
    backend.add_product(CatalogEntry::new(1, "Dried Mango", 1250, 8));
    backend.add_product(CatalogEntry::new(2, "Pineapple Rings", 899, 0));
    backend.add_product(CatalogEntry::new(3, "Mango Chutney", 500, 3));
    backend
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_anonymous_session_is_unauthorized() {
    let backend = MockBackend::spawn().await;
    let client = backend.client();

    let err = client.resolve_identity().await.unwrap_err();

    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_sign_in_cookie_authenticates_later_calls() {
    let backend = MockBackend::spawn().await;
    let id = backend.add_account("ada", "ada@example.com", "hunter22");
    let client = backend.client();

    let user = client
        .sign_in(&credentials("ada@example.com", "hunter22"))
        .await
        .unwrap();
    assert_eq!(user.id.as_str(), id);
    assert_eq!(user.username, "ada");

    let decoded = client.resolve_identity().await.unwrap();
    assert_eq!(decoded, user);

    let signin = backend.requests_to(&Method::POST, "/user/signin");
    assert_eq!(
        signin[0].body,
        json!({ "email": "ada@example.com", "password": "hunter22" })
    );
}

#[tokio::test]
async fn test_numeric_user_id_round_trips() {
    let backend = backend_with_catalog().await;
    backend.add_account("ada", "ada@example.com", "hunter22");
    let client = backend.client();

    let user = client
        .sign_in(&credentials("ada@example.com", "hunter22"))
        .await
        .unwrap();
    assert_eq!(user.id, UserId::parse("1").unwrap());
    assert_eq!(client.resolve_identity().await.unwrap().id, user.id);

    let owner = CartOwner::User(user.id);
    client.add_item(&owner, ProductId::new(1), 2).await.unwrap();

    let add = backend.requests_to(&Method::POST, "/cart/addItem");
    assert_eq!(add[0].body["user_id"], json!(1));
    assert_eq!(backend.cart(&CartKey::User("1".into())), vec![(1, 2)]);
}

#[tokio::test]
async fn test_cookie_jar_is_per_client() {
    let backend = MockBackend::spawn().await;
    backend.add_account("ada", "ada@example.com", "hunter22");
    let signed_in = backend.client();
    signed_in
        .sign_in(&credentials("ada@example.com", "hunter22"))
        .await
        .unwrap();

    let other = backend.client();
    assert!(other.resolve_identity().await.unwrap_err().is_unauthorized());
}

#[tokio::test]
async fn test_rejected_sign_in_carries_backend_message() {
    let backend = MockBackend::spawn().await;
    backend.add_account("ada", "ada@example.com", "hunter22");
    let client = backend.client();

    let err = client
        .sign_in(&credentials("ada@example.com", "nope"))
        .await
        .unwrap_err();

    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_register_posts_to_trailing_slash_route() {
    let backend = MockBackend::spawn().await;
    let client = backend.client();
    let email = Email::parse("grace@example.com").unwrap();

    let user = client
        .register("grace", &email, &SecretString::from("s3cret!"))
        .await
        .unwrap();
    assert_eq!(user.email, email);

    let err = client
        .register("grace", &email, &SecretString::from("s3cret!"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 409, .. }));
    assert_eq!(backend.requests_to(&Method::POST, "/user/").len(), 2);
}

// ============================================================================
// Cart Routes
// ============================================================================

#[tokio::test]
async fn test_get_cart_selects_owner_by_query_parameter() {
    let backend = backend_with_catalog().await;
    backend.seed_cart(CartKey::Guest("g-1".into()), &[(1, 2)]);
    backend.seed_cart(CartKey::User("user-9".into()), &[(3, 1)]);
    let client = backend.client();

    let guest_cart = client.get_cart(&guest("g-1")).await.unwrap();
    let user_cart = client.get_cart(&member("user-9")).await.unwrap();

    assert_eq!(guest_cart.cart_items.len(), 1);
    assert_eq!(guest_cart.cart_items[0].product_id, ProductId::new(1));
    assert_eq!(user_cart.cart_items[0].product_id, ProductId::new(3));

    let queries: Vec<Option<String>> = backend
        .requests_to(&Method::GET, "/cart/getcart")
        .into_iter()
        .map(|r| r.query)
        .collect();
    assert_eq!(
        queries,
        vec![
            Some("guestId=g-1".to_string()),
            Some("userId=user-9".to_string())
        ]
    );
}

#[tokio::test]
async fn test_get_cart_converts_joined_products() {
    let backend = backend_with_catalog().await;
    backend.seed_cart(CartKey::Guest("g-1".into()), &[(1, 2), (2, 1), (3, 4)]);
    backend.remove_product(3);
    let client = backend.client();

    let (cart, dropped) = convert_cart(client.get_cart(&guest("g-1")).await.unwrap());

    assert_eq!(dropped, 1);
    assert_eq!(cart.len(), 2);
    let mango = cart.line(ProductId::new(1)).unwrap();
    assert_eq!(mango.name, "Dried Mango");
    assert_eq!(mango.unit_price.to_string(), "12.50");
    assert_eq!(mango.max_quantity, 8);
    assert_eq!(cart.subtotal().to_string(), "33.99");
}

#[tokio::test]
async fn test_guest_line_routes_and_bodies() {
    let backend = backend_with_catalog().await;
    let client = backend.client();
    let owner = guest("g-7");

    client.add_item(&owner, ProductId::new(1), 2).await.unwrap();
    client.update_item(&owner, ProductId::new(1), 5).await.unwrap();
    client.remove_item(&owner, ProductId::new(1)).await.unwrap();
    client.add_item(&owner, ProductId::new(3), 1).await.unwrap();
    client.clear_cart(&owner).await.unwrap();

    assert!(backend.cart(&CartKey::Guest("g-7".into())).is_empty());

    let add = backend.requests_to(&Method::POST, "/cart/addItem");
    assert_eq!(
        add[0].body,
        json!({ "user_id": null, "guest_id": "g-7", "product_id": 1, "quantity": 2 })
    );

    let update = backend.requests_to(&Method::PATCH, "/cart/guest/item/1");
    assert_eq!(update[0].body, json!({ "quantity": 5, "guestId": "g-7" }));

    let remove = backend.requests_to(&Method::DELETE, "/cart/guest/item/1");
    assert_eq!(remove[0].body, json!({ "guestId": "g-7" }));

    let clear = backend.requests_to(&Method::DELETE, "/cart/clear/guest");
    assert_eq!(clear[0].query.as_deref(), Some("guestId=g-7"));
}

#[tokio::test]
async fn test_user_line_routes_and_bodies() {
    let backend = backend_with_catalog().await;
    let client = backend.client();
    let owner = member("user-3");

    client.add_item(&owner, ProductId::new(1), 1).await.unwrap();
    client.add_item(&owner, ProductId::new(1), 1).await.unwrap();
    assert_eq!(backend.cart(&CartKey::User("user-3".into())), vec![(1, 2)]);

    client.update_item(&owner, ProductId::new(1), 4).await.unwrap();
    assert_eq!(backend.cart(&CartKey::User("user-3".into())), vec![(1, 4)]);

    client.remove_item(&owner, ProductId::new(1)).await.unwrap();
    client.clear_cart(&owner).await.unwrap();

    let add = backend.requests_to(&Method::POST, "/cart/addItem");
    assert_eq!(add[0].body["user_id"], json!("user-3"));
    assert_eq!(add[0].body["guest_id"], Value::Null);

    let update = backend.requests_to(&Method::PATCH, "/cart/user-3/items/1");
    assert_eq!(update[0].body, json!({ "quantity": 4 }));

    assert_eq!(
        backend
            .requests_to(&Method::DELETE, "/cart/user-3/items/1")
            .len(),
        1
    );
    assert_eq!(
        backend.requests_to(&Method::DELETE, "/cart/remove/user-3").len(),
        1
    );
}

#[tokio::test]
async fn test_update_of_missing_line_is_not_found() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let err = client
        .update_item(&guest("g-1"), ProductId::new(1), 2)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref message) if message == "Cart item not found"));
}

#[tokio::test]
async fn test_server_failure_is_reported_with_status() {
    let backend = backend_with_catalog().await;
    backend.fail(Method::POST, "/cart/addItem");
    let client = backend.client();

    let err = client
        .add_item(&guest("g-1"), ProductId::new(1), 1)
        .await
        .unwrap_err();

    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "injected failure");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(backend.cart(&CartKey::Guest("g-1".into())).is_empty());
}

#[tokio::test]
async fn test_merge_sends_guest_id_in_query_and_body() {
    let backend = backend_with_catalog().await;
    let user_id = backend.add_account("ada", "ada@example.com", "hunter22");
    backend.seed_cart(CartKey::Guest("g-2".into()), &[(1, 1), (3, 2)]);
    backend.seed_cart(CartKey::User(user_id.clone()), &[(1, 2)]);
    let client = backend.client();
    client
        .sign_in(&credentials("ada@example.com", "hunter22"))
        .await
        .unwrap();

    client
        .merge_guest_cart(&GuestId::parse("g-2").unwrap())
        .await
        .unwrap();

    let merge = backend.requests_to(&Method::POST, "/cart/merge/");
    assert_eq!(merge[0].query.as_deref(), Some("guestId=g-2"));
    assert_eq!(merge[0].body, json!({ "guestId": "g-2" }));

    assert_eq!(backend.cart(&CartKey::User(user_id)), vec![(1, 3), (3, 2)]);
    assert!(backend.cart(&CartKey::Guest("g-2".into())).is_empty());
}

#[tokio::test]
async fn test_merge_without_session_is_unauthorized() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let err = client
        .merge_guest_cart(&GuestId::parse("g-2").unwrap())
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_get_product_is_cached() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let first = client.get_product(ProductId::new(1)).await.unwrap();
    let second = client.get_product(ProductId::new(1)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.name, "Dried Mango");
    assert_eq!(first.max_quantity, 8);
    assert!(!first.out_of_stock);
    assert_eq!(backend.requests_to(&Method::GET, "/product/1").len(), 1);
}

#[tokio::test]
async fn test_out_of_stock_product() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let product = client.get_product(ProductId::new(2)).await.unwrap();

    assert!(product.out_of_stock);
    assert_eq!(product.max_quantity, 0);
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let err = client.get_product(ProductId::new(404)).await.unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_search_matches_case_insensitively() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let hits = client.search_products("  MANGO ").await.unwrap();
    let ids: Vec<ProductId> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![ProductId::new(1), ProductId::new(3)]);

    let search = backend.requests_to(&Method::POST, "/product/search");
    assert_eq!(search[0].body, json!({ "productName": "MANGO" }));

    // Same normalized query is served from cache.
    client.search_products("mango").await.unwrap();
    assert_eq!(backend.requests_to(&Method::POST, "/product/search").len(), 1);
}

#[tokio::test]
async fn test_product_pages() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let first = client.list_products(1, 2).await.unwrap();
    let ids: Vec<ProductId> = first.products.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![ProductId::new(1), ProductId::new(2)]);
    assert_eq!(first.total_pages, 2);
    assert!(first.has_more());
    assert!(first.products[1].out_of_stock);

    let second = client.list_products(2, 2).await.unwrap();
    assert_eq!(second.products.len(), 1);
    assert_eq!(second.products[0].max_quantity, 3);
    assert!(!second.has_more());

    client.list_products(1, 2).await.unwrap();
    let pages: Vec<Option<String>> = backend
        .requests_to(&Method::GET, "/product/paginate")
        .into_iter()
        .map(|r| r.query)
        .collect();
    assert_eq!(
        pages,
        vec![
            Some("page=1&limit=2".to_string()),
            Some("page=2&limit=2".to_string())
        ]
    );
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_user_checkout() {
    let backend = backend_with_catalog().await;
    let user_id = backend.add_account("ada", "ada@example.com", "hunter22");
    backend.seed_cart(CartKey::User(user_id.clone()), &[(1, 2), (3, 1)]);
    let client = backend.client();
    let owner = member(&user_id);

    let order = client.create_order(&owner).await.unwrap();
    assert_eq!(order.id, OrderId::new(1));
    assert_eq!(order.status, "pending");
    assert_eq!(order.total_price.to_string(), "30.00");
    assert_eq!(order.items.len(), 2);
    assert_eq!(
        backend.requests_to(&Method::POST, &format!("/order/{user_id}")).len(),
        1
    );

    let email = Email::parse("ada@example.com").unwrap();
    let payment = client.initiate_payment(order.id, &email).await.unwrap();
    assert_eq!(payment.amount, order.total_price);
    assert_eq!(payment.total().to_string(), "45.00");
    assert_eq!(payment.redirect_url, "https://checkout.example/pay/tx-1");
    let pay = backend.requests_to(&Method::POST, "/order/pay/1/payment");
    assert_eq!(pay[0].body, json!({ "email": "ada@example.com" }));

    let receipt = client.confirm_payment("tx-1").await.unwrap();
    assert_eq!(receipt.order_id, order.id);
    assert_eq!(receipt.user_email, "ada@example.com");
    assert_eq!(receipt.transaction_reference, "tx-1");
    assert_eq!(backend.order_status(1), Some("paid"));

    let history = client
        .order_history(&UserId::parse(user_id).unwrap())
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].transaction_ref, "tx-1");
    assert_eq!(history[0].total_amount_paid, payment.total());
    assert_eq!(history[0].items[0].product_id, Some(ProductId::new(1)));
}

#[tokio::test]
async fn test_guest_order_uses_query_parameter() {
    let backend = backend_with_catalog().await;
    backend.seed_cart(CartKey::Guest("g-4".into()), &[(3, 2)]);
    let client = backend.client();

    let order = client.create_order(&guest("g-4")).await.unwrap();

    assert_eq!(order.total_price.to_string(), "10.00");
    assert_eq!(order.items[0].product_name, "Mango Chutney");
    let create = backend.requests_to(&Method::POST, "/order");
    assert_eq!(create[0].query.as_deref(), Some("guestId=g-4"));
}

#[tokio::test]
async fn test_order_from_empty_cart_is_rejected() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let err = client.create_order(&guest("g-empty")).await.unwrap_err();

    assert!(matches!(err, ApiError::Api { status: 400, ref message } if message == "Cart is empty"));
}

#[tokio::test]
async fn test_unknown_transaction_is_rejected() {
    let backend = backend_with_catalog().await;
    let client = backend.client();

    let err = client.confirm_payment("tx-404").await.unwrap_err();

    assert!(matches!(err, ApiError::PaymentRejected(ref message) if message == "Transaction not found"));
    let confirm = backend.requests_to(&Method::GET, "/order/confirmpayment");
    assert_eq!(confirm[0].query.as_deref(), Some("tx_ref=tx-404"));
}

#[tokio::test]
async fn test_payment_for_missing_order_is_not_found() {
    let backend = backend_with_catalog().await;
    let client = backend.client();
    let email = Email::parse("ada@example.com").unwrap();

    let err = client
        .initiate_payment(OrderId::new(99), &email)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_address_is_saved_per_owner() {
    let backend = backend_with_catalog().await;
    let user_id = backend.add_account("ada", "ada@example.com", "hunter22");
    let client = backend.client();
    let user_id = UserId::parse(user_id).unwrap();

    assert_eq!(client.get_address(&user_id).await.unwrap(), None);

    let address = Address {
        id: None,
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+2348000000000".to_string(),
        address: "12 Marina Road, Lagos".to_string(),
    };
    let saved = client
        .save_address(&CartOwner::User(user_id.clone()), &address)
        .await
        .unwrap();
    assert!(saved.id.is_some());
    assert_eq!(saved.name, address.name);

    let post = backend.requests_to(&Method::POST, "/address");
    assert_eq!(post[0].body["user_id"], json!(1));
    assert_eq!(post[0].body["guest_id"], Value::Null);

    let fetched = client.get_address(&user_id).await.unwrap();
    assert_eq!(fetched, Some(saved));
    let get = backend.requests_to(&Method::GET, "/address");
    assert_eq!(get[0].query.as_deref(), Some("userId=1"));
}

#[tokio::test]
async fn test_guest_address_and_blank_fields() {
    let backend = backend_with_catalog().await;
    let client = backend.client();
    let mut address = Address {
        id: None,
        name: "Grace".to_string(),
        email: "grace@example.com".to_string(),
        phone: "0800".to_string(),
        address: "1 Harbour St".to_string(),
    };

    client.save_address(&guest("g-5"), &address).await.unwrap();
    let post = backend.requests_to(&Method::POST, "/address");
    assert_eq!(post[0].body["guest_id"], json!("g-5"));
    assert_eq!(post[0].body["user_id"], Value::Null);

    address.phone = "  ".to_string();
    assert_eq!(address.missing_fields(), vec!["phone"]);
    let err = client.save_address(&guest("g-5"), &address).await.unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 400, .. }));
}
