//! Cache types for catalog responses.

use shopper_core::ProductId;

use crate::models::{Product, ProductPage, ProductSummary};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Search(String),
    Page { page: u32, limit: u32 },
}

impl CacheKey {
    /// Key for a search, normalized so casing and padding share an entry.
    pub fn search(query: &str) -> Self {
        Self::Search(query.trim().to_lowercase())
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Search(Vec<ProductSummary>),
    Page(ProductPage),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_key_is_normalized() {
        assert_eq!(CacheKey::search("  Tote "), CacheKey::search("tote"));
        assert_ne!(CacheKey::search("tote"), CacheKey::search("scarf"));
    }
}
