//! Shopify Commerce Provider
//!
//! Orders, customers and products via the Shopify Admin REST API.
//! The access token is held as a `SecretString` and never logged.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::models::{Customer, Order, Product};
use super::retry::{CallPolicy, call_with_policy, retry_after_hint};
use super::CommerceProvider;
use crate::config::CommerceConfig;
use crate::types::{ErrorClassifier, Result, SupportError};

const PROVIDER_NAME: &str = "shopify";

/// Page size used when scanning the catalog for a search
const CATALOG_SCAN_LIMIT: usize = 250;

pub struct ShopifyClient {
    /// `https://{shop}/admin/api/{version}`, absent when no shop is configured
    api_base: Option<String>,
    /// Storefront root used for canonical product URLs
    storefront: Option<String>,
    access_token: Option<SecretString>,
    client: reqwest::Client,
    policy: CallPolicy,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("api_base", &self.api_base)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("policy", &self.policy)
            .finish()
    }
}

#[derive(Deserialize)]
struct OrdersEnvelope {
    #[serde(default)]
    orders: Vec<Order>,
}

#[derive(Deserialize)]
struct CustomersEnvelope {
    #[serde(default)]
    customers: Vec<Customer>,
}

#[derive(Deserialize)]
struct ProductsEnvelope {
    #[serde(default)]
    products: Vec<Product>,
}

impl ShopifyClient {
    pub fn new(config: &CommerceConfig, policy: CallPolicy) -> Result<Self> {
        let storefront = config
            .shop_domain
            .as_deref()
            .map(normalize_origin)
            .transpose()?;

        let api_base = match &config.api_base {
            Some(base) => Some(normalize_origin(base)?),
            None => storefront
                .as_ref()
                .map(|origin| format!("{}/admin/api/{}", origin, config.api_version)),
        };

        let access_token = config
            .access_token
            .clone()
            .or_else(|| std::env::var("SHOPIFY_ACCESS_TOKEN").ok())
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let client = reqwest::Client::builder()
            .timeout(policy.timeout)
            .build()
            .map_err(|e| SupportError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_base,
            storefront,
            access_token,
            client,
            policy,
        })
    }

    /// Canonical storefront URL for a product handle
    pub fn product_url(&self, handle: &str) -> Option<String> {
        self.storefront
            .as_ref()
            .map(|origin| format!("{}/products/{}", origin, handle))
    }

    fn credentials(&self) -> Result<(&str, &SecretString)> {
        match (&self.api_base, &self.access_token) {
            (Some(base), Some(token)) => Ok((base.as_str(), token)),
            _ => Err(SupportError::NotConnected(PROVIDER_NAME.to_string())),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        operation: &str,
    ) -> Result<T> {
        let (base, token) = self.credentials()?;
        let url = format!("{}/{}", base, path);
        let url = url.as_str();
        let client = &self.client;

        call_with_policy(&self.policy, operation, move || async move {
            debug!(url = %url, "Shopify request");
            let response = client
                .get(url)
                .header("X-Shopify-Access-Token", token.expose_secret())
                .query(query)
                .send()
                .await
                .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

            let status = response.status();
            if !status.is_success() {
                let retry_after = (status == StatusCode::TOO_MANY_REQUESTS)
                    .then(|| retry_after_hint(response.headers()))
                    .flatten();
                let body = response.text().await.unwrap_or_default();
                let mut err = ErrorClassifier::classify_http_status(
                    status.as_u16(),
                    &format!("Shopify API error ({}): {}", status, body),
                    PROVIDER_NAME,
                );
                if let Some(delay) = retry_after {
                    err = err.retry_after(delay);
                }
                return Err(err.into());
            }

            response
                .json::<T>()
                .await
                .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME).into())
        })
        .await
    }
}

#[async_trait]
impl CommerceProvider for ShopifyClient {
    async fn find_order_by_number(&self, number: &str) -> Result<Option<Order>> {
        // Shopify order names carry the `#` prefix for numeric orders
        let name = if number.chars().all(|c| c.is_ascii_digit()) {
            format!("#{}", number)
        } else {
            number.to_string()
        };
        let envelope: OrdersEnvelope = self
            .get_json(
                "orders.json",
                &[("name", name), ("status", "any".to_string())],
                "find order",
            )
            .await?;
        Ok(envelope.orders.into_iter().next())
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let envelope: CustomersEnvelope = self
            .get_json(
                "customers/search.json",
                &[("query", format!("email:{}", email))],
                "find customer",
            )
            .await?;
        Ok(envelope.customers.into_iter().next())
    }

    async fn get_customer_orders(&self, customer_id: u64, limit: usize) -> Result<Vec<Order>> {
        let path = format!("customers/{}/orders.json", customer_id);
        match self
            .get_json::<OrdersEnvelope>(
                &path,
                &[("status", "any".to_string()), ("limit", limit.to_string())],
                "customer orders",
            )
            .await
        {
            Ok(envelope) => Ok(envelope.orders),
            Err(SupportError::Provider(err))
                if err.category == crate::types::ErrorCategory::NotFound =>
            {
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>> {
        let products = self.get_products(CATALOG_SCAN_LIMIT).await?;
        Ok(products
            .into_iter()
            .filter(|p| p.matches_query(query))
            .collect())
    }

    async fn get_products(&self, limit: usize) -> Result<Vec<Product>> {
        let envelope: ProductsEnvelope = self
            .get_json(
                "products.json",
                &[("limit", limit.to_string())],
                "list products",
            )
            .await?;
        Ok(envelope
            .products
            .into_iter()
            .map(|mut product| {
                product.url = self.product_url(&product.handle);
                product
            })
            .collect())
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn is_connected(&self) -> bool {
        if self.credentials().is_err() {
            debug!("Shopify credentials not configured");
            return false;
        }
        match self
            .get_json::<serde_json::Value>("shop.json", &[], "shop probe")
            .await
        {
            Ok(_) => {
                info!("Shopify is available");
                true
            }
            Err(e) => {
                warn!(error = %e, "Shopify probe failed");
                false
            }
        }
    }
}

/// Accept `shop.myshopify.com` or a full URL; return the origin without a
/// trailing slash.
fn normalize_origin(raw: &str) -> Result<String> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    let url = url::Url::parse(&candidate)
        .map_err(|e| SupportError::Config(format!("Invalid URL '{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SupportError::Config(format!(
            "URL must use http or https scheme, got: {}",
            url.scheme()
        )));
    }
    let mut result = url.to_string();
    if result.ends_with('/') {
        result.pop();
    }
    Ok(result)
}
