//! Stripe client configuration

use stripe::Client;

use crate::error::{BillingError, BillingResult};

/// Default path of the pricing page users return to from Stripe
pub const DEFAULT_BILLING_PATH: &str = "/pricing";

/// Configuration for Stripe billing
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Stripe secret API key
    pub secret_key: String,
    /// Price IDs for each paid plan
    pub price_ids: PriceIds,
    /// Base URL for success/cancel/return redirects
    pub app_base_url: String,
    /// Path on the app that Stripe-hosted pages send the user back to
    pub billing_path: String,
}

/// Stripe price IDs for the paid plans
/// Plan hierarchy: Starter (free, no price) → Pro → Business
#[derive(Debug, Clone, Default)]
pub struct PriceIds {
    pub pro_monthly: Option<String>,
    pub pro_yearly: Option<String>,
    pub business_monthly: Option<String>,
    pub business_yearly: Option<String>,
}

impl PriceIds {
    /// Read price IDs from the environment; unset or empty values stay `None`
    pub fn from_env() -> Self {
        Self {
            pro_monthly: non_empty_var("STRIPE_PRO_MONTHLY_PLAN_ID"),
            pro_yearly: non_empty_var("STRIPE_PRO_YEARLY_PLAN_ID"),
            business_monthly: non_empty_var("STRIPE_BUSINESS_MONTHLY_PLAN_ID"),
            business_yearly: non_empty_var("STRIPE_BUSINESS_YEARLY_PLAN_ID"),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl StripeConfig {
    /// Create a config with default URLs and no plan prices
    pub fn new(secret_key: impl Into<String>, app_base_url: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            price_ids: PriceIds::default(),
            app_base_url: app_base_url.into(),
            billing_path: DEFAULT_BILLING_PATH.to_string(),
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> BillingResult<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| BillingError::Config("STRIPE_SECRET_KEY not set".to_string()))?;
        if secret_key.trim().is_empty() {
            return Err(BillingError::Config("STRIPE_SECRET_KEY is empty".to_string()));
        }

        Ok(Self {
            secret_key,
            price_ids: PriceIds::from_env(),
            app_base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            billing_path: std::env::var("BILLING_PATH")
                .unwrap_or_else(|_| DEFAULT_BILLING_PATH.to_string()),
        })
    }

    /// Build an absolute URL on the app for `path`
    pub fn absolute_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.app_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL used for checkout success/cancel and the portal's return link
    pub fn billing_url(&self) -> String {
        self.absolute_url(&self.billing_path)
    }
}

/// Stripe billing client
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
}

impl StripeClient {
    /// Create a new Stripe client from config
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            client: Client::new(&config.secret_key),
        }
    }

    /// Get the inner Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}
