// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Plangate Billing Module
//!
//! Routes a user's price selection to the right Stripe-hosted flow.
//!
//! ## Features
//!
//! - **Checkout**: Subscription-mode checkout sessions for new subscribers and plan changes
//! - **Portal**: Billing portal sessions for managing the current plan
//! - **Subscriptions**: Retrieve and cancel (with proration) existing subscriptions
//! - **Pricing**: The plan catalog and its Stripe prices
//! - **Plan Lookup**: Resolve a user's current plan from stored Stripe state
//! - **Dispatch**: Pick portal / plan change / checkout for a price selection

pub mod checkout;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod lookup;
pub mod plans;
pub mod portal;
pub mod provider;
pub mod subscriptions;

// Checkout
pub use checkout::{build_checkout_params, CheckoutService, USER_ID_METADATA_KEY};

// Client
pub use client::{PriceIds, StripeClient, StripeConfig};

// Dispatch
pub use dispatch::{
    ActionStatus, GenerateSessionError, RedirectKind, ResponseAction, SessionDispatcher,
    StripeRedirect,
};

// Error
pub use error::{BillingError, BillingResult};

// Lookup
pub use lookup::{SubscriptionPlanSource, UserPlanLookup, UserSubscriptionPlan};

// Pricing
pub use plans::{PricingCatalog, PricingPlan};

// Portal
pub use portal::PortalService;

// Provider
pub use provider::{
    BillingProvider, CheckoutCustomer, CheckoutRequest, PortalRequest, SubscriptionCancellation,
    SubscriptionSnapshot,
};

// Subscriptions
pub use subscriptions::SubscriptionService;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

/// Main billing service that combines the Stripe-facing services
#[derive(Clone)]
pub struct BillingService {
    pub checkout: CheckoutService,
    pub portal: PortalService,
    pub subscriptions: SubscriptionService,
    config: StripeConfig,
}

impl BillingService {
    /// Create a new billing service from environment variables
    pub fn from_env() -> BillingResult<Self> {
        Ok(Self::new(StripeConfig::from_env()?))
    }

    /// Create a new billing service with explicit config
    pub fn new(config: StripeConfig) -> Self {
        let stripe = StripeClient::new(&config);

        Self {
            checkout: CheckoutService::new(stripe.clone()),
            portal: PortalService::new(stripe.clone()),
            subscriptions: SubscriptionService::new(stripe),
            config,
        }
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    pub fn catalog(&self) -> PricingCatalog {
        PricingCatalog::new(&self.config.price_ids)
    }

    /// Wire the Postgres plan lookup and a dispatcher on top of this service
    pub fn into_dispatcher(
        self,
        pool: PgPool,
    ) -> (SessionDispatcher, Arc<dyn SubscriptionPlanSource>, Arc<PricingCatalog>) {
        let catalog = Arc::new(self.catalog());
        let billing_url = self.config.billing_url();
        let provider: Arc<dyn BillingProvider> = Arc::new(self);
        let lookup: Arc<dyn SubscriptionPlanSource> =
            Arc::new(UserPlanLookup::new(pool, catalog.clone(), provider.clone()));
        let dispatcher = SessionDispatcher::new(provider, lookup.clone(), billing_url);
        (dispatcher, lookup, catalog)
    }
}

#[async_trait]
impl BillingProvider for BillingService {
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> BillingResult<String> {
        let session = self.checkout.create_subscription_checkout(request).await?;
        session.url.ok_or_else(|| {
            BillingError::MalformedResponse(format!("checkout session {} has no URL", session.id))
        })
    }

    async fn create_portal_session(&self, request: &PortalRequest) -> BillingResult<String> {
        let session = self.portal.create_portal_session(request).await?;
        Ok(session.url)
    }

    async fn cancel_subscription(
        &self,
        cancellation: &SubscriptionCancellation,
    ) -> BillingResult<SubscriptionSnapshot> {
        let subscription = self.subscriptions.cancel_subscription(cancellation).await?;
        Ok(SubscriptionSnapshot::from(&subscription))
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> BillingResult<SubscriptionSnapshot> {
        let subscription = self.subscriptions.retrieve_subscription(subscription_id).await?;
        Ok(SubscriptionSnapshot::from(&subscription))
    }
}
