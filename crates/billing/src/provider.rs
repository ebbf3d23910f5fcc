//! Billing provider seam
//!
//! The three hosted-API operations the dispatcher needs, behind an
//! object-safe trait. `BillingService` implements it against Stripe; tests
//! substitute an in-memory recorder.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::BillingResult;

/// Note attached to a subscription cancelled because the user picked another plan
pub const PLAN_CHANGE_CANCELLATION_COMMENT: &str =
    "subscription upgraded or downgraded, So existing subscription is cancelled.";

/// Who a new checkout session is attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutCustomer {
    /// Existing Stripe customer (plan change)
    Existing(String),
    /// No Stripe customer yet; Stripe creates one for this email
    Email(String),
}

/// Parameters for a subscription-mode checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub customer: CheckoutCustomer,
    pub user_id: Uuid,
    pub success_url: String,
    pub cancel_url: String,
}

/// Parameters for a billing portal session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub customer_id: String,
    pub return_url: String,
}

/// Parameters for cancelling a subscription immediately
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionCancellation {
    pub subscription_id: String,
    pub prorate: bool,
    pub comment: String,
}

impl SubscriptionCancellation {
    /// Cancellation issued when the user switches to a different price
    pub fn for_plan_change(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            prorate: true,
            comment: PLAN_CHANGE_CANCELLATION_COMMENT.to_string(),
        }
    }
}

/// Provider-side view of a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSnapshot {
    pub id: String,
    pub customer_id: String,
    pub cancel_at_period_end: bool,
}

/// Hosted billing operations
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a checkout session and return its hosted URL
    async fn create_checkout_session(&self, request: &CheckoutRequest) -> BillingResult<String>;

    /// Create a billing portal session and return its hosted URL
    async fn create_portal_session(&self, request: &PortalRequest) -> BillingResult<String>;

    /// Cancel a subscription now, returning its final state
    async fn cancel_subscription(
        &self,
        cancellation: &SubscriptionCancellation,
    ) -> BillingResult<SubscriptionSnapshot>;

    async fn retrieve_subscription(&self, subscription_id: &str) -> BillingResult<SubscriptionSnapshot>;
}
