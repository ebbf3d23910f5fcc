//! Checkout/portal dispatch
//!
//! Decides, from the user's current plan, whether a price selection opens
//! the billing portal, replaces the current subscription, or starts a new
//! checkout, and performs the matching Stripe calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use plangate_shared::SessionUser;

use crate::error::{BillingError, BillingResult};
use crate::lookup::SubscriptionPlanSource;
use crate::provider::{
    BillingProvider, CheckoutCustomer, CheckoutRequest, PortalRequest, SubscriptionCancellation,
};

/// Which branch produced a redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Same price as the current subscription: manage it in the portal
    Portal,
    /// Different price: old subscription cancelled, new checkout started
    PlanChange,
    /// No paid subscription: new checkout by email
    Checkout,
}

/// Stripe-hosted page the browser should be sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripeRedirect {
    pub kind: RedirectKind,
    pub url: String,
}

/// Opaque failure returned to the caller of the action
///
/// Every failure, authorization included, reads the same to the end user.
/// The cause is kept as the error source for logging and tests.
#[derive(Debug, thiserror::Error)]
#[error("Failed to generate user stripe session")]
pub struct GenerateSessionError(#[source] BillingError);

impl GenerateSessionError {
    pub fn cause(&self) -> &BillingError {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Success,
    Error,
}

/// Result body for callers that do not follow the redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseAction {
    pub status: ActionStatus,
    #[serde(rename = "stripeUrl", skip_serializing_if = "Option::is_none")]
    pub stripe_url: Option<String>,
}

impl ResponseAction {
    pub fn success(stripe_url: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            stripe_url: Some(stripe_url.into()),
        }
    }

    pub fn error() -> Self {
        Self {
            status: ActionStatus::Error,
            stripe_url: None,
        }
    }
}

/// Routes a price selection to the right Stripe-hosted flow
#[derive(Clone)]
pub struct SessionDispatcher {
    provider: Arc<dyn BillingProvider>,
    plans: Arc<dyn SubscriptionPlanSource>,
    billing_url: String,
}

impl SessionDispatcher {
    pub fn new(
        provider: Arc<dyn BillingProvider>,
        plans: Arc<dyn SubscriptionPlanSource>,
        billing_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            plans,
            billing_url: billing_url.into(),
        }
    }

    /// Produce the Stripe URL for `price_id`, collapsing every failure
    pub async fn generate_user_stripe(
        &self,
        price_id: &str,
        session: Option<&SessionUser>,
    ) -> Result<StripeRedirect, GenerateSessionError> {
        self.dispatch(price_id, session).await.map_err(|e| {
            tracing::error!(
                user_id = ?session.map(|user| user.id),
                price_id = %price_id,
                error = %e,
                error_debug = ?e,
                "Failed to generate user stripe session"
            );
            GenerateSessionError(e)
        })
    }

    async fn dispatch(
        &self,
        price_id: &str,
        session: Option<&SessionUser>,
    ) -> BillingResult<StripeRedirect> {
        let user = session.ok_or_else(|| BillingError::Unauthorized("no session".to_string()))?;
        let email = user
            .email()
            .ok_or_else(|| BillingError::Unauthorized("session has no email".to_string()))?;

        let plan = self.plans.user_subscription_plan(user.id).await?;

        let customer_id = match plan.stripe_customer_id.as_deref() {
            Some(customer_id) if plan.is_paid => customer_id,
            _ => {
                let url = self
                    .create_checkout(price_id, user, CheckoutCustomer::Email(email.to_string()))
                    .await?;
                return Ok(StripeRedirect {
                    kind: RedirectKind::Checkout,
                    url,
                });
            }
        };

        if plan.stripe_price_id.as_deref() == Some(price_id) {
            let url = self
                .provider
                .create_portal_session(&PortalRequest {
                    customer_id: customer_id.to_string(),
                    return_url: self.billing_url.clone(),
                })
                .await?;

            tracing::info!(user_id = %user.id, "Opening billing portal for current plan");
            return Ok(StripeRedirect {
                kind: RedirectKind::Portal,
                url,
            });
        }

        let subscription_id = plan.stripe_subscription_id.as_deref().ok_or_else(|| {
            BillingError::SubscriptionNotFound(format!("paid user {} has no subscription id", user.id))
        })?;

        let cancelled = self
            .provider
            .cancel_subscription(&SubscriptionCancellation::for_plan_change(subscription_id))
            .await?;

        tracing::info!(
            user_id = %user.id,
            cancelled_subscription = %cancelled.id,
            from_price = ?plan.stripe_price_id,
            to_price = %price_id,
            "Switching plan"
        );

        let url = self
            .create_checkout(price_id, user, CheckoutCustomer::Existing(cancelled.customer_id))
            .await?;

        Ok(StripeRedirect {
            kind: RedirectKind::PlanChange,
            url,
        })
    }

    async fn create_checkout(
        &self,
        price_id: &str,
        user: &SessionUser,
        customer: CheckoutCustomer,
    ) -> BillingResult<String> {
        self.provider
            .create_checkout_session(&CheckoutRequest {
                price_id: price_id.to_string(),
                customer,
                user_id: user.id,
                success_url: self.billing_url.clone(),
                cancel_url: self.billing_url.clone(),
            })
            .await
    }
}
