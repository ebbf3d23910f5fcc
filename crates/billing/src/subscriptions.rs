//! Stripe subscription retrieval and cancellation

use stripe::{CancelSubscription, CancellationDetails, Subscription, SubscriptionId};

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};
use crate::provider::{SubscriptionCancellation, SubscriptionSnapshot};

/// Subscription service for the Stripe subscription API
#[derive(Clone)]
pub struct SubscriptionService {
    stripe: StripeClient,
}

impl SubscriptionService {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    pub async fn retrieve_subscription(&self, subscription_id: &str) -> BillingResult<Subscription> {
        let sub_id = parse_subscription_id(subscription_id)?;
        let subscription = Subscription::retrieve(self.stripe.inner(), &sub_id, &[]).await?;
        Ok(subscription)
    }

    /// Cancel a subscription immediately
    pub async fn cancel_subscription(
        &self,
        cancellation: &SubscriptionCancellation,
    ) -> BillingResult<Subscription> {
        let sub_id = parse_subscription_id(&cancellation.subscription_id)?;

        let params = build_cancel_params(cancellation);
        let subscription = Subscription::cancel(self.stripe.inner(), &sub_id, params).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            customer_id = %subscription.customer.id(),
            prorate = cancellation.prorate,
            "Cancelled subscription"
        );

        Ok(subscription)
    }
}

/// Cancellation parameters carrying the proration flag and the reason comment
pub fn build_cancel_params(cancellation: &SubscriptionCancellation) -> CancelSubscription {
    CancelSubscription {
        cancellation_details: Some(CancellationDetails {
            comment: Some(cancellation.comment.clone()),
            feedback: None,
            reason: None,
        }),
        invoice_now: None,
        prorate: Some(cancellation.prorate),
    }
}

fn parse_subscription_id(subscription_id: &str) -> BillingResult<SubscriptionId> {
    subscription_id
        .parse::<SubscriptionId>()
        .map_err(|e| BillingError::SubscriptionNotFound(format!("{} ({})", subscription_id, e)))
}

impl From<&Subscription> for SubscriptionSnapshot {
    fn from(subscription: &Subscription) -> Self {
        Self {
            id: subscription.id.to_string(),
            customer_id: subscription.customer.id().to_string(),
            cancel_at_period_end: subscription.cancel_at_period_end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_subscription_id_is_not_found() {
        let err = parse_subscription_id("price_123").unwrap_err();
        assert!(matches!(err, BillingError::SubscriptionNotFound(_)));
        assert!(parse_subscription_id("sub_1Nabc").is_ok());
    }

    #[test]
    fn test_plan_change_cancel_params() {
        let cancellation = SubscriptionCancellation::for_plan_change("sub_1Nabc");
        let params = build_cancel_params(&cancellation);

        assert_eq!(params.prorate, Some(true));
        assert_eq!(params.invoice_now, None);
        let details = params.cancellation_details.unwrap();
        assert_eq!(
            details.comment.as_deref(),
            Some("subscription upgraded or downgraded, So existing subscription is cancelled.")
        );
        assert!(details.feedback.is_none());
        assert!(details.reason.is_none());
    }
}
