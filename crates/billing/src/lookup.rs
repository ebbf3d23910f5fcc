//! User subscription plan lookup
//!
//! Resolves what a user is currently paying for from the Stripe identifiers
//! stored on their user row, the pricing catalog, and (for paid users) the
//! live subscription in Stripe.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use plangate_shared::BillingInterval;

use crate::error::{BillingError, BillingResult};
use crate::plans::{PricingCatalog, PricingPlan};
use crate::provider::BillingProvider;

/// Paid access continues this long past `stripe_current_period_end`
pub const PERIOD_END_GRACE: Duration = Duration::days(1);

/// Stripe identifiers stored on a user row
#[derive(Debug, Clone, Default, FromRow)]
pub struct BillingRecord {
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub stripe_current_period_end: Option<OffsetDateTime>,
}

/// A user's plan together with their Stripe state
#[derive(Debug, Clone, Serialize)]
pub struct UserSubscriptionPlan {
    #[serde(flatten)]
    pub plan: PricingPlan,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_price_id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub stripe_current_period_end: Option<OffsetDateTime>,
    pub is_paid: bool,
    pub interval: Option<BillingInterval>,
    pub is_canceled: bool,
}

impl UserSubscriptionPlan {
    /// Free plan for a user with no Stripe state
    pub fn free(catalog: &PricingCatalog) -> Self {
        resolve_plan(catalog, BillingRecord::default(), OffsetDateTime::now_utc())
    }
}

/// Whether a stored price still grants paid access at `now`
pub fn is_paid_at(record: &BillingRecord, now: OffsetDateTime) -> bool {
    match (&record.stripe_price_id, record.stripe_current_period_end) {
        (Some(_), Some(period_end)) => period_end + PERIOD_END_GRACE > now,
        _ => false,
    }
}

/// Match a billing record against the catalog
///
/// `is_canceled` is always false here; it needs a round trip to Stripe.
pub fn resolve_plan(
    catalog: &PricingCatalog,
    record: BillingRecord,
    now: OffsetDateTime,
) -> UserSubscriptionPlan {
    let is_paid = is_paid_at(&record, now);

    let matched = record
        .stripe_price_id
        .as_deref()
        .and_then(|price_id| catalog.find_by_price_id(price_id));

    let (plan, interval) = match (is_paid, matched) {
        (true, Some((plan, interval))) => (plan.clone(), Some(interval)),
        _ => (catalog.free_plan().clone(), None),
    };

    UserSubscriptionPlan {
        plan,
        stripe_customer_id: record.stripe_customer_id,
        stripe_subscription_id: record.stripe_subscription_id,
        stripe_price_id: record.stripe_price_id,
        stripe_current_period_end: record.stripe_current_period_end,
        is_paid,
        interval,
        is_canceled: false,
    }
}

/// Fill in `is_canceled` from the live subscription
///
/// Only paid users with a stored subscription id cost a Stripe round trip.
pub async fn apply_cancellation_status(
    plan: &mut UserSubscriptionPlan,
    provider: &dyn BillingProvider,
) -> BillingResult<()> {
    if !plan.is_paid {
        return Ok(());
    }

    if let Some(subscription_id) = plan.stripe_subscription_id.as_deref() {
        let subscription = provider.retrieve_subscription(subscription_id).await?;
        plan.is_canceled = subscription.cancel_at_period_end;
    }

    Ok(())
}

/// Source of a user's current subscription plan
#[async_trait]
pub trait SubscriptionPlanSource: Send + Sync {
    async fn user_subscription_plan(&self, user_id: Uuid) -> BillingResult<UserSubscriptionPlan>;
}

/// Postgres-backed plan lookup
#[derive(Clone)]
pub struct UserPlanLookup {
    pool: PgPool,
    catalog: Arc<PricingCatalog>,
    provider: Arc<dyn BillingProvider>,
}

impl UserPlanLookup {
    pub fn new(pool: PgPool, catalog: Arc<PricingCatalog>, provider: Arc<dyn BillingProvider>) -> Self {
        Self {
            pool,
            catalog,
            provider,
        }
    }

    async fn fetch_record(&self, user_id: Uuid) -> BillingResult<BillingRecord> {
        let record: Option<BillingRecord> = sqlx::query_as(
            r#"
            SELECT stripe_customer_id, stripe_subscription_id, stripe_price_id, stripe_current_period_end
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or_else(|| BillingError::NotFound(format!("User {}", user_id)))
    }
}

#[async_trait]
impl SubscriptionPlanSource for UserPlanLookup {
    async fn user_subscription_plan(&self, user_id: Uuid) -> BillingResult<UserSubscriptionPlan> {
        let record = self.fetch_record(user_id).await?;
        let mut plan = resolve_plan(&self.catalog, record, OffsetDateTime::now_utc());

        apply_cancellation_status(&mut plan, self.provider.as_ref()).await?;

        tracing::debug!(
            user_id = %user_id,
            plan = %plan.plan.title,
            is_paid = plan.is_paid,
            is_canceled = plan.is_canceled,
            "Resolved user subscription plan"
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::client::PriceIds;
    use crate::provider::{
        CheckoutRequest, PortalRequest, SubscriptionCancellation, SubscriptionSnapshot,
    };

    /// Answers subscription retrieval only, recording the ids asked for
    struct SubscriptionStatus {
        cancel_at_period_end: bool,
        fail: bool,
        retrieved: Mutex<Vec<String>>,
    }

    impl SubscriptionStatus {
        fn new(cancel_at_period_end: bool) -> Self {
            Self {
                cancel_at_period_end,
                fail: false,
                retrieved: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(false)
            }
        }

        fn retrieved(&self) -> Vec<String> {
            self.retrieved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BillingProvider for SubscriptionStatus {
        async fn create_checkout_session(&self, _request: &CheckoutRequest) -> BillingResult<String> {
            unreachable!("plan lookup never creates checkout sessions")
        }

        async fn create_portal_session(&self, _request: &PortalRequest) -> BillingResult<String> {
            unreachable!("plan lookup never creates portal sessions")
        }

        async fn cancel_subscription(
            &self,
            _cancellation: &SubscriptionCancellation,
        ) -> BillingResult<SubscriptionSnapshot> {
            unreachable!("plan lookup never cancels subscriptions")
        }

        async fn retrieve_subscription(&self, subscription_id: &str) -> BillingResult<SubscriptionSnapshot> {
            self.retrieved.lock().unwrap().push(subscription_id.to_string());
            if self.fail {
                return Err(BillingError::StripeApi("rate limited".to_string()));
            }
            Ok(SubscriptionSnapshot {
                id: subscription_id.to_string(),
                customer_id: "cus_123".to_string(),
                cancel_at_period_end: self.cancel_at_period_end,
            })
        }
    }

    fn catalog() -> PricingCatalog {
        PricingCatalog::new(&PriceIds {
            pro_monthly: Some("price_pro_m".to_string()),
            pro_yearly: Some("price_pro_y".to_string()),
            business_monthly: Some("price_biz_m".to_string()),
            business_yearly: Some("price_biz_y".to_string()),
        })
    }

    fn paid_record(price: &str, period_end: OffsetDateTime) -> BillingRecord {
        BillingRecord {
            stripe_customer_id: Some("cus_123".to_string()),
            stripe_subscription_id: Some("sub_123".to_string()),
            stripe_price_id: Some(price.to_string()),
            stripe_current_period_end: Some(period_end),
        }
    }

    #[test]
    fn test_user_without_price_is_free() {
        let plan = resolve_plan(&catalog(), BillingRecord::default(), OffsetDateTime::now_utc());
        assert!(!plan.is_paid);
        assert_eq!(plan.plan.title, "Starter");
        assert_eq!(plan.interval, None);
    }

    #[test]
    fn test_active_period_is_paid() {
        let now = OffsetDateTime::now_utc();
        let plan = resolve_plan(&catalog(), paid_record("price_biz_y", now + Duration::days(20)), now);
        assert!(plan.is_paid);
        assert_eq!(plan.plan.title, "Business");
        assert_eq!(plan.interval, Some(BillingInterval::Yearly));
        assert_eq!(plan.stripe_customer_id.as_deref(), Some("cus_123"));
    }

    #[test]
    fn test_grace_day_after_period_end() {
        let now = OffsetDateTime::now_utc();

        let record = paid_record("price_pro_m", now - Duration::hours(12));
        assert!(is_paid_at(&record, now));

        let record = paid_record("price_pro_m", now - Duration::days(2));
        assert!(!is_paid_at(&record, now));
        let plan = resolve_plan(&catalog(), record, now);
        assert_eq!(plan.plan.title, "Starter");
        // Stripe ids are still reported for a lapsed subscriber
        assert_eq!(plan.stripe_price_id.as_deref(), Some("price_pro_m"));
    }

    #[test]
    fn test_unknown_price_falls_back_to_free_plan() {
        let now = OffsetDateTime::now_utc();
        let plan = resolve_plan(&catalog(), paid_record("price_legacy", now + Duration::days(3)), now);
        assert!(plan.is_paid);
        assert_eq!(plan.plan.title, "Starter");
        assert_eq!(plan.interval, None);
    }

    #[test]
    fn test_plan_serializes_flat() {
        let plan = UserSubscriptionPlan::free(&catalog());
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["title"], "Starter");
        assert_eq!(json["is_paid"], false);
        assert!(json["stripe_current_period_end"].is_null());
    }

    #[tokio::test]
    async fn test_paid_plan_reads_cancel_at_period_end() {
        let now = OffsetDateTime::now_utc();
        let mut plan = resolve_plan(&catalog(), paid_record("price_pro_m", now + Duration::days(5)), now);
        let provider = SubscriptionStatus::new(true);

        apply_cancellation_status(&mut plan, &provider).await.unwrap();

        assert_eq!(provider.retrieved(), vec!["sub_123".to_string()]);
        assert!(plan.is_canceled);
    }

    #[tokio::test]
    async fn test_active_subscription_is_not_canceled() {
        let now = OffsetDateTime::now_utc();
        let mut plan = resolve_plan(&catalog(), paid_record("price_pro_m", now + Duration::days(5)), now);
        let provider = SubscriptionStatus::new(false);

        apply_cancellation_status(&mut plan, &provider).await.unwrap();

        assert_eq!(provider.retrieved().len(), 1);
        assert!(!plan.is_canceled);
    }

    #[tokio::test]
    async fn test_unpaid_plan_skips_stripe() {
        let now = OffsetDateTime::now_utc();
        let mut plan = resolve_plan(&catalog(), paid_record("price_pro_m", now - Duration::days(3)), now);
        let provider = SubscriptionStatus::new(true);

        apply_cancellation_status(&mut plan, &provider).await.unwrap();

        assert!(provider.retrieved().is_empty());
        assert!(!plan.is_canceled);
    }

    #[tokio::test]
    async fn test_paid_plan_without_subscription_id_skips_stripe() {
        let now = OffsetDateTime::now_utc();
        let mut record = paid_record("price_biz_m", now + Duration::days(5));
        record.stripe_subscription_id = None;
        let mut plan = resolve_plan(&catalog(), record, now);
        let provider = SubscriptionStatus::new(true);

        apply_cancellation_status(&mut plan, &provider).await.unwrap();

        assert!(plan.is_paid);
        assert!(provider.retrieved().is_empty());
        assert!(!plan.is_canceled);
    }

    #[tokio::test]
    async fn test_retrieve_failure_fails_lookup() {
        let now = OffsetDateTime::now_utc();
        let mut plan = resolve_plan(&catalog(), paid_record("price_pro_y", now + Duration::days(5)), now);
        let provider = SubscriptionStatus::failing();

        let err = apply_cancellation_status(&mut plan, &provider).await.unwrap_err();

        assert!(matches!(err, BillingError::StripeApi(_)));
        assert_eq!(provider.retrieved().len(), 1);
    }
}
