//! Stripe Billing Portal

use stripe::{BillingPortalSession, CreateBillingPortalSession, CustomerId};

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};
use crate::provider::PortalRequest;

/// Portal service for Stripe billing portal sessions
#[derive(Clone)]
pub struct PortalService {
    stripe: StripeClient,
}

impl PortalService {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    /// Create a billing portal session for a customer
    pub async fn create_portal_session(
        &self,
        request: &PortalRequest,
    ) -> BillingResult<BillingPortalSession> {
        let customer_id = request
            .customer_id
            .parse::<CustomerId>()
            .map_err(|e| BillingError::StripeApi(format!("Invalid customer ID: {}", e)))?;

        let mut params = CreateBillingPortalSession::new(customer_id);
        params.return_url = Some(&request.return_url);

        let session = BillingPortalSession::create(self.stripe.inner(), params).await?;

        tracing::info!(
            customer_id = %session.customer,
            "Created billing portal session"
        );

        Ok(session)
    }
}
