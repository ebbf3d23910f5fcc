//! Stripe Checkout sessions

use std::collections::HashMap;

use stripe::{
    CheckoutSession, CheckoutSessionBillingAddressCollection, CheckoutSessionMode,
    CreateCheckoutSession, CreateCheckoutSessionLineItems, CreateCheckoutSessionPaymentMethodTypes,
    CustomerId,
};

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};
use crate::provider::{CheckoutCustomer, CheckoutRequest};

/// Metadata key the webhook uses to map a completed session back to the user
pub const USER_ID_METADATA_KEY: &str = "userId";

/// Checkout service for creating Stripe checkout sessions
#[derive(Clone)]
pub struct CheckoutService {
    stripe: StripeClient,
}

impl CheckoutService {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    /// Create a subscription-mode checkout session for a single price
    pub async fn create_subscription_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> BillingResult<CheckoutSession> {
        let params = build_checkout_params(request)?;
        let session = CheckoutSession::create(self.stripe.inner(), params).await?;

        tracing::info!(
            user_id = %request.user_id,
            session_id = %session.id,
            price_id = %request.price_id,
            existing_customer = matches!(request.customer, CheckoutCustomer::Existing(_)),
            "Created checkout session"
        );

        Ok(session)
    }
}

/// Translate a checkout request into Stripe parameters
///
/// Exactly one of `customer` / `customer_email` is set, depending on whether
/// the user already has a Stripe customer.
pub fn build_checkout_params(request: &CheckoutRequest) -> BillingResult<CreateCheckoutSession<'_>> {
    if request.price_id.trim().is_empty() {
        return Err(BillingError::InvalidInput("price ID is empty".to_string()));
    }

    let mut metadata = HashMap::new();
    metadata.insert(USER_ID_METADATA_KEY.to_string(), request.user_id.to_string());

    let mut params = CreateCheckoutSession {
        success_url: Some(&request.success_url),
        cancel_url: Some(&request.cancel_url),
        payment_method_types: Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]),
        mode: Some(CheckoutSessionMode::Subscription),
        billing_address_collection: Some(CheckoutSessionBillingAddressCollection::Auto),
        line_items: Some(vec![CreateCheckoutSessionLineItems {
            price: Some(request.price_id.clone()),
            quantity: Some(1),
            ..Default::default()
        }]),
        metadata: Some(metadata),
        ..Default::default()
    };

    match &request.customer {
        CheckoutCustomer::Existing(customer_id) => {
            let customer_id = customer_id
                .parse::<CustomerId>()
                .map_err(|e| BillingError::StripeApi(format!("Invalid customer ID: {}", e)))?;
            params.customer = Some(customer_id);
        }
        CheckoutCustomer::Email(email) => {
            params.customer_email = Some(email);
        }
    }

    Ok(params)
}
