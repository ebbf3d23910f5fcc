//! Application state

use std::sync::Arc;

use sqlx::PgPool;

use plangate_billing::{BillingService, PricingCatalog, SessionDispatcher, SubscriptionPlanSource};

use crate::{auth::JwtManager, config::Config};

/// Billing collaborators shared by the billing routes
#[derive(Clone)]
pub struct BillingState {
    pub dispatcher: SessionDispatcher,
    pub plans: Arc<dyn SubscriptionPlanSource>,
    pub catalog: Arc<PricingCatalog>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub jwt_manager: JwtManager,
    /// Billing (None when disabled or Stripe is not configured)
    pub billing: Option<BillingState>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let billing = if config.enable_billing {
            match BillingService::from_env() {
                Ok(service) => {
                    tracing::info!(
                        billing_url = %service.config().billing_url(),
                        "Stripe billing service initialized"
                    );
                    let (dispatcher, plans, catalog) = service.into_dispatcher(pool.clone());
                    Some(BillingState {
                        dispatcher,
                        plans,
                        catalog,
                    })
                }
                Err(e) => {
                    tracing::warn!("Stripe billing not configured: {}", e);
                    None
                }
            }
        } else {
            tracing::info!("Billing disabled via config (ENABLE_BILLING=false)");
            None
        };

        Self::with_billing(pool, config, billing)
    }

    /// Build state around explicitly wired billing collaborators
    pub fn with_billing(pool: PgPool, config: Config, billing: Option<BillingState>) -> Self {
        let jwt_manager = JwtManager::new(&config.jwt_secret, config.jwt_expiry_hours);

        Self {
            pool,
            config,
            jwt_manager,
            billing,
        }
    }
}
