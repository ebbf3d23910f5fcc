//! Pricing catalog
//!
//! The plans offered on the pricing page and the Stripe prices behind them.
//! Starter is free and has no Stripe price; Pro and Business each have a
//! monthly and a yearly price.

use serde::Serialize;

use plangate_shared::BillingInterval;

use crate::client::PriceIds;

/// List prices in whole currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanPrices {
    pub monthly: u32,
    pub yearly: u32,
}

/// Stripe price IDs backing a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanStripeIds {
    pub monthly: Option<String>,
    pub yearly: Option<String>,
}

/// A plan shown on the pricing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingPlan {
    pub title: String,
    pub description: String,
    pub benefits: Vec<String>,
    pub limitations: Vec<String>,
    pub prices: PlanPrices,
    pub stripe_ids: PlanStripeIds,
}

impl PricingPlan {
    pub fn is_free(&self) -> bool {
        self.stripe_ids.monthly.is_none() && self.stripe_ids.yearly.is_none()
    }

    /// Interval billed by `price_id`, if it belongs to this plan
    pub fn interval_for_price(&self, price_id: &str) -> Option<BillingInterval> {
        if self.stripe_ids.monthly.as_deref() == Some(price_id) {
            Some(BillingInterval::Monthly)
        } else if self.stripe_ids.yearly.as_deref() == Some(price_id) {
            Some(BillingInterval::Yearly)
        } else {
            None
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// All plans, free plan first
#[derive(Debug, Clone, Serialize)]
pub struct PricingCatalog {
    plans: Vec<PricingPlan>,
}

impl PricingCatalog {
    pub fn new(price_ids: &PriceIds) -> Self {
        let starter = PricingPlan {
            title: "Starter".to_string(),
            description: "For Beginners".to_string(),
            benefits: strings(&[
                "Up to 100 monthly posts",
                "Basic analytics and reporting",
                "Access to standard templates",
            ]),
            limitations: strings(&[
                "No priority access to new features.",
                "Limited customer support",
                "No custom branding",
                "Limited access to business resources.",
            ]),
            prices: PlanPrices { monthly: 0, yearly: 0 },
            stripe_ids: PlanStripeIds::default(),
        };

        let pro = PricingPlan {
            title: "Pro".to_string(),
            description: "Unlock Advanced Features".to_string(),
            benefits: strings(&[
                "Up to 500 monthly posts",
                "Advanced analytics and reporting",
                "Access to business templates",
                "Priority customer support",
                "Exclusive webinars and training.",
            ]),
            limitations: strings(&[
                "No custom branding",
                "Limited access to business resources.",
            ]),
            prices: PlanPrices { monthly: 15, yearly: 144 },
            stripe_ids: PlanStripeIds {
                monthly: price_ids.pro_monthly.clone(),
                yearly: price_ids.pro_yearly.clone(),
            },
        };

        let business = PricingPlan {
            title: "Business".to_string(),
            description: "For Power Users".to_string(),
            benefits: strings(&[
                "Unlimited posts",
                "Real-time analytics and reporting",
                "Access to all templates, including custom branding",
                "24/7 business customer support",
                "Personalized onboarding and account management.",
            ]),
            limitations: Vec::new(),
            prices: PlanPrices { monthly: 30, yearly: 300 },
            stripe_ids: PlanStripeIds {
                monthly: price_ids.business_monthly.clone(),
                yearly: price_ids.business_yearly.clone(),
            },
        };

        Self {
            plans: vec![starter, pro, business],
        }
    }

    pub fn plans(&self) -> &[PricingPlan] {
        &self.plans
    }

    pub fn free_plan(&self) -> &PricingPlan {
        // `new` always puts Starter first
        &self.plans[0]
    }

    /// Find the paid plan and interval a Stripe price belongs to
    pub fn find_by_price_id(&self, price_id: &str) -> Option<(&PricingPlan, BillingInterval)> {
        self.plans
            .iter()
            .find_map(|plan| plan.interval_for_price(price_id).map(|interval| (plan, interval)))
    }
}
