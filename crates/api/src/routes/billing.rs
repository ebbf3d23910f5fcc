//! Billing routes for Stripe integration

use axum::{
    async_trait,
    extract::{Extension, Form, FromRequest, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::Redirect,
    Json,
};
use serde::{Deserialize, Serialize};

use plangate_billing::{PricingPlan, UserSubscriptionPlan};
use plangate_shared::SessionUser;

use crate::{
    auth::SessionSource,
    error::{ApiError, ApiResult},
    security::is_trusted_origin,
    state::{AppState, BillingState},
};

#[derive(Debug, Deserialize)]
struct PriceSelectionBody {
    #[serde(alias = "priceId")]
    price_id: String,
}

/// Price chosen on the pricing page
///
/// Accepts a JSON body or a form post from the pricing page's buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSelection(pub String);

#[async_trait]
impl<S> FromRequest<S> for PriceSelection
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        let body = if is_json {
            let Json(body) = Json::<PriceSelectionBody>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            body
        } else {
            let Form(body) = Form::<PriceSelectionBody>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            body
        };

        let price_id = body.price_id.trim();
        if price_id.is_empty() {
            return Err(ApiError::BadRequest("price_id is required".to_string()));
        }

        Ok(Self(price_id.to_string()))
    }
}

fn billing(state: &AppState) -> ApiResult<&BillingState> {
    state.billing.as_ref().ok_or(ApiError::ServiceUnavailable)
}

/// Send the user to the Stripe page for the selected price
///
/// Portal for the current price, cancel + checkout for a different price,
/// checkout for users without a paid plan. Every failure, including a
/// missing session, is reported as the same opaque error. Cookie sessions
/// must come from an allowed origin, since a plan change cancels the
/// current subscription.
pub async fn generate_user_stripe(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
    source: Option<Extension<SessionSource>>,
    headers: HeaderMap,
    PriceSelection(price_id): PriceSelection,
) -> ApiResult<Redirect> {
    let billing = billing(&state)?;
    let session = session.map(|Extension(user)| user);

    if matches!(source, Some(Extension(SessionSource::Cookie)))
        && !is_trusted_origin(&headers, &state.config.cors_allowed_origins)
    {
        tracing::warn!(
            user_id = ?session.as_ref().map(|user| user.id),
            origin = ?headers.get(axum::http::header::ORIGIN),
            "Rejected cross-origin billing action"
        );
        return Err(ApiError::Forbidden);
    }

    let redirect = billing
        .dispatcher
        .generate_user_stripe(&price_id, session.as_ref())
        .await?;

    tracing::info!(
        user_id = ?session.as_ref().map(|user| user.id),
        kind = ?redirect.kind,
        "Redirecting to Stripe"
    );

    Ok(Redirect::to(&redirect.url))
}

/// Get the current user's subscription plan
pub async fn get_subscription(
    State(state): State<AppState>,
    session: Option<Extension<SessionUser>>,
) -> ApiResult<Json<UserSubscriptionPlan>> {
    let billing = billing(&state)?;
    let Extension(user) = session.ok_or(ApiError::Unauthorized)?;

    let plan = billing.plans.user_subscription_plan(user.id).await?;
    Ok(Json(plan))
}

#[derive(Debug, Serialize)]
pub struct PricingResponse {
    pub plans: Vec<PricingPlan>,
}

/// List the plans on offer
pub async fn pricing(State(state): State<AppState>) -> ApiResult<Json<PricingResponse>> {
    let billing = billing(&state)?;
    Ok(Json(PricingResponse {
        plans: billing.catalog.plans().to_vec(),
    }))
}
