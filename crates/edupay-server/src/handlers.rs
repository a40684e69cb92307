//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};

use edupay_core::{
    CoreError, ItemKind, PurchasableItem, Role, SessionStore, User, dashboard_path, login_redirect,
};
use edupay_payments::{
    CheckoutOrder, EntitlementStore, PaymentError, PlanActivation, VerificationRequest,
    WidgetConfig,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub gateway_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub terms_accepted: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order: CheckoutOrder,
    pub widget: WidgetConfig,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Role-specific dashboard to land on after a successful payment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Failure payload reported by the client widget
#[derive(Debug, Deserialize)]
pub struct WidgetFailureReport {
    pub error: WidgetFailureDetail,
    #[serde(default)]
    pub gateway_order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WidgetFailureDetail {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardRouteResponse {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct EntitlementsResponse {
    pub enrolled_courses: Vec<String>,
    pub active_plan: Option<PlanActivation>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Helpers
// ============================================================================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Resolve the session user, if any
fn session_user(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let token = bearer_token(headers)?;
    match state.sessions.user_for_token(token) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Session lookup error: {}", e);
            None
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    code: &str,
    redirect: Option<String>,
) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
            redirect,
        }),
    )
}

fn payments_disabled() -> ApiError {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "Payments not configured",
        "PAYMENTS_DISABLED",
        None,
    )
}

/// Listing page to fall back to when an item cannot be resolved
fn listing_page(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Plan => "/pricing",
        ItemKind::Course => "/courses",
    }
}

fn catalog_error_response(err: &CoreError, kind: ItemKind) -> ApiError {
    match err {
        CoreError::ItemNotFound { .. } => error_response(
            StatusCode::NOT_FOUND,
            err.to_string(),
            "ITEM_NOT_FOUND",
            Some(listing_page(kind).into()),
        ),
        CoreError::MalformedItem(_) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            err.to_string(),
            "ITEM_MALFORMED",
            None,
        ),
        _ => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            err.to_string(),
            "CATALOG_ERROR",
            None,
        ),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        gateway_configured: state.payments.is_some(),
    })
}

/// List the static plan catalog
pub async fn list_plans(State(state): State<AppState>) -> Json<Vec<PurchasableItem>> {
    Json(state.catalog.plans().to_vec())
}

/// Resolve a checkout target to a priced item
pub async fn resolve_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<PurchasableItem>, ApiError> {
    let kind = ItemKind::parse(&kind).ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown item kind: {kind}"),
            "ITEM_NOT_FOUND",
            Some("/courses".into()),
        )
    })?;

    state
        .catalog
        .resolve(kind, &id)
        .map(Json)
        .map_err(|e| catalog_error_response(&e, kind))
}

/// Create a gateway order and the widget config for it.
///
/// Requires an authenticated session; without one the response carries the
/// login redirect that resumes this checkout after sign-in.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    let kind = ItemKind::parse(&payload.kind).ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown item kind: {}", payload.kind),
            "ITEM_NOT_FOUND",
            Some("/courses".into()),
        )
    })?;

    let Some(user) = session_user(&state, &headers) else {
        let redirect = login_redirect(kind, &payload.id);
        let err = PaymentError::Unauthenticated {
            redirect: redirect.clone(),
        };
        return Err(error_response(
            StatusCode::UNAUTHORIZED,
            err.user_message(),
            "UNAUTHENTICATED",
            Some(redirect),
        ));
    };

    let payments = state.payments.as_ref().ok_or_else(payments_disabled)?;

    let item = state
        .catalog
        .resolve(kind, &payload.id)
        .map_err(|e| catalog_error_response(&e, kind))?;

    let order = payments
        .initiator
        .create_order(&item, &user, payload.terms_accepted)
        .await
        .map_err(|e| match &e {
            PaymentError::TermsNotAccepted => error_response(
                StatusCode::BAD_REQUEST,
                e.user_message(),
                "TERMS_NOT_ACCEPTED",
                None,
            ),
            _ => {
                tracing::error!("Order creation failed: {}", e);
                error_response(
                    StatusCode::BAD_GATEWAY,
                    e.user_message(),
                    "ORDER_CREATION_FAILED",
                    None,
                )
            }
        })?;

    let widget = payments.initiator.widget_config(&order, &item, &user);

    Ok(Json(CreateOrderResponse { order, widget }))
}

/// Verify a gateway callback and grant the entitlement
pub async fn verify_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<VerificationRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let payments = state.payments.as_ref().ok_or_else(payments_disabled)?;

    let result = payments.verifier.verify_and_report(&payload);

    let redirect = if result.success {
        let role = session_user(&state, &headers).map(|u| u.role);
        Some(dashboard_path(role).to_string())
    } else {
        None
    };

    Ok(Json(VerifyResponse {
        success: result.success,
        message: result.message,
        redirect,
    }))
}

/// Accept the widget's failure report.
///
/// Logging only; the order stays orphaned at the gateway.
pub async fn payment_failed(Json(report): Json<WidgetFailureReport>) -> Json<VerifyResponse> {
    let err = PaymentError::UserCancelled(report.error.description.clone());
    tracing::warn!(
        order_id = ?report.gateway_order_id,
        description = %report.error.description,
        "Payment widget reported failure"
    );

    Json(VerifyResponse {
        success: false,
        message: Some(err.user_message()),
        redirect: None,
    })
}

/// Role-specific dashboard path for the current session
pub async fn dashboard_route(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<DashboardRouteResponse> {
    let role: Option<Role> = session_user(&state, &headers).map(|u| u.role);
    Json(DashboardRouteResponse {
        path: dashboard_path(role).to_string(),
    })
}

/// Entitlements for the current session user
pub async fn my_entitlements(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EntitlementsResponse>, ApiError> {
    let user = session_user(&state, &headers).ok_or_else(|| {
        let err = PaymentError::Unauthenticated {
            redirect: "/login".into(),
        };
        error_response(
            StatusCode::UNAUTHORIZED,
            err.user_message(),
            "UNAUTHENTICATED",
            Some("/login".into()),
        )
    })?;

    let enrolled_courses = state.entitlements.enrolled_courses(&user.id).map_err(|e| {
        tracing::error!("Entitlement lookup failed: {}", e);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.user_message(),
            "STORAGE_ERROR",
            None,
        )
    })?;
    let active_plan = state.entitlements.active_plan(&user.id).map_err(|e| {
        tracing::error!("Entitlement lookup failed: {}", e);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.user_message(),
            "STORAGE_ERROR",
            None,
        )
    })?;

    Ok(Json(EntitlementsResponse {
        enrolled_courses,
        active_plan,
    }))
}
