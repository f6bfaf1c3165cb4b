//! HTTP API for the Adrail node

use adrail_core::{AdrailError, Address, Amount, CampaignId, CampaignMetadata};
use adrail_state::StateStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::runtime::NodeRuntime;

/// API state containing node runtime
pub type ApiState<S> = Arc<NodeRuntime<S>>;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Map a domain error to an HTTP status
fn error_status(err: &AdrailError) -> StatusCode {
    match err {
        AdrailError::AlreadyRegistered(_) => StatusCode::CONFLICT,
        AdrailError::NotRegistered(_) | AdrailError::InvalidCampaignId(_) => StatusCode::NOT_FOUND,
        AdrailError::ZeroBudget
        | AdrailError::MetadataTooLarge { .. }
        | AdrailError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply<T: Serialize>(result: Result<T, AdrailError>) -> (StatusCode, Json<ApiResponse<T>>) {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => (error_status(&e), Json(ApiResponse::err(e))),
    }
}

fn bad_address<T: Serialize>() -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::err("Invalid address")))
}

// ============ DTOs ============

/// Registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub address: String,
}

/// Registration response
#[derive(Serialize)]
pub struct RegisterResponse {
    pub address: String,
    pub ordinal: u64,
}

/// Opt-in toggle request
#[derive(Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

/// Provider response
#[derive(Serialize)]
pub struct ProviderResponse {
    pub address: String,
    pub ordinal: u64,
    pub receives_campaigns: bool,
    pub provides_data: bool,
    pub withdrawn_campaigns: Vec<u64>,
    pub balance: String,
}

/// Campaign creation request
#[derive(Deserialize)]
pub struct CreateCampaignRequest {
    pub organizer: String,
    pub organization: String,
    pub category: String,
    pub title: String,
    pub content_ref: String,
    /// Budget in smallest units
    pub budget: String,
}

/// Campaign response
#[derive(Serialize)]
pub struct CampaignResponse {
    pub id: u64,
    pub organizer: String,
    pub budget: String,
    pub providers_at_creation: u64,
    pub organization: String,
    pub category: String,
    pub title: String,
    pub content_ref: String,
    pub created_at: u64,
}

/// Withdrawal response
#[derive(Serialize)]
pub struct WithdrawResponse {
    pub address: String,
    pub paid: String,
    pub balance: String,
}

/// Pending rewards response
#[derive(Serialize)]
pub struct RewardsResponse {
    pub address: String,
    pub pending: String,
}

/// Vault response
#[derive(Serialize)]
pub struct VaultResponse {
    pub balance: String,
    pub total_deposited: String,
    pub total_paid: String,
}

/// Node status response
#[derive(Serialize)]
pub struct NodeStatusResponse {
    pub providers_total: u64,
    pub campaign_receivers: u64,
    pub data_providers: u64,
    pub campaign_count: u64,
    pub vault_balance: String,
    pub state_version: u64,
}

/// Create API router
pub fn create_router<S: StateStore + 'static>(state: ApiState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/status", get(status::<S>))
        // Providers
        .route("/provider", post(register_provider::<S>))
        .route("/provider/:address", get(get_provider::<S>))
        .route("/provider/:address/receive", post(toggle_receive::<S>))
        .route("/provider/:address/data", post(toggle_data::<S>))
        .route("/provider/:address/rewards", get(get_rewards::<S>))
        .route("/provider/:address/withdraw", post(withdraw::<S>))
        // Campaigns
        .route("/campaign", post(create_campaign::<S>))
        .route("/campaign/:id", get(get_campaign::<S>))
        .route("/campaigns/:address", get(list_campaigns::<S>))
        .route("/organizer/:address/campaign", get(organizer_campaign::<S>))
        // Vault
        .route("/vault", get(vault::<S>))
        .with_state(state)
        .layer(cors)
}

/// Health check
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Node status
async fn status<S: StateStore + 'static>(State(runtime): State<ApiState<S>>) -> impl IntoResponse {
    reply(match runtime.status().await {
        Ok(s) => Ok(NodeStatusResponse {
            providers_total: s.providers_total,
            campaign_receivers: s.campaign_receivers,
            data_providers: s.data_providers,
            campaign_count: s.campaign_count,
            vault_balance: s.vault_balance.to_string(),
            state_version: s.state_version,
        }),
        Err(e) => Err(e),
    })
}

/// Register a new provider
async fn register_provider<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let Ok(address) = Address::from_hex(&req.address) else {
        return bad_address();
    };

    reply(match runtime.market().enable_new_user(address).await {
        Ok(ordinal) => Ok(RegisterResponse {
            address: address.to_hex(),
            ordinal,
        }),
        Err(e) => Err(e),
    })
}

/// Get a provider record
async fn get_provider<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let Ok(addr) = Address::from_hex(&address) else {
        return bad_address();
    };

    let result = async {
        let record = runtime
            .market()
            .get_provider(&addr)
            .await?
            .ok_or_else(|| AdrailError::NotRegistered(addr.to_hex()))?;
        let balance = runtime.market().account_balance(&addr).await?;
        Ok(ProviderResponse {
            address: addr.to_hex(),
            ordinal: record.ordinal,
            receives_campaigns: record.receives_campaigns,
            provides_data: record.provides_data,
            withdrawn_campaigns: record.withdrawn.iter().copied().collect(),
            balance: balance.0.to_string(),
        })
    }
    .await;

    reply(result)
}

/// Toggle receive-campaigns opt-in
async fn toggle_receive<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> impl IntoResponse {
    let Ok(addr) = Address::from_hex(&address) else {
        return bad_address();
    };

    reply(
        runtime
            .market()
            .toggle_receive_campaigns(addr, req.enabled)
            .await
            .map(|_| serde_json::json!({"enabled": req.enabled})),
    )
}

/// Toggle provide-data opt-in
async fn toggle_data<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> impl IntoResponse {
    let Ok(addr) = Address::from_hex(&address) else {
        return bad_address();
    };

    reply(
        runtime
            .market()
            .toggle_provide_data(addr, req.enabled)
            .await
            .map(|_| serde_json::json!({"enabled": req.enabled})),
    )
}

/// Pending rewards for a provider
async fn get_rewards<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let Ok(addr) = Address::from_hex(&address) else {
        return bad_address();
    };

    reply(
        runtime
            .market()
            .pending_rewards(&addr)
            .await
            .map(|pending| RewardsResponse {
                address: addr.to_hex(),
                pending: pending.0.to_string(),
            }),
    )
}

/// Withdraw rewards
async fn withdraw<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let Ok(addr) = Address::from_hex(&address) else {
        return bad_address();
    };

    let result = async {
        let paid = runtime.market().withdraw_rewards(addr).await?;
        let balance = runtime.market().account_balance(&addr).await?;
        Ok(WithdrawResponse {
            address: addr.to_hex(),
            paid: paid.0.to_string(),
            balance: balance.0.to_string(),
        })
    }
    .await;

    reply(result)
}

/// Create a campaign
async fn create_campaign<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Json(req): Json<CreateCampaignRequest>,
) -> impl IntoResponse {
    let Ok(organizer) = Address::from_hex(&req.organizer) else {
        return bad_address();
    };
    let Ok(budget) = req.budget.parse::<u128>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("Invalid budget")),
        );
    };

    let metadata = CampaignMetadata::new(req.organization, req.category, req.title, req.content_ref);

    let result = runtime
        .market()
        .create_campaign(organizer, metadata, Amount::new(budget))
        .await
        .map(|id| {
            info!("Campaign {} created via API", id);
            serde_json::json!({"id": id.0})
        });

    reply(result)
}

/// Get a campaign by id
async fn get_campaign<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    reply(
        runtime
            .market()
            .get_campaign(CampaignId::new(id))
            .await
            .map(campaign_response),
    )
}

/// List campaign ids visible to a receiving provider
async fn list_campaigns<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let Ok(addr) = Address::from_hex(&address) else {
        return bad_address();
    };

    reply(
        runtime
            .market()
            .active_campaign_ids(&addr)
            .await
            .map(|ids| ids.into_iter().map(|id| id.0).collect::<Vec<u64>>()),
    )
}

/// Most recent campaign for an organizer
async fn organizer_campaign<S: StateStore + 'static>(
    State(runtime): State<ApiState<S>>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let Ok(addr) = Address::from_hex(&address) else {
        return bad_address();
    };

    let result = async {
        match runtime.market().active_campaign(&addr).await? {
            Some(record) => Ok(campaign_response(record)),
            None => Err(AdrailError::InvalidCampaignId(0)),
        }
    }
    .await;

    reply(result)
}

/// Vault counters
async fn vault<S: StateStore + 'static>(State(runtime): State<ApiState<S>>) -> impl IntoResponse {
    let result = async {
        Ok(VaultResponse {
            balance: runtime.market().vault_balance().await?.0.to_string(),
            total_deposited: runtime.market().total_deposited().await?.0.to_string(),
            total_paid: runtime.market().total_paid().await?.0.to_string(),
        })
    }
    .await;

    reply(result)
}

fn campaign_response(record: adrail_state::CampaignRecord) -> CampaignResponse {
    CampaignResponse {
        id: record.id,
        organizer: record.organizer.to_hex(),
        budget: record.budget.to_string(),
        providers_at_creation: record.providers_at_creation,
        organization: record.metadata.organization,
        category: record.metadata.category,
        title: record.metadata.title,
        content_ref: record.metadata.content_ref,
        created_at: record.created_at,
    }
}

/// Start API server
pub async fn start_api_server<S: StateStore + 'static>(
    runtime: ApiState<S>,
    listen_addr: &str,
) -> anyhow::Result<()> {
    let router = create_router(runtime);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!("API server listening on {}", listen_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
