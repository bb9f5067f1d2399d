use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::config::{ClientSettings, ClientSettingsPatch};
use crate::lcu::models::Summoner;
use crate::shared::{AppError, AppState};

/// Thin HTTP façade over the core, served to the local UI.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/app-info", get(app_info))
        .route("/v1/lcu/auth-info", get(lcu_auth_info))
        .route("/v1/horse/query", post(query_horse))
        .route("/v1/horse/enemy-message", get(enemy_message))
        .route("/v1/config", get(get_settings).put(update_settings))
        .with_state(state)
}

async fn app_info() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn lcu_auth_info(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let client = state.runtime.client().ok_or(AppError::ClientInactive)?;
    let auth = client.auth();
    Ok(Json(json!({
        "port": auth.port,
        "token": auth.token,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QueryHorseReq {
    summoner_name: String,
}

async fn query_horse(
    State(state): State<AppState>,
    Json(req): Json<QueryHorseReq>,
) -> Result<Json<Value>, AppError> {
    let client = state.runtime.client().ok_or(AppError::ClientInactive)?;
    let aggregator = state.runtime.aggregator().ok_or(AppError::ClientInactive)?;

    let name = req.summoner_name.trim();
    let summoner: Summoner = if name.is_empty() {
        match state.runtime.current_summoner() {
            Some(summoner) => summoner,
            None => client.current_summoner().await?,
        }
    } else {
        client
            .summoner_by_name(name)
            .await
            .map_err(|_| AppError::NotFound("summoner not found".into()))?
    };
    if summoner.summoner_id <= 0 {
        return Err(AppError::NotFound("summoner not found".into()));
    }

    let cfg = state.scores.snapshot();
    let settings = state.settings.snapshot();
    let score = aggregator
        .compute_user_score(summoner.summoner_id, &cfg, Utc::now())
        .await;
    let tier = cfg.horse_index(score.score);
    Ok(Json(json!({
        "score": score.score,
        "currKDA": score.curr_kda,
        "horse": settings.horse_name(tier, &cfg.horse[tier].name),
    })))
}

/// Text summary of the enemy team, retained by the in-game workflow for the
/// UI to copy to the clipboard.
async fn enemy_message(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state
        .runtime
        .enemy_message()
        .map(|message| Json(json!({ "message": message })))
        .ok_or_else(|| AppError::NotFound("no in-game summary available".into()))
}

async fn get_settings(State(state): State<AppState>) -> Json<ClientSettings> {
    Json((*state.settings.snapshot()).clone())
}

async fn update_settings(
    State(state): State<AppState>,
    Json(patch): Json<ClientSettingsPatch>,
) -> Result<Json<ClientSettings>, AppError> {
    let next = state.settings.update(patch).map_err(|err| {
        error!(error = %err, "failed to persist settings");
        AppError::Internal
    })?;
    Ok(Json((*next).clone()))
}
