use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/v1/lobby
#[derive(Debug, Serialize)]
pub struct LobbyResponse {
    /// Names waiting for an opponent, oldest first.
    pub waiting: Vec<String>,
    pub sessions: usize,
}

/// GET /api/v1/sessions/{session_id}
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub game_id: Uuid,
    pub player1: String,
    pub player2: String,
    pub age_secs: u64,
}

pub async fn get_lobby(State(state): State<AppState>) -> Json<LobbyResponse> {
    let coordinator = state.coordinator.read().await;
    let registry = coordinator.registry();
    Json(LobbyResponse {
        waiting: registry.waiting_names(),
        sessions: registry.session_count(),
    })
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let id = Uuid::parse_str(&session_id)
        .map_err(|_| AppError::BadRequest(format!("Invalid session id: {session_id}")))?;

    let coordinator = state.coordinator.read().await;
    let session = coordinator
        .registry()
        .session(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;

    Ok(Json(SessionResponse {
        game_id: session.id,
        player1: session.first.name.clone(),
        player2: session.second.name.clone(),
        age_secs: session.created_at.elapsed().as_secs(),
    }))
}
