use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::HeaderMap,
    routing::{get, post},
};
use blockfall_engine::{GameMode, ScoreSubmission};
use chrono::{TimeDelta, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    auth::{self, SessionStore},
    error::ApiError,
    model::{ScoreRecord, User, UserProfile},
    ranking::{self, RankingEntry, RankingPeriod},
    store::DocumentStore,
};

#[derive(Debug, Clone)]
pub struct AppState {
    store: Arc<Mutex<DocumentStore>>,
    sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    #[must_use]
    pub fn new(store: DocumentStore, token_ttl: TimeDelta) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            sessions: Arc::new(Mutex::new(SessionStore::new(token_ttl))),
        }
    }

    /// The id of the user owning the request's bearer token.
    async fn authenticate(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        let token = auth::bearer_token(headers)?;
        self.sessions
            .lock()
            .await
            .resolve(token, Utc::now())
            .ok_or(ApiError::InvalidToken)
    }

    async fn issue_token(&self, user_id: &str) -> String {
        self.sessions.lock().await.issue(user_id, Utc::now())
    }
}

/// All API routes, nested under `base_path` when it is not empty.
#[must_use]
pub fn router(state: AppState, base_path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/health", get(health))
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/scores", post(submit_score))
        .route("/api/rankings/:period", get(rankings))
        .route("/api/users/profile", get(profile))
        .with_state(state);

    let app = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(base_path, api)
    };
    app.layer(cors)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

impl Credentials {
    fn from_body(body: Result<Json<Self>, JsonRejection>) -> Result<Self, ApiError> {
        let Json(credentials) = body.map_err(|_| ApiError::MissingCredentials)?;
        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return Err(ApiError::MissingCredentials);
        }
        Ok(credentials)
    }
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    success: bool,
    message: &'static str,
    token: String,
    user: UserProfile,
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let credentials = Credentials::from_body(body)?;

    let user = {
        let store = state.store.lock().await;
        let mut users = store.users().await?;
        if users.by_name(&credentials.username).is_some() {
            return Err(ApiError::UsernameTaken);
        }
        let user = User::new(
            auth::new_id(),
            credentials.username,
            auth::hash_password(&credentials.password),
            Utc::now(),
        );
        users.users.push(user.clone());
        store.save_users(&users).await?;
        user
    };
    info!("registered user {}", user.username);

    Ok(Json(AuthResponse {
        success: true,
        message: "registration complete",
        token: state.issue_token(&user.id).await,
        user: user.profile(),
    }))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let credentials = Credentials::from_body(body)?;

    let user = {
        let store = state.store.lock().await;
        let mut users = store.users().await?;
        let user = users
            .by_name_mut(&credentials.username)
            .filter(|user| auth::verify_password(&credentials.password, &user.password))
            .ok_or(ApiError::InvalidCredentials)?;
        user.last_login = Utc::now();
        let user = user.clone();
        store.save_users(&users).await?;
        user
    };
    info!("user {} logged in", user.username);

    Ok(Json(AuthResponse {
        success: true,
        message: "login successful",
        token: state.issue_token(&user.id).await,
        user: user.profile(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreResponse {
    success: bool,
    message: &'static str,
    score: ScoreRecord,
    exp_gained: u64,
    level_up: bool,
    new_level: u32,
    new_exp: u64,
}

async fn submit_score(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ScoreSubmission>, JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let user_id = state.authenticate(&headers).await?;
    let Json(submission) = body.map_err(|_| ApiError::InvalidScore)?;
    if submission.level == 0 {
        return Err(ApiError::InvalidScore);
    }

    let store = state.store.lock().await;
    let mut users = store.users().await?;
    let mut scores = store.scores().await?;
    let previous_users = users.clone();
    let user = users.by_id_mut(&user_id).ok_or(ApiError::UserNotFound)?;

    let now = Utc::now();
    let record = ScoreRecord {
        id: auth::new_id(),
        user_id,
        username: user.username.clone(),
        score: submission.score,
        level: submission.level,
        lines: submission.lines,
        game_mode: submission.game_mode,
        date: now,
        timestamp: now.timestamp_millis(),
    };
    let exp_gained = submission.score / 100;
    let level_up = user.gain_exp(exp_gained);
    let (new_level, new_exp) = (user.level, user.exp);
    store.save_users(&users).await?;

    scores.scores.push(record.clone());
    if let Err(source) = store.save_scores(&scores).await {
        // the score was not stored, so neither is the exp it earned
        if let Err(rollback) = store.save_users(&previous_users).await {
            error!("failed to restore users after a lost score: {rollback}");
        }
        return Err(source.into());
    }
    if level_up {
        info!("user {} reached level {new_level}", record.username);
    }

    Ok(Json(ScoreResponse {
        success: true,
        message: "score recorded",
        score: record,
        exp_gained,
        level_up,
        new_level,
        new_exp,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankingQuery {
    game_mode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RankingResponse {
    success: bool,
    rankings: Vec<RankingEntry>,
    period: String,
    game_mode: String,
    total: usize,
}

async fn rankings(
    State(state): State<AppState>,
    Path(period): Path<String>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<RankingResponse>, ApiError> {
    let period = RankingPeriod::parse_or_all(&period);
    let scores = state.store.lock().await.scores().await?;

    let rankings = match query.game_mode.as_deref().map(str::parse::<GameMode>) {
        None => ranking::rank(&scores.scores, period, None, Utc::now()),
        Some(Ok(mode)) => ranking::rank(&scores.scores, period, Some(mode), Utc::now()),
        // no score can belong to an unknown mode
        Some(Err(_)) => vec![],
    };

    Ok(Json(RankingResponse {
        success: true,
        total: rankings.len(),
        rankings,
        period: period.to_string(),
        game_mode: query.game_mode.unwrap_or_else(|| "all".to_owned()),
    }))
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
    success: bool,
    user: UserProfile,
}

async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user_id = state.authenticate(&headers).await?;
    let users = state.store.lock().await.users().await?;
    let user = users.by_id(&user_id).ok_or(ApiError::UserNotFound)?;
    Ok(Json(ProfileResponse {
        success: true,
        user: user.profile(),
    }))
}
