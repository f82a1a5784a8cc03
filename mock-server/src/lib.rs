use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct TaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

#[derive(Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub access_token: String,
    pub token_type: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

struct User {
    email: String,
    password: String,
}

struct OwnedTask {
    owner: String,
    task: Task,
}

#[derive(Default)]
struct Db {
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
    tasks: Vec<OwnedTask>,
    next_id: i64,
}

/// Shared server state. Cloning shares the same underlying data.
#[derive(Clone, Default)]
pub struct AppState {
    db: Arc<RwLock<Db>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate every issued access token.
    pub async fn revoke_tokens(&self) {
        let mut db = self.db.write().await;
        tracing::info!(count = db.tokens.len(), "revoking all access tokens");
        db.tokens.clear();
    }
}

type ApiError = (StatusCode, Json<MessageResponse>);

fn error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(MessageResponse {
            message: message.to_string(),
        }),
    )
}

pub fn app() -> Router {
    router(AppState::new())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/test", get(test_connection))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", put(update_task).delete(delete_task))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, AppState::new()).await
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

async fn sign_in(
    State(state): State<AppState>,
    Json(input): Json<SignInRequest>,
) -> Result<Json<JwtResponse>, ApiError> {
    let mut db = state.db.write().await;
    let email = db
        .users
        .get(&input.username)
        .filter(|user| user.password == input.password)
        .map(|user| user.email.clone())
        .ok_or_else(|| {
            tracing::info!(username = %input.username, "sign-in rejected");
            error(StatusCode::UNAUTHORIZED, "Bad credentials")
        })?;

    let token = Uuid::new_v4().to_string();
    db.tokens.insert(token.clone(), input.username.clone());
    tracing::info!(username = %input.username, "signed in");
    Ok(Json(JwtResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        username: input.username,
        email,
    }))
}

async fn sign_up(
    State(state): State<AppState>,
    Json(input): Json<SignUpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if input.username.trim().is_empty() || input.email.trim().is_empty() || input.password.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Error: All fields are required!"));
    }

    let mut db = state.db.write().await;
    if db.users.contains_key(&input.username) {
        return Err(error(StatusCode::BAD_REQUEST, "Error: Username is already taken!"));
    }
    if db.users.values().any(|user| user.email == input.email) {
        return Err(error(StatusCode::BAD_REQUEST, "Error: Email is already in use!"));
    }

    db.users.insert(
        input.username.clone(),
        User {
            email: input.email,
            password: input.password,
        },
    );
    tracing::info!(username = %input.username, "registered user");
    Ok(Json(MessageResponse {
        message: "User registered successfully!".to_string(),
    }))
}

async fn test_connection() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Server is running".to_string(),
    })
}

/// Resolve the bearer token in `headers` to a username.
fn authorize(db: &Db, headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| db.tokens.get(token))
        .cloned()
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, ApiError> {
    let db = state.db.read().await;
    let user = authorize(&db, &headers)?;
    Ok(Json(
        db.tasks
            .iter()
            .filter(|owned| owned.owner == user)
            .map(|owned| owned.task.clone())
            .collect(),
    ))
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<TaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut db = state.db.write().await;
    let user = authorize(&db, &headers)?;
    if input.title.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Title is required"));
    }

    db.next_id += 1;
    let task = Task {
        id: db.next_id,
        title: input.title,
        description: input.description.unwrap_or_default(),
        status: input.status.unwrap_or_default(),
        priority: input.priority.unwrap_or_default(),
        created_at: Utc::now(),
    };
    db.tasks.push(OwnedTask {
        owner: user,
        task: task.clone(),
    });
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<TaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut db = state.db.write().await;
    let user = authorize(&db, &headers)?;
    if input.title.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Title is required"));
    }

    let task = db
        .tasks
        .iter_mut()
        .find(|owned| owned.task.id == id && owned.owner == user)
        .map(|owned| &mut owned.task)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Task not found"))?;
    task.title = input.title;
    task.description = input.description.unwrap_or_default();
    if let Some(status) = input.status {
        task.status = status;
    }
    if let Some(priority) = input.priority {
        task.priority = priority;
    }
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut db = state.db.write().await;
    let user = authorize(&db, &headers)?;
    let index = db
        .tasks
        .iter()
        .position(|owned| owned.task.id == id && owned.owner == user)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "Task not found"))?;
    db.tasks.remove(index);
    Ok(StatusCode::OK)
}
