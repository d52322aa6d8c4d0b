//! HTTP API over a shared [`Workspace`].
//!
//! Handlers lock the workspace only for the synchronous part of their work.
//! Login snapshots the users, releases the lock, sleeps through the
//! simulated latency and then locks again to sign in.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post, put},
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::AuthGate;
use crate::error::{ApiError, ApiResult, AuthError};
use crate::query::{BoardFilter, SortDirection, SortKey, TaskFilter, TaskSort};
use crate::types::{BehaviorAction, Project, TaskPatch, TaskPriority, TaskStatus, User};
use crate::workspace::{TaskDraft, Workspace};

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    workspace: Arc<Mutex<Workspace>>,
    gate: AuthGate,
}

impl AppState {
    pub fn new(workspace: Workspace, gate: AuthGate) -> Self {
        Self {
            workspace: Arc::new(Mutex::new(workspace)),
            gate,
        }
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, Workspace>> {
        self.workspace
            .lock()
            .map_err(|_| ApiError::internal("workspace lock poisoned"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Session

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct SessionResponse {
    user: Option<User>,
    selected_project: Option<Project>,
}

fn session_response(workspace: &Workspace) -> SessionResponse {
    SessionResponse {
        user: workspace.current_user().cloned(),
        selected_project: workspace.selected_project().cloned(),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(ApiError::missing_field("email"));
    }
    if request.password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }

    let users = state.lock()?.store().users().to_vec();
    let (user, ticket) = state
        .gate
        .login_with_ticket(&users, email, &request.password)
        .await?;

    let mut workspace = state.lock()?;
    // A logout may have run between the login finishing and taking the lock
    if !state.gate.is_current(ticket) {
        return Err(AuthError::Superseded.into());
    }
    workspace.sign_in(user);
    Ok(Json(session_response(&workspace)))
}

async fn logout(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.gate.cancel_pending();
    state.lock()?.logout();
    Ok(StatusCode::NO_CONTENT)
}

async fn session(State(state): State<AppState>) -> ApiResult<Json<SessionResponse>> {
    Ok(Json(session_response(&*state.lock()?)))
}

// ---------------------------------------------------------------------------
// Projects

#[derive(Serialize)]
struct ProjectsResponse {
    selected: Option<String>,
    projects: Vec<Project>,
}

async fn projects(State(state): State<AppState>) -> ApiResult<Json<ProjectsResponse>> {
    let workspace = state.lock()?;
    Ok(Json(ProjectsResponse {
        selected: workspace.selected_project().map(|p| p.id.clone()),
        projects: workspace.visible_projects()?.into_iter().cloned().collect(),
    }))
}

#[derive(Deserialize)]
struct SelectProjectRequest {
    #[serde(default)]
    project_id: Option<String>,
}

async fn select_project(
    State(state): State<AppState>,
    Json(request): Json<SelectProjectRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let mut workspace = state.lock()?;
    workspace.set_selected_project(request.project_id.as_deref())?;
    Ok(Json(session_response(&workspace)))
}

// ---------------------------------------------------------------------------
// Tasks

/// Query string of the task list. Filters accept `all` for "no filter".
#[derive(Debug, Default, Deserialize)]
struct TaskListParams {
    search: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    assignee: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
}

fn active(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != "all")
}

fn parse_status(value: Option<&str>) -> ApiResult<Option<TaskStatus>> {
    active(value)
        .map(|v| {
            TaskStatus::from_str(v)
                .ok_or_else(|| ApiError::invalid_value("status", &format!("Unknown status '{}'", v)))
        })
        .transpose()
}

fn parse_priority(value: Option<&str>) -> ApiResult<Option<TaskPriority>> {
    active(value)
        .map(|v| {
            TaskPriority::from_str(v).ok_or_else(|| {
                ApiError::invalid_value("priority", &format!("Unknown priority '{}'", v))
            })
        })
        .transpose()
}

impl TaskListParams {
    fn filter(&self) -> ApiResult<TaskFilter> {
        Ok(TaskFilter {
            search: self.search.clone().unwrap_or_default(),
            status: parse_status(self.status.as_deref())?,
            priority: parse_priority(self.priority.as_deref())?,
            assignee_id: active(self.assignee.as_deref()).map(str::to_string),
        })
    }

    fn sort(&self) -> ApiResult<TaskSort> {
        let key = match self.sort.as_deref() {
            None => SortKey::default(),
            Some(s) => SortKey::from_str(s)
                .ok_or_else(|| ApiError::invalid_value("sort", &format!("Unknown sort key '{}'", s)))?,
        };
        let direction = match self.direction.as_deref() {
            None => SortDirection::default(),
            Some(d) => SortDirection::from_str(d).ok_or_else(|| {
                ApiError::invalid_value("direction", &format!("Unknown direction '{}'", d))
            })?,
        };
        Ok(TaskSort::new(key, direction))
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> ApiResult<impl IntoResponse> {
    let filter = params.filter()?;
    let sort = params.sort()?;
    let tasks = state.lock()?.visible_tasks(&filter, sort)?;
    Ok(Json(tasks))
}

async fn create_task(
    State(state): State<AppState>,
    Json(draft): Json<TaskDraft>,
) -> ApiResult<impl IntoResponse> {
    let task = state.lock()?.create_task(draft)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<impl IntoResponse> {
    let update = state.lock()?.update_task(&task_id, patch)?;
    Ok(Json(update))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let workspace = state.lock()?;
    let comments: Vec<_> = workspace.comments_for(&task_id)?.into_iter().cloned().collect();
    Ok(Json(comments))
}

#[derive(Deserialize)]
struct CommentRequest {
    #[serde(default)]
    content: String,
}

/// Blank content is accepted and ignored with `204 No Content`.
async fn add_comment(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> ApiResult<Response> {
    let comment = state.lock()?.add_comment(&task_id, &request.content)?;
    Ok(match comment {
        Some(comment) => (StatusCode::CREATED, Json(comment)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

async fn list_activity(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let workspace = state.lock()?;
    let logs: Vec<_> = workspace.activity_for(&task_id)?.into_iter().cloned().collect();
    Ok(Json(logs))
}

#[derive(Deserialize)]
struct BehaviorRequest {
    action: BehaviorAction,
    #[serde(default)]
    duration_ms: Option<u64>,
}

async fn track_behavior(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(request): Json<BehaviorRequest>,
) -> ApiResult<impl IntoResponse> {
    let entry = state
        .lock()?
        .track_behavior(&task_id, request.action, request.duration_ms)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

// ---------------------------------------------------------------------------
// Views

#[derive(Debug, Default, Deserialize)]
struct BoardParams {
    assignee: Option<String>,
    priority: Option<String>,
}

async fn board(
    State(state): State<AppState>,
    Query(params): Query<BoardParams>,
) -> ApiResult<impl IntoResponse> {
    let filter = BoardFilter {
        assignee_id: active(params.assignee.as_deref()).map(str::to_string),
        priority: parse_priority(params.priority.as_deref())?,
    };
    let columns = state.lock()?.board(filter)?;
    Ok(Json(columns))
}

#[derive(Debug, Default, Deserialize)]
struct CalendarParams {
    year: Option<i32>,
    month: Option<u32>,
}

async fn calendar(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> ApiResult<impl IntoResponse> {
    let today = Local::now().date_naive();
    let year = params.year.unwrap_or(today.year());
    let month = params.month.unwrap_or(today.month());
    if !(1..=12).contains(&month) {
        return Err(ApiError::invalid_value("month", "Month must be between 1 and 12"));
    }
    let days = state
        .lock()?
        .calendar(year, month, &Local)?
        .ok_or_else(|| ApiError::invalid_value("year", "Year is outside the supported range"))?;
    Ok(Json(days))
}

async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let report = state.lock()?.analytics(&Local::now())?;
    Ok(Json(report))
}

/// Build the axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/session", get(session))
        .route("/api/projects", get(projects))
        .route("/api/projects/selected", put(select_project))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{task_id}", patch(update_task))
        .route(
            "/api/tasks/{task_id}/comments",
            get(list_comments).post(add_comment),
        )
        .route("/api/tasks/{task_id}/activity", get(list_activity))
        .route("/api/tasks/{task_id}/behavior", post(track_behavior))
        .route("/api/board", get(board))
        .route("/api/calendar", get(calendar))
        .route("/api/metrics", get(metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A running server.
pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Signal graceful shutdown and wait for in-flight requests.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            error!("Server task failed: {}", e);
        }
    }
}

/// Bind `addr` and serve in the background.
pub async fn start_server(state: AppState, addr: &str) -> anyhow::Result<ServerHandle> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("TaskFlow API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx,
        task,
    })
}
