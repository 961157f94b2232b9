// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Customer API
//!
//! HTTP surface for the engagement owner: project creation, status,
//! deliverables, approvals, interrupt answers, chat and the SSE event
//! stream. Every project route enforces owner-only access: the caller's
//! identity (the `x-cadence-owner` header, established by the fronting
//! proxy — authentication itself is out of scope) must equal the ledger's
//! `owner_id`.
//!
//! Client misuse (bad enum values, missing approval tokens, unknown ids)
//! is rejected here and never reaches the orchestration core.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::application::workflow_driver::WorkflowDriver;
use crate::application::{
    ApprovalService, BoardService, InterruptService, LedgerService, ServiceError,
};
use crate::domain::approval::ApprovalAction;
use crate::domain::chat::ChatMessage;
use crate::domain::events::ProjectEvent;
use crate::domain::interrupt::InterruptId;
use crate::domain::ledger::{FactRecord, LedgerEntry, ProjectId, TaskLedger};
use crate::domain::phase::{Phase, PhaseStatus};
use crate::domain::repository::ChatRepository;
use crate::infrastructure::event_bus::ProjectEventBus;

const OWNER_HEADER: &str = "x-cadence-owner";

pub struct AppState {
    pub ledgers: LedgerService,
    pub approvals: ApprovalService,
    pub interrupts: InterruptService,
    pub board: BoardService,
    pub chat: Arc<dyn ChatRepository>,
    pub events: ProjectEventBus,
    pub driver: Arc<dyn WorkflowDriver>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/projects", post(create_project))
        .route("/projects/{id}/status", get(project_status))
        .route("/projects/{id}/deliverables", get(list_deliverables))
        .route("/projects/{id}/phases/{phase}/approval", post(submit_approval))
        .route(
            "/internal/projects/{id}/phases/{phase}/approval-token",
            post(store_approval_token),
        )
        .route("/projects/{id}/interrupts", get(list_interrupts))
        .route("/projects/{id}/interrupts/{interrupt_id}/answer", post(answer_interrupt))
        .route("/projects/{id}/tasks", get(list_tasks))
        .route("/projects/{id}/chat", get(list_chat).post(post_chat))
        .route("/projects/{id}/events", get(stream_events))
        .with_state(state)
}

// ============================================================================
// Error mapping
// ============================================================================

pub enum ApiError {
    BadRequest(String),
    Forbidden,
    NotFound(String),
    Upstream(String),
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::TaskNotFound(..) | ServiceError::InterruptNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            _ if err.is_client_error() => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "not the project owner".to_string()),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Upstream(m) => (StatusCode::BAD_GATEWAY, m),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ============================================================================
// Guards & parsing helpers
// ============================================================================

fn parse_project_id(raw: &str) -> Result<ProjectId, ApiError> {
    ProjectId::from_string(raw).map_err(|_| ApiError::BadRequest("invalid project id".into()))
}

fn parse_phase(raw: &str) -> Result<Phase, ApiError> {
    raw.parse().map_err(|_| ApiError::BadRequest(format!("invalid phase: {}", raw)))
}

fn caller_identity(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(OWNER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Forbidden)
}

/// Load the ledger and verify the caller owns the project.
async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    project_id: ProjectId,
) -> Result<TaskLedger, ApiError> {
    let caller = caller_identity(headers)?;
    if !state.ledgers.exists(project_id).await? {
        return Err(ApiError::NotFound(format!("project {}", project_id)));
    }
    let ledger = state.ledgers.read(project_id).await?;
    if ledger.owner_id != caller {
        return Err(ApiError::Forbidden);
    }
    Ok(ledger)
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
struct CreateProjectRequest {
    project_name: String,
    customer: String,
    /// Statement-of-work text, recorded as the ledger's first fact.
    #[serde(default)]
    sow: String,
}

async fn create_project(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = caller_identity(&headers)?;
    if body.project_name.trim().is_empty() {
        return Err(ApiError::BadRequest("project_name is required".into()));
    }

    let project_id = ProjectId::new();
    let mut ledger = TaskLedger::new(project_id, &body.project_name, &body.customer, owner);
    if !body.sow.trim().is_empty() {
        ledger
            .append(
                crate::domain::ledger::LedgerSection::Facts,
                LedgerEntry::Fact(FactRecord {
                    description: body.sow.clone(),
                    source: "statement-of-work".to_string(),
                    recorded_at: Utc::now(),
                }),
            )
            .map_err(ServiceError::from)?;
    }
    state.ledgers.write(&ledger).await?;

    state.events.publish(ProjectEvent::ProjectCreated {
        project_id,
        project_name: ledger.project_name.clone(),
        customer: ledger.customer.clone(),
        created_at: ledger.created_at,
    });
    Ok((StatusCode::CREATED, Json(json!({ "project_id": project_id }))))
}

async fn project_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    let ledger = authorize(&state, &headers, project_id).await?;
    Ok(Json(json!({
        "project_id": ledger.project_id,
        "project_name": ledger.project_name,
        "customer": ledger.customer,
        "current_phase": ledger.current_phase,
        "phase_status": ledger.phase_status,
        "facts": ledger.facts.len(),
        "assumptions": ledger.assumptions.len(),
        "decisions": ledger.decisions.len(),
        "blockers": ledger.blockers.len(),
        "created_at": ledger.created_at,
        "updated_at": ledger.updated_at,
    })))
}

async fn list_deliverables(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    let ledger = authorize(&state, &headers, project_id).await?;
    Ok(Json(json!({ "deliverables": ledger.deliverables })))
}

#[derive(Deserialize)]
struct StoreTokenRequest {
    task_token: String,
}

/// Driver-facing: park the workflow engine's resume token when a phase
/// submission goes out for customer review. Not owner-gated — this path is
/// exposed on the internal listener only, never to customers.
async fn store_approval_token(
    State(state): State<Arc<AppState>>,
    Path((id, phase)): Path<(String, String)>,
    Json(body): Json<StoreTokenRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    let phase = parse_phase(&phase)?;
    if !state.ledgers.exists(project_id).await? {
        return Err(ApiError::NotFound(format!("project {}", project_id)));
    }
    if body.task_token.is_empty() {
        return Err(ApiError::BadRequest("task_token is required".into()));
    }

    state.approvals.store(project_id, phase, &body.task_token).await?;
    state
        .ledgers
        .set_phase_status(project_id, phase, PhaseStatus::AwaitingApproval)
        .await?;
    Ok(Json(json!({ "phase": phase, "phase_status": PhaseStatus::AwaitingApproval })))
}

#[derive(Deserialize)]
struct ApprovalRequest {
    action: ApprovalAction,
    #[serde(default)]
    feedback: Option<String>,
}

/// Approve or request revision of a submitted phase. Consumes exactly one
/// stored approval token; with no token pending this is a 404, never a
/// silent success.
async fn submit_approval(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, phase)): Path<(String, String)>,
    Json(body): Json<ApprovalRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    let phase = parse_phase(&phase)?;
    authorize(&state, &headers, project_id).await?;

    let token = state
        .approvals
        .redeem(project_id, phase)
        .await?
        .ok_or_else(|| ApiError::NotFound("no pending approval for this phase".into()))?;

    state
        .driver
        .report_success(
            &token.task_token,
            json!({
                "project_id": project_id,
                "phase": phase,
                "action": body.action,
                "feedback": body.feedback,
            }),
        )
        .await
        .map_err(|e| ApiError::Upstream(format!("workflow driver callback failed: {:#}", e)))?;

    let status = match body.action {
        ApprovalAction::Approve => PhaseStatus::Approved,
        ApprovalAction::Revise => PhaseStatus::InProgress,
    };
    state.ledgers.set_phase_status(project_id, phase, status).await?;
    Ok(Json(json!({ "action": body.action, "phase": phase })))
}

async fn list_interrupts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    authorize(&state, &headers, project_id).await?;
    let interrupts = state.interrupts.list(project_id).await?;
    Ok(Json(json!({ "interrupts": interrupts })))
}

#[derive(Deserialize)]
struct AnswerRequest {
    response: String,
}

async fn answer_interrupt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, interrupt_id)): Path<(String, String)>,
    Json(body): Json<AnswerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    let interrupt_id = InterruptId::from_string(&interrupt_id)
        .map_err(|_| ApiError::BadRequest("invalid interrupt id".into()))?;
    authorize(&state, &headers, project_id).await?;

    let interrupt = state.interrupts.answer(project_id, interrupt_id, &body.response).await?;
    Ok(Json(json!({
        "interrupt_id": interrupt.id,
        "status": interrupt.status,
        "answered_at": interrupt.answered_at,
    })))
}

#[derive(Deserialize)]
struct TaskListQuery {
    phase: Option<String>,
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    authorize(&state, &headers, project_id).await?;
    let phase = query.phase.as_deref().map(parse_phase).transpose()?;
    let tasks = state.board.list(project_id, phase).await?;
    Ok(Json(json!({ "tasks": tasks })))
}

#[derive(Deserialize)]
struct ChatPostRequest {
    content: String,
}

async fn post_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<ChatPostRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    let ledger = authorize(&state, &headers, project_id).await?;

    let message = ChatMessage::new(&ledger.owner_id, &body.content);
    state
        .chat
        .append(project_id, &message)
        .await
        .map_err(ServiceError::from)?;
    state.events.publish(ProjectEvent::ChatMessagePosted {
        project_id,
        message_id: message.id,
        author: message.author.clone(),
        posted_at: message.created_at,
    });
    Ok(Json(json!({ "message_id": message.id })))
}

async fn list_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_project_id(&id)?;
    authorize(&state, &headers, project_id).await?;
    let messages = state.chat.list(project_id).await.map_err(ServiceError::from)?;
    Ok(Json(json!({ "messages": messages })))
}

/// Live project event stream (SSE). Best-effort: lagged receivers drop old
/// events and carry on.
async fn stream_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let project_id = parse_project_id(&id)?;
    authorize(&state, &headers, project_id).await?;

    let stream = BroadcastStream::new(state.events.raw_subscribe()).filter_map(move |item| {
        match item {
            Ok(event) if event.project_id() == project_id => {
                match serde_json::to_string(&event) {
                    Ok(data) => Some(Ok(Event::default().data(data))),
                    Err(e) => {
                        warn!("Failed to serialize project event: {}", e);
                        None
                    }
                }
            }
            Ok(_) => None,
            // Lagged receivers skip dropped events and keep streaming.
            Err(_) => None,
        }
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
