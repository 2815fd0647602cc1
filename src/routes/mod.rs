//! API routes

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::analysis::{
    export, AnalysisError, AnalysisResult, Entity, ExportError, ExportPayload, SearchHit,
    SentimentScore,
};
use crate::config::prompts::UnknownTone;
use crate::conversation::ChatMode;
use crate::core::{
    ChatError, ChatResponse, DocumentInfo, SessionSnapshot, SettingsUpdate, TranscriptEntry,
};
use crate::document::Document;
use crate::providers::CompletionError;
use crate::AppState;

/// Largest PDF accepted by the upload route
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Settings(#[from] UnknownTone),

    #[error("No document loaded. Upload a PDF first.")]
    NoDocument,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Chat(ChatError::EmptyPrompt) => StatusCode::BAD_REQUEST,
            ApiError::Chat(ChatError::NoDocument) | ApiError::NoDocument => StatusCode::NOT_FOUND,
            ApiError::Chat(ChatError::Completion(CompletionError::Timeout)) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            ApiError::Chat(ChatError::Completion(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Analysis(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Settings(_) => StatusCode::BAD_REQUEST,
            ApiError::Export(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Chat(e) => e.kind(),
            ApiError::Analysis(e) => e.kind(),
            ApiError::Export(_) => "export_failed",
            ApiError::Settings(_) => "unknown_tone",
            ApiError::NoDocument => "no_document",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ {} [{}]", self, self.kind());
        }
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub mode: Option<ChatMode>,
}

/// Export payload plus a ready-to-use download link
#[derive(Debug, Serialize)]
pub struct Download {
    #[serde(flatten)]
    pub payload: ExportPayload,
    pub href: String,
}

impl From<ExportPayload> for Download {
    fn from(payload: ExportPayload) -> Self {
        let href = payload.data_uri();
        Self { payload, href }
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentText {
    pub document_id: Uuid,
    pub text: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn session_snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.lock().await.snapshot())
}

async fn reset_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.reset_conversations();
    tracing::info!("🔄 Conversations reset");
    Json(session.snapshot())
}

async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<SessionSnapshot> {
    let mut session = state.session.lock().await;
    session.apply_settings(update)?;
    tracing::debug!("Settings updated: tone={}, endpoint={}", session.tone, session.api_url);
    Ok(Json(session.snapshot()))
}

async fn submit(state: &AppState, mode: ChatMode, request: ChatRequest) -> ApiResult<ChatResponse> {
    // overlapping submissions wait here and run in arrival order
    let mut session = state.session.lock().await;
    let response = state
        .chat_engine
        .chat(&mut session, mode, &request.prompt)
        .await?;
    Ok(Json(response))
}

async fn general_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    submit(&state, ChatMode::General, request).await
}

async fn document_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    submit(&state, ChatMode::Document, request).await
}

async fn general_transcript(State(state): State<AppState>) -> Json<Vec<TranscriptEntry>> {
    Json(state.session.lock().await.transcript(ChatMode::General))
}

async fn document_transcript(State(state): State<AppState>) -> Json<Vec<TranscriptEntry>> {
    Json(state.session.lock().await.transcript(ChatMode::Document))
}

async fn upload_document(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<DocumentInfo> {
    tracing::info!("📥 Received upload ({} bytes)", body.len());

    // extraction is CPU bound and runs without holding the session
    let document = tokio::task::spawn_blocking(move || Document::from_pdf(body.to_vec()))
        .await
        .map_err(|e| ApiError::Internal(format!("extraction task failed: {}", e)))??;

    let info = DocumentInfo::from(&document);
    state.session.lock().await.replace_document(document);
    Ok(Json(info))
}

async fn current_document(state: &AppState) -> Result<Arc<Document>, ApiError> {
    state.session.lock().await.document().ok_or(ApiError::NoDocument)
}

async fn document_text(State(state): State<AppState>) -> ApiResult<DocumentText> {
    let doc = current_document(&state).await?;
    Ok(Json(DocumentText {
        document_id: doc.id,
        text: doc.text().to_string(),
    }))
}

/// Run the tagger on the blocking pool
async fn tag_entities(
    state: &AppState,
    doc: Arc<Document>,
) -> Result<AnalysisResult<Vec<Entity>>, ApiError> {
    let analyzer = Arc::clone(&state.analyzer);
    tokio::task::spawn_blocking(move || analyzer.entities(&doc))
        .await
        .map_err(|e| ApiError::Internal(format!("entity tagging task failed: {}", e)))
}

async fn document_entities(State(state): State<AppState>) -> ApiResult<AnalysisResult<Vec<Entity>>> {
    let doc = current_document(&state).await?;
    Ok(Json(tag_entities(&state, doc).await?))
}

async fn document_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<AnalysisResult<Vec<SearchHit>>> {
    let doc = current_document(&state).await?;
    Ok(Json(state.analyzer.search(&doc, &query.q)))
}

async fn document_sentiment(
    State(state): State<AppState>,
) -> ApiResult<AnalysisResult<SentimentScore>> {
    let doc = current_document(&state).await?;
    Ok(Json(state.analyzer.sentiment(&doc)))
}

async fn export_conversation(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Download> {
    let mode = query.mode.unwrap_or(ChatMode::General);
    let session = state.session.lock().await;
    Ok(Json(export::conversation_json(session.thread(mode))?.into()))
}

async fn export_entities(State(state): State<AppState>) -> ApiResult<Download> {
    let doc = current_document(&state).await?;
    let entities = tag_entities(&state, doc).await?;
    Ok(Json(export::entities_csv(&entities.value)?.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/v1/session", get(session_snapshot))
        .route("/v1/session/reset", post(reset_session))
        .route("/v1/settings", put(update_settings))
        .route("/v1/chat", get(general_transcript).post(general_chat))
        .route(
            "/v1/document",
            put(upload_document).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/v1/document/text", get(document_text))
        .route(
            "/v1/document/chat",
            get(document_transcript).post(document_chat),
        )
        .route("/v1/document/entities", get(document_entities))
        .route("/v1/document/search", get(document_search))
        .route("/v1/document/sentiment", get(document_sentiment))
        .route("/v1/export/conversation", get(export_conversation))
        .route("/v1/export/entities", get(export_entities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::providers::scripted::ScriptedClient;

    fn app(client: ScriptedClient) -> (Router, AppState) {
        let state = AppState::new(&Config::default(), Arc::new(client));
        (router().with_state(state.clone()), state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn load_text(state: &AppState, text: &str) {
        state
            .session
            .lock()
            .await
            .replace_document(Document::from_pages(Vec::new(), [text]));
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(ScriptedClient::new());
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_general_chat_and_transcript() {
        let (app, _) = app(ScriptedClient::new().reply("Hi there"));

        let (status, body) =
            send(&app, Method::POST, "/v1/chat", Some(json!({ "prompt": "Hello" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hi there");
        assert_eq!(body["mode"], "general");
        assert_eq!(body["interaction"], 1);

        let (_, transcript) = send(&app, Method::GET, "/v1/chat", None).await;
        let transcript = transcript.as_array().unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1]["speaker"], "Alfred AI");
    }

    #[tokio::test]
    async fn test_completion_failures_map_to_gateway_errors() {
        let (app, state) = app(
            ScriptedClient::new()
                .fail(CompletionError::Timeout)
                .fail(CompletionError::Http {
                    status: 500,
                    body: "boom".into(),
                }),
        );

        let (status, body) =
            send(&app, Method::POST, "/v1/chat", Some(json!({ "prompt": "Hello" }))).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["kind"], "timeout");
        assert_eq!(body["error"], "The request timed out. Please try again.");

        let (status, body) =
            send(&app, Method::POST, "/v1/chat", Some(json!({ "prompt": "Again" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "http_error");

        let snapshot = state.session.lock().await.snapshot();
        assert_eq!(snapshot.interaction_count, 2);
        assert_eq!(snapshot.general_turns, 3);
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let (app, _) = app(ScriptedClient::new());
        let (status, body) =
            send(&app, Method::POST, "/v1/chat", Some(json!({ "prompt": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "empty_prompt");
    }

    #[tokio::test]
    async fn test_document_routes_require_document() {
        let (app, _) = app(ScriptedClient::new());

        for uri in [
            "/v1/document/text",
            "/v1/document/entities",
            "/v1/document/search?q=x",
            "/v1/document/sentiment",
            "/v1/export/entities",
        ] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body["kind"], "no_document");
        }

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/document/chat",
            Some(json!({ "prompt": "Summarize" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_upload_keeps_previous_document() {
        let (app, state) = app(ScriptedClient::new());
        load_text(&state, "Original text").await;

        let request = Request::builder()
            .method(Method::PUT)
            .uri("/v1/document")
            .body(Body::from("definitely not a pdf"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = send(&app, Method::GET, "/v1/document/text", None).await;
        assert_eq!(body["text"], "Original text");
    }

    #[tokio::test]
    async fn test_document_analysis_routes() {
        let (app, state) = app(ScriptedClient::new());
        load_text(
            &state,
            "Apple reported great results. Analysts at Apple were happy with the excellent quarter.",
        )
        .await;

        let (status, body) = send(&app, Method::GET, "/v1/document/search?q=apple", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"].as_array().unwrap().len(), 2);
        assert_eq!(body["value"][0]["offset"], 0);

        let (_, body) = send(&app, Method::GET, "/v1/document/search?q=", None).await;
        assert!(body["value"].as_array().unwrap().is_empty());

        let (status, body) = send(&app, Method::GET, "/v1/document/sentiment", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["value"]["polarity"].as_f64().unwrap() > 0.0);

        let (status, body) = send(&app, Method::GET, "/v1/document/entities", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["value"].is_array());
    }

    #[tokio::test]
    async fn test_document_chat_route() {
        let (app, state) = app(ScriptedClient::new().reply("A short memo."));
        load_text(&state, "Memo: the meeting moved to Friday.").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/document/chat",
            Some(json!({ "prompt": "What is this?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "document");

        let (_, transcript) = send(&app, Method::GET, "/v1/document/chat", None).await;
        assert_eq!(transcript.as_array().unwrap().len(), 2);

        let (_, general) = send(&app, Method::GET, "/v1/chat", None).await;
        assert!(general.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settings_update() {
        let (app, _) = app(ScriptedClient::new());

        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/settings",
            Some(json!({ "tone": "Friendly", "user_name": "Bruce" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tone"], "Friendly");
        assert_eq!(body["user_name"], "Bruce");

        let (status, body) =
            send(&app, Method::PUT, "/v1/settings", Some(json!({ "tone": "Sarcastic" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "unknown_tone");
    }

    #[tokio::test]
    async fn test_export_conversation_and_reset() {
        let (app, _) = app(ScriptedClient::new().reply("Hi there"));
        send(&app, Method::POST, "/v1/chat", Some(json!({ "prompt": "Hello" }))).await;

        let (status, body) = send(&app, Method::GET, "/v1/export/conversation", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "conversation_history.json");
        assert!(body["href"]
            .as_str()
            .unwrap()
            .starts_with("data:file/json;base64,"));
        let payload: ExportPayload = serde_json::from_value(body).unwrap();
        let turns: Vec<Value> = serde_json::from_slice(&payload.decode().unwrap()).unwrap();
        assert_eq!(turns.len(), 3);

        let (_, snapshot) = send(&app, Method::POST, "/v1/session/reset", None).await;
        assert_eq!(snapshot["general_turns"], 1);
        assert_eq!(snapshot["interaction_count"], 1);
    }

    #[tokio::test]
    async fn test_entities_route_handles_dense_document() {
        let (app, state) = app(ScriptedClient::new());
        load_text(&state, &"42 ".repeat(20_000)).await;

        let (status, body) = send(&app, Method::GET, "/v1/document/entities", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"].as_array().unwrap().len(), 20_000);
        assert_eq!(body["value"][0]["label"], "CARDINAL");
    }

    #[tokio::test]
    async fn test_export_entities() {
        let (app, state) = app(ScriptedClient::new());
        load_text(&state, "Sales rose 12% in March.").await;

        let (status, body) = send(&app, Method::GET, "/v1/export/entities", None).await;
        assert_eq!(status, StatusCode::OK);
        let payload: ExportPayload = serde_json::from_value(body).unwrap();
        let csv = String::from_utf8(payload.decode().unwrap()).unwrap();
        assert!(csv.starts_with("Entity,Type,Color\n"));
        assert!(csv.contains("12%,PERCENT,black"));
    }
}
