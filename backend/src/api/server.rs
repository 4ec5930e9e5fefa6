//! HTTP server for the qsf-flow API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                                  |
//! |--------|-------------------|----------------------------------------------|
//! | GET    | `/health`         | Health check                                 |
//! | POST   | `/api/convert`    | QSF upload to flow document (no API calls)   |
//! | POST   | `/api/statistics` | Question counts of a QSF upload              |
//! | POST   | `/api/publish`    | Convert and create the flow on the platform  |
//! | POST   | `/api/campaign`   | Create a link campaign and attach a flow     |
//! | POST   | `/api/reshape`    | Response export to bulk import rows          |
//! | GET    | `/api/logs`       | SSE stream for real-time logs                |
//!
//! Endpoints that call the platform need a configured API token; without one
//! they answer 400 and the offline endpoints keep working.

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{
    error_response, CampaignRequest, CampaignResponse, ConvertResponse, PublishResponse,
    ReshapeResponse, StatisticsResponse,
};
use crate::client::FlowApiClient;
use crate::error::{PipelineError, QsfError, ServerError, ServerResult};
use crate::models::{AccountSession, ColumnMapping, FlowDocument, ImportContext, LanguageCatalog, SurveyDocument};
use crate::transform::mapper::FlowOptions;
use crate::transform::pipeline::{convert_survey, create_campaign, load_catalog, publish_survey, reshape_responses};
use crate::transform::statistics::aggregate;

/// Shared handler state.
#[derive(Clone, Default)]
pub struct AppState {
    client: Option<Arc<FlowApiClient>>,
}

impl AppState {
    pub fn new(client: Option<FlowApiClient>) -> Self {
        Self {
            client: client.map(Arc::new),
        }
    }

    fn client(&self) -> ServerResult<&FlowApiClient> {
        self.client
            .as_deref()
            .ok_or_else(|| ServerError::BadRequest("API token not configured on the server".into()))
    }

    async fn session(&self) -> ServerResult<(&FlowApiClient, AccountSession)> {
        let client = self.client()?;
        let session = client
            .complete_login()
            .await
            .map_err(|e| ServerError::Pipeline(e.into()))?;
        Ok((client, session))
    }
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_)
            | ServerError::Pipeline(PipelineError::EmptyCampaignName)
            | ServerError::Pipeline(PipelineError::MissingFlowId) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Qsf(_))
            | ServerError::Pipeline(PipelineError::Csv(_))
            | ServerError::Pipeline(PipelineError::Convert(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(PipelineError::Api(_))
            | ServerError::Pipeline(PipelineError::AssignFailed { .. }) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        eprintln!("❌ {}", self);
        let mut body = error_response(&self.to_string());
        if let ServerError::Pipeline(PipelineError::AssignFailed { channel_id, .. }) = &self {
            body["channelId"] = json!(channel_id);
        }
        (status, Json(body)).into_response()
    }
}

/// Build the router. Split from [`start_server`] for tests.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/convert", post(convert))
        .route("/api/statistics", post(statistics))
        .route("/api/publish", post(publish))
        .route("/api/campaign", post(campaign))
        .route("/api/reshape", post(reshape))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, client: Option<FlowApiClient>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ref client) = client {
        println!("🌐 Platform: {}", client.config().base_url);
    } else {
        println!("⚠️  No API token: publish and campaign endpoints disabled");
    }

    let app = router(AppState::new(client));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 qsf-flow server running on http://localhost:{}", port);
    println!("   POST /api/convert    - QSF to flow document");
    println!("   POST /api/statistics - Question counts");
    println!("   POST /api/publish    - Create flow");
    println!("   POST /api/campaign   - Create link campaign");
    println!("   POST /api/reshape    - Response CSV to import CSV");
    println!("   GET  /api/logs       - SSE log stream");
    println!("   GET  /health         - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "qsf-flow",
        "version": env!("CARGO_PKG_VERSION"),
        "platform": state.client.as_ref().map(|c| c.config().base_url.clone()),
        "endpoints": {
            "convert": "POST /api/convert",
            "statistics": "POST /api/statistics",
            "publish": "POST /api/publish",
            "campaign": "POST /api/campaign",
            "reshape": "POST /api/reshape",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip the missed entries.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Multipart fields by name. Later fields with the same name win.
struct Form {
    fields: HashMap<String, Vec<u8>>,
    file_name: Option<String>,
}

impl Form {
    async fn read(mut multipart: Multipart) -> ServerResult<Self> {
        let mut fields = HashMap::new();
        let mut file_name = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                file_name = field.file_name().map(|s| s.to_string());
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            fields.insert(name, bytes.to_vec());
        }

        Ok(Self { fields, file_name })
    }

    fn file(&self) -> ServerResult<&[u8]> {
        self.fields
            .get("file")
            .map(Vec::as_slice)
            .ok_or_else(|| ServerError::BadRequest("No file provided".into()))
    }

    /// Text field, trimmed; blank counts as absent.
    fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|b| String::from_utf8_lossy(b).trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn required(&self, name: &str) -> ServerResult<String> {
        self.text(name)
            .ok_or_else(|| ServerError::BadRequest(format!("Missing field: {}", name)))
    }

    fn survey(&self) -> ServerResult<SurveyDocument> {
        log_info(format!(
            "📄 Upload: {} ({} bytes)",
            self.file_name.as_deref().unwrap_or("unknown"),
            self.file()?.len()
        ));
        let content = String::from_utf8_lossy(self.file()?);
        let survey = SurveyDocument::from_json(&content).map_err(PipelineError::from)?;
        Ok(survey)
    }

    fn flow_options(&self, survey: &SurveyDocument) -> FlowOptions {
        match self.text("name") {
            Some(name) => FlowOptions::new(name),
            None => FlowOptions::for_survey(survey),
        }
    }
}

async fn convert(State(state): State<AppState>, multipart: Multipart) -> ServerResult<Json<ConvertResponse>> {
    let form = Form::read(multipart).await?;
    let survey = form.survey()?;

    let catalog = match state.client.as_deref() {
        Some(client) => load_catalog(client).await,
        None => LanguageCatalog::new(),
    };

    let result = convert_survey(&survey, &catalog, &form.flow_options(&survey))?;
    Ok(Json(ConvertResponse::new(result, aggregate(&survey))))
}

async fn statistics(multipart: Multipart) -> ServerResult<Json<StatisticsResponse>> {
    let form = Form::read(multipart).await?;
    let survey = form.survey()?;
    Ok(Json(StatisticsResponse::new(survey.name(), aggregate(&survey))))
}

async fn publish(State(state): State<AppState>, multipart: Multipart) -> ServerResult<Json<PublishResponse>> {
    let form = Form::read(multipart).await?;
    let survey = form.survey()?;
    let (client, session) = state.session().await?;

    let options = form.flow_options(&survey).with_parent_node(&session.account.id);
    let outcome = publish_survey(client, client.config(), &survey, &options, &session.node.id).await?;

    Ok(Json(PublishResponse::new(outcome, aggregate(&survey))))
}

async fn campaign(
    State(state): State<AppState>,
    Json(request): Json<CampaignRequest>,
) -> ServerResult<Json<CampaignResponse>> {
    let (client, session) = state.session().await?;
    let outcome = create_campaign(
        client,
        client.config(),
        &request.name,
        &session.node.id,
        &request.flow_id,
    )
    .await?;

    Ok(Json(outcome.into()))
}

async fn reshape(multipart: Multipart) -> ServerResult<Json<ReshapeResponse>> {
    let form = Form::read(multipart).await?;

    let context = ImportContext {
        node_id: form.required("nodeId")?,
        flow_id: form.required("flowId")?,
        language: form.required("language")?,
    };

    let mapping = match form.text("mapping").as_deref() {
        None | Some("auto") => None,
        Some(raw) => Some(
            serde_json::from_str::<ColumnMapping>(raw)
                .map_err(|e| ServerError::BadRequest(format!("Invalid mapping: {}", e)))?,
        ),
    };

    let question_keys = match form.text("flow") {
        Some(raw) => FlowDocument::from_json(&raw)
            .map_err(|e| PipelineError::Qsf(QsfError::InvalidDocument(e)))?
            .question_keys(),
        None => Vec::new(),
    };

    let outcome = reshape_responses(form.file()?, mapping, &question_keys, &context)?;
    Ok(Json(outcome.into()))
}
