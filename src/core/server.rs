//! MCP server implementation.
//!
//! This module contains the core server implementation including:
//! - Tool-call envelope request/response structures
//! - Tool registry mapping tool names to handler functions
//! - The batch dispatcher with per-call error isolation
//! - HTTP route table and server bootstrap with Actix Web
//! - SSE heartbeat endpoint

use actix_web::{
    error, web, App, HttpRequest, HttpResponse, HttpServer, Result,
    http::header,
    middleware::{Compress, DefaultHeaders, Logger},
};
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::core::config::ServerConfig;
use crate::tools;

/// Batch of tool invocations posted to `/mcp/v1/execute`.
///
/// The order of `tool_calls` is significant: the response carries one entry
/// per call, in the same order.
#[derive(Deserialize, Debug)]
pub struct ToolCallRequest {
    pub tool_calls: Vec<ToolCall>,
}

/// A single named, parameterized invocation within a batch.
///
/// Every field is lenient: an absent field never fails the envelope parse,
/// it surfaces as a per-call error (or is ignored, for `id`) during
/// dispatch. Only a malformed envelope itself is a batch-wide failure.
#[derive(Deserialize, Debug)]
pub struct ToolCall {
    /// Opaque pass-through identifier. Not interpreted, not required to be
    /// unique, and not echoed back in the response.
    #[allow(dead_code)]
    #[serde(default)]
    pub id: String,
    /// Tool name, resolved against the registry at dispatch time. An
    /// absent name resolves like any other unknown name.
    #[serde(default)]
    pub name: String,
    /// Raw parameters, decoded later against the resolved tool's schema.
    /// `None` (field absent) becomes an invalid-parameters error for this
    /// call only.
    #[serde(default)]
    pub parameters: Option<Box<RawValue>>,
}

/// Ordered list of per-call outcomes, 1:1 with the request's `tool_calls`.
#[derive(Serialize, Debug)]
pub struct ToolCallBatchResponse {
    pub responses: Vec<ToolResponse>,
}

/// Outcome of a single tool call.
///
/// Serialized with a string discriminator to stay wire-compatible with
/// heterogeneous JSON: `{"type":"data","content":...}` or
/// `{"type":"error","content":"..."}`.
#[derive(Serialize, Debug)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ToolResponse {
    /// Successful execution; carries the tool's structured payload.
    Data(serde_json::Value),
    /// Per-call failure; carries a human-readable message.
    Error(String),
}

/// Why a single tool call failed.
///
/// These never abort the batch: the dispatcher converts them into
/// `ToolResponse::Error` entries and keeps going.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid parameters: {0}")]
    InvalidParameters(#[from] serde_json::Error),
    #[error("Invalid parameters: missing parameters field")]
    MissingParameters,
}

/// Tool descriptor returned by the `/mcp/v1/tools` catalog endpoint.
#[derive(Serialize, Debug, Clone)]
pub struct ToolDescriptor {
    /// Unique tool identifier (e.g., "ask_question")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema defining the tool's parameters
    pub parameters: serde_json::Value,
}

/// Tool handler function type definition.
///
/// Handlers receive the call's raw parameters, decode them into their own
/// typed shape, and return either a structured payload or a `ToolError`.
/// Handlers must be Send + Sync to work across server worker threads.
pub type ToolHandler =
    Box<dyn Fn(&RawValue) -> std::result::Result<serde_json::Value, ToolError> + Send + Sync>;

/// Registry of available tools.
///
/// Built once at startup and shared immutably across worker threads. Keeps
/// an ordered descriptor list for the catalog endpoint and a name-to-handler
/// map for dispatch.
pub struct ToolRegistry {
    /// Descriptors in registration order (for the catalog endpoint)
    pub tools: Vec<ToolDescriptor>,
    /// Map of tool names to their handler functions (for dispatch)
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a tool with the registry.
    ///
    /// Adds the descriptor to the catalog list and stores the handler for
    /// dispatch under the descriptor's name.
    pub fn register(&mut self, tool: ToolDescriptor, handler: ToolHandler) {
        let name = tool.name.clone();
        self.tools.push(tool);
        self.handlers.insert(name, handler);
    }

    /// Resolve a tool name to its handler, or `None` if unregistered.
    pub fn resolve(&self, name: &str) -> Option<&ToolHandler> {
        self.handlers.get(name)
    }
}

/// Process a batch of tool calls in input order.
///
/// Each call is resolved, decoded, and executed independently: an unknown
/// name or a parameter decode failure produces an `error` entry for that
/// call only. The returned list always has the same length and order as the
/// input; no item is dropped, retried, or reordered.
pub fn dispatch(registry: &ToolRegistry, calls: &[ToolCall]) -> Vec<ToolResponse> {
    calls
        .iter()
        .map(|call| {
            let outcome = match registry.resolve(&call.name) {
                Some(handler) => match call.parameters.as_deref() {
                    Some(raw) => handler(raw),
                    None => Err(ToolError::MissingParameters),
                },
                None => Err(ToolError::UnknownTool(call.name.clone())),
            };
            match outcome {
                Ok(payload) => ToolResponse::Data(payload),
                Err(err) => ToolResponse::Error(err.to_string()),
            }
        })
        .collect()
}

/// Health check endpoint handler.
///
/// Used by load balancers and monitoring systems to verify server
/// availability.
async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "mcp-qa-server"
    })))
}

/// `POST /mcp/v1/execute` handler.
///
/// Parses the outer envelope (malformed bodies are rejected with 400 before
/// this handler runs), dispatches the batch, and returns the ordered
/// response list.
async fn mcp_execute(
    registry: web::Data<Arc<ToolRegistry>>,
    req: web::Json<ToolCallRequest>,
) -> Result<HttpResponse> {
    let responses = dispatch(&registry, &req.tool_calls);
    Ok(HttpResponse::Ok().json(ToolCallBatchResponse { responses }))
}

/// `GET /mcp/v1/tools` handler.
///
/// Returns the descriptors of all registered tools so clients can discover
/// what is available before calling.
async fn mcp_tools(registry: web::Data<Arc<ToolRegistry>>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "tools": registry.tools
    })))
}

/// Request body for the legacy `/ask` endpoint.
#[derive(Deserialize, Debug)]
pub struct QuestionRequest {
    pub question: String,
}

/// Response body for the legacy `/ask` endpoint.
#[derive(Serialize, Debug)]
pub struct AnswerResponse {
    pub answer: String,
}

/// Answer prefix for the legacy endpoint. Intentionally shorter than the
/// tool's prefix in `tools::ask_question`.
pub const LEGACY_ANSWER_PREFIX: &str = "This is a placeholder answer. Your question was: ";

/// `POST /ask` handler (legacy, non-batched).
async fn ask(req: web::Json<QuestionRequest>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(AnswerResponse {
        answer: format!("{LEGACY_ANSWER_PREFIX}{}", req.question),
    }))
}

/// `GET /sse` heartbeat handler.
///
/// Emits one `ready` frame and then idles. The body stream pends forever
/// after the first frame; Actix drops it when the client disconnects, which
/// closes the connection cleanly without blocking any worker.
async fn sse_heartbeat() -> HttpResponse {
    let ready = stream::once(async {
        Ok::<_, Infallible>(Bytes::from_static(b"event: ready\ndata: {}\n\n"))
    });

    HttpResponse::Ok()
        .content_type("text/event-stream")
        // Disable caching so intermediaries never buffer or replay frames
        .insert_header(header::CacheControl(vec![header::CacheDirective::NoCache]))
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .streaming(ready.chain(stream::pending()))
}

/// Map JSON extractor failures to a plain-text 400.
///
/// Covers malformed top-level JSON and missing required envelope fields,
/// the one case where a failure is batch-wide rather than per-call.
fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    let reason = format!("Bad request: {err}");
    error::InternalError::from_response(err, HttpResponse::BadRequest().body(reason)).into()
}

/// Explicit route table.
///
/// Constructed at startup and handed to the server bootstrap (and to tests)
/// rather than registered ambiently. Resources answer 405 for methods they
/// do not route.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .service(web::resource("/mcp/v1/execute").route(web::post().to(mcp_execute)))
        .service(web::resource("/mcp/v1/tools").route(web::get().to(mcp_tools)))
        .service(web::resource("/ask").route(web::post().to(ask)))
        .service(web::resource("/sse").route(web::get().to(sse_heartbeat)))
        .service(web::resource("/health").route(web::get().to(health)));
}

/// Initialize and register all tools.
///
/// Called during server startup to create the tool registry. Add new tool
/// registrations here following this pattern:
/// `tools::your_tool::register(&mut registry);`
pub fn initialize_tools() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    tools::ask_question::register(&mut registry);

    Arc::new(registry)
}

/// Run the HTTP server until shutdown.
///
/// Configures and starts an Actix Web server with the explicit route table
/// and a registry shared across worker threads. Returns the bind error if
/// the listener cannot be established; the caller treats that as fatal.
pub async fn run_server_http(config: ServerConfig) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = config.bind_addr();
    let tool_registry = web::Data::new(initialize_tools());

    info!(addr = %bind_addr, workers = config.workers, "starting MCP server");

    HttpServer::new(move || {
        App::new()
            .app_data(tool_registry.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            // Add security headers to all responses
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            // Request logging: %r = request line, %s = status, %Dms = duration
            .wrap(Logger::new("%r %s %Dms"))
            .configure(routes)
    })
    .workers(config.workers)
    // Connection limits for high-traffic scenarios
    .max_connections(10000)
    .max_connection_rate(1000)
    // Timeout configurations to prevent resource exhaustion
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    // Graceful shutdown timeout
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}
