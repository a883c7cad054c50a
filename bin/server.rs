// Loan Chaincode - HTTP host
// Exposes invoke/query over REST with Axum, backed by the SQLite ledger

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use loan_chaincode::{
    init_logging, CallerIdentity, ChaincodeConfig, ChaincodeError, LoanChaincode, SqliteLedger,
    StoredEvent,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    ledger: Arc<Mutex<SqliteLedger>>,
    chaincode: Arc<LoanChaincode>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }
}

/// Invocation body: function name plus ordered string arguments
#[derive(Deserialize)]
struct InvocationRequest {
    function: String,
    #[serde(default)]
    args: Vec<String>,
}

// ============================================================================
// Errors
// ============================================================================

enum ApiError {
    Chaincode(ChaincodeError),
    Internal(String),
}

impl From<ChaincodeError> for ApiError {
    fn from(err: ChaincodeError) -> Self {
        ApiError::Chaincode(err)
    }
}

fn status_for(err: &ChaincodeError) -> StatusCode {
    match err {
        ChaincodeError::InvalidArguments(_)
        | ChaincodeError::UnknownFunction(_)
        | ChaincodeError::NotAQuery(_) => StatusCode::BAD_REQUEST,
        ChaincodeError::PermissionDenied { .. } | ChaincodeError::AttributeUnavailable { .. } => {
            StatusCode::FORBIDDEN
        }
        ChaincodeError::NotFound(_) => StatusCode::NOT_FOUND,
        ChaincodeError::MalformedRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ChaincodeError::ReadFailed(_) | ChaincodeError::WriteFailed(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Chaincode(err) => (status_for(&err), err.code().to_string(), err.to_string()),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                message,
            ),
        };

        let body = ApiResponse::<String> {
            success: false,
            data: None,
            error: Some(message),
            code: Some(code),
        };
        (status, Json(body)).into_response()
    }
}

fn lock_ledger(state: &AppState) -> Result<MutexGuard<'_, SqliteLedger>, ApiError> {
    state
        .ledger
        .lock()
        .map_err(|_| ApiError::Internal("ledger lock poisoned".to_string()))
}

/// Caller certificate attributes from request headers
fn caller_identity(headers: &HeaderMap) -> CallerIdentity {
    let mut identity = CallerIdentity::new();
    for (header, attribute) in [("x-username", "username"), ("x-role", "role")] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            identity = identity.attribute(attribute, value);
        }
    }
    identity
}

fn payload_string(payload: Vec<u8>) -> String {
    String::from_utf8_lossy(&payload).into_owned()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/invoke - Run a transaction
async fn invoke(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InvocationRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let ledger = lock_ledger(&state)?;
    let mut stub = ledger.stub(caller_identity(&headers));

    let payload = state
        .chaincode
        .invoke(&mut stub, &request.function, &request.args)?;

    Ok(Json(ApiResponse::ok(payload_string(payload))))
}

/// POST /api/query - Run a read-only query
async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<InvocationRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let ledger = lock_ledger(&state)?;
    let stub = ledger.stub(caller_identity(&headers));

    let payload = state
        .chaincode
        .query(&stub, &request.function, &request.args)?;

    Ok(Json(ApiResponse::ok(payload_string(payload))))
}

/// GET /api/events - Event log, newest first
async fn events(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<StoredEvent>>>, ApiError> {
    let ledger = lock_ledger(&state)?;
    let events = ledger.events().map_err(|e| {
        tracing::error!(error = %e, "Error reading event log");
        ApiError::Internal(e.to_string())
    })?;

    Ok(Json(ApiResponse::ok(events)))
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/invoke", post(invoke))
        .route("/query", post(query))
        .route("/events", get(events))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[derive(Parser)]
#[command(name = "loan-server", version, about = "HTTP host for the loan application chaincode")]
struct ServerArgs {
    /// Ledger database file
    #[arg(long, default_value = "ledger.db")]
    db: PathBuf,

    /// Chaincode config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    let config = ChaincodeConfig::load(args.config.as_deref())?;
    init_logging(&config.log_level);

    let ledger = SqliteLedger::open(&args.db)?;
    tracing::info!(db = ?args.db, "Ledger opened");

    let state = AppState {
        ledger: Arc::new(Mutex::new(ledger)),
        chaincode: Arc::new(LoanChaincode::new(config)),
    };

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    tracing::info!(addr = %args.addr, "LoanChaincode started successfully");

    axum::serve(listener, app(state)).await?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            ledger: Arc::new(Mutex::new(SqliteLedger::open_in_memory().unwrap())),
            chaincode: Arc::new(LoanChaincode::default()),
        }
    }

    fn call(path: &str, role: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .header("x-username", "alice")
            .header("x-role", role)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_query() {
        let state = test_state();
        let record = r#"{"id":"LA1","status":"Submitted"}"#;

        let response = app(state.clone())
            .oneshot(call(
                "/api/invoke",
                "Bank_Home_Loan_Admin",
                serde_json::json!({"function": "CreateLoanApplication", "args": ["LA1", record]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(state.clone())
            .oneshot(call(
                "/api/query",
                "Loan_Officer",
                serde_json::json!({"function": "GetLoanApplication", "args": ["LA1"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"], record);

        let events = state.ledger.lock().unwrap().events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor, "alice");
    }

    #[tokio::test]
    async fn test_permission_denied_maps_to_forbidden() {
        let response = app(test_state())
            .oneshot(call(
                "/api/invoke",
                "Loan_Officer",
                serde_json::json!({"function": "CreateLoanApplication", "args": ["LA1", "{}"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["code"], "PERMISSION_DENIED");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_missing_record_maps_to_not_found() {
        let response = app(test_state())
            .oneshot(call(
                "/api/query",
                "",
                serde_json::json!({"function": "GetLoanApplication", "args": ["LA404"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_function_is_bad_request() {
        let response = app(test_state())
            .oneshot(call(
                "/api/invoke",
                "",
                serde_json::json!({"function": "DeleteLoanApplication", "args": ["LA1"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
