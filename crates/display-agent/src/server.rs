// ============================================
// File: crates/display-agent/src/server.rs
// ============================================
//! # Command Agent
//!
//! ## Creation Reason
//! The long-running local listener through which the registry or an
//! operator reboots/powers off the appliance, authenticated by the
//! same shared secret the registration client reports with.
//!
//! ## Endpoints
//! ```text
//! GET  /health    → 200 {status, timestamp, apiKeyConfigured}
//! POST /reboot    → 200 ack, then delayed host reboot
//! POST /shutdown  → 200 ack, then delayed host power-off
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The acknowledgement is sent before the host action is scheduled
//!   to run; response latency never includes the configured delay
//! - Graceful shutdown stops accepting connections and lets in-flight
//!   responses complete, but never forces (or cancels) a host action

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use display_common::{time, CredentialStore};

use crate::auth::{authenticate, AuthVerdict};
use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::host::HostControl;
use crate::scheduler::ActionScheduler;

// ============================================
// AppState
// ============================================

/// State shared across request handlers.
///
/// The credential store is the only shared input and it is read-only
/// from the agent's point of view; each request loads the current file
/// contents independently.
#[derive(Clone)]
pub struct AppState {
    store: Arc<CredentialStore>,
    host: Arc<dyn HostControl>,
    scheduler: ActionScheduler,
    action_delay: Duration,
}

impl AppState {
    /// Creates handler state.
    #[must_use]
    pub fn new(store: CredentialStore, host: Arc<dyn HostControl>, action_delay: Duration) -> Self {
        Self {
            store: Arc::new(store),
            host,
            scheduler: ActionScheduler::new(),
            action_delay,
        }
    }

    /// Number of host actions acknowledged but not yet executed.
    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.scheduler.pending()
    }
}

// ============================================
// Response bodies
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: u64,
    api_key_configured: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AckResponse {
    status: &'static str,
    message: String,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
}

// ============================================
// Handlers
// ============================================

/// Liveness probe. Always 200; reports credential presence as a
/// boolean only.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: time::unix_timestamp(),
        api_key_configured: state.store.is_configured(),
    })
}

/// Which privileged operation a request maps to.
#[derive(Debug, Clone, Copy)]
enum HostAction {
    Reboot,
    Shutdown,
}

impl HostAction {
    const fn name(self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::Shutdown => "shutdown",
        }
    }

    const fn ack_status(self) -> &'static str {
        match self {
            Self::Reboot => "rebooting",
            Self::Shutdown => "shutting-down",
        }
    }
}

async fn reboot(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    privileged(state, &headers, &uri, HostAction::Reboot)
}

async fn shutdown(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    privileged(state, &headers, &uri, HostAction::Shutdown)
}

/// Authenticates and, if authorized, schedules the host action and
/// acknowledges immediately. The ack is constructed and returned before
/// the action can run; the delay never blocks the response.
fn privileged(state: AppState, headers: &HeaderMap, uri: &Uri, action: HostAction) -> Response {
    match authenticate(&state.store, headers, uri) {
        AuthVerdict::Authorized => {}
        AuthVerdict::Unauthorized => {
            warn!(action = action.name(), "Rejected privileged request");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "unauthorized",
                }),
            )
                .into_response();
        }
        AuthVerdict::Misconfigured => {
            error!(
                action = action.name(),
                "Privileged request received but no credential is configured"
            );
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "agent has no credential configured",
                }),
            )
                .into_response();
        }
    }

    let delay = state.action_delay;
    let host = Arc::clone(&state.host);
    state.scheduler.defer(delay, async move {
        let result = match action {
            HostAction::Reboot => host.reboot().await,
            HostAction::Shutdown => host.shutdown().await,
        };
        // The caller was acknowledged long ago; a failure here can only
        // be logged.
        if let Err(e) = result {
            error!(action = action.name(), error = %e, "Host operation failed");
        }
    });

    info!(
        action = action.name(),
        delay_secs = delay.as_secs(),
        "Privileged request acknowledged, host action scheduled"
    );

    (
        StatusCode::OK,
        Json(AckResponse {
            status: action.ack_status(),
            message: format!(
                "{} scheduled in {} second(s)",
                action.name(),
                delay.as_secs()
            ),
            timestamp: time::unix_timestamp(),
        }),
    )
        .into_response()
}

/// Builds the agent router over the given state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/reboot", post(reboot))
        .route("/shutdown", post(shutdown))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================
// CommandAgent
// ============================================

/// The command agent listener.
///
/// # Lifecycle
/// 1. Create with `CommandAgent::new(config, host)`
/// 2. Serve with `agent.run().await`
/// 3. Shutdown via termination signal or programmatic `shutdown()`
pub struct CommandAgent {
    config: AgentConfig,
    state: AppState,
    shutdown_tx: broadcast::Sender<()>,
}

impl CommandAgent {
    /// Creates a new agent from validated configuration.
    #[must_use]
    pub fn new(config: AgentConfig, host: Arc<dyn HostControl>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let state = AppState::new(
            config.credential_store(),
            host,
            Duration::from_secs(config.listener.reboot_delay_secs),
        );
        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Runs the listener until a termination signal arrives.
    ///
    /// # Errors
    /// Returns a fatal `StartupFailed` error when the port cannot be
    /// bound. Per-request errors never surface here.
    pub async fn run(&self) -> Result<()> {
        let bind_addr = self.config.listener.bind_addr;
        let listener = tokio::net::TcpListener::bind(bind_addr)
            .await
            .map_err(|e| AgentError::startup_failed(format!("bind {bind_addr} failed: {e}")))?;

        info!(
            addr = %bind_addr,
            key_file = %self.state.store.key_file().display(),
            "Command agent listening"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(async move {
                wait_for_termination(&mut shutdown_rx).await;
            })
            .await
            .map_err(|e| AgentError::startup_failed(e.to_string()))?;

        // Acknowledged actions survive shutdown by design.
        self.state.scheduler.detach_all();
        info!("Command agent shutdown complete");
        Ok(())
    }

    /// Triggers agent shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Handler state, exposed for status reporting.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

impl std::fmt::Debug for CommandAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandAgent")
            .field("bind_addr", &self.config.listener.bind_addr)
            .finish()
    }
}

/// Resolves when ctrl-c, SIGTERM, or a programmatic shutdown arrives.
async fn wait_for_termination(shutdown_rx: &mut broadcast::Receiver<()>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c"),
        _ = terminate => info!("Received termination signal"),
        _ = shutdown_rx.recv() => info!("Received programmatic shutdown"),
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::io::Write;
    use std::time::Instant;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::host::NoopHost;

    const TEST_KEY: &str = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc1230000";

    struct Fixture {
        _dir: TempDir,
        host: Arc<NoopHost>,
        state: AppState,
    }

    fn fixture(with_key: bool, delay: Duration) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("api-key");
        if with_key {
            let mut f = std::fs::File::create(&key_path).unwrap();
            writeln!(f, "{TEST_KEY}").unwrap();
        }
        let host = Arc::new(NoopHost::new());
        let state = AppState::new(
            CredentialStore::new(key_path),
            Arc::clone(&host) as Arc<dyn HostControl>,
            delay,
        );
        Fixture {
            _dir: dir,
            host,
            state,
        }
    }

    fn post(path: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri(path);
        if let Some(key) = key {
            builder = builder.header("X-Api-Key", key);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_configured_credential() {
        let fx = fixture(true, Duration::from_millis(10));
        let response = router(fx.state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["apiKeyConfigured"], true);
        assert!(json["timestamp"].as_u64().unwrap() > 1_577_836_800);
    }

    #[tokio::test]
    async fn test_health_reports_missing_credential() {
        let fx = fixture(false, Duration::from_millis(10));
        let response = router(fx.state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["apiKeyConfigured"], false);
    }

    #[tokio::test]
    async fn test_reboot_acknowledges_then_executes() {
        let fx = fixture(true, Duration::from_millis(200));
        let started = Instant::now();
        let response = router(fx.state.clone())
            .oneshot(post("/reboot", Some(TEST_KEY)))
            .await
            .unwrap();

        // Ack must arrive before the delay elapses and before the host
        // action runs.
        assert_eq!(response.status(), StatusCode::OK);
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(fx.host.reboot_count(), 0);
        assert_eq!(fx.state.pending_actions(), 1);

        let json = body_json(response).await;
        assert_eq!(json["status"], "rebooting");

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fx.host.reboot_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_endpoint_schedules_poweroff() {
        let fx = fixture(true, Duration::from_millis(10));
        let response = router(fx.state.clone())
            .oneshot(post("/shutdown", Some(TEST_KEY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "shutting-down");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fx.host.shutdown_count(), 1);
        assert_eq!(fx.host.reboot_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_key_is_unauthorized_and_never_executes() {
        let fx = fixture(true, Duration::from_millis(10));
        let response = router(fx.state.clone())
            .oneshot(post("/reboot", Some("wrong")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fx.host.reboot_count(), 0);
        assert_eq!(fx.state.pending_actions(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized_with_identical_body() {
        let fx = fixture(true, Duration::from_millis(10));

        let missing = router(fx.state.clone())
            .oneshot(post("/reboot", None))
            .await
            .unwrap();
        let wrong = router(fx.state.clone())
            .oneshot(post("/reboot", Some("wrong")))
            .await
            .unwrap();

        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        // No oracle: both rejection bodies are identical.
        assert_eq!(body_json(missing).await, body_json(wrong).await);
    }

    #[tokio::test]
    async fn test_query_parameter_credential_is_accepted() {
        let fx = fixture(true, Duration::from_millis(10));
        let response = router(fx.state)
            .oneshot(post(&format!("/reboot?api_key={TEST_KEY}"), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unconfigured_agent_returns_500_not_401() {
        let fx = fixture(false, Duration::from_millis(10));
        let response = router(fx.state.clone())
            .oneshot(post("/reboot", Some(TEST_KEY)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fx.host.reboot_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_reboots_both_acknowledged() {
        let fx = fixture(true, Duration::from_millis(100));

        let (r1, r2) = tokio::join!(
            router(fx.state.clone()).oneshot(post("/reboot", Some(TEST_KEY))),
            router(fx.state.clone()).oneshot(post("/reboot", Some(TEST_KEY))),
        );
        assert_eq!(r1.unwrap().status(), StatusCode::OK);
        assert_eq!(r2.unwrap().status(), StatusCode::OK);
        assert_eq!(fx.state.pending_actions(), 2);

        // Health stays responsive while actions are pending.
        let health = router(fx.state.clone())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(fx.host.reboot_count(), 2);
    }
}
