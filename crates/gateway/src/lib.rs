//! HTTP webhook gateway for dfbridge.
//!
//! Exposes two routes:
//! - `GET /` — liveness probe, plain `OK`
//! - `POST /webhook` — Dialogflow ES fulfillment, behind the optional
//!   shared-secret gate
//!
//! Built on Axum. Every `/webhook` call that passes the gate ends in a
//! 200 with a well-formed fulfillment body, whatever the upstream did.

pub mod auth;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{
    Router,
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
};
use dfbridge_agent::TurnRunner;
use dfbridge_config::{AppConfig, GatewayConfig};
use dfbridge_core::fulfillment::{FulfillmentResponse, WebhookTurn};
use tower_http::cors::CorsLayer;
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};

/// Shared application state for the gateway.
///
/// Immutable after startup; requests never write to it.
pub struct GatewayState {
    pub runner: TurnRunner,
    pub webhook_secret: Option<String>,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - shared-secret gate on `/webhook` only
/// - request body size limit
/// - permissive CORS (when enabled)
/// - HTTP trace logging
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    let webhook = Router::new()
        .route("/webhook", post(webhook_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_webhook_secret,
        ));

    let router = Router::new()
        .route("/", get(health_handler))
        .merge(webhook)
        .with_state(state)
        .layer(DefaultBodyLimit::max(gateway.body_limit_bytes));

    let router = if gateway.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server and run until Ctrl-C / SIGTERM.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let provider = dfbridge_providers::build_from_config(&config)?;

    let mut runner = TurnRunner::new(Arc::new(provider), &config.model);
    if let Some(system_prompt) = &config.system_prompt {
        runner = runner.with_system_prompt(system_prompt);
    }

    if config.gateway.webhook_secret.is_none() {
        warn!("No webhook secret configured; /webhook accepts unauthenticated calls");
    }

    let state = Arc::new(GatewayState {
        runner,
        webhook_secret: config.gateway.webhook_secret.clone(),
    });
    let app = build_router(state.clone(), &config.gateway);

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        model = %state.runner.model(),
        base_url = %config.base_url,
        "Webhook listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

// --- Handlers ---

async fn health_handler() -> &'static str {
    "OK"
}

/// A body that is missing, not declared as JSON, or unparsable is read as
/// `null` and answered with defaults. Only an oversized body is refused.
async fn webhook_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<FulfillmentResponse>, JsonRejection> {
    let request_id = uuid::Uuid::new_v4();

    async move {
        let payload = match payload {
            Ok(Json(payload)) => payload,
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                warn!(error = %rejection.body_text(), "Webhook body over limit");
                return Err(rejection);
            }
            Err(rejection) => {
                debug!(error = %rejection.body_text(), "Unreadable webhook body, using defaults");
                Value::Null
            }
        };

        let WebhookTurn {
            session,
            query_text,
            history,
        } = WebhookTurn::extract(&payload);

        info!(
            session = %session,
            query_chars = query_text.chars().count(),
            history_len = history.len(),
            "Webhook turn received"
        );

        let outcome = state.runner.run(history, &query_text).await;
        debug!(reply_chars = outcome.reply().chars().count(), "Turn answered");
        Ok(Json(outcome.into_fulfillment(&session)))
    }
    .instrument(info_span!("webhook", %request_id))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use dfbridge_core::error::ProviderError;
    use dfbridge_core::fulfillment::UPSTREAM_FAILURE_APOLOGY;
    use dfbridge_core::message::Turn;
    use dfbridge_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    const SESSION: &str = "projects/demo/agent/sessions/s-1";

    /// Lightweight mock provider for gateway tests.
    struct MockProvider {
        reply: Result<String, ProviderError>,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    impl MockProvider {
        fn new(reply: Result<&str, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(String::from),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> ProviderRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone().map(|text| ProviderResponse {
                content: Some(text),
                model: Some("mock-model".into()),
            })
        }
    }

    fn app_with(provider: Arc<MockProvider>, secret: Option<&str>) -> Router {
        let state = Arc::new(GatewayState {
            runner: TurnRunner::new(provider, "mock-model"),
            webhook_secret: secret.map(String::from),
        });
        build_router(state, &GatewayConfig::default())
    }

    fn webhook_request(body: &Value, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn dialogflow_body(query: &str, history: Value) -> Value {
        json!({
            "responseId": "r-1",
            "session": SESSION,
            "queryResult": {
                "queryText": query,
                "languageCode": "es",
                "outputContexts": [{
                    "name": format!("{SESSION}/contexts/deepseek_session"),
                    "lifespanCount": 19,
                    "parameters": { "history": history }
                }]
            }
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = app_with(MockProvider::new(Ok("unused")), Some("s3cret"));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn hola_round_trip() {
        let provider = MockProvider::new(Ok("¡Hola! ¿En qué puedo ayudarte?"));
        let app = app_with(provider.clone(), None);

        let response = app
            .oneshot(webhook_request(&dialogflow_body("Hola", json!([])), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(
            body_json(response).await,
            json!({
                "fulfillmentText": "¡Hola! ¿En qué puedo ayudarte?",
                "outputContexts": [{
                    "name": format!("{SESSION}/contexts/deepseek_session"),
                    "lifespanCount": 20,
                    "parameters": { "history": [
                        { "role": "user", "content": "Hola" },
                        { "role": "assistant", "content": "¡Hola! ¿En qué puedo ayudarte?" }
                    ]}
                }]
            })
        );
        assert_eq!(provider.last_request().messages.len(), 2);
    }

    #[tokio::test]
    async fn no_matching_context_prompts_without_history() {
        let provider = MockProvider::new(Ok("Claro."));
        let app = app_with(provider.clone(), None);

        let body = json!({
            "session": SESSION,
            "queryResult": {
                "queryText": "¿Me ayudas?",
                "outputContexts": [{
                    "name": format!("{SESSION}/contexts/unrelated"),
                    "parameters": { "history": [{ "role": "user", "content": "viejo" }] }
                }]
            }
        });
        let response = app.oneshot(webhook_request(&body, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let messages = provider.last_request().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Turn::user("¿Me ayudas?"));
    }

    #[tokio::test]
    async fn full_history_stays_at_twelve() {
        let provider = MockProvider::new(Ok("respuesta nueva"));
        let app = app_with(provider, None);

        let history: Vec<Value> = (0..12)
            .map(|i| {
                let role = if i % 2 == 0 { "user" } else { "assistant" };
                json!({ "role": role, "content": format!("m{i}") })
            })
            .collect();

        let response = app
            .oneshot(webhook_request(
                &dialogflow_body("pregunta nueva", Value::Array(history)),
                None,
            ))
            .await
            .unwrap();

        let json = body_json(response).await;
        let window = json["outputContexts"][0]["parameters"]["history"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(window.len(), 12);
        assert_eq!(window[0]["content"], "m2");
        assert_eq!(window[10], json!({ "role": "user", "content": "pregunta nueva" }));
        assert_eq!(
            window[11],
            json!({ "role": "assistant", "content": "respuesta nueva" })
        );
    }

    #[tokio::test]
    async fn upstream_failure_returns_apology_only() {
        let provider = MockProvider::new(Err(ProviderError::Network("connection reset".into())));
        let app = app_with(provider, None);

        let response = app
            .oneshot(webhook_request(&dialogflow_body("Hola", json!([])), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json, json!({ "fulfillmentText": UPSTREAM_FAILURE_APOLOGY }));
        assert!(json.get("outputContexts").is_none());
    }

    #[tokio::test]
    async fn malformed_caller_state_is_normalized() {
        let provider = MockProvider::new(Ok("ok"));
        let app = app_with(provider.clone(), None);

        let response = app
            .oneshot(webhook_request(&json!({ "queryResult": 5 }), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["fulfillmentText"], "ok");
        assert_eq!(
            json["outputContexts"][0]["name"],
            "/contexts/deepseek_session"
        );
        assert_eq!(provider.last_request().messages[1], Turn::user(""));
    }

    #[tokio::test]
    async fn missing_content_type_is_answered_with_defaults() {
        let provider = MockProvider::new(Ok("ok"));
        let app = app_with(provider.clone(), None);

        let req = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from(dialogflow_body("Hola", json!([])).to_string()))
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["fulfillmentText"], "ok");
        assert_eq!(
            json["outputContexts"][0]["name"],
            "/contexts/deepseek_session"
        );
        assert_eq!(provider.last_request().messages.len(), 2);
        assert_eq!(provider.last_request().messages[1], Turn::user(""));
    }

    #[tokio::test]
    async fn unparsable_json_is_answered_with_defaults() {
        let provider = MockProvider::new(Ok("ok"));
        let app = app_with(provider.clone(), None);

        for raw in ["{not json", ""] {
            let req = Request::builder()
                .method("POST")
                .uri("/webhook")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(raw))
                .unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "body {raw:?}");

            let json = body_json(response).await;
            assert_eq!(json["fulfillmentText"], "ok");
            assert_eq!(provider.last_request().messages[1], Turn::user(""));
        }
    }

    #[tokio::test]
    async fn secret_configured_requires_exact_bearer() {
        let provider = MockProvider::new(Ok("ok"));
        let body = dialogflow_body("Hola", json!([]));

        for bad in [None, Some("Bearer wrong"), Some("s3cret"), Some("bearer s3cret")] {
            let app = app_with(provider.clone(), Some("s3cret"));
            let response = app.oneshot(webhook_request(&body, bad)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {bad:?}");
            assert_eq!(body_json(response).await, json!({ "error": "Unauthorized" }));
        }
        assert!(provider.seen.lock().unwrap().is_empty());

        let app = app_with(provider.clone(), Some("s3cret"));
        let response = app
            .oneshot(webhook_request(&body, Some("Bearer s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn no_secret_admits_any_header() {
        let provider = MockProvider::new(Ok("ok"));
        let body = dialogflow_body("Hola", json!([]));

        for auth in [None, Some("Bearer anything"), Some("junk")] {
            let app = app_with(provider.clone(), None);
            let response = app.oneshot(webhook_request(&body, auth)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "header {auth:?}");
        }
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let provider = MockProvider::new(Ok("ok"));
        let state = Arc::new(GatewayState {
            runner: TurnRunner::new(provider.clone(), "mock-model"),
            webhook_secret: None,
        });
        let gateway = GatewayConfig {
            body_limit_bytes: 64,
            ..GatewayConfig::default()
        };
        let app = build_router(state, &gateway);

        let body = dialogflow_body(&"x".repeat(256), json!([]));
        let response = app.oneshot(webhook_request(&body, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(provider.seen.lock().unwrap().is_empty());
    }
}
