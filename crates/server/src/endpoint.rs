use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use riverlevels_core::InterfaceError;
use riverlevels_skill::{
    IntentRouter, RequestContext, RiverStateFetcher, RouteError, SkillRequest, SkillResponse,
};
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

pub struct SkillState<F> {
    router: Arc<IntentRouter<F>>,
}

impl<F> Clone for SkillState<F> {
    fn clone(&self) -> Self {
        Self { router: Arc::clone(&self.router) }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillError {
    pub error: &'static str,
    pub correlation_id: String,
}

pub fn router<F>(router: Arc<IntentRouter<F>>) -> Router
where
    F: RiverStateFetcher + 'static,
{
    Router::new().route("/skill", post(handle_skill::<F>)).with_state(SkillState { router })
}

pub async fn handle_skill<F>(
    State(state): State<SkillState<F>>,
    payload: Result<Json<SkillRequest>, JsonRejection>,
) -> Result<Json<SkillResponse>, (StatusCode, Json<SkillError>)>
where
    F: RiverStateFetcher + 'static,
{
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let interface = InterfaceError::BadRequest {
                message: rejection.body_text(),
                correlation_id: Uuid::new_v4().to_string(),
            };
            warn!(
                event_name = "skill.invocation.rejected",
                correlation_id = %interface.correlation_id(),
                error = %interface,
                "skill envelope rejected"
            );
            return Err(interface_response(&interface));
        }
    };
    let ctx = RequestContext { correlation_id: correlation_id(&request) };

    match state.router.route(&request, &ctx).await {
        Ok(response) => Ok(Json(response)),
        Err(RouteError::Fetch(fetch_error)) => {
            let interface = fetch_error.into_interface(ctx.correlation_id);
            error!(
                event_name = "skill.invocation.failed",
                correlation_id = %interface.correlation_id(),
                error = %interface,
                "skill invocation failed at the platform boundary"
            );
            Err(interface_response(&interface))
        }
    }
}

fn correlation_id(request: &SkillRequest) -> String {
    let request_id = request.request_id().trim();
    if request_id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        request_id.to_owned()
    }
}

fn interface_response(error: &InterfaceError) -> (StatusCode, Json<SkillError>) {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(SkillError {
            error: error.user_message(),
            correlation_id: error.correlation_id().to_owned(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use riverlevels_core::{EntityResource, FetchError, LocaleCatalog, RemoteReading};
    use riverlevels_skill::{IntentRouter, RiverStateFetcher, SkillResponse};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::router;

    struct StubFetcher {
        fail: bool,
    }

    #[async_trait]
    impl RiverStateFetcher for StubFetcher {
        async fn fetch(&self, entity: &EntityResource) -> Result<RemoteReading, FetchError> {
            if self.fail {
                return Err(FetchError::RemoteUnavailable {
                    url: "http://rivers.test/river/x".to_owned(),
                    message: "connection refused".to_owned(),
                });
            }
            Ok(RemoteReading {
                river: entity.name.clone(),
                section: "Chester Weir".to_owned(),
                state_text: "good".to_owned(),
                state_value: "1.2".to_owned(),
            })
        }
    }

    fn app(fail: bool) -> axum::Router {
        let skill = IntentRouter::new(Arc::new(LocaleCatalog::builtin()), StubFetcher { fail });
        router(Arc::new(skill))
    }

    fn post_skill(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/skill")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn intent(name: &str) -> Value {
        json!({
            "version": "1.0",
            "request": {
                "type": "IntentRequest",
                "requestId": "amzn1.echo-api.request.42",
                "intent": { "name": name }
            }
        })
    }

    #[tokio::test]
    async fn skill_endpoint_returns_reading_envelope() {
        let response = app(false).oneshot(post_skill(intent("LevelDeeIntent"))).await.expect("call");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: SkillResponse = serde_json::from_slice(&bytes).expect("envelope");
        assert_eq!(payload.version, "1.0");
        assert_eq!(payload.speech_text(), "The river Dee, Chester Weir is good, 1.2");
        assert!(!payload.ends_session());
    }

    #[tokio::test]
    async fn skill_endpoint_ends_session_on_stop() {
        let response =
            app(false).oneshot(post_skill(intent("AMAZON.StopIntent"))).await.expect("call");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["response"]["shouldEndSession"], true);
        assert_eq!(payload["response"]["outputSpeech"]["text"], "Goodbye!");
    }

    #[tokio::test]
    async fn remote_failure_surfaces_as_bad_gateway() {
        let response = app(true).oneshot(post_skill(intent("LevelDeeIntent"))).await.expect("call");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["correlation_id"], "amzn1.echo-api.request.42");
    }

    #[tokio::test]
    async fn malformed_envelope_returns_bad_request_body() {
        let response =
            app(false).oneshot(post_skill(json!({ "version": "1.0" }))).await.expect("call");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["error"], "The request could not be processed.");
        assert!(!payload["correlation_id"].as_str().expect("correlation id").is_empty());
    }

    #[tokio::test]
    async fn slot_without_name_is_accepted() {
        let mut body = intent("LevelDeeIntent");
        body["request"]["intent"]["slots"] = json!({ "River": { "value": "Dee" } });

        let response = app(false).oneshot(post_skill(body)).await.expect("call");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
