use async_trait::async_trait;
use reqwest::{Client, Url};
use riverlevels_core::config::ProviderConfig;
use riverlevels_core::reading::RiverPayload;
use riverlevels_core::{EntityResource, FetchError, RemoteReading};
use tracing::{debug, warn};

/// Reads the live state of one river from the provider. One call is one
/// round trip: no caching, no retry.
#[async_trait]
pub trait RiverStateFetcher: Send + Sync {
    async fn fetch(&self, entity: &EntityResource) -> Result<RemoteReading, FetchError>;
}

#[derive(Clone, Debug)]
pub struct HttpRiverStateFetcher {
    client: Client,
    base_url: String,
}

impl HttpRiverStateFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    pub fn from_config(provider: &ProviderConfig) -> Self {
        Self::new(provider.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/river/{external_id}` with the id percent-encoded as one segment.
    pub fn river_url(&self, external_id: &str) -> Result<Url, FetchError> {
        let invalid_base = |message: String| FetchError::RemoteUnavailable {
            url: self.base_url.clone(),
            message,
        };
        let mut url = Url::parse(&self.base_url)
            .map_err(|error| invalid_base(format!("invalid provider base url: {error}")))?;
        url.path_segments_mut()
            .map_err(|()| invalid_base("provider base url cannot carry a path".to_owned()))?
            .pop_if_empty()
            .push("river")
            .push(external_id);
        Ok(url)
    }
}

#[async_trait]
impl RiverStateFetcher for HttpRiverStateFetcher {
    async fn fetch(&self, entity: &EntityResource) -> Result<RemoteReading, FetchError> {
        let Some(external_id) = entity.external_id() else {
            return Err(FetchError::UnresolvedEntity(entity.name.clone()));
        };
        let url = self.river_url(external_id)?.to_string();

        debug!(
            event_name = "skill.fetch.request",
            river = %entity.name,
            url = %url,
            "requesting river state"
        );

        let response = self.client.get(&url).send().await.map_err(|error| {
            FetchError::RemoteUnavailable { url: url.clone(), message: error.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                event_name = "skill.fetch.bad_status",
                river = %entity.name,
                status = %status,
                "river provider returned a non-success status"
            );
            return Err(FetchError::RemoteUnavailable {
                url,
                message: format!("provider returned {status}"),
            });
        }

        let body = response.text().await.map_err(|error| FetchError::RemoteUnavailable {
            url: url.clone(),
            message: format!("failed to read response body: {error}"),
        })?;

        let payload = RiverPayload::parse(&body)
            .map_err(|error| FetchError::MalformedResponse { url, message: error.to_string() })?;

        Ok(RemoteReading::from(payload))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        routing::get,
        Router,
    };
    use riverlevels_core::{EntityResource, FetchError};

    use super::{HttpRiverStateFetcher, RiverStateFetcher};

    type SeenPaths = Arc<Mutex<Vec<String>>>;

    async fn river(
        State(seen): State<SeenPaths>,
        Path(id): Path<String>,
    ) -> (StatusCode, String) {
        seen.lock().expect("seen lock").push(format!("/api/river/{id}"));
        match id.as_str() {
            "75148ca0-ee5e-4344-8534-db9a59ed4cd0" => (
                StatusCode::OK,
                r#"{"data":{"river":"Dee","section":"Chester Weir","state":{"text":"good","value":"1.2"}}}"#
                    .to_owned(),
            ),
            "garbled" => (StatusCode::OK, r#"{"data":{"river":"Dee"}}"#.to_owned()),
            _ => (StatusCode::SERVICE_UNAVAILABLE, "try later".to_owned()),
        }
    }

    async fn spawn_provider() -> (String, SeenPaths) {
        let seen = SeenPaths::default();
        let app = Router::new().route("/api/river/{id}", get(river)).with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{address}/api/"), seen)
    }

    #[tokio::test]
    async fn fetch_requests_river_path_and_parses_reading() {
        let (base_url, seen) = spawn_provider().await;
        let fetcher = HttpRiverStateFetcher::new(base_url);
        let dee = EntityResource::new("Dee", "75148ca0-ee5e-4344-8534-db9a59ed4cd0");

        let reading = fetcher.fetch(&dee).await.expect("reading");

        assert_eq!(reading.river, "Dee");
        assert_eq!(reading.section, "Chester Weir");
        assert_eq!(reading.state_text, "good");
        assert_eq!(reading.state_value, "1.2");
        assert_eq!(
            seen.lock().expect("seen lock").as_slice(),
            ["/api/river/75148ca0-ee5e-4344-8534-db9a59ed4cd0".to_owned()]
        );
    }

    #[tokio::test]
    async fn every_fetch_is_a_fresh_round_trip() {
        let (base_url, seen) = spawn_provider().await;
        let fetcher = HttpRiverStateFetcher::new(base_url);
        let dee = EntityResource::new("Dee", "75148ca0-ee5e-4344-8534-db9a59ed4cd0");

        fetcher.fetch(&dee).await.expect("first reading");
        fetcher.fetch(&dee).await.expect("second reading");

        assert_eq!(seen.lock().expect("seen lock").len(), 2);
    }

    #[tokio::test]
    async fn non_success_status_is_remote_unavailable() {
        let (base_url, _) = spawn_provider().await;
        let fetcher = HttpRiverStateFetcher::new(base_url);

        let error = fetcher.fetch(&EntityResource::new("Tees", "offline")).await.expect_err("503");

        assert!(matches!(
            error,
            FetchError::RemoteUnavailable { ref message, .. } if message.contains("503")
        ));
    }

    #[tokio::test]
    async fn payload_missing_fields_is_malformed() {
        let (base_url, _) = spawn_provider().await;
        let fetcher = HttpRiverStateFetcher::new(base_url);

        let error =
            fetcher.fetch(&EntityResource::new("Dee", "garbled")).await.expect_err("malformed");

        assert!(matches!(error, FetchError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn transport_failure_is_remote_unavailable() {
        let fetcher = HttpRiverStateFetcher::new("http://127.0.0.1:1");

        let error = fetcher.fetch(&EntityResource::new("Dee", "any")).await.expect_err("refused");

        assert!(matches!(error, FetchError::RemoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn unknown_entity_is_rejected_without_network_io() {
        let (base_url, seen) = spawn_provider().await;
        let fetcher = HttpRiverStateFetcher::new(base_url);

        let error = fetcher.fetch(&EntityResource::unknown()).await.expect_err("unknown");

        assert_eq!(error, FetchError::UnresolvedEntity("Unknown".to_owned()));
        assert!(seen.lock().expect("seen lock").is_empty());
    }

    #[test]
    fn river_url_joins_base_and_path() {
        let fetcher = HttpRiverStateFetcher::new("http://rivers.test/api/");

        assert_eq!(fetcher.base_url(), "http://rivers.test/api");
        assert_eq!(
            fetcher.river_url("75148ca0-ee5e-4344-8534-db9a59ed4cd0").expect("url").as_str(),
            "http://rivers.test/api/river/75148ca0-ee5e-4344-8534-db9a59ed4cd0"
        );
        let bare = HttpRiverStateFetcher::new("http://rivers.test");
        assert_eq!(bare.river_url("abc").expect("url").as_str(), "http://rivers.test/river/abc");
    }

    #[test]
    fn river_url_keeps_delimiters_inside_the_id_segment() {
        let fetcher = HttpRiverStateFetcher::new("http://rivers.test/api");

        let url = fetcher.river_url("abc?x#y/z").expect("url");

        assert_eq!(url.path(), "/api/river/abc%3Fx%23y%2Fz");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn unparseable_base_url_is_remote_unavailable() {
        let fetcher = HttpRiverStateFetcher::new("not a url");

        let error = fetcher.river_url("abc").expect_err("invalid base");

        assert!(matches!(error, FetchError::RemoteUnavailable { .. }));
    }
}
