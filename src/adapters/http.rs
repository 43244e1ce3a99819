use crate::config::toml_config::{AuthConfig, ServiceConfig};
use crate::core::{Watchlist, WatchlistItem, WatchlistService};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// 兩個服務共用的連線池
pub fn build_session() -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("watchlist-sync/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub struct HttpWatchlistClient {
    config: ServiceConfig,
    endpoint: Url,
    client: Client,
}

impl HttpWatchlistClient {
    pub fn new(config: ServiceConfig, client: Client) -> Result<Self> {
        let endpoint = watchlist_url(&config)?;
        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match &self.config.auth {
            AuthConfig::Bearer { token } => request.bearer_auth(token),
            AuthConfig::Header { header, token } => request.header(header.as_str(), token.as_str()),
        };

        match self.config.timeout_seconds {
            Some(seconds) => request.timeout(Duration::from_secs(seconds)),
            None => request,
        }
    }

    fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        tracing::debug!("{} responded with {}", self.config.name, status);

        if status.is_success() {
            Ok(response)
        } else {
            Err(SyncError::HttpStatus {
                service: self.config.name.clone(),
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }
}

#[async_trait]
impl WatchlistService for HttpWatchlistClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch(&self) -> Result<Watchlist> {
        tracing::debug!("Making API request to: {}", self.endpoint);
        let request = self.authorize(self.client.get(self.endpoint.clone()));
        let response = self.check_status(request.send().await?)?;

        let body: Value = serde_json::from_slice(&response.bytes().await?)?;
        extract_items(body, self.config.items_field.as_deref(), &self.config.name)
    }

    async fn add_item(&self, item: &WatchlistItem) -> Result<()> {
        let mut payload = serde_json::Map::new();
        payload.insert(
            self.config.payload_field.clone(),
            Value::String(item.as_str().to_string()),
        );

        tracing::debug!("POST {} -> {}", item, self.endpoint);
        let request = self.authorize(self.client.post(self.endpoint.clone()).json(&payload));
        self.check_status(request.send().await?)?;
        Ok(())
    }
}

/// `base_url` 一律視為目錄，`watchlist_path` 接在其下
fn watchlist_url(config: &ServiceConfig) -> Result<Url> {
    let invalid = |reason: String| SyncError::InvalidConfigValueError {
        field: format!("{}.base_url", config.name),
        value: config.base_url.clone(),
        reason,
    };

    let mut base = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(config.watchlist_path.trim_start_matches('/'))
        .map_err(|e| invalid(e.to_string()))
}

/// Pulls item identifiers out of a fetch response. Strings are used as-is,
/// numbers are stringified, anything else is skipped.
pub fn extract_items(body: Value, items_field: Option<&str>, service: &str) -> Result<Watchlist> {
    let entries = match (items_field, body) {
        (Some(field), Value::Object(mut map)) => match map.remove(field) {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(SyncError::ProcessingError {
                    message: format!("{} response has no array field '{}'", service, field),
                })
            }
        },
        (None, Value::Array(entries)) => entries,
        (_, other) => {
            return Err(SyncError::ProcessingError {
                message: format!(
                    "{} response is not a watchlist array (got {})",
                    service,
                    json_kind(&other)
                ),
            })
        }
    };

    let mut skipped = 0usize;
    let list: Watchlist = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(WatchlistItem::from(s)),
            Value::Number(n) => Some(WatchlistItem::from(n.to_string())),
            _ => {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        tracing::warn!("⚠️ Skipped {} unsupported entries in {} watchlist", skipped, service);
    }

    Ok(list)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn service_config(name: &str, base_url: String, auth: AuthConfig) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            base_url,
            watchlist_path: "watchlist".to_string(),
            payload_field: "item".to_string(),
            items_field: None,
            timeout_seconds: Some(5),
            auth,
        }
    }

    fn bearer(token: &str) -> AuthConfig {
        AuthConfig::Bearer {
            token: token.to_string(),
        }
    }

    fn client_for(config: ServiceConfig) -> HttpWatchlistClient {
        HttpWatchlistClient::new(config, build_session().unwrap()).unwrap()
    }

    #[test]
    fn test_watchlist_url_joins_under_base() {
        let client = client_for(service_config(
            "Plex",
            "https://plex.tv/api".to_string(),
            bearer("t"),
        ));
        assert_eq!(client.endpoint(), "https://plex.tv/api/watchlist");

        let mut config = service_config("Plex", "https://plex.tv/api/".to_string(), bearer("t"));
        config.watchlist_path = "/v2/watchlist".to_string();
        assert_eq!(client_for(config).endpoint(), "https://plex.tv/api/v2/watchlist");
    }

    #[tokio::test]
    async fn test_fetch_with_bearer_auth() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v0/watchlist")
                .header("Authorization", "Bearer letterboxd-token");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!(["Dune", "Arrival", "Dune"]));
        });

        let client = client_for(service_config(
            "Letterboxd",
            server.url("/v0/"),
            bearer("letterboxd-token"),
        ));
        let list = client.fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(list.len(), 2);
        assert!(list.contains(&WatchlistItem::from("Arrival")));
    }

    #[tokio::test]
    async fn test_fetch_with_custom_header_and_envelope() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/watchlist")
                .header("X-Plex-Token", "plex-token");
            then.status(200).json_body(json!({
                "items": ["Her", 603, {"title": "ignored"}],
                "size": 3
            }));
        });

        let mut config = service_config(
            "Plex",
            server.url("/api/"),
            AuthConfig::Header {
                header: "X-Plex-Token".to_string(),
                token: "plex-token".to_string(),
            },
        );
        config.items_field = Some("items".to_string());
        let list = client_for(config).fetch().await.unwrap();

        api_mock.assert();
        let items: Vec<&str> = list.iter().map(|i| i.as_str()).collect();
        assert_eq!(items, vec!["603", "Her"]);
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_an_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/watchlist");
            then.status(401);
        });

        let client = client_for(service_config("Plex", server.url("/"), bearer("expired")));
        let err = client.fetch().await.unwrap_err();

        api_mock.assert();
        match err {
            SyncError::HttpStatus {
                service, status, ..
            } => {
                assert_eq!(service, "Plex");
                assert_eq!(status, 401);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_unexpected_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/watchlist");
            then.status(200).json_body(json!({"items": []}));
        });

        let client = client_for(service_config("Plex", server.url("/"), bearer("t")));
        let err = client.fetch().await.unwrap_err();

        assert!(matches!(err, SyncError::ProcessingError { .. }));
    }

    #[tokio::test]
    async fn test_add_item_posts_payload() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v0/watchlist")
                .header("Authorization", "Bearer letterboxd-token")
                .json_body(json!({"film": "Arrival"}));
            then.status(201);
        });

        let mut config = service_config("Letterboxd", server.url("/v0/"), bearer("letterboxd-token"));
        config.payload_field = "film".to_string();
        client_for(config)
            .add_item(&WatchlistItem::from("Arrival"))
            .await
            .unwrap();

        api_mock.assert();
    }

    #[tokio::test]
    async fn test_add_item_failure_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/watchlist");
            then.status(500);
        });

        let client = client_for(service_config("Letterboxd", server.url("/"), bearer("t")));
        let err = client
            .add_item(&WatchlistItem::from("Arrival"))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::HttpStatus { status: 500, .. }));
    }

    #[test]
    fn test_extract_items_requires_array() {
        assert!(extract_items(json!("Dune"), None, "Plex").is_err());
        assert!(extract_items(json!({"data": ["Dune"]}), Some("items"), "Plex").is_err());

        let list = extract_items(json!([null, true, "Dune"]), None, "Plex").unwrap();
        assert_eq!(list.len(), 1);
    }
}
