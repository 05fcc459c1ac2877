use chrono::{DateTime, Local};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::modules::store::NotificationRecord;

/// Why a fetch produced no snapshot; the store recovers by keeping its
/// previous state.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not signed in: {0}")]
    Auth(String),
    #[error("notification service error: {0}")]
    Network(String),
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub account: String,
    pub token: String,
}

/// HTTP client for the notification service; cheap to clone into a spawned
/// fetch task.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    base_url: String,
    identity: Option<Identity>,
}

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    notifications: Vec<FeedNotification>,
}

#[derive(Debug, Deserialize)]
struct FeedNotification {
    id: String,
    message: String,
    #[serde(default)]
    read: bool,
    #[serde(rename = "createdAt")]
    created_at: Option<String>,
}

impl FeedNotification {
    fn into_record(self) -> NotificationRecord {
        // An unparseable timestamp is not worth dropping the record over.
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Local))
            .unwrap_or_else(Local::now);
        NotificationRecord {
            id: self.id,
            message: self.message,
            read: self.read,
            created_at,
        }
    }
}

impl HttpFeed {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        identity: Option<Identity>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(concat!("belfry/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            identity,
        })
    }

    pub fn signed_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Lists notifications for the current identity in service order.
    /// Without an identity this fails before any request is issued.
    pub async fn list_notifications(&self) -> Result<Vec<NotificationRecord>, FetchError> {
        let Some(identity) = &self.identity else {
            return Err(FetchError::Auth("no identity configured".to_string()));
        };

        let url = format!("{}/v1/notifications", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&identity.token)
            .query(&[("account", identity.account.as_str())])
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {}", status)));
        }

        let envelope: FeedEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Network(format!("undecodable response: {}", e)))?;

        Ok(envelope
            .notifications
            .into_iter()
            .map(FeedNotification::into_record)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn identity() -> Option<Identity> {
        Some(Identity {
            account: "casey".to_string(),
            token: "sekrit".to_string(),
        })
    }

    fn feed_for(server: &ServerGuard) -> HttpFeed {
        HttpFeed::new(server.url(), Duration::from_secs(2), identity()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_identity_fails_before_any_request() {
        // Unroutable address: if a request were issued this would time out.
        let feed = HttpFeed::new("http://127.0.0.1:1", Duration::from_secs(1), None).unwrap();
        match feed.list_notifications().await {
            Err(FetchError::Auth(msg)) => assert!(msg.contains("no identity")),
            other => panic!("expected Auth error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_good_envelope_decodes_in_service_order() {
        let mut server = Server::new_async().await;
        let body = serde_json::json!({
            "notifications": [
                {
                    "id": "n-3",
                    "message": "Your statement is ready",
                    "read": false,
                    "createdAt": "2026-08-29T10:15:00Z"
                },
                {
                    "id": "n-2",
                    "message": "Password changed",
                    "read": true,
                    "createdAt": "2026-08-28T09:00:00Z"
                },
                {
                    "id": "n-1",
                    "message": "Welcome aboard",
                    "createdAt": "garbage"
                }
            ]
        })
        .to_string();
        let mock = server
            .mock("GET", "/v1/notifications")
            .match_query(Matcher::UrlEncoded("account".into(), "casey".into()))
            .match_header("authorization", "Bearer sekrit")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let feed = feed_for(&server);
        let records = feed.list_notifications().await.unwrap();
        mock.assert_async().await;

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["n-3", "n-2", "n-1"]);
        assert!(!records[0].read);
        assert!(records[1].read);
        // Missing read field defaults to unread.
        assert!(!records[2].read);

        let expected = DateTime::parse_from_rfc3339("2026-08-29T10:15:00Z")
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(records[0].created_at, expected);
        // Garbage timestamp fell back to the current time.
        assert!(records[2].created_at >= expected);
    }

    #[tokio::test]
    async fn test_server_error_status_is_a_network_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/notifications")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let feed = feed_for(&server);
        match feed.list_notifications().await {
            Err(FetchError::Network(msg)) => assert!(msg.contains("500")),
            other => panic!("expected Network error, got {:?}", other.map(|r| r.len())),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_network_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/notifications")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("this is not json")
            .create_async()
            .await;

        let feed = feed_for(&server);
        match feed.list_notifications().await {
            Err(FetchError::Network(msg)) => assert!(msg.contains("undecodable")),
            other => panic!("expected Network error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_network_error() {
        let feed =
            HttpFeed::new("http://127.0.0.1:1", Duration::from_secs(1), identity()).unwrap();
        match feed.list_notifications().await {
            Err(FetchError::Network(msg)) => assert!(msg.contains("request failed")),
            other => panic!("expected Network error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_empty_envelope_is_an_empty_snapshot() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/notifications")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"notifications": []}"#)
            .create_async()
            .await;

        let feed = feed_for(&server);
        let records = feed.list_notifications().await.unwrap();
        assert!(records.is_empty());
    }
}
