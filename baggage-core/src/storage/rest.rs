use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

use super::{RecordStore, StorageError};
use crate::config::StorageConfig;
use crate::error::BaggageError;
use crate::models::{NewRecord, RecordFilter, StoredRecord};

/// PostgREST (Supabase) client for the response table.
#[derive(Debug, Clone)]
pub struct RestRecordStore {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RestRecordStore {
    pub fn new(config: &StorageConfig) -> Result<Self, BaggageError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| BaggageError::MissingConfig("SUPABASE_URL".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| BaggageError::MissingConfig("SUPABASE_KEY".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", url.trim_end_matches('/'), config.table),
            api_key,
        })
    }

    async fn check_status(response: Response) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Api {
            code: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn insert(&self, record: &NewRecord) -> Result<StoredRecord, StorageError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await?;

        let rows: Vec<StoredRecord> = Self::check_status(response).await?.json().await?;
        rows.into_iter().next().ok_or(StorageError::NoRowReturned)
    }

    async fn list(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StorageError> {
        let mut params: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", filter.limit.to_string()),
            ("offset", filter.offset.to_string()),
        ];
        if let Some(item) = &filter.item {
            params.push(("item", format!("eq.{}", item)));
        }

        let response = self
            .client
            .get(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&params)
            .send()
            .await?;

        Ok(Self::check_status(response).await?.json().await?)
    }

    fn name(&self) -> &str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> RestRecordStore {
        let config = StorageConfig {
            url: Some(server.uri()),
            api_key: Some("service-key".to_string()),
            timeout_seconds: 2,
            ..StorageConfig::default()
        };
        RestRecordStore::new(&config).expect("Failed to create store")
    }

    fn row(id: i64, item: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "item": item,
            "check_in": true,
            "carry_on": false,
            "description": "Pack it in checked baggage.",
            "created_at": "2024-05-01T12:30:00+00:00"
        })
    }

    #[test]
    fn test_new_requires_credentials() {
        let config = StorageConfig {
            url: Some("https://example.supabase.co".to_string()),
            ..StorageConfig::default()
        };
        assert!(matches!(
            RestRecordStore::new(&config),
            Err(BaggageError::MissingConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_posts_row_and_returns_representation() {
        let mock_server = MockServer::start().await;
        let store = store_for(&mock_server);

        Mock::given(method("POST"))
            .and(path("/rest/v1/tsa_responses"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("prefer", "return=representation"))
            .and(body_json(serde_json::json!([{
                "item": "scissors",
                "check_in": true,
                "carry_on": false,
                "description": "Pack it in checked baggage."
            }])))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([
                row(42, "scissors")
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let stored = store
            .insert(&NewRecord {
                item: "scissors".to_string(),
                check_in: true,
                carry_on: false,
                description: "Pack it in checked baggage.".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(stored.id, Some(42));
        assert_eq!(stored.item, "scissors");
    }

    #[tokio::test]
    async fn test_insert_surfaces_store_errors() {
        let mock_server = MockServer::start().await;
        let store = store_for(&mock_server);

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&mock_server)
            .await;

        let result = store
            .insert(&NewRecord {
                item: "knife".to_string(),
                check_in: true,
                carry_on: false,
                description: "x".to_string(),
            })
            .await;
        assert!(matches!(result, Err(StorageError::Api { code: 503, .. })));
    }

    #[tokio::test]
    async fn test_list_filters_by_item_newest_first() {
        let mock_server = MockServer::start().await;
        let store = store_for(&mock_server);

        Mock::given(method("GET"))
            .and(path("/rest/v1/tsa_responses"))
            .and(query_param("item", "eq.water bottle"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "50"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                row(2, "water bottle"),
                row(1, "water bottle")
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let filter = RecordFilter::new(Some("water bottle".to_string()), None, None);
        let rows = store.list(&filter).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, Some(2));
    }

    #[tokio::test]
    async fn test_list_surfaces_store_errors() {
        let mock_server = MockServer::start().await;
        let store = store_for(&mock_server);

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let result = store.list(&RecordFilter::default()).await;
        assert!(matches!(result, Err(StorageError::Api { code: 500, .. })));
    }

    #[tokio::test]
    async fn test_plain_timestamp_columns_decode() {
        let mock_server = MockServer::start().await;
        let store = store_for(&mock_server);

        let mut plain = row(5, "knife");
        plain["created_at"] = serde_json::json!("2024-05-01T12:30:00.123456");

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!([plain.clone()])),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([plain])))
            .mount(&mock_server)
            .await;

        let stored = store
            .insert(&NewRecord {
                item: "knife".to_string(),
                check_in: true,
                carry_on: false,
                description: "Pack it in checked baggage.".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(stored.id, Some(5));

        let rows = store.list(&RecordFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].created_at.to_rfc3339(),
            "2024-05-01T12:30:00.123456+00:00"
        );
    }
}
