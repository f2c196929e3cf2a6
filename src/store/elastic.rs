//! Elasticsearch HTTP client.

use super::{DocumentStore, StoreError, WriteOutcome};
use crate::batch::BatchItem;
use crate::schema::{FieldType, TableSpec};
use log::debug;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bulk rejection statuses expected to succeed on retry.
const TRANSIENT_STATUS: &[u16] = &[429, 503];
const TRANSIENT_ERROR_TYPES: &[&str] = &[
    "es_rejected_execution_exception",
    "circuit_breaking_exception",
];

#[derive(Clone)]
pub struct ElasticClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ElasticClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent("eceg-loader/0.1")
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.http.request(method, url);
        if let Some(ref key) = self.api_key {
            builder.header("Authorization", format!("ApiKey {key}"))
        } else {
            builder
        }
    }

    async fn error_from(response: reqwest::Response) -> StoreError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error body".to_string());
        StoreError::Status { status, body }
    }

    /// Index settings and mappings derived from the table spec.
    fn mapping_body(spec: &TableSpec) -> Value {
        let mut properties = serde_json::Map::new();
        for field in &spec.fields {
            properties.insert(field.name.clone(), Self::field_mapping(&field.field_type));
        }

        json!({
            "settings": {
                "number_of_shards": 1,
                "number_of_replicas": 1,
                "refresh_interval": "5s",
                "analysis": {
                    "analyzer": {
                        "spanish_analyzer": { "type": "spanish" }
                    }
                }
            },
            "mappings": { "properties": Value::Object(properties) }
        })
    }

    fn field_mapping(field_type: &FieldType) -> Value {
        match field_type {
            FieldType::Keyword => json!({ "type": "keyword" }),
            FieldType::Integer => json!({ "type": "integer" }),
            FieldType::Float => json!({ "type": "float" }),
            FieldType::Text { analyzer } => {
                let mut mapping = json!({
                    "type": "text",
                    "fields": { "keyword": { "type": "keyword" } }
                });
                if let Some(analyzer) = analyzer {
                    mapping["analyzer"] = Value::String(analyzer.clone());
                }
                mapping
            }
        }
    }

    /// NDJSON payload for the `_bulk` endpoint: one action line and one
    /// source line per item.
    fn bulk_body(items: &[BatchItem]) -> Result<String, StoreError> {
        let mut body = String::new();
        for item in items {
            let action = match &item.id {
                Some(id) => json!({ "index": { "_id": id } }),
                None => json!({ "index": {} }),
            };
            body.push_str(&action.to_string());
            body.push('\n');
            body.push_str(&serde_json::to_string(&item.document)?);
            body.push('\n');
        }
        Ok(body)
    }
}

impl DocumentStore for ElasticClient {
    async fn ping(&self) -> Result<(), StoreError> {
        let response = self.request(Method::GET, "/").send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn index_exists(&self, index: &str) -> Result<bool, StoreError> {
        let response = self
            .request(Method::HEAD, &format!("/{index}"))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn create_index(&self, spec: &TableSpec) -> Result<(), StoreError> {
        let response = self
            .request(Method::PUT, &format!("/{}", spec.index))
            .json(&Self::mapping_body(spec))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!("index {} created", spec.index);
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error body".to_string());
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
            debug!("index {} already exists", spec.index);
            return Ok(());
        }

        Err(StoreError::Status { status, body })
    }

    async fn bulk_write(
        &self,
        index: &str,
        items: &[BatchItem],
    ) -> Result<Vec<WriteOutcome>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .request(Method::POST, &format!("/{index}/_bulk"))
            .header("Content-Type", "application/x-ndjson")
            .body(Self::bulk_body(items)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let parsed: BulkResponse = response.json().await?;
        if parsed.items.len() != items.len() {
            return Err(StoreError::ItemCountMismatch {
                sent: items.len(),
                got: parsed.items.len(),
            });
        }

        Ok(parsed
            .items
            .into_iter()
            .map(BulkResponseItem::into_outcome)
            .collect())
    }

    async fn count(&self, index: &str) -> Result<u64, StoreError> {
        let response = self
            .request(Method::GET, &format!("/{index}/_count"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let parsed: CountResponse = response.json().await?;
        Ok(parsed.count)
    }
}

#[derive(Deserialize)]
struct BulkResponse {
    items: Vec<BulkResponseItem>,
}

/// One entry of a `_bulk` response, keyed by the action name.
#[derive(Deserialize)]
struct BulkResponseItem {
    #[serde(alias = "create")]
    index: BulkItemStatus,
}

#[derive(Deserialize)]
struct BulkItemStatus {
    status: u16,
    error: Option<BulkItemError>,
}

#[derive(Deserialize)]
struct BulkItemError {
    #[serde(rename = "type")]
    error_type: String,
    reason: Option<String>,
}

impl BulkResponseItem {
    fn into_outcome(self) -> WriteOutcome {
        let BulkItemStatus { status, error } = self.index;
        if error.is_none() && (200..300).contains(&status) {
            return WriteOutcome::Accepted;
        }

        let transient = TRANSIENT_STATUS.contains(&status)
            || error
                .as_ref()
                .is_some_and(|err| TRANSIENT_ERROR_TYPES.contains(&err.error_type.as_str()));

        let reason = match error {
            Some(err) => match err.reason {
                Some(reason) => format!("{}: {}", err.error_type, reason),
                None => err.error_type,
            },
            None => format!("status {status}"),
        };

        WriteOutcome::Rejected { reason, transient }
    }
}

#[derive(Deserialize)]
struct CountResponse {
    count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{Document, FieldValue};
    use crate::schema::{integer, keyword, spanish_text};

    #[test]
    fn mapping_body_reflects_field_types() {
        let spec = TableSpec {
            index: "cat".to_string(),
            fields: vec![keyword("CVE"), spanish_text("DESC"), integer("POBTOT")],
            id_field: None,
        };

        let body = ElasticClient::mapping_body(&spec);
        let properties = &body["mappings"]["properties"];

        assert_eq!(properties["CVE"]["type"], "keyword");
        assert_eq!(properties["POBTOT"]["type"], "integer");
        assert_eq!(properties["DESC"]["type"], "text");
        assert_eq!(properties["DESC"]["analyzer"], "spanish_analyzer");
        assert_eq!(properties["DESC"]["fields"]["keyword"]["type"], "keyword");
        assert_eq!(
            body["settings"]["analysis"]["analyzer"]["spanish_analyzer"]["type"],
            "spanish"
        );
    }

    #[test]
    fn bulk_body_pairs_action_and_source_lines() {
        let items = vec![
            BatchItem {
                document: Document::from([("CVE".to_string(), FieldValue::Str("01".to_string()))]),
                index: "cat".to_string(),
                id: Some("01".to_string()),
            },
            BatchItem {
                document: Document::from([("CVE".to_string(), FieldValue::Absent)]),
                index: "cat".to_string(),
                id: None,
            },
        ];

        let body = ElasticClient::bulk_body(&items).unwrap();
        let lines: Vec<&str> = body.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("\"_id\":\"01\""));
        assert_eq!(lines[2], r#"{"index":{}}"#);
        assert_eq!(lines[3], r#"{"CVE":null}"#);
    }

    #[test]
    fn outcome_classification() {
        let accepted = BulkResponseItem {
            index: BulkItemStatus {
                status: 201,
                error: None,
            },
        };
        assert_eq!(accepted.into_outcome(), WriteOutcome::Accepted);

        let throttled = BulkResponseItem {
            index: BulkItemStatus {
                status: 429,
                error: Some(BulkItemError {
                    error_type: "es_rejected_execution_exception".to_string(),
                    reason: Some("queue full".to_string()),
                }),
            },
        };
        assert_eq!(
            throttled.into_outcome(),
            WriteOutcome::Rejected {
                reason: "es_rejected_execution_exception: queue full".to_string(),
                transient: true,
            }
        );

        let malformed = BulkResponseItem {
            index: BulkItemStatus {
                status: 400,
                error: Some(BulkItemError {
                    error_type: "mapper_parsing_exception".to_string(),
                    reason: None,
                }),
            },
        };
        assert_eq!(
            malformed.into_outcome(),
            WriteOutcome::Rejected {
                reason: "mapper_parsing_exception".to_string(),
                transient: false,
            }
        );
    }
}
