// src/webhook.rs

use crate::form::InvoicePayload;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use thiserror::Error;
use tracing::{info, warn};

/// Endpoint used when neither the config file nor the environment names one.
pub const DEFAULT_WEBHOOK_URL: &str = "https://invoices.app.n8n.cloud/webhook/tax-invoice";

/// What came back from the invoice webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub content_disposition: Option<String>,
    /// Only read for success statuses.
    pub body: Vec<u8>,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a usable response.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(e.to_string())
    }
}

#[async_trait]
pub trait Webhook: Send + Sync {
    async fn post_invoice(&self, payload: &InvoicePayload)
    -> Result<WebhookResponse, TransportError>;
}

/// Posts invoices to the automation webhook over HTTP.
pub struct HttpWebhook {
    client: Client,
    url: String,
}

impl HttpWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Webhook for HttpWebhook {
    async fn post_invoice(
        &self,
        payload: &InvoicePayload,
    ) -> Result<WebhookResponse, TransportError> {
        info!(url = %self.url, bill_number = %payload.bill_number, "Posting invoice to webhook");

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            warn!(status = %status, "Webhook returned non-success status");
            return Ok(WebhookResponse {
                status: status.as_u16(),
                content_disposition,
                body: Vec::new(),
            });
        }

        let body = response.bytes().await?.to_vec();
        info!(status = %status, bytes = body.len(), "Webhook response received");

        Ok(WebhookResponse {
            status: status.as_u16(),
            content_disposition,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::routing::post;
    use std::sync::Arc;
    use tokio::net::TcpListener;
    use tokio::sync::{Mutex, oneshot};

    fn payload() -> InvoicePayload {
        InvoicePayload {
            company_name: "Acme & Co".to_string(),
            bill_number: "2025-26/007".to_string(),
            bill_type: "Quote".to_string(),
            bill_date: "2025-06-30".to_string(),
            consignment_number: "CN-1".to_string(),
            item_description: "M.S. Pipe".to_string(),
            quantity: "10".to_string(),
            bundles: "2".to_string(),
            rate: "99.5".to_string(),
        }
    }

    fn client() -> Client {
        Client::builder().no_proxy().build().expect("client")
    }

    type Captured = Arc<Mutex<Option<oneshot::Sender<(Option<String>, serde_json::Value)>>>>;

    async fn spawn_server(
        status: StatusCode,
        disposition: Option<&'static str>,
    ) -> (String, oneshot::Receiver<(Option<String>, serde_json::Value)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = oneshot::channel();
        let captured: Captured = Arc::new(Mutex::new(Some(tx)));

        let app = Router::new().route(
            "/webhook",
            post(move |headers: HeaderMap, body: String| {
                let captured = captured.clone();
                async move {
                    let content_type = headers
                        .get(header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let json: serde_json::Value =
                        serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
                    if let Some(tx) = captured.lock().await.take() {
                        let _ = tx.send((content_type, json));
                    }
                    let mut out = HeaderMap::new();
                    if let Some(d) = disposition {
                        out.insert(header::CONTENT_DISPOSITION, d.parse().expect("header"));
                    }
                    (status, out, b"PK\x03\x04sheet".to_vec())
                }
            }),
        );
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}/webhook"), rx)
    }

    #[tokio::test]
    async fn posts_json_and_reads_attachment() {
        let (url, rx) =
            spawn_server(StatusCode::OK, Some(r#"attachment; filename="abc.xlsx""#)).await;
        let hook = HttpWebhook::with_client(client(), url);

        let response = hook.post_invoice(&payload()).await.expect("response");
        assert!(response.is_success());
        assert_eq!(response.body, b"PK\x03\x04sheet".to_vec());
        assert_eq!(
            response.content_disposition.as_deref(),
            Some(r#"attachment; filename="abc.xlsx""#)
        );

        let (content_type, json) = rx.await.expect("captured request");
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(json["companyName"], "Acme & Co");
        assert_eq!(json["billNumber"], "2025-26/007");
        assert_eq!(json["rate"], "99.5");
    }

    #[tokio::test]
    async fn server_error_is_reported_as_status() {
        let (url, _rx) = spawn_server(StatusCode::INTERNAL_SERVER_ERROR, None).await;
        let hook = HttpWebhook::with_client(client(), url);

        let response = hook.post_invoice(&payload()).await.expect("response");
        assert_eq!(response.status, 500);
        assert!(!response.is_success());
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let hook = HttpWebhook::with_client(client(), format!("http://{addr}/webhook"));
        let err = hook.post_invoice(&payload()).await.expect_err("must fail");
        assert!(!err.message.is_empty());
    }
}
