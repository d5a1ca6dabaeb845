use async_trait::async_trait;
use reqwest::{Client, header::AUTHORIZATION};

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub authorization: Option<String>,
    pub body: RequestBody,
}

impl OutboundRequest {
    pub fn form(url: String, fields: &[(&str, &str)]) -> Self {
        Self {
            url,
            authorization: None,
            body: RequestBody::Form(
                fields
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            ),
        }
    }

    pub fn json(url: String, value: serde_json::Value) -> Self {
        Self {
            url,
            authorization: None,
            body: RequestBody::Json(value),
        }
    }

    pub fn with_authorization(mut self, authorization: String) -> Self {
        self.authorization = Some(authorization);
        self
    }

    /// Value of a form field, if this is a form request.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.as_str()),
            RequestBody::Json(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure: the upstream never produced an HTTP response.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Outbound HTTP seam shared by every provider call.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: OutboundRequest) -> Result<UpstreamReply, TransportError>;
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: OutboundRequest) -> Result<UpstreamReply, TransportError> {
        let mut builder = self.client.post(&request.url);

        if let Some(authorization) = &request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        builder = match &request.body {
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Json(value) => builder.json(value),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError(format!("Request to {} failed: {}", request.url, e)))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        Ok(UpstreamReply { status, body })
    }
}
