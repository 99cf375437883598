use reqwest::Client;

use crate::envelope::{decode, FeedResponse, FeedShape, SdkError};

/// Parameters for one feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerQuery {
    shape: FeedShape,
    protocol: String,
    ip: String,
    client_port: String,
    query_port: String,
    service_port: Option<String>,
    request: Option<String>,
}

impl ServerQuery {
    /// A multi-protocol feed request (`game_type`).
    pub fn multi(game_type: &str, ip: &str, client_port: u32, query_port: u32) -> Self {
        Self {
            shape: FeedShape::Multi,
            protocol: game_type.to_string(),
            ip: ip.to_string(),
            client_port: client_port.to_string(),
            query_port: query_port.to_string(),
            service_port: None,
            request: None,
        }
    }

    /// A single-library feed request (`lgsl_type` + `request` letters).
    pub fn single(
        lgsl_type: &str,
        ip: &str,
        client_port: u32,
        query_port: u32,
        request: &str,
    ) -> Self {
        Self {
            shape: FeedShape::Single,
            protocol: lgsl_type.to_string(),
            ip: ip.to_string(),
            client_port: client_port.to_string(),
            query_port: query_port.to_string(),
            service_port: None,
            request: Some(request.to_string()),
        }
    }

    pub fn with_service_port(mut self, port: u32) -> Self {
        self.service_port = Some(port.to_string());
        self
    }

    /// Send the query port verbatim, bypassing integer formatting.
    pub fn with_raw_query_port(mut self, raw: &str) -> Self {
        self.query_port = raw.to_string();
        self
    }

    pub fn shape(&self) -> FeedShape {
        self.shape
    }

    /// Query-string pairs in the gateway's parameter names.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        let type_key = match self.shape {
            FeedShape::Multi => "game_type",
            FeedShape::Single => "lgsl_type",
        };
        let mut params = vec![
            (type_key, self.protocol.as_str()),
            ("ip", self.ip.as_str()),
            ("c_port", self.client_port.as_str()),
            ("q_port", self.query_port.as_str()),
        ];
        if let Some(port) = &self.service_port {
            params.push(("s_port", port.as_str()));
        }
        if let Some(request) = &self.request {
            params.push(("request", request.as_str()));
        }
        params
    }
}

/// HTTP client for a running gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    multi_path: String,
    single_path: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            multi_path: "/gameq_feed".to_string(),
            single_path: "/lgsl_feed".to_string(),
        }
    }

    /// Override the feed paths when the gateway is configured with others.
    pub fn with_paths(mut self, multi_path: &str, single_path: &str) -> Self {
        self.multi_path = multi_path.to_string();
        self.single_path = single_path.to_string();
        self
    }

    fn url_for(&self, shape: FeedShape) -> String {
        let path = match shape {
            FeedShape::Multi => &self.multi_path,
            FeedShape::Single => &self.single_path,
        };
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the undecoded response body.
    pub async fn raw(&self, query: &ServerQuery) -> Result<String, SdkError> {
        let resp = self
            .client
            .get(self.url_for(query.shape()))
            .query(&query.params())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SdkError::Status(status.as_u16()));
        }
        Ok(resp.text().await?)
    }

    /// Run a query and decode the envelope.
    pub async fn query(&self, query: &ServerQuery) -> Result<FeedResponse, SdkError> {
        let body = self.raw(query).await?;
        decode(query.shape(), &body)
    }

    /// True when the liveness endpoint answers `OK`.
    pub async fn health(&self) -> Result<bool, SdkError> {
        let resp = self.client.get(format!("{}/health", self.base_url)).send().await?;
        Ok(resp.status().is_success() && resp.text().await? == "OK")
    }
}
