//! reqwest-backed executor

use std::error::Error as StdError;

use async_trait::async_trait;

use crate::common::config::PreviewConfig;
use crate::common::{Error, Result};

use super::{HttpExecutor, HttpResponse, Method, RequestSpec, ResponseBody, TransportError,
    TransportErrorKind};

/// Executor sending real requests through a shared reqwest client
pub struct ReqwestExecutor {
    client: reqwest::Client,
    preview: PreviewConfig,
}

impl ReqwestExecutor {
    pub fn new(preview: PreviewConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("apiprobe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { client, preview })
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Flatten a reqwest error and its sources into one line
fn transport_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    };

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    TransportError::new(kind, message)
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: &RequestSpec) -> std::result::Result<HttpResponse, TransportError> {
        tracing::debug!(method = %request.method, url = %request.url, "Sending request");

        let mut builder = self
            .client
            .request(to_reqwest(request.method), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;

        let response = HttpResponse {
            status,
            body: ResponseBody::parse(text),
        };

        tracing::info!(
            target: "apiprobe::preview",
            status,
            "{} {}\n{}",
            request.method,
            request.url,
            response.preview(self.preview)
        );

        Ok(response)
    }
}
