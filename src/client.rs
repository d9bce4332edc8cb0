//! Blocking HTTP client for the configured feed server.
//!
//! One attempt per call, no retries. Transport failures and non-success statuses are classified
//! into [`FeedError`] so callers never see raw transport errors.

use std::error::Error as StdError;
use std::path::PathBuf;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response, multipart};

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult, TransportFailure};
use crate::types::{RequestParams, to_query_pairs};

/// Optional request parts for [`RequestClient::execute`].
#[derive(Debug, Clone, Default)]
pub struct RequestOptions<'a> {
    /// Form fields (sent as multipart text parts when `files` is non-empty).
    pub data: Option<&'a RequestParams>,
    /// Query string parameters.
    pub params: Option<&'a RequestParams>,
    /// `(field name, local path)` pairs uploaded as a multipart form.
    pub files: Vec<(String, PathBuf)>,
}

impl<'a> RequestOptions<'a> {
    pub fn with_params(params: &'a RequestParams) -> Self {
        Self {
            params: Some(params),
            ..Default::default()
        }
    }
}

/// HTTP client bound to a normalized base URL.
#[derive(Debug, Clone)]
pub struct RequestClient {
    client: Client,
    base_url: String,
}

impl RequestClient {
    /// Build a client honoring the configured TLS verification and timeouts.
    pub fn new(config: &FeedConfig) -> FeedResult<Self> {
        if config.server_url.is_empty() {
            return Err(FeedError::Configuration(
                "Server URL not provided in Configuration".to_string(),
            ));
        }

        let mut builder = Client::builder().danger_accept_invalid_certs(!config.verify_ssl);
        if let Some(timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.read_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FeedError::unclassified(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.server_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue `method` against `<base_url><endpoint>`.
    ///
    /// Success statuses return the response untouched. 400/401/404 and every other non-success
    /// status fail with [`FeedError::RemoteApi`] carrying the body (parsed as JSON when
    /// possible).
    pub fn execute(
        &self,
        endpoint: &str,
        method: Method,
        request: RequestOptions<'_>,
    ) -> FeedResult<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::info!(%url, %method, "Executing url");

        let builder = self.build_request(&url, method, &request)?;
        let response = builder.send().map_err(|e| classify_transport_error(&url, e))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(%url, status = status.as_u16(), "Successfully got response for url");
            return Ok(response);
        }

        let text = response.text().unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        match status.as_u16() {
            400 | 401 | 404 => tracing::debug!(%url, status = status.as_u16(), "remote API rejected request"),
            other => tracing::error!(%url, status = other, %body, "unexpected response status"),
        }
        Err(FeedError::RemoteApi {
            status: status.as_u16(),
            body,
        })
    }

    /// [`Self::execute`], then read the whole body as text.
    ///
    /// Failures while the body is streaming are classified like send failures: a stall past the
    /// read timeout is [`TransportFailure::ReadTimeout`], a dropped connection is
    /// [`TransportFailure::Connection`].
    pub fn execute_text(
        &self,
        endpoint: &str,
        method: Method,
        request: RequestOptions<'_>,
    ) -> FeedResult<String> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.execute(endpoint, method, request)?;
        response.text().map_err(|e| classify_body_error(&url, e))
    }

    /// GET the base URL and report whether the server answered with a success status.
    pub fn check_health(&self) -> FeedResult<bool> {
        let response = self.execute("", Method::GET, RequestOptions::default())?;
        Ok(response.status().is_success())
    }

    fn build_request(
        &self,
        url: &str,
        method: Method,
        request: &RequestOptions<'_>,
    ) -> FeedResult<RequestBuilder> {
        let mut builder = self.client.request(method, url);
        if let Some(params) = request.params {
            builder = builder.query(&to_query_pairs(params));
        }

        if request.files.is_empty() {
            if let Some(data) = request.data {
                builder = builder.form(&to_query_pairs(data));
            }
            return Ok(builder);
        }

        let mut form = multipart::Form::new();
        if let Some(data) = request.data {
            for (key, value) in to_query_pairs(data) {
                form = form.text(key, value);
            }
        }
        for (field, path) in &request.files {
            form = form.file(field.clone(), path)?;
        }
        Ok(builder.multipart(form))
    }
}

/// Map a transport error onto the fixed taxonomy; anything unrecognized keeps its message.
fn classify_transport_error(url: &str, err: reqwest::Error) -> FeedError {
    let failure = if is_tls_failure(&err) {
        Some(TransportFailure::Tls)
    } else if err.is_timeout() && err.is_connect() {
        Some(TransportFailure::ConnectTimeout)
    } else if err.is_timeout() {
        Some(TransportFailure::ReadTimeout)
    } else if err.is_connect() {
        Some(TransportFailure::Connection)
    } else {
        None
    };

    match failure {
        Some(failure) => {
            tracing::error!(%url, error = %err, "{}", failure.message());
            FeedError::Transport(failure)
        }
        None => {
            tracing::error!(%url, error = %err, "request failed");
            FeedError::unclassified(err.to_string())
        }
    }
}

fn classify_body_error(url: &str, err: reqwest::Error) -> FeedError {
    let failure = if err.is_timeout() {
        TransportFailure::ReadTimeout
    } else {
        TransportFailure::Connection
    };
    tracing::error!(%url, error = %err, "{}", failure.message());
    FeedError::Transport(failure)
}

fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(inner) = source {
        let msg = inner.to_string().to_ascii_lowercase();
        if msg.contains("certificate") || msg.contains("tls") || msg.contains("ssl") {
            return true;
        }
        source = inner.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;
    use crate::config::InputMode;

    #[test]
    fn empty_server_url_is_a_configuration_error() {
        let cfg = FeedConfig::for_files(InputMode::ServerUrl);
        let err = RequestClient::new(&cfg).unwrap_err();
        assert!(matches!(err, FeedError::Configuration(_)));
    }

    #[test]
    fn refused_connection_maps_to_connection_failure() {
        // Bind then drop to obtain a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let cfg = FeedConfig::new(&format!("http://127.0.0.1:{port}"), true, InputMode::ServerUrl);
        let client = RequestClient::new(&cfg).unwrap();

        let err = client
            .execute("/feed.csv", Method::GET, RequestOptions::default())
            .unwrap_err();
        assert!(matches!(err, FeedError::Transport(TransportFailure::Connection)));
        assert_eq!(err.to_string(), "Invalid endpoint or credentials");
    }
}
