//! Signing, encoding and sending requests.
//!
//! # Design
//! `Transport` is the only seam that touches the network: it executes an
//! `HttpRequest` and returns an `HttpResponse`. `UreqTransport` does that with
//! a blocking `ureq` agent; tests substitute their own.
//!
//! `Dispatcher` owns the rest of the exchange. It signs the unescaped
//! parameters, then escapes and encodes them (multipart body for POST, query
//! string for GET), short-circuits URL-only calls, sends, and decodes the
//! response. Failures are reported through the injected `Diagnostics` before
//! they reach the caller.

use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::diagnostics::{Diagnostics, FailureContext, TracingDiagnostics};
use crate::error::{TransportError, TurnitinError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart;
use crate::operation::FunctionCommand;
use crate::params::{RequestParams, WireValue};
use crate::response::{RemoteError, RemoteResult, TurnitinResponse};
use crate::signing::{escape_post_value, escape_query_value, sign};

/// Executes plain-data HTTP requests.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport over `ureq`. HTTP error statuses are returned as
/// responses; only connection-level failures are errors.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(read_timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_recv_response(Some(read_timeout))
            .timeout_recv_body(Some(read_timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.send(request.body.as_deref().unwrap_or_default())
            }
        };
        let mut response = result.map_err(|err| match err {
            ureq::Error::Timeout(_) => TransportError::Timeout,
            other => TransportError::Connection(other.to_string()),
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| TransportError::Body(err.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// A request ready for the wire and the signature it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub md5: String,
    pub request: HttpRequest,
}

/// What came back from a dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// URL-only call: the signed URL, nothing was sent.
    Url(String),
    Response(RemoteResult<TurnitinResponse>),
    /// Testing mode: the request went out but its result is withheld.
    Suppressed,
}

#[derive(Debug)]
pub struct Dispatcher<T = UreqTransport, D = TracingDiagnostics> {
    config: ClientConfig,
    transport: T,
    diagnostics: D,
}

impl<T: Transport, D: Diagnostics> Dispatcher<T, D> {
    pub fn new(config: ClientConfig, transport: T, diagnostics: D) -> Self {
        Self {
            config,
            transport,
            diagnostics,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    /// Sign `params` and encode them for `method`. The signature is taken
    /// over the raw values; escaping happens afterwards.
    pub fn build_request(&self, params: &RequestParams, method: HttpMethod) -> SignedRequest {
        let md5 = sign(params, &self.config.shared_secret);
        let request = match method {
            HttpMethod::Get => self.build_get(params, &md5),
            HttpMethod::Post => self.build_post(params, &md5),
        };
        SignedRequest { md5, request }
    }

    fn build_get(&self, params: &RequestParams, md5: &str) -> HttpRequest {
        let query: Vec<String> = params
            .wire_fields()
            .into_iter()
            .filter_map(|(key, value)| match value {
                WireValue::Text(text) => Some(format!("{key}={}", escape_query_value(&text))),
                WireValue::File { .. } => None,
            })
            .chain(std::iter::once(format!("md5={md5}")))
            .collect();
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}?{}", self.config.endpoint_url(), query.join("&")),
            headers: Vec::new(),
            body: None,
        }
    }

    fn build_post(&self, params: &RequestParams, md5: &str) -> HttpRequest {
        let mut fields: Vec<(&str, WireValue<'_>)> = params
            .wire_fields()
            .into_iter()
            .map(|(key, value)| match value {
                WireValue::Text(text) => (key, WireValue::Text(escape_post_value(&text))),
                file => (key, file),
            })
            .collect();
        fields.push(("md5", WireValue::Text(md5.to_string())));

        let boundary = multipart::boundary();
        HttpRequest {
            method: HttpMethod::Post,
            url: self.config.endpoint_url(),
            headers: vec![(
                "content-type".to_string(),
                multipart::content_type(&boundary),
            )],
            body: Some(multipart::encode(&fields, &boundary)),
        }
    }

    /// Sign, send and decode one call.
    pub fn send(&self, params: &RequestParams, method: HttpMethod) -> Result<Dispatched, TurnitinError> {
        let SignedRequest { md5, request } = self.build_request(params, method);

        let url_only = params.fcmd.as_deref() == Some(FunctionCommand::UrlOnly.as_str());
        if method == HttpMethod::Get && url_only {
            return Ok(Dispatched::Url(request.url));
        }

        debug!(
            fid = params.fid.as_deref().unwrap_or_default(),
            fcmd = params.fcmd.as_deref().unwrap_or_default(),
            method = ?method,
            "sending turnitin request"
        );
        let response = match self.transport.execute(&request) {
            Ok(response) => response,
            Err(source) => {
                self.report_unreachable(params, &md5, &source);
                return Err(TurnitinError::Unreachable {
                    host: self.config.host.clone(),
                    endpoint: self.config.endpoint.clone(),
                    source,
                });
            }
        };

        if self.config.testing {
            return Ok(Dispatched::Suppressed);
        }

        let result = match TurnitinResponse::parse(response) {
            Ok(parsed) => {
                if !parsed.is_success() {
                    let summary = format!("error {}", parsed.return_code());
                    self.report_remote_error(params, &md5, &summary, parsed.body());
                }
                parsed.into_result()
            }
            Err(err) => {
                if let RemoteError::Malformed { reason, body } = &err {
                    let summary = format!("malformed response ({reason})");
                    self.report_remote_error(params, &md5, &summary, body);
                }
                RemoteResult::Error(err)
            }
        };
        Ok(Dispatched::Response(result))
    }

    fn report_unreachable(&self, params: &RequestParams, md5: &str, source: &TransportError) {
        let verb = if params.pdata.is_some() { "POSTING" } else { "REQUEST" };
        self.diagnostics.log_error(&format!(
            "Turnitin API error for account_id {}: {verb} FAILED",
            self.config.account_id
        ));
        self.diagnostics.log_error(&params.to_log_json(md5));
        let context = FailureContext {
            kind: "turnitin_api_unreachable",
            account_id: &self.config.account_id,
            host: &self.config.host,
            endpoint: &self.config.endpoint,
        };
        self.diagnostics.capture(&context, source);
    }

    fn report_remote_error(&self, params: &RequestParams, md5: &str, summary: &str, body: &str) {
        self.diagnostics.log_error(&format!(
            "Turnitin API error for account_id {}: {summary}",
            self.config.account_id
        ));
        self.diagnostics.log_error(&params.to_log_json(md5));
        self.diagnostics.log_error(body);
    }
}
