//! The network seam.
//!
//! `Transport` executes one `HttpRequest` and returns the response without
//! interpreting its status. `UreqTransport` is the production implementation;
//! tests substitute their own.

use log::debug;
use ureq::typestate::WithBody;
use ureq::{Agent, RequestBuilder};

use crate::config::ClientConfig;
use crate::error::{RequestError, RequestResult};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseBody};

/// Executes HTTP requests. Implementations must be shareable between threads.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> RequestResult<HttpResponse>;
}

/// Blocking transport backed by a single `ureq::Agent`.
///
/// The agent pools connections internally, so one value serves every request
/// a `Courier` makes.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout())
            .max_redirects(config.max_redirects)
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    fn send(&self, builder: RequestBuilder<WithBody>, body: Option<Vec<u8>>) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        match body {
            Some(bytes) => builder.send(&bytes[..]),
            None => builder.send_empty(),
        }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> RequestResult<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        debug!("{method} {url}");

        let result = match method {
            HttpMethod::Get => apply_headers(self.agent.get(&url), &self.user_agent, &headers).call(),
            HttpMethod::Post => self.send(apply_headers(self.agent.post(&url), &self.user_agent, &headers), body),
            HttpMethod::Put => self.send(apply_headers(self.agent.put(&url), &self.user_agent, &headers), body),
            HttpMethod::Delete => {
                let builder = apply_headers(self.agent.delete(&url), &self.user_agent, &headers);
                match body {
                    Some(_) => self.send(builder.force_send_body(), body),
                    None => builder.call(),
                }
            }
        };
        let response = result.map_err(|e| RequestError::transport(format!("{method} {url}"), e))?;

        let status = response.status().as_u16();
        debug!("{method} {url} -> {status}");
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = ResponseBody::from_reader(response.into_body().into_reader());

        Ok(HttpResponse { status, headers, body })
    }
}

fn apply_headers<B>(mut builder: RequestBuilder<B>, user_agent: &str, headers: &[(String, String)]) -> RequestBuilder<B> {
    builder = builder.header("user-agent", user_agent);
    for (key, value) in headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder
}
