//! HTTP transport seam.
//!
//! The dispatcher only needs a blocking POST of a raw XML body with a
//! per-call timeout and an optional client certificate, plus a GET for the
//! token API. [`ReqwestTransport`] is the production implementation.

use std::time::Duration;

use reqwest::blocking::{Client, ClientBuilder};
use reqwest::{Identity, Proxy};
use wxpay_core::config::TransportConfig;

use crate::error::ClientError;

/// Blocking HTTP client used by the dispatcher.
pub trait Transport: Send + Sync {
    /// POST `body` to `url` and return the response body.
    fn post_xml(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
        use_client_cert: bool,
    ) -> Result<String, ClientError>;

    /// GET `url` and return the response body.
    fn get(&self, url: &str, timeout: Duration) -> Result<String, ClientError>;
}

/// `reqwest` transport honouring the configured proxy and client certificate.
pub struct ReqwestTransport {
    plain: Client,
    with_cert: Option<Client>,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, ClientError> {
        let plain = builder(config)?.build().map_err(map_reqwest)?;
        let with_cert = match config.client_cert() {
            Some((cert_path, key_path)) => {
                // Identity::from_pem wants the certificate and key in one buffer.
                let mut pem = std::fs::read(cert_path)?;
                pem.push(b'\n');
                pem.extend(std::fs::read(key_path)?);
                let identity = Identity::from_pem(&pem)
                    .map_err(|e| ClientError::Config(format!("client certificate: {e}")))?;
                Some(builder(config)?.identity(identity).build().map_err(map_reqwest)?)
            }
            None => None,
        };
        if let Some(proxy) = config.proxy_url() {
            tracing::info!(proxy = %proxy, "using HTTP proxy");
        }
        Ok(Self { plain, with_cert })
    }

    fn client(&self, use_client_cert: bool) -> Result<&Client, ClientError> {
        if !use_client_cert {
            return Ok(&self.plain);
        }
        self.with_cert.as_ref().ok_or_else(|| {
            ClientError::Config("operation requires a client certificate but none is configured".into())
        })
    }
}

fn builder(config: &TransportConfig) -> Result<ClientBuilder, ClientError> {
    let mut builder = Client::builder().use_rustls_tls();
    if let Some(proxy) = config.proxy_url() {
        builder = builder.proxy(Proxy::all(proxy).map_err(map_reqwest)?);
    }
    Ok(builder)
}

fn map_reqwest(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::TransportTimeout(err.to_string())
    } else {
        ClientError::TransportUnavailable(err.to_string())
    }
}

fn read_body(response: reqwest::blocking::Response) -> Result<String, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::TransportUnavailable(format!("HTTP {status}")));
    }
    response.text().map_err(map_reqwest)
}

impl Transport for ReqwestTransport {
    fn post_xml(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
        use_client_cert: bool,
    ) -> Result<String, ClientError> {
        let response = self
            .client(use_client_cert)?
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(body.to_owned())
            .timeout(timeout)
            .send()
            .map_err(map_reqwest)?;
        read_body(response)
    }

    fn get(&self, url: &str, timeout: Duration) -> Result<String, ClientError> {
        let response = self.plain.get(url).timeout(timeout).send().map_err(map_reqwest)?;
        read_body(response)
    }
}
