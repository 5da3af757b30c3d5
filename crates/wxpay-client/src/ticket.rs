//! Access token and JSAPI ticket retrieval.
//!
//! Both values come from the JSON token API and are cached through a
//! [`TokenCache`] for the lifetime the provider announces in `expires_in`.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::TokenCache;
use crate::error::ClientError;
use crate::transport::Transport;

pub const ACCESS_TOKEN: &str = "access_token";
pub const JSAPI_TICKET: &str = "jsapi_ticket";

const TOKEN_TIMEOUT: Duration = Duration::from_secs(6);

#[derive(Debug, Deserialize)]
struct TokenReply {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    access_token: Option<String>,
    ticket: Option<String>,
    #[serde(default)]
    expires_in: u64,
}

/// Fetches and caches the JSAPI ticket used for page signatures.
pub struct JsapiTicketSource {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn TokenCache>,
    token_base: String,
    corp_id: String,
    secret: String,
}

impl JsapiTicketSource {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn TokenCache>,
        token_base: impl Into<String>,
        corp_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            cache,
            token_base: token_base.into().trim_end_matches('/').to_string(),
            corp_id: corp_id.into(),
            secret: secret.into(),
        }
    }

    pub fn access_token(&self) -> Result<String, ClientError> {
        if let Some(token) = self.cache.get(ACCESS_TOKEN) {
            return Ok(token);
        }
        let url = format!(
            "{}/cgi-bin/gettoken?corpid={}&corpsecret={}",
            self.token_base,
            urlencoding::encode(&self.corp_id),
            urlencoding::encode(&self.secret)
        );
        let reply = self.fetch(&url, "gettoken")?;
        let token = reply
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::TokenUnavailable("reply carries no access_token".into()))?;
        self.cache.put(ACCESS_TOKEN, token.clone(), Duration::from_secs(reply.expires_in));
        tracing::debug!(expires_in = reply.expires_in, "access token refreshed");
        Ok(token)
    }

    pub fn ticket(&self) -> Result<String, ClientError> {
        if let Some(ticket) = self.cache.get(JSAPI_TICKET) {
            return Ok(ticket);
        }
        let url = format!(
            "{}/cgi-bin/get_jsapi_ticket?access_token={}",
            self.token_base,
            urlencoding::encode(&self.access_token()?)
        );
        let reply = self.fetch(&url, "get_jsapi_ticket")?;
        let ticket = reply
            .ticket
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::TokenUnavailable("reply carries no ticket".into()))?;
        self.cache.put(JSAPI_TICKET, ticket.clone(), Duration::from_secs(reply.expires_in));
        tracing::debug!(expires_in = reply.expires_in, "jsapi ticket refreshed");
        Ok(ticket)
    }

    // `url` embeds the secret; only `endpoint` is logged.
    fn fetch(&self, url: &str, endpoint: &str) -> Result<TokenReply, ClientError> {
        let body = self.transport.get(url, TOKEN_TIMEOUT)?;
        let reply: TokenReply = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedResponse(format!("{endpoint}: {e}")))?;
        if reply.errcode != 0 {
            tracing::warn!(endpoint, errcode = reply.errcode, errmsg = %reply.errmsg, "token API error");
            return Err(ClientError::TokenUnavailable(format!(
                "{endpoint}: {} {}",
                reply.errcode, reply.errmsg
            )));
        }
        Ok(reply)
    }
}
