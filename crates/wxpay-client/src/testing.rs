//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use wxpay_core::{to_xml, ParameterSet, PayConfig};
use wxpay_crypto::{sign_params, MerchantKey};

use crate::error::ClientError;
use crate::transport::Transport;

pub(crate) const API_KEY: &str = "192006250b4c09247ec02edce69f6a2d";

#[derive(Clone)]
pub(crate) enum Reply {
    Body(String),
    Timeout,
}

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub url: String,
    pub body: String,
    pub timeout: Duration,
    pub use_client_cert: bool,
}

/// Replies are queued per path; the last reply for a path repeats.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn on(&self, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(path))
            .collect()
    }

    fn next(&self, url: &str) -> Result<String, ClientError> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies
            .iter_mut()
            .find(|(path, _)| url.ends_with(path.as_str()))
            .map(|(_, q)| q)
            .ok_or_else(|| ClientError::TransportUnavailable(format!("no route for {url}")))?;
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Timeout) => Err(ClientError::TransportTimeout("scripted".into())),
            None => Err(ClientError::TransportUnavailable(format!("no reply for {url}"))),
        }
    }
}

impl Transport for ScriptedTransport {
    fn post_xml(
        &self,
        url: &str,
        body: &str,
        timeout: Duration,
        use_client_cert: bool,
    ) -> Result<String, ClientError> {
        self.requests.lock().unwrap().push(Recorded {
            url: url.to_string(),
            body: body.to_string(),
            timeout,
            use_client_cert,
        });
        self.next(url)
    }

    fn get(&self, url: &str, timeout: Duration) -> Result<String, ClientError> {
        self.requests.lock().unwrap().push(Recorded {
            url: url.to_string(),
            body: String::new(),
            timeout,
            use_client_cert: false,
        });
        self.next(url)
    }
}

pub(crate) fn config() -> PayConfig {
    let mut config = PayConfig::default();
    config.merchant.app_id = "wx2421b1c4370ec43b".into();
    config.merchant.mch_id = "10000100".into();
    config.merchant.api_key = API_KEY.into();
    config.merchant.notify_url = "https://shop.example.com/notify".into();
    config.report.level = wxpay_core::config::ReportLevel::Off;
    config
}

pub(crate) fn signed_xml(params: ParameterSet, key: &str) -> String {
    let key = MerchantKey::new(key).unwrap();
    to_xml(sign_params(params, &key).params())
}

pub(crate) fn success(params: ParameterSet) -> ParameterSet {
    params
        .with("return_code", "SUCCESS")
        .with("return_msg", "OK")
        .with("result_code", "SUCCESS")
}
