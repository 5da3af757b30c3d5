//! Fixtures shared by the cross-crate tests: a scripted provider, a
//! counting ledger and helpers for building signed frames.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use wxpay_client::{ClientError, InMemoryTokenCache, PayClient, Transport};
use wxpay_core::config::ReportLevel;
use wxpay_core::{to_xml, ParameterSet, PayConfig};
use wxpay_crypto::{sign_params, MerchantKey};
use wxpay_notify::{Bill, BillCriteria, InMemoryLedger, Ledger, LedgerError};

/// Signing key from the provider's documentation.
pub const API_KEY: &str = "192006250b4c09247ec02edce69f6a2d";
pub const APP_ID: &str = "wx2421b1c4370ec43b";
pub const MCH_ID: &str = "10000100";

/// Provider stand-in. Each path answers with a fixed body; every request
/// is recorded.
#[derive(Default)]
pub struct FakeProvider {
    bodies: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl FakeProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer requests whose URL ends with `path`.
    pub fn answer(&self, path: &str, body: impl Into<String>) {
        self.bodies.lock().unwrap().insert(path.to_string(), body.into());
    }

    /// URL and body of every request sent so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(url, _)| url.ends_with(path))
            .count()
    }

    fn reply(&self, url: &str) -> Result<String, ClientError> {
        let bodies = self.bodies.lock().unwrap();
        bodies
            .iter()
            .filter(|(path, _)| url.ends_with(path.as_str()))
            .max_by_key(|(path, _)| path.len())
            .map(|(_, body)| body.clone())
            .ok_or_else(|| ClientError::TransportUnavailable(format!("connection refused: {url}")))
    }
}

impl Transport for FakeProvider {
    fn post_xml(
        &self,
        url: &str,
        body: &str,
        _timeout: Duration,
        _use_client_cert: bool,
    ) -> Result<String, ClientError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.to_string()));
        self.reply(url)
    }

    fn get(&self, url: &str, _timeout: Duration) -> Result<String, ClientError> {
        self.requests.lock().unwrap().push((url.to_string(), String::new()));
        self.reply(url)
    }
}

/// Ledger wrapper that counts successful settlements.
pub struct CountingLedger {
    inner: InMemoryLedger,
    settled: AtomicUsize,
}

impl CountingLedger {
    pub fn new(bills: impl IntoIterator<Item = Bill>) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryLedger::with_bills(bills),
            settled: AtomicUsize::new(0),
        })
    }

    pub fn settled(&self) -> usize {
        self.settled.load(Ordering::SeqCst)
    }

    pub fn bill(&self, out_trade_no: &str) -> Option<Bill> {
        self.inner.get(out_trade_no)
    }
}

impl Ledger for CountingLedger {
    fn check_paid_bill(&self, criteria: &BillCriteria) -> Result<bool, LedgerError> {
        self.inner.check_paid_bill(criteria)
    }

    fn check_not_pay_bill(&self, criteria: &BillCriteria) -> Result<Option<Bill>, LedgerError> {
        self.inner.check_not_pay_bill(criteria)
    }

    fn bill_paid(&self, criteria: &BillCriteria, paid_at: &str) -> Result<(), LedgerError> {
        self.inner.bill_paid(criteria, paid_at)?;
        self.settled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Merchant configuration with reporting switched off.
pub fn config() -> PayConfig {
    let mut config = PayConfig::default();
    config.merchant.app_id = APP_ID.into();
    config.merchant.mch_id = MCH_ID.into();
    config.merchant.api_key = API_KEY.into();
    config.merchant.notify_url = "https://shop.example.com/notify".into();
    config.report.level = ReportLevel::Off;
    config
}

pub fn client(config: PayConfig, provider: &Arc<FakeProvider>) -> PayClient {
    PayClient::with_transport(config, provider.clone(), Arc::new(InMemoryTokenCache::new()))
        .unwrap()
}

/// Encode `params` as a frame signed with `key`.
pub fn signed_xml(params: ParameterSet, key: &str) -> String {
    let key = MerchantKey::new(key).unwrap();
    to_xml(sign_params(params, &key).params())
}

pub fn success(params: ParameterSet) -> ParameterSet {
    params
        .with("return_code", "SUCCESS")
        .with("return_msg", "OK")
        .with("result_code", "SUCCESS")
}

/// A payment result callback for `out_trade_no`, signed with `key`.
pub fn callback(out_trade_no: &str, total_fee: u64, key: &str) -> String {
    signed_xml(
        success(ParameterSet::new())
            .with("appid", APP_ID)
            .with("mch_id", MCH_ID)
            .with("nonce_str", "5d2b6c2a8db53831f7eda20af46e531c")
            .with("openid", "oUpF8uMEb4qRXf22hE3X68TekukE")
            .with("out_trade_no", out_trade_no)
            .with("transaction_id", "1004400740201409030005092168")
            .with("total_fee", total_fee)
            .with("trade_type", "JSAPI")
            .with("time_end", "20140903131540"),
        key,
    )
}

/// The provider's order query answer for a trade in `trade_state`.
pub fn order_query_reply(out_trade_no: &str, trade_state: &str, key: &str) -> String {
    signed_xml(
        success(ParameterSet::new())
            .with("appid", APP_ID)
            .with("mch_id", MCH_ID)
            .with("nonce_str", "BFK89FC6rxKCOjLX")
            .with("out_trade_no", out_trade_no)
            .with("transaction_id", "1004400740201409030005092168")
            .with("trade_state", trade_state)
            .with("total_fee", 100)
            .with("time_end", "20140903131600"),
        key,
    )
}
