//! Integration test: sandbox mode end to end.

use std::sync::Arc;

use wxpay_client::ClientError;
use wxpay_core::request::OrderQuery;
use wxpay_core::{from_xml, ParameterSet, TradeState};
use wxpay_crypto::{verify, MerchantKey};
use wxpay_integration_tests::{
    callback, client, config, order_query_reply, signed_xml, CountingLedger, FakeProvider,
    API_KEY, MCH_ID,
};
use wxpay_notify::{Bill, NotificationOutcome, NotificationProcessor};

const SANDBOX_KEY: &str = "9b1f4c0e6d2a4f8c8e1d7a5b3c2e1f00";

fn sandbox_provider() -> Arc<FakeProvider> {
    let provider = FakeProvider::new();
    provider.answer(
        "/sandboxnew/pay/getsignkey",
        signed_xml(
            ParameterSet::new()
                .with("return_code", "SUCCESS")
                .with("return_msg", "ok")
                .with("mch_id", MCH_ID)
                .with("sandbox_signkey", SANDBOX_KEY),
            API_KEY,
        ),
    );
    provider.answer(
        "/sandboxnew/pay/orderquery",
        order_query_reply("T1", "SUCCESS", SANDBOX_KEY),
    );
    provider
}

fn sandbox_config() -> wxpay_core::PayConfig {
    let mut config = config();
    config.endpoint.sandbox = true;
    config
}

#[test]
fn test_sandbox_key_fetched_once_and_used_for_signing() {
    let provider = sandbox_provider();
    let client = client(sandbox_config(), &provider);

    let first = client.order_query(&OrderQuery::by_out_trade_no("T1")).unwrap();
    let second = client.order_query(&OrderQuery::by_out_trade_no("T1")).unwrap();
    assert_eq!(first.trade_state, TradeState::Success);
    assert_eq!(first, second);

    assert_eq!(provider.count("/sandboxnew/pay/getsignkey"), 1);
    assert_eq!(provider.count("/sandboxnew/pay/orderquery"), 2);

    let requests = provider.requests();
    let (key_url, key_body) = &requests[0];
    assert!(key_url.ends_with("/sandboxnew/pay/getsignkey"));
    let key_request = from_xml(key_body).unwrap();
    assert!(!key_request.contains("appid"));
    assert!(verify(&key_request, &MerchantKey::new(API_KEY).unwrap()));

    let (_, query_body) = &requests[1];
    let query = from_xml(query_body).unwrap();
    assert!(verify(&query, &MerchantKey::new(SANDBOX_KEY).unwrap()));
    assert!(!verify(&query, &MerchantKey::new(API_KEY).unwrap()));
}

#[test]
fn test_sandbox_key_failure_aborts_the_call() {
    let provider = FakeProvider::new();
    provider.answer(
        "/sandboxnew/pay/getsignkey",
        signed_xml(
            ParameterSet::new()
                .with("return_code", "FAIL")
                .with("return_msg", "mch_id not registered for sandbox"),
            API_KEY,
        ),
    );
    let client = client(sandbox_config(), &provider);

    let err = client
        .order_query(&OrderQuery::by_out_trade_no("T1"))
        .unwrap_err();
    assert!(matches!(err, ClientError::SandboxUnavailable(_)));
    assert_eq!(provider.count("/pay/orderquery"), 0);
}

#[test]
fn test_sandbox_callback_verified_with_sandbox_key() {
    let provider = sandbox_provider();
    let ledger = CountingLedger::new(vec![Bill::unpaid("T1", 100)]);
    let processor =
        NotificationProcessor::new(Arc::new(client(sandbox_config(), &provider)), ledger.clone());

    let result = processor.process(&callback("T1", 100, SANDBOX_KEY)).unwrap();

    assert_eq!(result.outcome, NotificationOutcome::Accepted(TradeState::Success));
    assert_eq!(ledger.settled(), 1);
    let reply = from_xml(&result.reply).unwrap();
    assert!(verify(&reply, &MerchantKey::new(SANDBOX_KEY).unwrap()));
}
