//! Integration test: request signing as seen on the wire.

use wxpay_core::request::OrderQuery;
use wxpay_core::{from_xml, ParameterSet};
use wxpay_crypto::{md5_upper_hex, sign, verify, MerchantKey};
use wxpay_integration_tests::{client, config, order_query_reply, FakeProvider, API_KEY, APP_ID, MCH_ID};

#[test]
fn test_signature_over_sorted_canonical_string() {
    let key = MerchantKey::new("testkey").unwrap();
    let params = ParameterSet::new()
        .with("total_fee", 100)
        .with("out_trade_no", "T1");

    let expected = md5_upper_hex(b"out_trade_no=T1&total_fee=100&key=testkey");
    assert_eq!(sign(&params, &key), expected);
    assert_eq!(expected, "288552FECDB84948DE63E64FDD4B3E68");
}

#[test]
fn test_sent_request_carries_identity_and_valid_signature() {
    let provider = FakeProvider::new();
    provider.answer("/pay/orderquery", order_query_reply("T1", "NOTPAY", API_KEY));
    let client = client(config(), &provider);

    client.order_query(&OrderQuery::by_out_trade_no("T1")).unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    let (url, body) = &requests[0];
    assert_eq!(url, "https://api.mch.weixin.qq.com/pay/orderquery");

    let sent = from_xml(body).unwrap();
    assert_eq!(sent.get("appid"), Some(APP_ID));
    assert_eq!(sent.get("mch_id"), Some(MCH_ID));
    assert_eq!(sent.get("out_trade_no"), Some("T1"));
    assert_eq!(sent.get("nonce_str").map(str::len), Some(32));
    assert!(verify(&sent, &MerchantKey::new(API_KEY).unwrap()));
    assert!(!verify(&sent, &MerchantKey::new("otherkey").unwrap()));
}

#[test]
fn test_response_signed_with_wrong_key_is_fatal() {
    let provider = FakeProvider::new();
    provider.answer("/pay/orderquery", order_query_reply("T1", "SUCCESS", "wrongkey"));
    let client = client(config(), &provider);

    let err = client
        .order_query(&OrderQuery::by_out_trade_no("T1"))
        .unwrap_err();
    assert!(matches!(err, wxpay_client::ClientError::SignatureInvalid { .. }));
}
