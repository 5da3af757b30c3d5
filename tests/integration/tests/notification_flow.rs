//! Integration test: payment callbacks against a real client and ledger.
//!
//! The provider is scripted; the client, processor and ledger are the
//! production types.

use std::sync::Arc;

use wxpay_core::request::UnifiedOrder;
use wxpay_core::{from_xml, ParameterSet, TradeState, TradeType};
use wxpay_crypto::{verify, MerchantKey};
use wxpay_integration_tests::{
    callback, client, config, order_query_reply, signed_xml, success, CountingLedger,
    FakeProvider, API_KEY, APP_ID, MCH_ID,
};
use wxpay_notify::processor::{BILL_NOT_FOUND, ORDER_QUERY_FAILED, PARAMETER_FORMAT_ERROR};
use wxpay_notify::{
    Bill, BillStatus, NativeOrderFactory, NotificationOutcome, NotificationProcessor,
    NotificationState,
};

fn setup(bills: Vec<Bill>) -> (Arc<FakeProvider>, Arc<CountingLedger>, NotificationProcessor) {
    let provider = FakeProvider::new();
    let ledger = CountingLedger::new(bills);
    let processor =
        NotificationProcessor::new(Arc::new(client(config(), &provider)), ledger.clone());
    (provider, ledger, processor)
}

fn is_signed_success(reply: &str) -> bool {
    let params = from_xml(reply).unwrap();
    params.get("return_code") == Some("SUCCESS")
        && params.get("return_msg") == Some("OK")
        && verify(&params, &MerchantKey::new(API_KEY).unwrap())
}

// =========================================================================
// Settlement
// =========================================================================

#[test]
fn test_pending_bill_is_settled_once() {
    let (provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);
    provider.answer("/pay/orderquery", order_query_reply("T1", "SUCCESS", API_KEY));

    let result = processor.process(&callback("T1", 100, API_KEY)).unwrap();

    assert_eq!(result.outcome, NotificationOutcome::Accepted(TradeState::Success));
    assert_eq!(result.state, NotificationState::Replied);
    assert!(result.settled);
    assert!(is_signed_success(&result.reply));
    assert_eq!(ledger.settled(), 1);

    let bill = ledger.bill("T1").unwrap();
    assert_eq!(bill.status, BillStatus::Paid);
    assert_eq!(bill.paid_at.as_deref(), Some("20140903131600"));
    assert_eq!(provider.count("/pay/orderquery"), 1);
}

#[test]
fn test_redelivery_is_acknowledged_without_second_settlement() {
    let (provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);
    provider.answer("/pay/orderquery", order_query_reply("T1", "SUCCESS", API_KEY));
    let raw = callback("T1", 100, API_KEY);

    let first = processor.process(&raw).unwrap();
    let second = processor.process(&raw).unwrap();

    for result in [&first, &second] {
        assert!(result.outcome.is_accepted());
        assert_eq!(result.state, NotificationState::Replied);
        assert!(is_signed_success(&result.reply));
    }
    assert!(first.settled);
    assert!(!second.settled);
    assert_eq!(ledger.settled(), 1);
    // The redelivery is answered from the ledger alone.
    assert_eq!(provider.count("/pay/orderquery"), 1);
}

#[test]
fn test_concurrent_deliveries_settle_once() {
    let (provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);
    provider.answer("/pay/orderquery", order_query_reply("T1", "SUCCESS", API_KEY));
    let processor = Arc::new(processor);
    let raw = callback("T1", 100, API_KEY);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let processor = processor.clone();
            let raw = raw.clone();
            std::thread::spawn(move || processor.process(&raw).unwrap())
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.iter().all(|r| r.outcome.is_accepted()));
    assert_eq!(results.iter().filter(|r| r.settled).count(), 1);
    assert_eq!(ledger.settled(), 1);
}

#[test]
fn test_unpaid_trade_is_acknowledged_but_not_settled() {
    let (provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);
    provider.answer("/pay/orderquery", order_query_reply("T1", "USERPAYING", API_KEY));

    let result = processor.process(&callback("T1", 100, API_KEY)).unwrap();

    assert_eq!(result.outcome, NotificationOutcome::Accepted(TradeState::UserPaying));
    assert!(!result.settled);
    assert_eq!(ledger.settled(), 0);
    assert_eq!(ledger.bill("T1").unwrap().status, BillStatus::Unpaid);
}

// =========================================================================
// Rejections
// =========================================================================

fn assert_unsigned_failure(reply: &str) {
    let params = from_xml(reply).unwrap();
    assert_eq!(params.get("return_code"), Some("FAIL"));
    assert!(params.get("return_msg").is_some());
    assert!(!params.contains("sign"));
}

#[test]
fn test_unknown_trade_is_rejected() {
    let (provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);

    let result = processor.process(&callback("T9", 100, API_KEY)).unwrap();

    assert_eq!(result.outcome, NotificationOutcome::Rejected(BILL_NOT_FOUND.into()));
    assert_eq!(result.outcome, NotificationOutcome::Rejected("internal bill not found".into()));
    assert_eq!(result.state, NotificationState::Rejected);
    assert_unsigned_failure(&result.reply);
    assert_eq!(provider.count("/pay/orderquery"), 0);
    assert_eq!(ledger.settled(), 0);
}

#[test]
fn test_amount_mismatch_is_rejected() {
    let (_provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);

    let result = processor.process(&callback("T1", 1, API_KEY)).unwrap();

    assert_eq!(result.outcome, NotificationOutcome::Rejected(BILL_NOT_FOUND.into()));
    assert_eq!(ledger.settled(), 0);
}

#[test]
fn test_unconfirmed_trade_is_rejected() {
    let (provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);
    provider.answer(
        "/pay/orderquery",
        signed_xml(
            ParameterSet::new()
                .with("return_code", "SUCCESS")
                .with("result_code", "FAIL")
                .with("err_code", "ORDERNOTEXIST")
                .with("err_code_des", "order does not exist"),
            API_KEY,
        ),
    );

    // The callback itself is well formed and correctly signed.
    let result = processor.process(&callback("T1", 100, API_KEY)).unwrap();

    assert_eq!(result.outcome, NotificationOutcome::Rejected(ORDER_QUERY_FAILED.into()));
    assert_eq!(result.state, NotificationState::Rejected);
    assert_unsigned_failure(&result.reply);
    assert_eq!(ledger.settled(), 0);
    assert_eq!(ledger.bill("T1").unwrap().status, BillStatus::Unpaid);
}

#[test]
fn test_forged_query_answer_is_rejected() {
    let (provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);
    provider.answer("/pay/orderquery", order_query_reply("T1", "SUCCESS", "forgedkey"));

    let result = processor.process(&callback("T1", 100, API_KEY)).unwrap();

    assert_eq!(result.outcome, NotificationOutcome::Rejected(ORDER_QUERY_FAILED.into()));
    assert_eq!(ledger.settled(), 0);
}

#[test]
fn test_callback_with_bad_signature_is_rejected() {
    let (provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);

    let result = processor.process(&callback("T1", 100, "forgedkey")).unwrap();

    assert_eq!(
        result.outcome,
        NotificationOutcome::Rejected(PARAMETER_FORMAT_ERROR.into())
    );
    assert_unsigned_failure(&result.reply);
    assert_eq!(provider.count("/pay/orderquery"), 0);
    assert_eq!(ledger.settled(), 0);
}

#[test]
fn test_garbage_body_is_rejected() {
    let (_provider, _ledger, processor) = setup(vec![]);

    let result = processor.process("not xml at all").unwrap();

    assert_eq!(
        result.outcome,
        NotificationOutcome::Rejected(PARAMETER_FORMAT_ERROR.into())
    );
    assert_unsigned_failure(&result.reply);
}

#[test]
fn test_query_transport_failure_is_an_internal_error() {
    // No answer scripted for the order query: the provider is unreachable.
    let (_provider, ledger, processor) = setup(vec![Bill::unpaid("T1", 100)]);

    assert!(processor.process(&callback("T1", 100, API_KEY)).is_err());
    assert_eq!(ledger.bill("T1").unwrap().status, BillStatus::Unpaid);
}

// =========================================================================
// Scan-to-pay (mode one)
// =========================================================================

struct Catalog;

impl NativeOrderFactory for Catalog {
    fn build_order(&self, product_id: &str, openid: &str) -> Result<UnifiedOrder, String> {
        Ok(
            UnifiedOrder::new("Espresso", "T42", 1200, "203.0.113.7", TradeType::Native)
                .product_id(product_id)
                .openid(openid),
        )
    }
}

#[test]
fn test_scan_to_pay_callback_places_order() {
    let provider = FakeProvider::new();
    provider.answer(
        "/pay/unifiedorder",
        signed_xml(
            success(ParameterSet::new())
                .with("appid", APP_ID)
                .with("mch_id", MCH_ID)
                .with("nonce_str", "IITRi8Iabbblz1Jc")
                .with("prepay_id", "wx201410272009395522657a690389285100")
                .with("trade_type", "NATIVE"),
            API_KEY,
        ),
    );
    let mut config = config();
    config.nonce_length = 16;
    let processor = NotificationProcessor::new(
        Arc::new(client(config, &provider)),
        CountingLedger::new(vec![]),
    );
    // The provider's mode-one callback: no return_code, no result_code.
    let raw = signed_xml(
        ParameterSet::new()
            .with("appid", APP_ID)
            .with("mch_id", MCH_ID)
            .with("openid", "oUpF8uMuAJO_M2pxb1Q9zNjWeS6o")
            .with("is_subscribe", "N")
            .with("nonce_str", "5K8264ILTKCH16CQ2502SI8ZNMTM67VS")
            .with("product_id", "P1"),
        API_KEY,
    );

    let result = processor.process_native(&raw, &Catalog).unwrap();

    assert_eq!(result.outcome, NotificationOutcome::Accepted(TradeState::NotPay));
    let reply = from_xml(&result.reply).unwrap();
    assert_eq!(reply.get("prepay_id"), Some("wx201410272009395522657a690389285100"));
    assert_eq!(reply.get("result_code"), Some("SUCCESS"));
    assert_eq!(reply.get("nonce_str").map(str::len), Some(16));
    assert!(verify(&reply, &MerchantKey::new(API_KEY).unwrap()));

    let (_, body) = &provider.requests()[0];
    let order = from_xml(body).unwrap();
    assert_eq!(order.get("product_id"), Some("P1"));
    assert_eq!(order.get("openid"), Some("oUpF8uMuAJO_M2pxb1Q9zNjWeS6o"));
}
