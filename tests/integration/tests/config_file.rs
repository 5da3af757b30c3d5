//! Integration test: a configuration written to disk drives a client.

use wxpay_core::config::ReportLevel;
use wxpay_core::request::CloseOrder;
use wxpay_core::{ParameterSet, PayConfig};
use wxpay_integration_tests::{client, config, signed_xml, success, FakeProvider, API_KEY};

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf").join("wxpay.toml");

    let mut original = config();
    original.endpoint.sandbox = true;
    original.report.level = ReportLevel::All;
    original.save(&path).unwrap();

    let loaded = PayConfig::load(&path).unwrap();
    assert_eq!(loaded.merchant.app_id, original.merchant.app_id);
    assert_eq!(loaded.merchant.api_key, API_KEY);
    assert!(loaded.endpoint.sandbox);
    assert_eq!(loaded.report.level, ReportLevel::All);
    assert_eq!(loaded.nonce_length, 32);
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = PayConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded.endpoint.api_base, "https://api.mch.weixin.qq.com");
    assert!(loaded.validate().is_err());
}

#[test]
fn test_loaded_config_drives_calls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wxpay.toml");
    std::fs::write(
        &path,
        r#"
[merchant]
app_id = "wx2421b1c4370ec43b"
mch_id = "10000100"
api_key = "192006250b4c09247ec02edce69f6a2d"

[endpoint]
api_base = "https://pay.test.local/"

[report]
level = "off"
"#,
    )
    .unwrap();

    let provider = FakeProvider::new();
    provider.answer("/pay/closeorder", signed_xml(success(ParameterSet::new()), API_KEY));
    let client = client(PayConfig::load(&path).unwrap(), &provider);

    let resp = client.close_order(&CloseOrder::new("T1")).unwrap();
    assert!(resp.is_success());
    assert_eq!(provider.requests()[0].0, "https://pay.test.local/pay/closeorder");
}
