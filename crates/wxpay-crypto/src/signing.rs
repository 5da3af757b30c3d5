//! Parameter signatures.
//!
//! Every frame exchanged with the provider carries a `sign` field computed
//! over the remaining non-empty fields in ascending key order:
//!
//! ```text
//! MD5("k1=v1&k2=v2&...&key=<merchant key>"), uppercase hex
//! ```

use subtle::ConstantTimeEq;
use wxpay_core::{to_url_params, ParameterSet};

use crate::error::CryptoError;
use crate::hashing::{md5_upper_hex, sha1_hex};
use crate::keys::MerchantKey;

/// Name of the signature field.
pub const SIGN_FIELD: &str = "sign";

// Contains the key; must never reach a log line.
fn signing_payload(params: &ParameterSet, key: &MerchantKey) -> String {
    format!("{}&key={}", to_url_params(params, &[SIGN_FIELD]), key.expose())
}

/// Signature over `params`. An existing `sign` field is ignored.
pub fn sign(params: &ParameterSet, key: &MerchantKey) -> String {
    md5_upper_hex(signing_payload(params, key).as_bytes())
}

/// Check the `sign` field of `params`, distinguishing a missing signature
/// from a wrong one.
pub fn verify_strict(params: &ParameterSet, key: &MerchantKey) -> Result<(), CryptoError> {
    let transmitted = params
        .get(SIGN_FIELD)
        .filter(|s| !s.is_empty())
        .ok_or(CryptoError::MissingSignature)?;
    let expected = sign(params, key);
    if bool::from(expected.as_bytes().ct_eq(transmitted.as_bytes())) {
        Ok(())
    } else {
        tracing::debug!("signature mismatch");
        Err(CryptoError::SignatureMismatch)
    }
}

/// True iff `params` carries a `sign` field matching its other fields.
pub fn verify(params: &ParameterSet, key: &MerchantKey) -> bool {
    verify_strict(params, key).is_ok()
}

/// Parameter set with its `sign` field filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    params: ParameterSet,
}

impl SignedRequest {
    pub fn signature(&self) -> &str {
        self.params.get(SIGN_FIELD).unwrap_or_default()
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn into_params(self) -> ParameterSet {
        self.params
    }
}

/// Sign `params` and attach the result, replacing any previous `sign`.
pub fn sign_params(mut params: ParameterSet, key: &MerchantKey) -> SignedRequest {
    let signature = sign(&params, key);
    params.insert(SIGN_FIELD, signature);
    SignedRequest { params }
}

/// JS-SDK page signature: SHA-1 over the ticket, nonce, timestamp and page
/// URL (fragment removed), lowercase hex.
pub fn jsapi_signature(ticket: &str, nonce: &str, timestamp: i64, url: &str) -> String {
    let url = url.split('#').next().unwrap_or(url);
    let payload = format!(
        "jsapi_ticket={ticket}&noncestr={nonce}&timestamp={timestamp}&url={url}"
    );
    sha1_hex(payload.as_bytes())
}
