pub mod error;
pub mod keys;
pub mod hashing;
pub mod nonce;
pub mod signing;

pub use error::CryptoError;
pub use keys::MerchantKey;
pub use hashing::{md5_upper_hex, sha1_hex};
pub use nonce::nonce_str;
pub use signing::{jsapi_signature, sign, sign_params, verify, verify_strict, SignedRequest, SIGN_FIELD};
