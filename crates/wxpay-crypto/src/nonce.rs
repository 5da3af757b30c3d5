use rand::Rng;
use wxpay_core::config::MAX_NONCE_LENGTH;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random string over `[a-z0-9]`, at most 32 characters long.
pub fn nonce_str(len: usize) -> String {
    let len = len.min(MAX_NONCE_LENGTH);
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
