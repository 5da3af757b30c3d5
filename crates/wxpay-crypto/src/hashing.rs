use md5::{Digest, Md5};
use sha1::Sha1;

/// MD5 of `data`, rendered as 32 uppercase hex characters.
pub fn md5_upper_hex(data: &[u8]) -> String {
    hex::encode_upper(Md5::digest(data))
}

/// SHA-1 of `data`, rendered as 40 lowercase hex characters.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}
