pub mod init;
pub mod sign;
pub mod query;
pub mod close;
pub mod refund;
pub mod notify;

use wxpay_core::ProviderResponse;

/// Print every field of a response, one per line.
pub(crate) fn print_response(resp: &ProviderResponse) {
    for (key, value) in resp.params().iter() {
        if key == "sign" {
            continue;
        }
        println!("  {key:<16} {value}");
    }
}
