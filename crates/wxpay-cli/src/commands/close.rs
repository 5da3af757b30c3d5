//! `wxpay close`: Close an unpaid order.

use clap::Args;
use wxpay_client::PayClient;
use wxpay_core::request::CloseOrder;
use wxpay_core::PayConfig;

#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Merchant trade number of the order to close.
    pub out_trade_no: String,
}

pub fn run(args: &CloseArgs, config: PayConfig) -> anyhow::Result<()> {
    let client = PayClient::new(config)?;
    let resp = client.close_order(&CloseOrder::new(&args.out_trade_no))?;
    println!("Closed {}", args.out_trade_no);
    super::print_response(&resp);
    Ok(())
}
