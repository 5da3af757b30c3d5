//! `wxpay refund`: Refund a paid order. Needs the client certificate.

use clap::Args;
use wxpay_client::PayClient;
use wxpay_core::request::Refund;
use wxpay_core::PayConfig;

use super::query::trade_ref;

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("trade").required(true))]
pub struct RefundArgs {
    /// Merchant trade number.
    #[arg(long, group = "trade")]
    pub out_trade_no: Option<String>,

    /// Provider transaction id.
    #[arg(long, group = "trade")]
    pub transaction_id: Option<String>,

    /// Merchant refund number.
    #[arg(long)]
    pub out_refund_no: String,

    /// Order total in fen.
    #[arg(long)]
    pub total_fee: u64,

    /// Amount to refund in fen.
    #[arg(long)]
    pub refund_fee: u64,

    /// Operator; defaults to the merchant id.
    #[arg(long)]
    pub op_user_id: Option<String>,
}

pub fn run(args: &RefundArgs, config: PayConfig) -> anyhow::Result<()> {
    if args.refund_fee > args.total_fee {
        anyhow::bail!(
            "refund_fee {} exceeds total_fee {}",
            args.refund_fee,
            args.total_fee
        );
    }
    let trade = trade_ref(args.out_trade_no.as_ref(), args.transaction_id.as_ref())?;
    let op_user_id = args
        .op_user_id
        .clone()
        .unwrap_or_else(|| config.merchant.mch_id.clone());

    let client = PayClient::new(config)?;
    let refund = client.refund(&Refund::new(
        trade,
        &args.out_refund_no,
        args.total_fee,
        args.refund_fee,
        op_user_id,
    ))?;

    println!("Refund {} accepted", refund.out_refund_no);
    println!("  refund_id:  {}", refund.refund_id);
    println!("  refund_fee: {}", refund.refund_fee);
    Ok(())
}
