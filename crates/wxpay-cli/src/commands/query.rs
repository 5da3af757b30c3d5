//! `wxpay query`: Query an order by trade number or transaction id.

use clap::Args;
use wxpay_client::PayClient;
use wxpay_core::request::OrderQuery;
use wxpay_core::{PayConfig, TradeRef};

#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("trade").required(true))]
pub struct QueryArgs {
    /// Merchant trade number.
    #[arg(long, group = "trade")]
    pub out_trade_no: Option<String>,

    /// Provider transaction id.
    #[arg(long, group = "trade")]
    pub transaction_id: Option<String>,
}

/// Resolve the trade reference from mutually exclusive flags.
pub(crate) fn trade_ref(
    out_trade_no: Option<&String>,
    transaction_id: Option<&String>,
) -> anyhow::Result<TradeRef> {
    match (out_trade_no, transaction_id) {
        (Some(no), _) => Ok(TradeRef::OutTradeNo(no.clone())),
        (None, Some(id)) => Ok(TradeRef::TransactionId(id.clone())),
        (None, None) => anyhow::bail!("pass --out-trade-no or --transaction-id"),
    }
}

pub fn run(args: &QueryArgs, config: PayConfig) -> anyhow::Result<()> {
    let trade = trade_ref(args.out_trade_no.as_ref(), args.transaction_id.as_ref())?;
    let client = PayClient::new(config)?;
    let order = client.order_query(&OrderQuery::new(trade))?;

    println!("Order {}", order.out_trade_no);
    println!("  state:          {}", order.trade_state);
    if let Some(desc) = &order.trade_state_desc {
        println!("  description:    {desc}");
    }
    if let Some(id) = &order.transaction_id {
        println!("  transaction_id: {id}");
    }
    if let Some(fee) = order.total_fee {
        println!("  total_fee:      {fee}");
    }
    if let Some(time_end) = &order.time_end {
        println!("  time_end:       {time_end}");
    }
    Ok(())
}
