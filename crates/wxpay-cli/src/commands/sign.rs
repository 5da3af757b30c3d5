//! `wxpay sign`: Sign key=value pairs with the merchant key.

use anyhow::Context;
use clap::Args;
use wxpay_core::{to_xml, ParameterSet, PayConfig};
use wxpay_crypto::{sign_params, verify, MerchantKey};

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Fields as key=value.
    #[arg(required = true)]
    pub fields: Vec<String>,

    /// Signing key; defaults to merchant.api_key from the configuration.
    #[arg(long)]
    pub key: Option<String>,

    /// Check the `sign` field among the pairs instead of computing one.
    #[arg(long)]
    pub verify: bool,
}

fn parse_fields(fields: &[String]) -> anyhow::Result<ParameterSet> {
    fields
        .iter()
        .map(|field| {
            field
                .split_once('=')
                .with_context(|| format!("expected key=value, got {field:?}"))
        })
        .collect()
}

pub fn run(args: &SignArgs, config: &PayConfig) -> anyhow::Result<()> {
    let params = parse_fields(&args.fields)?;
    let key = args.key.clone().unwrap_or_else(|| config.merchant.api_key.clone());
    let key = MerchantKey::new(key).context("no signing key: pass --key or set merchant.api_key")?;

    if args.verify {
        if verify(&params, &key) {
            println!("signature valid");
            return Ok(());
        }
        anyhow::bail!("signature invalid");
    }

    let signed = sign_params(params, &key);
    println!("sign: {}", signed.signature());
    println!("{}", to_xml(signed.params()));
    Ok(())
}
