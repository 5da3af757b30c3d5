//! Call timing reports (`/payitil/report`).

use std::time::Duration;

use chrono::Local;
use wxpay_core::config::{ReportConfig, ReportLevel};
use wxpay_core::request::Report;
use wxpay_core::{ProviderResponse, ReturnCode};

use crate::error::ClientError;

/// Decides whether a finished call is reported and builds the report.
#[derive(Debug, Clone)]
pub struct CallReporter {
    level: ReportLevel,
    client_ip: String,
}

impl CallReporter {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            level: config.level,
            client_ip: config.client_ip.clone(),
        }
    }

    pub fn level(&self) -> ReportLevel {
        self.level
    }

    /// Report for one call, or `None` when the configured level skips it.
    pub fn build(
        &self,
        interface_url: &str,
        elapsed: Duration,
        result: &Result<ProviderResponse, ClientError>,
        out_trade_no: Option<&str>,
    ) -> Option<Report> {
        let succeeded = matches!(result, Ok(resp) if resp.is_success());
        match self.level {
            ReportLevel::Off => return None,
            ReportLevel::Failures if succeeded => return None,
            ReportLevel::Failures | ReportLevel::All => {}
        }

        let mut report = Report {
            interface_url: interface_url.to_string(),
            execute_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            return_code: ReturnCode::Fail.to_string(),
            result_code: ReturnCode::Fail.to_string(),
            user_ip: self.client_ip.clone(),
            time: Local::now().format("%Y%m%d%H%M%S").to_string(),
            return_msg: None,
            err_code: None,
            err_code_des: None,
            out_trade_no: out_trade_no.map(str::to_owned),
            device_info: None,
        };
        match result {
            Ok(resp) => {
                report.return_code = resp.return_code().to_string();
                if let Some(code) = resp.result_code() {
                    report.result_code = code.to_string();
                }
                report.return_msg = resp.return_msg().map(str::to_owned);
                report.err_code = resp.err_code().map(str::to_owned);
                report.err_code_des = resp.err_code_des().map(str::to_owned);
                if let Some(no) = resp.get("out_trade_no") {
                    report.out_trade_no = Some(no.to_string());
                }
                report.device_info = resp.get("device_info").map(str::to_owned);
            }
            Err(err) => report.return_msg = Some(err.to_string()),
        }
        Some(report)
    }
}
