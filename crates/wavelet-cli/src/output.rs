//! Output formatting utilities.
//!
//! Results go to stdout, either as JSON or as a short human-readable summary.

use colored::Colorize;
use serde::Serialize;
use wavelet_estimator::{EstimationError, ExecutionResult};

/// A transaction the contract tried to send, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionReport {
    pub tag: u8,
    pub payload: String,
}

/// Printable summary of one successful estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateReport {
    pub function: String,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub host_gas: u64,
    pub host_calls: usize,
    pub return_value: Option<i64>,
    pub output: Option<String>,
    pub logs: Vec<String>,
    pub transactions: Vec<TransactionReport>,
}

impl EstimateReport {
    pub fn new(function: &str, gas_limit: u64, result: &ExecutionResult) -> Self {
        Self {
            function: function.to_string(),
            gas_limit,
            gas_used: result.gas_used,
            host_gas: result.host_gas,
            host_calls: result.host_calls,
            return_value: result.return_value,
            output: result.output.as_ref().map(hex::encode),
            logs: result.log_lines(),
            transactions: result
                .transactions
                .iter()
                .map(|tx| TransactionReport {
                    tag: tx.tag,
                    payload: hex::encode(&tx.payload),
                })
                .collect(),
        }
    }
}

/// Machine-readable failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub gas_exhausted: bool,
    /// What the call emitted before running out of gas
    pub partial: Option<EstimateReport>,
}

impl ErrorReport {
    pub fn new(function: &str, gas_limit: u64, err: &EstimationError) -> Self {
        Self {
            error: err.to_string(),
            gas_exhausted: err.is_gas_exhausted(),
            partial: err
                .partial_result()
                .map(|partial| EstimateReport::new(function, gas_limit, partial)),
        }
    }
}

/// Format a gas amount with thousands separators.
pub fn format_gas(gas: u64) -> String {
    let digits = gas.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an estimation summary.
pub fn print_report(report: &EstimateReport) {
    println!("{}", "Gas Estimate".bold());
    println!("{}", "=".repeat(50));
    println!("Function:     {}", report.function.bright_cyan());
    println!("Gas Used:     {}", format_gas(report.gas_used).bright_yellow());
    println!(
        "  host:       {} ({} calls)",
        format_gas(report.host_gas),
        report.host_calls
    );
    println!("Gas Limit:    {}", format_gas(report.gas_limit));

    if let Some(value) = report.return_value {
        println!("Returned:     {}", value);
    }

    print_emitted(report);
}

/// Print what an exhausted call emitted before it stopped.
pub fn print_partial(report: &EstimateReport) {
    print_error(&format!(
        "Call needs more than {} gas",
        format_gas(report.gas_limit)
    ));
    println!(
        "  host:       {} ({} calls) before stopping",
        format_gas(report.host_gas),
        report.host_calls
    );
    print_emitted(report);
}

fn print_emitted(report: &EstimateReport) {
    if let Some(output) = &report.output {
        println!("Result:       0x{}", output);
    }

    if !report.logs.is_empty() {
        println!("Logs:");
        for line in &report.logs {
            println!("  {}", line);
        }
    }

    if !report.transactions.is_empty() {
        println!("Transactions:");
        for tx in &report.transactions {
            println!("  tag {}: 0x{}", tx.tag, tx.payload);
        }
    }
}

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavelet_estimator::VmFault;

    #[test]
    fn test_format_gas() {
        assert_eq!(format_gas(0), "0");
        assert_eq!(format_gas(999), "999");
        assert_eq!(format_gas(1_000), "1,000");
        assert_eq!(format_gas(10_000_000_000), "10,000,000,000");
    }

    #[test]
    fn test_report_hex_encodes_bytes() {
        let result = ExecutionResult {
            gas_used: 1234,
            output: Some(vec![0xde, 0xad]),
            logs: vec![b"hello".to_vec()],
            host_calls: 2,
            host_gas: 500,
            ..ExecutionResult::default()
        };

        let report = EstimateReport::new("greet", 10_000, &result);
        assert_eq!(report.output.as_deref(), Some("dead"));
        assert_eq!(report.logs, vec!["hello".to_string()]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["gas_used"], 1234);
        assert_eq!(json["function"], "greet");
    }

    #[test]
    fn test_error_report_carries_partial_output() {
        let err = EstimationError::Vm(VmFault::GasExhausted {
            limit: 10,
            partial: Box::new(ExecutionResult {
                gas_used: 10,
                logs: vec![b"progress".to_vec()],
                host_calls: 1,
                ..ExecutionResult::default()
            }),
        });
        let report = ErrorReport::new("work", 10, &err);
        assert!(report.gas_exhausted);
        assert!(report.error.contains("10"));

        let partial = report.partial.unwrap();
        assert_eq!(partial.gas_used, 10);
        assert_eq!(partial.logs, vec!["progress".to_string()]);
    }

    #[test]
    fn test_error_report_without_partial() {
        let err = EstimationError::Vm(VmFault::Trap("unreachable".into()));
        let report = ErrorReport::new("work", 10, &err);
        assert!(!report.gas_exhausted);
        assert!(report.partial.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["partial"].is_null());
    }
}
