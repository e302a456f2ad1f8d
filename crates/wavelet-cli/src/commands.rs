//! CLI command implementations.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fmt;
use std::path::{Path, PathBuf};
use wavelet_abi::{encode_invocation_envelope, encode_parameters, CallParameter, ContractPayload};
use wavelet_estimator::{ContractSource, GasEstimator};
use wavelet_types::Hash;

use crate::config::CliConfig;
use crate::output::*;

/// Main CLI.
#[derive(Parser, Debug)]
#[command(name = "wavelet-estimate")]
#[command(about = "Estimate the gas a Wavelet contract call consumes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "WAVELET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Node API URL
    #[arg(short, long, global = true, env = "WAVELET_NODE")]
    pub node: Option<String>,

    /// Log filter, e.g. `info` or `wavelet_vm=debug`
    #[arg(long, global = true, env = "WAVELET_LOG")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dry-run a contract function and report its gas usage
    Estimate {
        /// Local file, http(s) URL, or 64-hex contract id on the node
        #[arg(long)]
        contract: String,

        /// Function name, without the `_contract_on_` prefix
        #[arg(short, long)]
        function: String,

        /// Amount attached to the call
        #[arg(short, long, default_value_t = 0)]
        amount: u64,

        /// Parameter as `tag:value`, repeatable, in call order
        #[arg(short, long = "param")]
        params: Vec<CallParameter>,

        /// JSON file with a list of `{"type": ..., "value": ...}` parameters,
        /// appended after any `--param`
        #[arg(long)]
        params_file: Option<PathBuf>,

        /// Gas limit; defaults to the configured limit
        #[arg(short, long)]
        gas_limit: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the hex invocation envelope for a call
    Encode {
        /// Amount attached to the call
        #[arg(short, long, default_value_t = 0)]
        amount: u64,

        /// Parameter as `tag:value`, repeatable, in call order
        #[arg(short, long = "param")]
        params: Vec<CallParameter>,

        /// Round index
        #[arg(long, default_value_t = 0)]
        round_index: u64,

        /// Round id (hex)
        #[arg(long)]
        round_id: Option<String>,

        /// Transaction id (hex)
        #[arg(long)]
        transaction_id: Option<String>,

        /// Sender id (hex)
        #[arg(long)]
        sender_id: Option<String>,
    },

    /// Show node status
    NodeInfo,

    /// Show an account
    Account {
        /// Account id (hex)
        id: Hash,
    },
}

/// A failure that has already been printed; only the exit status is left.
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failure already reported")
    }
}

impl std::error::Error for Reported {}

/// Execute a command.
pub async fn execute(command: Commands, config: &CliConfig) -> anyhow::Result<()> {
    match command {
        Commands::Estimate {
            contract,
            function,
            amount,
            mut params,
            params_file,
            gas_limit,
            json,
        } => {
            if let Some(path) = params_file {
                params.extend(load_params_file(&path)?);
            }

            let estimator = GasEstimator::new(config.estimator.clone())?;
            let source = ContractSource::parse(&contract);
            let limit = gas_limit.unwrap_or(estimator.default_gas_limit());
            tracing::info!(%source, function = %function, amount, limit, "estimating");

            match estimator
                .estimate(&source, &function, amount, &params, Some(limit))
                .await
            {
                Ok(result) => {
                    let report = EstimateReport::new(&function, limit, &result);
                    if json {
                        print_json(&report)?;
                    } else {
                        print_report(&report);
                    }
                    Ok(())
                }
                Err(e) => {
                    if json {
                        print_json(&ErrorReport::new(&function, limit, &e))?;
                    } else if let Some(partial) = e.partial_result() {
                        print_partial(&EstimateReport::new(&function, limit, partial));
                    } else {
                        return Err(e.into());
                    }
                    Err(Reported.into())
                }
            }
        }

        Commands::Encode {
            amount,
            params,
            round_index,
            round_id,
            transaction_id,
            sender_id,
        } => {
            let envelope = encode_envelope(
                amount,
                &params,
                round_index,
                round_id.as_deref(),
                transaction_id.as_deref(),
                sender_id.as_deref(),
            )?;
            println!("{}", hex::encode(envelope));
            Ok(())
        }

        Commands::NodeInfo => {
            let estimator = GasEstimator::new(config.estimator.clone())?;
            let info = estimator.client().node_info().await?;
            print_json(&info)
        }

        Commands::Account { id } => {
            let estimator = GasEstimator::new(config.estimator.clone())?;
            let account = estimator.client().account(&id).await?;
            print_json(&account)?;
            if account.is_contract {
                print_success("Account holds a contract");
            }
            Ok(())
        }
    }
}

/// Read a JSON parameter list.
pub fn load_params_file(path: &Path) -> anyhow::Result<Vec<CallParameter>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file '{}'", path.display()))?;
    let params = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse params file '{}'", path.display()))?;
    Ok(params)
}

/// Build an envelope, zero-filling any identifier that is not given.
pub fn encode_envelope(
    amount: u64,
    params: &[CallParameter],
    round_index: u64,
    round_id: Option<&str>,
    transaction_id: Option<&str>,
    sender_id: Option<&str>,
) -> anyhow::Result<Vec<u8>> {
    let zero = Hash::ZERO.to_hex();
    let payload = ContractPayload::from_hex_ids(
        round_index,
        round_id.unwrap_or(&zero),
        transaction_id.unwrap_or(&zero),
        sender_id.unwrap_or(&zero),
        amount,
        encode_parameters(params)?,
    )?;
    Ok(encode_invocation_envelope(&payload))
}
