//! StarkCodec CLI.
//!
//! # Commands
//! ```text
//! starkcodec resolve   --family <family> <file>
//! starkcodec decode    --family <family> <file> [--aggregate [--collect]] [--json]
//! starkcodec roundtrip --family <family> <file>
//! starkcodec test      --fixtures <dir>
//! starkcodec rpc       <action> [--rpc-url <url>]
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

use starkcodec_observability::{init_tracing, LogConfig};

mod cmd_codec;
mod cmd_rpc;
mod cmd_test;
mod family;

use family::Family;

#[derive(Parser)]
#[command(
    name = "starkcodec",
    about = "Resolve, decode and re-encode Starknet JSON-RPC envelopes",
    long_about = "
StarkCodec CLI: resolve polymorphic Starknet JSON-RPC payloads (transactions,
broadcast transactions, contract classes, traces) into typed values and
write them back in canonical form.

ENVIRONMENT VARIABLES:
  STARKCODEC_RPC_URL   Starknet JSON-RPC endpoint for `rpc` commands
  STARKCODEC_LOG       Log level or filter directives (default: warn)
",
    version
)]
struct Cli {
    /// Log level or filter directives
    #[arg(long, global = true, env = "STARKCODEC_LOG", default_value = "warn")]
    log: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the discriminator of a payload without decoding its body
    Resolve {
        #[arg(long, value_enum)]
        family: Family,
        /// JSON file, or `-` for stdin
        file: String,
    },

    /// Decode a payload (or an array of payloads) and print a summary
    Decode {
        #[arg(long, value_enum)]
        family: Family,
        /// JSON file, or `-` for stdin
        file: String,
        /// The input is a JSON array of envelopes
        #[arg(long)]
        aggregate: bool,
        /// With --aggregate, attempt every element and report all failures
        #[arg(long, requires = "aggregate")]
        collect: bool,
        /// Decode on the Rayon pool above this many elements
        #[arg(long, default_value_t = 64)]
        parallel_threshold: usize,
        /// Print the canonical JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Decode, re-encode and decode again; fail unless the result is stable
    Roundtrip {
        #[arg(long, value_enum)]
        family: Family,
        /// JSON file, or `-` for stdin
        file: String,
    },

    /// Run golden fixtures
    Test {
        /// Directory containing fixture JSON files
        #[arg(long, default_value = "./fixtures")]
        fixtures: String,
        /// Only run fixtures of this family
        #[arg(long, value_enum)]
        family: Option<Family>,
        #[arg(short, long)]
        verbose: bool,
    },

    /// Query a Starknet node
    Rpc {
        /// JSON-RPC endpoint
        #[arg(long, env = "STARKCODEC_RPC_URL")]
        rpc_url: String,
        /// Retries for transient transport failures
        #[arg(long, default_value_t = 3)]
        retries: u32,
        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
        /// Print canonical JSON instead of summaries
        #[arg(long)]
        json: bool,
        #[command(subcommand)]
        action: cmd_rpc::RpcAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&LogConfig::default().level(cli.log).json(cli.log_json))?;

    match cli.command {
        Commands::Resolve { family, file } => cmd_codec::resolve(family, &file),

        Commands::Decode { family, file, aggregate, collect, parallel_threshold, json } => {
            cmd_codec::decode(family, &file, aggregate, collect, parallel_threshold, json)
        }

        Commands::Roundtrip { family, file } => cmd_codec::roundtrip(family, &file),

        Commands::Test { fixtures, family, verbose } => cmd_test::run(&fixtures, family, verbose),

        Commands::Rpc { rpc_url, retries, timeout, json, action } => {
            let options = cmd_rpc::RpcOptions {
                url: rpc_url,
                retries,
                timeout_secs: timeout,
                as_json: json,
            };
            cmd_rpc::run(options, action).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_aggregate_decode() {
        let cli = Cli::try_parse_from([
            "starkcodec", "decode", "--family", "block-trace", "traces.json", "--aggregate", "--collect",
        ])
        .unwrap();
        match cli.command {
            Commands::Decode { family, aggregate, collect, parallel_threshold, .. } => {
                assert_eq!(family, Family::BlockTrace);
                assert!(aggregate && collect);
                assert_eq!(parallel_threshold, 64);
            }
            _ => panic!("expected decode"),
        }
    }

    #[test]
    fn collect_requires_aggregate() {
        let parsed = Cli::try_parse_from(["starkcodec", "decode", "--family", "class", "c.json", "--collect"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn rpc_takes_felt_arguments() {
        let cli = Cli::try_parse_from([
            "starkcodec", "rpc", "--rpc-url", "http://localhost:5050", "nonce", "0x4", "--pending",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Rpc { action: cmd_rpc::RpcAction::Nonce { .. }, .. }));
    }
}
