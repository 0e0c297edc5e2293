//! `starkcodec rpc`: query a node through the typed provider.

use anyhow::{Context, Result};
use clap::Subcommand;
use std::time::Duration;

use starkcodec_core::{BlockId, Envelope, Felt};
use starkcodec_rpc::{HttpClientConfig, HttpRpcClient, RetryConfig, StarknetProvider};

use crate::family::Decoded;

#[derive(Subcommand)]
pub enum RpcAction {
    /// Print the node's JSON-RPC spec version
    #[command(name = "spec-version")]
    SpecVersion,
    /// Print the chain id
    #[command(name = "chain-id")]
    ChainId,
    /// Print the latest block hash and number
    Head,
    /// Fetch and decode a transaction by hash
    Tx {
        hash: Felt,
    },
    /// Fetch and decode a transaction trace
    Trace {
        hash: Felt,
    },
    /// Fetch and decode every trace in a block
    #[command(name = "block-traces")]
    BlockTraces {
        #[command(flatten)]
        block: BlockArg,
    },
    /// Fetch the class deployed at an address
    #[command(name = "class-at")]
    ClassAt {
        address: Felt,
        #[command(flatten)]
        block: BlockArg,
    },
    /// Fetch an account nonce
    Nonce {
        address: Felt,
        #[command(flatten)]
        block: BlockArg,
    },
}

#[derive(clap::Args)]
pub struct BlockArg {
    /// Block number; defaults to the latest block
    #[arg(long)]
    block: Option<u64>,
    /// Use the pending block
    #[arg(long, conflicts_with = "block")]
    pending: bool,
}

impl BlockArg {
    fn id(&self) -> BlockId {
        match (self.block, self.pending) {
            (Some(number), _) => BlockId::number(number),
            (None, true) => BlockId::pending(),
            (None, false) => BlockId::latest(),
        }
    }
}

pub struct RpcOptions {
    pub url: String,
    pub retries: u32,
    pub timeout_secs: u64,
    pub as_json: bool,
}

fn print(decoded: Decoded, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&decoded.to_value()?)?);
    } else {
        println!("{}", decoded.summary());
    }
    Ok(())
}

pub async fn run(options: RpcOptions, action: RpcAction) -> Result<()> {
    let config = HttpClientConfig {
        retry: RetryConfig {
            max_retries: options.retries,
            ..RetryConfig::default()
        },
        request_timeout: Duration::from_secs(options.timeout_secs),
    };
    let client = HttpRpcClient::new(&options.url, config)
        .with_context(|| format!("connect to '{}'", options.url))?;
    let provider = StarknetProvider::new(client);

    match action {
        RpcAction::SpecVersion => println!("{}", provider.spec_version().await?),
        RpcAction::ChainId => println!("{}", provider.chain_id().await?),
        RpcAction::Head => {
            let head = provider.block_hash_and_number().await?;
            println!("{} {}", head.block_number, head.block_hash);
        }
        RpcAction::Tx { hash } => {
            let tx = provider
                .transaction_by_hash(hash)
                .await
                .with_context(|| format!("transaction {hash}"))?;
            if options.as_json {
                println!("{}", serde_json::to_string_pretty(&tx.to_value()?)?);
            } else {
                let hash = tx.transaction_hash;
                println!("{hash} {}", Decoded::Transaction(tx.transaction).summary());
            }
        }
        RpcAction::Trace { hash } => {
            let trace = provider
                .trace_transaction(hash)
                .await
                .with_context(|| format!("trace of {hash}"))?;
            print(Decoded::Trace(trace), options.as_json)?;
        }
        RpcAction::BlockTraces { block } => {
            let traces = provider.trace_block_transactions(block.id()).await?;
            for entry in traces {
                print(Decoded::BlockTrace(entry), options.as_json)?;
            }
        }
        RpcAction::ClassAt { address, block } => {
            let class = provider.class_at(block.id(), address).await?;
            print(Decoded::Class(class), options.as_json)?;
        }
        RpcAction::Nonce { address, block } => {
            println!("{}", provider.nonce(block.id(), address).await?);
        }
    }
    Ok(())
}
