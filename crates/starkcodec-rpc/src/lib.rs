//! # starkcodec-rpc
//!
//! Talks to a Starknet node over JSON-RPC 2.0 and hands every result to the
//! StarkCodec envelope resolvers.
//!
//! - [`RpcTransport`]: async transport trait, object-safe
//! - [`HttpRpcClient`]: reqwest transport with exponential backoff retry
//! - [`StarknetProvider`]: typed methods over any transport
//!
//! # Example
//!
//! ```no_run
//! use starkcodec_core::BlockId;
//! use starkcodec_rpc::{HttpRpcClient, StarknetProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpRpcClient::default_for("http://127.0.0.1:5050/rpc")?;
//! let provider = StarknetProvider::new(client);
//! let traces = provider.trace_block_transactions(BlockId::latest()).await?;
//! println!("{} traces", traces.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod provider;
pub mod request;
pub mod retry;
pub mod transport;
pub mod types;

pub use error::{ProviderError, TransportError};
pub use http::{HttpClientConfig, HttpRpcClient};
pub use provider::StarknetProvider;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use retry::{RetryConfig, RetryPolicy};
pub use transport::RpcTransport;
pub use types::{
    AddDeclareTransactionResult, AddDeployAccountTransactionResult, AddInvokeTransactionResult,
    BlockHashAndNumber, FunctionCall, MsgFromL1,
};
