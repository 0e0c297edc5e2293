//! The `RpcTransport` trait: how requests reach a Starknet node.

use async_trait::async_trait;
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// The async trait every transport implements.
///
/// Implementations must be `Send + Sync` for use across Tokio tasks. The
/// trait is object-safe and can be stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// One request, one response envelope. Node errors arrive inside the
    /// envelope, not as `Err`.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Several requests; responses come back in request order.
    ///
    /// Falls back to one `send` per request.
    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, TransportError> {
        let mut out = Vec::with_capacity(reqs.len());
        for req in reqs {
            out.push(self.send(req).await?);
        }
        Ok(out)
    }

    /// The transport's identifier (URL or name).
    fn url(&self) -> &str;

    /// Call a method and return the raw result text.
    async fn request(
        &self,
        id: u64,
        method: &str,
        params: Value,
    ) -> Result<Box<RawValue>, TransportError> {
        self.send(JsonRpcRequest::new(id, method, params))
            .await?
            .into_result()
            .map_err(TransportError::Rpc)
    }
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for std::sync::Arc<T> {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        (**self).send(req).await
    }

    async fn send_batch(
        &self,
        reqs: Vec<JsonRpcRequest>,
    ) -> Result<Vec<JsonRpcResponse>, TransportError> {
        (**self).send_batch(reqs).await
    }

    fn url(&self) -> &str {
        (**self).url()
    }
}
