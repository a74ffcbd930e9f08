use crate::error::CrowdloanError;
use async_trait::async_trait;
use jsonrpsee::{
    core::{client::ClientT, params::ArrayParams},
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
    ws_client::{WsClient, WsClientBuilder},
};
use serde::de::DeserializeOwned;
use sp_core::{Bytes, H256};
use std::fmt;
use tracing::debug;
use url::Url;

/// Read-only view of the relay chain used by the contribution fetcher.
///
/// Every storage read takes the block hash it is pinned to, so a whole run sees
/// one consistent snapshot.
#[async_trait]
pub trait RelayChainApi: Send + Sync {
    /// Hash of the canonical block at `number`, if the node knows it.
    async fn block_hash(&self, number: u32) -> Result<Option<H256>, CrowdloanError>;

    /// Top trie value at `key`.
    async fn storage(&self, key: &[u8], at: H256) -> Result<Option<Vec<u8>>, CrowdloanError>;

    /// Up to `count` child trie keys strictly after `start_key`.
    async fn child_keys_paged(
        &self,
        child_key: &[u8],
        count: u32,
        start_key: Option<&[u8]>,
        at: H256,
    ) -> Result<Vec<Vec<u8>>, CrowdloanError>;

    /// Child trie value at `key`.
    async fn child_storage(
        &self,
        child_key: &[u8],
        key: &[u8],
        at: H256,
    ) -> Result<Option<Vec<u8>>, CrowdloanError>;
}

enum Transport {
    Ws(WsClient),
    Http(HttpClient),
}

/// JSON-RPC client for a Substrate relay chain node.
///
/// `ws://`/`wss://` endpoints use a persistent WebSocket connection, `http://`/`https://`
/// endpoints plain HTTP requests. Dropping the client closes the connection.
pub struct RelayChainClient {
    endpoint: String,
    transport: Transport,
}

impl fmt::Debug for RelayChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transport = match self.transport {
            Transport::Ws(_) => "ws",
            Transport::Http(_) => "http",
        };
        f.debug_struct("RelayChainClient")
            .field("endpoint", &self.endpoint)
            .field("transport", &transport)
            .finish()
    }
}

impl RelayChainClient {
    /// Connects to `endpoint`.
    pub async fn connect(endpoint: &str) -> Result<Self, CrowdloanError> {
        let url = Url::parse(endpoint)
            .map_err(|err| CrowdloanError::Config(format!("invalid endpoint {endpoint}: {err}")))?;

        let transport = match url.scheme() {
            "ws" | "wss" => Transport::Ws(
                WsClientBuilder::default()
                    .build(endpoint)
                    .await
                    .map_err(|source| CrowdloanError::Rpc { method: "connect", source })?,
            ),
            "http" | "https" => Transport::Http(
                HttpClientBuilder::default()
                    .build(endpoint)
                    .map_err(|source| CrowdloanError::Rpc { method: "connect", source })?,
            ),
            other => {
                return Err(CrowdloanError::Config(format!(
                    "unsupported endpoint scheme {other:?}, expected ws, wss, http or https"
                )))
            }
        };

        debug!(endpoint, "connected to relay chain");
        Ok(Self { endpoint: endpoint.to_string(), transport })
    }

    /// Endpoint this client is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request<R>(&self, method: &'static str, params: ArrayParams) -> Result<R, CrowdloanError>
    where
        R: DeserializeOwned,
    {
        let response = match &self.transport {
            Transport::Ws(client) => client.request(method, params).await,
            Transport::Http(client) => client.request(method, params).await,
        };
        response.map_err(|source| CrowdloanError::Rpc { method, source })
    }
}

#[async_trait]
impl RelayChainApi for RelayChainClient {
    async fn block_hash(&self, number: u32) -> Result<Option<H256>, CrowdloanError> {
        self.request("chain_getBlockHash", rpc_params![number]).await
    }

    async fn storage(&self, key: &[u8], at: H256) -> Result<Option<Vec<u8>>, CrowdloanError> {
        let value: Option<Bytes> =
            self.request("state_getStorage", rpc_params![Bytes(key.to_vec()), at]).await?;
        Ok(value.map(|bytes| bytes.0))
    }

    async fn child_keys_paged(
        &self,
        child_key: &[u8],
        count: u32,
        start_key: Option<&[u8]>,
        at: H256,
    ) -> Result<Vec<Vec<u8>>, CrowdloanError> {
        let keys: Vec<Bytes> = self
            .request(
                "childstate_getKeysPaged",
                rpc_params![
                    Bytes(child_key.to_vec()),
                    Bytes(Vec::new()),
                    count,
                    start_key.map(|key| Bytes(key.to_vec())),
                    at
                ],
            )
            .await?;
        Ok(keys.into_iter().map(|bytes| bytes.0).collect())
    }

    async fn child_storage(
        &self,
        child_key: &[u8],
        key: &[u8],
        at: H256,
    ) -> Result<Option<Vec<u8>>, CrowdloanError> {
        let value: Option<Bytes> = self
            .request(
                "childstate_getStorage",
                rpc_params![Bytes(child_key.to_vec()), Bytes(key.to_vec()), at],
            )
            .await?;
        Ok(value.map(|bytes| bytes.0))
    }
}
