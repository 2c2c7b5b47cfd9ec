//! # JSON-RPCクライアント
//!
//! SuiとSolanaのフルノードはどちらもJSON-RPC 2.0を話すため、
//! リクエストの送信とエラー判定だけを共通化する。

pub mod solana;
pub mod sui;

pub use solana::SolanaRpcClient;
pub use sui::SuiRpcClient;

use scantrail_core::ChainError;

/// JSON-RPC 2.0 エンドポイント。
#[derive(Debug, Clone)]
pub struct JsonRpc {
    http_client: reqwest::Client,
    url: String,
}

impl JsonRpc {
    pub fn new(http_client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }

    /// メソッドを呼び出し、`result` を返す。
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChainError::Transport(format!("{method}: {e}")))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChainError::InvalidResponse(format!("{method} ({status}): {e}")))?;

        if let Some(error) = body.get("error") {
            return Err(ChainError::Rpc(format!("{method}: {error}")));
        }
        if !status.is_success() {
            return Err(ChainError::Transport(format!("{method}: HTTP {status}")));
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| ChainError::InvalidResponse(format!("{method}: resultがありません")))
    }
}
