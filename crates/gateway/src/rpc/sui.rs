//! # Sui JSON-RPC（記録トランザクション）
//!
//! - `unsafe_moveCall`: Move呼び出しからTransactionDataを構築
//! - `sui_executeTransactionBlock`: 署名済みトランザクションの実行
//! - `sui_getTransactionBlock`: チェックポイント取り込みの確認

use std::time::Duration;

use base64::Engine;
use scantrail_core::{ChainError, ChainWriter};
use scantrail_types::{MoveCall, SignedTransaction, TransactionReceipt};

use super::JsonRpc;

/// Suiフルノードのクライアント。
#[derive(Debug, Clone)]
pub struct SuiRpcClient {
    rpc: JsonRpc,
    gas_budget: u64,
    finality_timeout: Duration,
    poll_interval: Duration,
}

impl SuiRpcClient {
    pub fn new(
        rpc: JsonRpc,
        gas_budget: u64,
        finality_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            rpc,
            gas_budget,
            finality_timeout,
            poll_interval,
        }
    }

    /// トランザクションのチェックポイントを1回だけ問い合わせる。
    async fn checkpoint_of(&self, digest: &str) -> Result<Option<u64>, ChainError> {
        let result = self
            .rpc
            .call(
                "sui_getTransactionBlock",
                serde_json::json!([digest, {"showEffects": false}]),
            )
            .await?;
        Ok(result.get("checkpoint").and_then(parse_u64))
    }
}

#[async_trait::async_trait]
impl ChainWriter for SuiRpcClient {
    async fn prepare(&self, call: &MoveCall, sender: &str) -> Result<Vec<u8>, ChainError> {
        let result = self
            .rpc
            .call(
                "unsafe_moveCall",
                serde_json::json!([
                    sender,
                    call.package,
                    call.module,
                    call.function,
                    [],
                    call.arguments,
                    null,
                    self.gas_budget.to_string(),
                ]),
            )
            .await?;

        let tx_bytes = result
            .get("txBytes")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChainError::InvalidResponse("txBytesがありません".into()))?;
        b64()
            .decode(tx_bytes)
            .map_err(|e| ChainError::InvalidResponse(format!("txBytesのBase64デコードに失敗: {e}")))
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<String, ChainError> {
        let result = self
            .rpc
            .call(
                "sui_executeTransactionBlock",
                serde_json::json!([
                    tx.tx_bytes,
                    tx.signatures,
                    {"showEffects": true},
                    "WaitForLocalExecution",
                ]),
            )
            .await?;

        let digest = result
            .get("digest")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChainError::InvalidResponse("digestがありません".into()))?
            .to_string();

        let status = result.pointer("/effects/status/status").and_then(|v| v.as_str());
        match status {
            Some("success") | None => Ok(digest),
            Some(_) => {
                let reason = result
                    .pointer("/effects/status/error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                Err(ChainError::ExecutionFailed(format!("{digest}: {reason}")))
            }
        }
    }

    async fn wait_for_finality(&self, digest: &str) -> Result<TransactionReceipt, ChainError> {
        let timeout = || ChainError::Timeout(digest.to_string());
        let deadline = tokio::time::Instant::now()
            .checked_add(self.finality_timeout)
            .ok_or_else(timeout)?;
        loop {
            match self.checkpoint_of(digest).await {
                Ok(Some(checkpoint)) => {
                    return Ok(TransactionReceipt {
                        digest: digest.to_string(),
                        checkpoint: Some(checkpoint),
                    });
                }
                Ok(None) => {}
                // 実行直後はノードがまだトランザクションを返さないことがある
                Err(ChainError::Rpc(e)) if is_not_found(&e) => {
                    tracing::debug!(digest = %digest, error = %e, "トランザクションが未反映です");
                }
                Err(e) => return Err(e),
            }

            match tokio::time::Instant::now().checked_add(self.poll_interval) {
                Some(next) if next <= deadline => tokio::time::sleep(self.poll_interval).await,
                _ => return Err(timeout()),
            }
        }
    }
}

/// フルノードがまだトランザクションを認識していないことを示すエラーか。
fn is_not_found(error: &str) -> bool {
    error.contains("Could not find the referenced transaction")
}

/// チェックポイント番号は文字列で返る。
fn parse_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        other => other.as_u64(),
    }
}

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}
