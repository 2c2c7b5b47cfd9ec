//! # Solana JSON-RPC（所有オブジェクトと履歴）
//!
//! デバイスはToken-2022のミントとして表現され、公開鍵とロールは
//! tokenMetadata拡張の `additionalMetadata` に格納されている。

use scantrail_core::{ChainError, ChainReader};
use scantrail_types::{ChainObject, HistoryEntry, OwnedObject};

use super::JsonRpc;

/// Token-2022 プログラムID
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

/// Solana RPCのクライアント。
#[derive(Debug, Clone)]
pub struct SolanaRpcClient {
    rpc: JsonRpc,
}

impl SolanaRpcClient {
    pub fn new(rpc: JsonRpc) -> Self {
        Self { rpc }
    }
}

#[async_trait::async_trait]
impl ChainReader for SolanaRpcClient {
    async fn list_owned_objects(&self, owner: &str) -> Result<Vec<OwnedObject>, ChainError> {
        let result = self
            .rpc
            .call(
                "getTokenAccountsByOwner",
                serde_json::json!([
                    owner,
                    {"programId": TOKEN_2022_PROGRAM_ID},
                    {"encoding": "jsonParsed"},
                ]),
            )
            .await?;

        let accounts = result
            .get("value")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ChainError::InvalidResponse("getTokenAccountsByOwner: valueがありません".into()))?;

        let mut owned = Vec::new();
        for account in accounts {
            let Some(info) = account.pointer("/account/data/parsed/info") else {
                continue;
            };
            // 残高0のトークンアカウントは保有とみなさない
            let amount = info
                .pointer("/tokenAmount/amount")
                .and_then(|v| v.as_str())
                .unwrap_or("0");
            if amount == "0" {
                continue;
            }
            if let Some(mint) = info.get("mint").and_then(|v| v.as_str()) {
                owned.push(OwnedObject {
                    id: mint.to_string(),
                });
            }
        }
        Ok(owned)
    }

    async fn get_object(&self, id: &str) -> Result<Option<ChainObject>, ChainError> {
        let result = self
            .rpc
            .call(
                "getAccountInfo",
                serde_json::json!([id, {"encoding": "jsonParsed"}]),
            )
            .await?;

        let Some(value) = result.get("value").filter(|v| !v.is_null()) else {
            return Ok(None);
        };

        let metadata = value
            .pointer("/data/parsed/info/extensions")
            .and_then(|v| v.as_array())
            .and_then(|extensions| {
                extensions.iter().find(|ext| {
                    ext.get("extension").and_then(|v| v.as_str()) == Some("tokenMetadata")
                })
            })
            .and_then(|ext| ext.get("state"));

        let Some(metadata) = metadata else {
            return Ok(Some(ChainObject {
                id: id.to_string(),
                name: None,
                additional_metadata: Vec::new(),
            }));
        };

        let additional_metadata = metadata
            .get("additionalMetadata")
            .and_then(|v| v.as_array())
            .map(|pairs| pairs.iter().filter_map(metadata_pair).collect())
            .unwrap_or_default();

        Ok(Some(ChainObject {
            id: id.to_string(),
            name: metadata
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            additional_metadata,
        }))
    }

    async fn get_transaction_history(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, ChainError> {
        let result = self
            .rpc
            .call(
                "getSignaturesForAddress",
                serde_json::json!([address, {"limit": limit}]),
            )
            .await?;

        let entries = result.as_array().ok_or_else(|| {
            ChainError::InvalidResponse("getSignaturesForAddress: 配列ではありません".into())
        })?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let signature = entry.get("signature")?.as_str()?.to_string();
                Some(HistoryEntry {
                    signature,
                    memo: entry.get("memo").and_then(|v| v.as_str()).map(str::to_string),
                    block_time: entry.get("blockTime").and_then(|v| v.as_i64()),
                })
            })
            .collect())
    }
}

/// `["key", "value"]` の組を取り出す。
fn metadata_pair(pair: &serde_json::Value) -> Option<(String, String)> {
    let [key, value] = pair.as_array()?.as_slice() else {
        return None;
    };
    Some((key.as_str()?.to_string(), value.as_str()?.to_string()))
}
