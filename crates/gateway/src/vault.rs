//! # Key Vault
//!
//! プリンシパルごとにデバイスの秘密鍵を保持する。
//! 値はエンコード済み秘密鍵（`suiprivkey` 形式など）のまま扱い、デコードは記録処理に任せる。

use std::collections::HashMap;
use std::path::Path;

use tokio::sync::RwLock;

use crate::error::GatewayError;

/// デバイス鍵の保管庫。
#[async_trait::async_trait]
pub trait KeyVault: Send + Sync {
    /// プリンシパルの鍵を取得する。存在しない場合はNone。
    async fn get(&self, principal: &str, key_id: &str) -> Result<Option<String>, GatewayError>;

    /// プリンシパルの鍵を保存する（同じIDは上書き）。
    async fn put(&self, principal: &str, key_id: &str, secret: &str) -> Result<(), GatewayError>;
}

/// プロセス内メモリによる実装。
#[derive(Debug, Default)]
pub struct MemoryKeyVault {
    keys: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryKeyVault {
    /// 空の保管庫
    pub fn new() -> Self {
        Self::default()
    }

    /// `{"principal": {"key_id": "secret"}}` 形式のJSONから構築する。
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let keys: HashMap<String, HashMap<String, String>> = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Key VaultのJSONパースに失敗: {e}"))?;
        Ok(Self {
            keys: RwLock::new(keys),
        })
    }

    /// JSONファイルから構築する。
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Key Vaultファイルの読み込みに失敗 ({}): {e}", path.display()))?;
        Self::from_json(&json)
    }
}

#[async_trait::async_trait]
impl KeyVault for MemoryKeyVault {
    async fn get(&self, principal: &str, key_id: &str) -> Result<Option<String>, GatewayError> {
        let keys = self.keys.read().await;
        Ok(keys
            .get(principal)
            .and_then(|entries| entries.get(key_id))
            .cloned())
    }

    async fn put(&self, principal: &str, key_id: &str, secret: &str) -> Result<(), GatewayError> {
        let mut keys = self.keys.write().await;
        keys.entry(principal.to_string())
            .or_default()
            .insert(key_id.to_string(), secret.to_string());
        Ok(())
    }
}
