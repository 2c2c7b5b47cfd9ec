//! # POST /keys
//!
//! カストディ型のデバイス鍵を生成し、プリンシパルのKey Vaultに保存する。

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use base58::ToBase58;
use scantrail_crypto::{encode_sui_private_key, sui_address, Ed25519SigningKey};
use scantrail_types::{KeygenRequest, KeygenResponse};

use crate::auth::authenticate;
use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /keys — Ed25519鍵を生成して保存する。
///
/// 鍵IDを省略した場合は公開鍵のBase58を鍵IDとする。
pub async fn handle_keygen(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(body): Json<KeygenRequest>,
) -> Result<Json<KeygenResponse>, GatewayError> {
    let principal = authenticate(&state, &headers).await?;

    let signing_key = Ed25519SigningKey::generate(&mut rand::rngs::OsRng);
    let verifying_key = signing_key.verifying_key();
    let public_key = verifying_key.to_bytes().to_base58();
    let secret = encode_sui_private_key(&signing_key)
        .map_err(|e| GatewayError::Internal(format!("秘密鍵のエンコードに失敗: {e}")))?;

    let key_id = body
        .key_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| public_key.clone());

    state.vault.put(&principal, &key_id, &secret).await?;

    let sui_address = sui_address(&verifying_key).to_string();
    tracing::info!(
        principal = %principal,
        key_id = %key_id,
        sui_address = %sui_address,
        "デバイス鍵を生成しました"
    );

    Ok(Json(KeygenResponse {
        key_id,
        sui_address,
        public_key,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::vault::{KeyVault, MemoryKeyVault};
    use scantrail_crypto::decode_secret;

    /// 生成した鍵がVaultに保存され、アドレスと公開鍵が一致することを確認
    #[tokio::test]
    async fn test_keygen_stores_key() {
        let vault = Arc::new(MemoryKeyVault::new());
        let state = test_state_with_vault(
            Default::default(),
            FakeReader::default(),
            SharedVault(vault.clone()),
        );

        let response = handle_keygen(
            State(state),
            auth_headers(),
            Json(KeygenRequest {
                key_id: Some("tag-7".into()),
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(response.key_id, "tag-7");

        let stored = vault.get("alice", "tag-7").await.unwrap().unwrap();
        let key = decode_secret(&stored).unwrap();
        assert_eq!(key.verifying_key().to_bytes().to_base58(), response.public_key);
        assert_eq!(
            sui_address(&key.verifying_key()).to_string(),
            response.sui_address
        );
    }

    /// 鍵ID省略時は公開鍵のBase58になる
    #[tokio::test]
    async fn test_keygen_default_key_id() {
        let state = test_state(Default::default(), FakeReader::default());
        let response = handle_keygen(State(state), auth_headers(), Json(KeygenRequest::default()))
            .await
            .unwrap()
            .0;
        assert_eq!(response.key_id, response.public_key);
    }

    /// テスト側からVaultの中身を参照するためのラッパー
    struct SharedVault(Arc<MemoryKeyVault>);

    #[async_trait::async_trait]
    impl KeyVault for SharedVault {
        async fn get(&self, principal: &str, key_id: &str) -> Result<Option<String>, GatewayError> {
            self.0.get(principal, key_id).await
        }

        async fn put(&self, principal: &str, key_id: &str, secret: &str) -> Result<(), GatewayError> {
            self.0.put(principal, key_id, secret).await
        }
    }
}
