//! # Gateway認証
//!
//! `Authorization: Bearer <token>` からプリンシパルを解決する。
//! トークンは平文では保持せず、SHA-256ハッシュ（16進数）とプリンシパルの対応だけを持つ。

use std::collections::HashMap;

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// Bearerトークンからプリンシパルを解決する。
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// トークンに対応するプリンシパル。未知のトークンはNone。
    async fn resolve(&self, token: &str) -> Option<String>;
}

/// 設定で与えられた固定トークン一覧による実装。
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    /// SHA-256(token)の16進数 → プリンシパル
    principals: HashMap<String, String>,
}

impl StaticTokenProvider {
    /// `sha256hex:principal` のカンマ区切りからパースする。
    pub fn parse(tokens: &str) -> anyhow::Result<Self> {
        let mut principals = HashMap::new();
        for entry in tokens.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (hash, principal) = entry
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("API_TOKENSの形式が不正です: {entry}"))?;
            let hash = hash.trim().to_ascii_lowercase();
            let decoded = hex::decode(&hash)
                .map_err(|e| anyhow::anyhow!("トークンハッシュの16進数デコードに失敗: {e}"))?;
            if decoded.len() != 32 {
                anyhow::bail!("トークンハッシュは32バイトである必要があります: {entry}");
            }
            let principal = principal.trim();
            if principal.is_empty() {
                anyhow::bail!("プリンシパルが空です: {entry}");
            }
            principals.insert(hash, principal.to_string());
        }
        Ok(Self { principals })
    }

    /// 登録済みトークン数
    pub fn len(&self) -> usize {
        self.principals.len()
    }

    /// トークンが1件も登録されていないか
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn resolve(&self, token: &str) -> Option<String> {
        self.principals.get(&hash_token(token)).cloned()
    }
}

/// トークンのSHA-256ハッシュ（16進数）
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// リクエストヘッダーを認証し、プリンシパルを返す。
pub(crate) async fn authenticate(
    state: &GatewayState,
    headers: &HeaderMap,
) -> Result<String, GatewayError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| GatewayError::Unauthorized("Authorizationヘッダーがありません".into()))?
        .to_str()
        .map_err(|_| GatewayError::Unauthorized("Authorizationヘッダーが不正です".into()))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GatewayError::Unauthorized("Bearerトークンが必要です".into()))?;

    state
        .identity
        .resolve(token)
        .await
        .ok_or_else(|| GatewayError::Unauthorized("不明なトークンです".into()))
}
