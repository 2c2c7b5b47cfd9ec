//! # POST /scan
//!
//! スキャナーとアイテムの共同署名によるスキャンイベントの記録。

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use scantrail_core::{record_scan, ScanInput};
use scantrail_types::{ScanRequest, ScanResponse};

use crate::auth::authenticate;
use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /scan — スキャンイベントを記録する。
///
/// 秘密鍵が省略された側は、プリンシパルのKey Vaultから鍵IDで解決する。
pub async fn handle_scan(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(body): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, GatewayError> {
    let principal = authenticate(&state, &headers).await?;

    let scanner_secret =
        resolve_secret(&state, &principal, body.scanner_secret, body.scanner_key_id).await?;
    let item_secret = resolve_secret(&state, &principal, body.item_secret, body.item_key_id).await?;

    let input = ScanInput {
        scanner_secret,
        item_secret,
        message: body.message,
    };
    let receipt = record_scan(state.writer.as_ref(), &state.scan_config, &input).await?;

    tracing::info!(
        principal = %principal,
        digest = %receipt.digest,
        multisig = %receipt.multisig_address,
        "スキャンを記録しました"
    );

    Ok(Json(ScanResponse {
        digest: receipt.digest,
        multisig_address: receipt.multisig_address.to_string(),
        combined_signature: receipt.combined_signature,
        checkpoint: receipt.checkpoint,
    }))
}

/// 直接指定された秘密鍵を優先し、無ければKey Vaultから取得する。
async fn resolve_secret(
    state: &GatewayState,
    principal: &str,
    secret: Option<String>,
    key_id: Option<String>,
) -> Result<Option<String>, GatewayError> {
    if secret.as_deref().is_some_and(|s| !s.trim().is_empty()) {
        return Ok(secret);
    }
    let Some(key_id) = key_id.filter(|id| !id.trim().is_empty()) else {
        return Ok(None);
    };
    state
        .vault
        .get(principal, &key_id)
        .await?
        .map(Some)
        .ok_or_else(|| GatewayError::NotFound(format!("鍵が見つかりません: {key_id}")))
}
