//! # Gateway エラー型

use axum::http::StatusCode;
use scantrail_core::{ChainError, ScanError};

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（必須入力の欠落、鍵・アドレスのデコード失敗）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// 認証失敗
    #[error("認証に失敗: {0}")]
    Unauthorized(String),
    /// 参照先が存在しない
    #[error("見つかりません: {0}")]
    NotFound(String),
    /// チェーンRPCのエラー
    #[error("チェーンRPC エラー: {0}")]
    Chain(String),
    /// チェーンRPCのタイムアウト
    #[error("チェーンRPC タイムアウト: {0}")]
    Timeout(String),
    /// 内部エラー（署名検証の失敗を含む）
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl From<ChainError> for GatewayError {
    fn from(e: ChainError) -> Self {
        match e {
            ChainError::Timeout(_) => GatewayError::Timeout(e.to_string()),
            other => GatewayError::Chain(other.to_string()),
        }
    }
}

impl From<ScanError> for GatewayError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::Validation(_) | ScanError::Decode(_) => GatewayError::BadRequest(e.to_string()),
            ScanError::Verification(_) | ScanError::Signing(_) => {
                GatewayError::Internal(e.to_string())
            }
            ScanError::Chain(chain) => chain.into(),
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Chain(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "リクエスト処理に失敗しました");
        }
        (status, self.to_string()).into_response()
    }
}
