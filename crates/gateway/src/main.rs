//! # Scantrail Gateway
//!
//! スキャンイベントの記録と、位置情報履歴の再構築を提供するHTTP Gateway。
//!
//! ## 役割
//! - クライアント認証（Bearerトークン）
//! - スキャナー・アイテムの共同署名と記録トランザクションの送信（Sui）
//! - 所有デバイスの履歴からの位置情報の再構築（Solana）
//! - カストディ型デバイス鍵の生成と保管
//!
//! ## API エンドポイント
//! - `POST /scan` — スキャンイベントの記録
//! - `GET /events/{owner}` — 位置情報の一覧
//! - `GET /timeline/{owner}` — デバイスごとの時系列
//! - `POST /keys` — デバイス鍵の生成
//! - `GET /health` — 死活確認

mod auth;
mod config;
mod endpoints;
mod error;
mod rpc;
mod vault;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use auth::StaticTokenProvider;
use config::{GatewayConfig, GatewayState};
use endpoints::*;
use rpc::{JsonRpc, SolanaRpcClient, SuiRpcClient};
use vault::MemoryKeyVault;

/// ルーターを構築する。
fn router(state: Arc<GatewayState>) -> axum::Router {
    axum::Router::new()
        .route("/scan", axum::routing::post(handle_scan))
        .route("/events/{owner}", axum::routing::get(handle_events))
        .route("/timeline/{owner}", axum::routing::get(handle_timeline))
        .route("/keys", axum::routing::post(handle_keygen))
        .route("/health", axum::routing::get(handle_health))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env()?;

    let http_client = reqwest::Client::new();
    let writer = SuiRpcClient::new(
        JsonRpc::new(http_client.clone(), config.sui_rpc_url.clone()),
        config.gas_budget,
        config.finality_timeout,
        config.finality_poll_interval,
    );
    let reader = SolanaRpcClient::new(JsonRpc::new(http_client, config.solana_rpc_url.clone()));

    let identity = StaticTokenProvider::parse(&config.api_tokens)?;
    if identity.is_empty() {
        tracing::warn!("API_TOKENSが未設定です。認証付きエンドポイントはすべて401を返します");
    }

    let vault = match &config.key_vault_path {
        Some(path) => MemoryKeyVault::from_file(path)?,
        None => MemoryKeyVault::new(),
    };

    tracing::info!(
        sui_rpc = %config.sui_rpc_url,
        solana_rpc = %config.solana_rpc_url,
        package = %config.scan.package,
        threshold = config.scan.threshold,
        tokens = identity.len(),
        "Gateway設定を読み込みました"
    );

    let state = Arc::new(GatewayState {
        writer: Box::new(writer),
        reader: Box::new(reader),
        identity: Box::new(identity),
        vault: Box::new(vault),
        scan_config: config.scan.clone(),
        history_limit: config.history_limit,
    });

    let app = router(state);

    tracing::info!("Gatewayを {} で起動します", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナルハンドラの登録に失敗しました");
        return;
    }
    tracing::info!("シャットダウンします");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    async fn serve(state: Arc<GatewayState>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        format!("http://127.0.0.1:{port}")
    }

    /// /healthは認証なしで応答する
    #[tokio::test]
    async fn test_health_without_auth() {
        let base = serve(test_state(Default::default(), FakeReader::default())).await;
        let response = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    /// ルーター経由でイベントが返り、認証なしでは401になる
    #[tokio::test]
    async fn test_events_route() {
        let owner = "So11111111111111111111111111111111111111112";
        let reader = FakeReader::default()
            .with_device(owner, "MintA", "ScannerPk", "scanner")
            .with_memo("ScannerPk", "sig1", "\"ItemPk,ScannerPk,37.7749,-122.4194\"", 1);
        let base = serve(test_state(Default::default(), reader)).await;
        let client = reqwest::Client::new();

        let unauthorized = client
            .get(format!("{base}/events/{owner}"))
            .send()
            .await
            .unwrap();
        assert_eq!(unauthorized.status(), reqwest::StatusCode::UNAUTHORIZED);

        let response = client
            .get(format!("{base}/events/{owner}?limit=5"))
            .bearer_auth(TEST_TOKEN)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: scantrail_types::EventsResponse = response.json().await.unwrap();
        assert_eq!(body.events.len(), 1);
        assert_eq!(body.events[0].latitude, 37.7749);
        assert_eq!(body.events[0].longitude, -122.4194);
    }

    /// ルーター経由のスキャン記録
    #[tokio::test]
    async fn test_scan_route() {
        use scantrail_crypto::{encode_sui_private_key, Ed25519SigningKey};

        let base = serve(test_state(Default::default(), FakeReader::default())).await;
        let scanner = encode_sui_private_key(&Ed25519SigningKey::from_bytes(&[5; 32])).unwrap();
        let item = encode_sui_private_key(&Ed25519SigningKey::from_bytes(&[6; 32])).unwrap();

        let response = reqwest::Client::new()
            .post(format!("{base}/scan"))
            .bearer_auth(TEST_TOKEN)
            .json(&serde_json::json!({
                "scanner_secret": scanner,
                "item_secret": item,
                "message": "scan at gate 3",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: scantrail_types::ScanResponse = response.json().await.unwrap();
        assert_eq!(body.digest, "DIGEST");
        assert_eq!(body.checkpoint, Some(7));
    }
}
