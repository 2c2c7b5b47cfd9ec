//! テスト用ヘルパー関数。
//! Gateway内のテストから共通で使用される。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use scantrail_core::{ChainError, ChainReader, ChainWriter, ScanConfig};
use scantrail_types::{
    ChainObject, HistoryEntry, MoveCall, OwnedObject, SignedTransaction, TransactionReceipt,
};

use crate::auth::{hash_token, StaticTokenProvider};
use crate::config::GatewayState;
use crate::vault::{KeyVault, MemoryKeyVault};

/// テスト用のBearerトークン（プリンシパル `alice`）
pub const TEST_TOKEN: &str = "test-token";

/// モックJSON-RPCサーバーを起動し、URLを返す。
/// ハンドラーは `(method, params)` を受け取り、JSON-RPCレスポンス全体を返す。
pub async fn start_mock_rpc<F>(handler: F) -> String
where
    F: Fn(&str, serde_json::Value) -> serde_json::Value + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let app = axum::Router::new().route(
        "/",
        axum::routing::post(move |Json(body): Json<serde_json::Value>| {
            let handler = handler.clone();
            async move {
                let method = body["method"].as_str().unwrap_or_default().to_string();
                let params = body["params"].clone();
                Json(handler(&method, params))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

/// 呼び出し回数を数えるChainWriter。
#[derive(Default)]
pub struct FakeWriter {
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ChainWriter for FakeWriter {
    async fn prepare(&self, _call: &MoveCall, _sender: &str) -> Result<Vec<u8>, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0, 1, 2, 3])
    }

    async fn submit(&self, _tx: &SignedTransaction) -> Result<String, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("DIGEST".to_string())
    }

    async fn wait_for_finality(&self, digest: &str) -> Result<TransactionReceipt, ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionReceipt {
            digest: digest.to_string(),
            checkpoint: Some(7),
        })
    }
}

/// 固定データを返すChainReader。
#[derive(Default)]
pub struct FakeReader {
    /// 所有者 → ミント
    pub owned: HashMap<String, Vec<String>>,
    /// ミント → 追加メタデータ
    pub objects: HashMap<String, Vec<(String, String)>>,
    /// アドレス → 履歴
    pub histories: HashMap<String, Vec<HistoryEntry>>,
}

impl FakeReader {
    /// 所有者に、公開鍵とロールを持つデバイスを追加する。
    pub fn with_device(mut self, owner: &str, mint: &str, public_key: &str, role: &str) -> Self {
        self.owned
            .entry(owner.to_string())
            .or_default()
            .push(mint.to_string());
        self.objects.insert(
            mint.to_string(),
            vec![
                ("public".to_string(), public_key.to_string()),
                ("role".to_string(), role.to_string()),
            ],
        );
        self
    }

    /// アドレスにメモ付きの履歴を追加する。
    pub fn with_memo(mut self, address: &str, signature: &str, memo: &str, block_time: i64) -> Self {
        self.histories
            .entry(address.to_string())
            .or_default()
            .push(HistoryEntry {
                signature: signature.to_string(),
                memo: Some(memo.to_string()),
                block_time: Some(block_time),
            });
        self
    }
}

#[async_trait::async_trait]
impl ChainReader for FakeReader {
    async fn list_owned_objects(&self, owner: &str) -> Result<Vec<OwnedObject>, ChainError> {
        Ok(self
            .owned
            .get(owner)
            .map(|mints| mints.iter().map(|id| OwnedObject { id: id.clone() }).collect())
            .unwrap_or_default())
    }

    async fn get_object(&self, id: &str) -> Result<Option<ChainObject>, ChainError> {
        Ok(self.objects.get(id).map(|pairs| ChainObject {
            id: id.to_string(),
            name: None,
            additional_metadata: pairs.clone(),
        }))
    }

    async fn get_transaction_history(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, ChainError> {
        Ok(self
            .histories
            .get(address)
            .map(|entries| entries.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

/// テスト用の記録パラメータ
pub fn test_scan_config() -> ScanConfig {
    ScanConfig {
        package: "0x2a".to_string(),
        module: "scan".to_string(),
        function: "mint".to_string(),
        label: "Scan".to_string(),
        icon_uri: String::new(),
        threshold: 1,
    }
}

/// テスト用GatewayStateを構築するヘルパー
pub fn test_state(writer: Arc<FakeWriter>, reader: FakeReader) -> Arc<GatewayState> {
    test_state_with_vault(writer, reader, MemoryKeyVault::new())
}

/// Key Vaultを指定してGatewayStateを構築する。
pub fn test_state_with_vault(
    writer: Arc<FakeWriter>,
    reader: FakeReader,
    vault: impl KeyVault + 'static,
) -> Arc<GatewayState> {
    let tokens = format!("{}:alice", hash_token(TEST_TOKEN));
    Arc::new(GatewayState {
        writer: Box::new(SharedWriter(writer)),
        reader: Box::new(reader),
        identity: Box::new(StaticTokenProvider::parse(&tokens).unwrap()),
        vault: Box::new(vault),
        scan_config: test_scan_config(),
        history_limit: 10,
    })
}

/// テスト用の認証ヘッダー
pub fn auth_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        axum::http::header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {TEST_TOKEN}")).unwrap(),
    );
    headers
}

/// テスト側で呼び出し回数を参照できるようにArcを共有するラッパー
struct SharedWriter(Arc<FakeWriter>);

#[async_trait::async_trait]
impl ChainWriter for SharedWriter {
    async fn prepare(&self, call: &MoveCall, sender: &str) -> Result<Vec<u8>, ChainError> {
        self.0.prepare(call, sender).await
    }

    async fn submit(&self, tx: &SignedTransaction) -> Result<String, ChainError> {
        self.0.submit(tx).await
    }

    async fn wait_for_finality(&self, digest: &str) -> Result<TransactionReceipt, ChainError> {
        self.0.wait_for_finality(digest).await
    }
}
