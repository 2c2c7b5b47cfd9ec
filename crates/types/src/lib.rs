//! # Scantrail 共有型定義
//!
//! スキャンイベントの記録・再構築で使用するデータ構造をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - Base58: Solanaアドレス、デバイス公開鍵
//! - 0x付き16進数: Suiアドレス、オブジェクトID
//! - Base64: バイナリデータ（署名、トランザクションバイト列）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 位置情報レコード
// ---------------------------------------------------------------------------

/// トランザクションメモから復元されたスキャンイベントの位置情報。
/// 読み取り専用のビューであり、読み取りのたびに履歴から再計算される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// 緯度
    pub latitude: f64,
    /// 経度
    pub longitude: f64,
    /// アイテム（タグ）の公開鍵
    pub item_public_key: String,
    /// スキャナー（デバイス）の公開鍵
    pub scanner_public_key: String,
    /// ブロック時刻（UNIX秒）。チェーンが未確定の場合は0
    pub timestamp: i64,
    /// メモを含むトランザクションの署名
    pub signature: String,
}

/// デバイス単位のイベント履歴。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceHistory {
    /// メタデータを保持していたオブジェクト（ミント）のID
    pub object_id: String,
    /// メタデータの `public` から取得したデバイス公開鍵
    pub public_key: String,
    /// 復元された位置情報
    pub events: Vec<LocationRecord>,
}

// ---------------------------------------------------------------------------
// チェーンインデクサから取得するデータ
// ---------------------------------------------------------------------------

/// 主体（スキャナー/アイテム所有者）が保有するオブジェクト。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedObject {
    /// オブジェクトID（Solanaではミントアドレス）
    pub id: String,
}

/// オンチェーンオブジェクトの内容。
/// `additional_metadata` はチェーン上の任意のキー/値ペアそのまま。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainObject {
    /// オブジェクトID
    pub id: String,
    /// 表示名（存在する場合）
    pub name: Option<String>,
    /// 追加メタデータ（キー, 値）
    pub additional_metadata: Vec<(String, String)>,
}

/// アドレスのトランザクション履歴の1エントリ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// トランザクション署名
    pub signature: String,
    /// メモ（存在しない場合はNone）
    pub memo: Option<String>,
    /// ブロック時刻（UNIX秒）
    pub block_time: Option<i64>,
}

// ---------------------------------------------------------------------------
// 型付きメタデータ
// ---------------------------------------------------------------------------

/// アプリケーションが解釈するメタデータキーの閉じた集合。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    /// デバイス公開鍵
    Public,
    /// デバイスの役割（scanner / item）
    Role,
}

impl MetadataKey {
    /// チェーン上のキー文字列から変換する。未知のキーはNone。
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "public" => Some(Self::Public),
            "role" => Some(Self::Role),
            _ => None,
        }
    }
}

/// デバイスの役割。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceRole {
    /// スキャナー端末
    Scanner,
    /// アイテムに付与されたタグ
    Item,
}

impl DeviceRole {
    /// 文字列から変換する（大文字小文字は区別しない）。
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "scanner" => Some(Self::Scanner),
            "item" => Some(Self::Item),
            _ => None,
        }
    }
}

/// 境界で検証済みのメタデータ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    /// デバイス公開鍵（空文字列は未設定とみなす）
    pub public_key: Option<String>,
    /// デバイスの役割
    pub role: Option<DeviceRole>,
}

impl AssetMetadata {
    /// 任意のキー/値ペアから既知のキーだけを取り出す。
    ///
    /// 未知のキーは無視する。同じキーが複数ある場合は最初の値を採用する。
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut metadata = Self::default();
        for (key, value) in pairs {
            let value = value.trim();
            match MetadataKey::parse(key.trim()) {
                Some(MetadataKey::Public) if metadata.public_key.is_none() => {
                    if !value.is_empty() {
                        metadata.public_key = Some(value.to_string());
                    }
                }
                Some(MetadataKey::Role) if metadata.role.is_none() => {
                    metadata.role = DeviceRole::parse(value);
                }
                _ => {}
            }
        }
        metadata
    }
}

// ---------------------------------------------------------------------------
// 記録トランザクション
// ---------------------------------------------------------------------------

/// Moveエントリ関数呼び出し。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveCall {
    /// パッケージID
    pub package: String,
    /// モジュール名
    pub module: String,
    /// 関数名
    pub function: String,
    /// 引数（JSON-RPCにそのまま渡す）
    pub arguments: Vec<serde_json::Value>,
}

/// 署名済みトランザクション。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Base64エンコードされたTransactionDataのBCSバイト列
    pub tx_bytes: String,
    /// Base64エンコードされたユーザー署名（flag || sig || pk）
    pub signatures: Vec<String>,
}

/// ファイナリティ到達後のレシート。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// トランザクションダイジェスト
    pub digest: String,
    /// 取り込まれたチェックポイント
    pub checkpoint: Option<u64>,
}

// ---------------------------------------------------------------------------
// Gateway API
// ---------------------------------------------------------------------------

/// POST /scan のリクエスト。
///
/// 秘密鍵を直接渡すか、Key Vaultに保存済みの鍵IDで参照する。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    /// スキャナーのエンコード済み秘密鍵
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanner_secret: Option<String>,
    /// アイテムのエンコード済み秘密鍵
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_secret: Option<String>,
    /// Key Vault上のスキャナー鍵ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scanner_key_id: Option<String>,
    /// Key Vault上のアイテム鍵ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_key_id: Option<String>,
    /// 記録するメッセージ
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /scan のレスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    /// トランザクションダイジェスト
    pub digest: String,
    /// 2者マルチシグのSuiアドレス
    pub multisig_address: String,
    /// Base64エンコードされた結合署名
    pub combined_signature: String,
    /// 取り込まれたチェックポイント
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<u64>,
}

/// GET /events/{owner} のレスポンス。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsResponse {
    /// 対象の所有者アドレス
    pub owner: String,
    /// 位置情報（オブジェクト順に連結）
    pub events: Vec<LocationRecord>,
}

/// GET /timeline/{owner} のレスポンス。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineResponse {
    /// 対象の所有者アドレス
    pub owner: String,
    /// デバイスごとの時系列
    pub devices: Vec<DeviceHistory>,
}

/// POST /keys のリクエスト。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeygenRequest {
    /// 保存時の鍵ID（省略時は公開鍵のBase58）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// POST /keys のレスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeygenResponse {
    /// Key Vault上の鍵ID
    pub key_id: String,
    /// Suiアドレス
    pub sui_address: String,
    /// Base58エンコードされた公開鍵（Solanaアドレス形式）
    pub public_key: String,
}
