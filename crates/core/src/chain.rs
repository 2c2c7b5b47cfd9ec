//! # チェーンRPCクライアント
//!
//! 書き込み（Sui: 記録トランザクション）と読み取り（Solana: 所有オブジェクトと履歴）を
//! 別のトレイトに分ける。実装はプロセス起動時に一度だけ構築し、注入する。

use scantrail_types::{
    ChainObject, HistoryEntry, MoveCall, OwnedObject, SignedTransaction, TransactionReceipt,
};

/// チェーンRPCのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// HTTP通信に失敗
    #[error("RPC通信に失敗: {0}")]
    Transport(String),
    /// ノードがJSON-RPCエラーを返した
    #[error("RPCエラー: {0}")]
    Rpc(String),
    /// レスポンスの形式が想定と異なる
    #[error("RPCレスポンスが不正です: {0}")]
    InvalidResponse(String),
    /// トランザクションの実行が失敗した
    #[error("トランザクションの実行に失敗: {0}")]
    ExecutionFailed(String),
    /// ファイナリティ待機のタイムアウト
    #[error("ファイナリティ待機がタイムアウトしました: {0}")]
    Timeout(String),
}

/// 記録トランザクションを送信するクライアント。
#[async_trait::async_trait]
pub trait ChainWriter: Send + Sync {
    /// Move呼び出しからsenderのTransactionData（BCSバイト列）を構築する。
    async fn prepare(&self, call: &MoveCall, sender: &str) -> Result<Vec<u8>, ChainError>;

    /// 署名済みトランザクションを送信し、ダイジェストを返す。
    async fn submit(&self, tx: &SignedTransaction) -> Result<String, ChainError>;

    /// トランザクションがファイナリティに到達するまで待機する。
    async fn wait_for_finality(&self, digest: &str) -> Result<TransactionReceipt, ChainError>;
}

/// 所有オブジェクトと履歴を読み取るクライアント。
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// 主体が保有するオブジェクトを列挙する。
    async fn list_owned_objects(&self, owner: &str) -> Result<Vec<OwnedObject>, ChainError>;

    /// オブジェクトを取得する。存在しない場合はNone。
    async fn get_object(&self, id: &str) -> Result<Option<ChainObject>, ChainError>;

    /// アドレスの直近のトランザクション履歴を新しい順に取得する。
    async fn get_transaction_history(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, ChainError>;
}
