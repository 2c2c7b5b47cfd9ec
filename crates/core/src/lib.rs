//! # Scantrail Core
//!
//! スキャンイベントの共同署名による記録と、トランザクションメモからの
//! 位置情報イベントの再構築を実装する。
//!
//! ## 構成
//! - [`cosign`] — スキャナーとアイテムの2者がメッセージに署名し、結合署名を検証した上で
//!   記録トランザクションを1件だけ送信する
//! - [`reconstruct`] — 所有オブジェクトのメタデータからデバイス公開鍵を取り出し、
//!   各アドレスの履歴メモを並行に取得・パースする
//! - [`memo`] — 4フィールドのメモペイロードの寛容なパーサ
//! - [`chain`] — チェーンRPCクライアントの抽象インターフェース
//!
//! チェーンとの通信は全てトレイト経由で注入される。リトライは一切行わず、
//! プロバイダのエラーはそのまま呼び出し元に返す。

pub mod chain;
pub mod cosign;
pub mod memo;
pub mod reconstruct;

pub use chain::{ChainError, ChainReader, ChainWriter};
pub use cosign::{record_scan, ScanConfig, ScanError, ScanInput, ScanReceipt};
pub use memo::{parse_memo, ScanMemo};
pub use reconstruct::{
    reconstruct_device_histories, reconstruct_events, timeline, ReconstructOptions,
};
