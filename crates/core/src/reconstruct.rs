//! # 位置情報イベントの再構築
//!
//! ## 処理フロー
//! 1. 主体が保有するオブジェクトを列挙する
//! 2. 各オブジェクトのメタデータを型付きに変換し、`public` キーの公開鍵を取り出す
//!    （公開鍵を持たないオブジェクトはスキップ）
//! 3. 公開鍵ごとに直近の履歴を取得し、メモ付きのエントリだけを残す
//! 4. メモを寛容にパースし、ブロック時刻と署名を付けて位置情報レコードにする
//! 5. 3〜4は全公開鍵について並行に実行し、全て完了してから結合する
//!
//! 結合はオブジェクト順を保つ。いずれかの取得が失敗した場合はそのエラーを返す。

use futures::future::try_join_all;
use scantrail_types::{AssetMetadata, DeviceHistory, DeviceRole, HistoryEntry, LocationRecord};

use crate::chain::{ChainError, ChainReader};
use crate::memo::parse_memo;

/// 再構築のオプション。
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// アドレスごとに取得する履歴の件数
    pub history_limit: usize,
    /// 指定した場合、この役割のメタデータを持つオブジェクトだけを対象にする
    pub role: Option<DeviceRole>,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            history_limit: 10,
            role: None,
        }
    }
}

/// 主体のデバイスごとのイベント履歴を再構築する。
///
/// 保有オブジェクトが無い場合は空のVecを返す。
pub async fn reconstruct_device_histories(
    reader: &dyn ChainReader,
    owner: &str,
    options: &ReconstructOptions,
) -> Result<Vec<DeviceHistory>, ChainError> {
    let owned = reader.list_owned_objects(owner).await?;
    if owned.is_empty() {
        tracing::debug!(owner = %owner, "保有オブジェクトがありません");
        return Ok(Vec::new());
    }

    let objects = try_join_all(owned.iter().map(|object| reader.get_object(&object.id))).await?;

    let mut devices = Vec::new();
    for object in objects.into_iter().flatten() {
        let metadata = AssetMetadata::from_pairs(&object.additional_metadata);
        if let (Some(wanted), Some(role)) = (options.role, metadata.role) {
            if wanted != role {
                continue;
            }
        }
        match metadata.public_key {
            Some(public_key) => devices.push((object.id, public_key)),
            None => {
                tracing::warn!(object_id = %object.id, "publicメタデータが無いためスキップします");
            }
        }
    }

    let histories = try_join_all(devices.into_iter().map(|(object_id, public_key)| async move {
        let entries = reader
            .get_transaction_history(&public_key, options.history_limit)
            .await?;
        let events = location_records(&entries);
        tracing::debug!(
            public_key = %public_key,
            entries = entries.len(),
            events = events.len(),
            "履歴を取得しました"
        );
        Ok::<_, ChainError>(DeviceHistory {
            object_id,
            public_key,
            events,
        })
    }))
    .await?;

    tracing::info!(
        owner = %owner,
        devices = histories.len(),
        events = histories.iter().map(|h| h.events.len()).sum::<usize>(),
        "イベントを再構築しました"
    );
    Ok(histories)
}

/// 主体の全デバイスのイベントを1つのリストに連結して返す。
pub async fn reconstruct_events(
    reader: &dyn ChainReader,
    owner: &str,
    options: &ReconstructOptions,
) -> Result<Vec<LocationRecord>, ChainError> {
    let histories = reconstruct_device_histories(reader, owner, options).await?;
    Ok(histories.into_iter().flat_map(|h| h.events).collect())
}

/// 各デバイスのイベントをタイムスタンプ昇順に並べ替える。
///
/// 同じタイムスタンプのイベントは元の順序を保つ。
pub fn timeline(mut histories: Vec<DeviceHistory>) -> Vec<DeviceHistory> {
    for history in &mut histories {
        history.events.sort_by_key(|event| event.timestamp);
    }
    histories
}

/// メモ付きのエントリからパースできたものだけをレコードにする。
fn location_records(entries: &[HistoryEntry]) -> Vec<LocationRecord> {
    entries
        .iter()
        .filter_map(|entry| {
            let memo = entry.memo.as_deref()?;
            parse_memo(memo).map(|parsed| parsed.into_record(&entry.signature, entry.block_time))
        })
        .collect()
}
