//! # GET /events/{owner}, GET /timeline/{owner}
//!
//! 所有者のデバイスのトランザクション履歴から位置情報を再構築する。

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use scantrail_core::{reconstruct_device_histories, reconstruct_events, timeline, ReconstructOptions};
use scantrail_types::{DeviceRole, EventsResponse, TimelineResponse};
use serde::Deserialize;

use crate::auth::authenticate;
use crate::config::{GatewayState, MAX_HISTORY_LIMIT};
use crate::error::GatewayError;

/// 再構築のクエリパラメータ。
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// `scanner` / `item` で絞り込む
    pub role: Option<String>,
    /// アドレスごとの履歴取得件数
    pub limit: Option<usize>,
}

/// GET /events/{owner} — 全デバイスの位置情報を連結して返す。
pub async fn handle_events(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(owner): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, GatewayError> {
    authenticate(&state, &headers).await?;
    let options = reconstruct_options(&state, &owner, &query)?;

    let events = reconstruct_events(state.reader.as_ref(), &owner, &options).await?;
    tracing::info!(owner = %owner, records = events.len(), "イベントを返却します");

    Ok(Json(EventsResponse { owner, events }))
}

/// GET /timeline/{owner} — デバイスごとの時系列を返す。
pub async fn handle_timeline(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Path(owner): Path<String>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<TimelineResponse>, GatewayError> {
    authenticate(&state, &headers).await?;
    let options = reconstruct_options(&state, &owner, &query)?;

    let histories = reconstruct_device_histories(state.reader.as_ref(), &owner, &options).await?;
    let devices = timeline(histories);
    tracing::info!(owner = %owner, devices = devices.len(), "タイムラインを返却します");

    Ok(Json(TimelineResponse { owner, devices }))
}

fn reconstruct_options(
    state: &GatewayState,
    owner: &str,
    query: &EventsQuery,
) -> Result<ReconstructOptions, GatewayError> {
    solana_sdk::pubkey::Pubkey::from_str(owner)
        .map_err(|e| GatewayError::BadRequest(format!("不正な所有者アドレス: {owner} ({e})")))?;

    let role = match query.role.as_deref() {
        Some(raw) => Some(
            DeviceRole::parse(raw)
                .ok_or_else(|| GatewayError::BadRequest(format!("不明なロール: {raw}")))?,
        ),
        None => None,
    };

    let history_limit = match query.limit {
        Some(0) => return Err(GatewayError::BadRequest("limitは1以上である必要があります".into())),
        Some(limit) => limit.min(MAX_HISTORY_LIMIT),
        None => state.history_limit,
    };

    Ok(ReconstructOptions {
        history_limit,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    const OWNER: &str = "So11111111111111111111111111111111111111112";

    fn reader() -> FakeReader {
        FakeReader::default()
            .with_device(OWNER, "MintScanner", "ScannerPk", "scanner")
            .with_device(OWNER, "MintItem", "ItemPk", "item")
            .with_memo("ScannerPk", "s2", "[27] \"ItemPk,ScannerPk,2.0,2.0\"", 200)
            .with_memo("ScannerPk", "s1", "\"ItemPk,ScannerPk,1.0,1.0\"", 100)
            .with_memo("ScannerPk", "junk", "hello", 150)
            .with_memo("ItemPk", "i1", "ItemPk,ScannerPk,3.0,3.0", 300)
    }

    /// 全デバイスの位置情報がオブジェクト順に連結される
    #[tokio::test]
    async fn test_events() {
        let state = test_state(Default::default(), reader());
        let response = handle_events(
            State(state),
            auth_headers(),
            Path(OWNER.to_string()),
            Query(EventsQuery::default()),
        )
        .await
        .unwrap()
        .0;

        let signatures: Vec<&str> = response.events.iter().map(|e| e.signature.as_str()).collect();
        assert_eq!(signatures, vec!["s2", "s1", "i1"]);
        assert_eq!(response.owner, OWNER);
    }

    /// ロールで絞り込み、タイムラインは時刻順に並ぶ
    #[tokio::test]
    async fn test_timeline_sorted_and_filtered() {
        let state = test_state(Default::default(), reader());
        let response = handle_timeline(
            State(state),
            auth_headers(),
            Path(OWNER.to_string()),
            Query(EventsQuery {
                role: Some("scanner".into()),
                limit: None,
            }),
        )
        .await
        .unwrap()
        .0;

        assert_eq!(response.devices.len(), 1);
        let device = &response.devices[0];
        assert_eq!(device.object_id, "MintScanner");
        let timestamps: Vec<i64> = device.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![100, 200]);
    }

    /// 保有オブジェクトが無い所有者は空のリスト
    #[tokio::test]
    async fn test_events_empty_owner() {
        let state = test_state(Default::default(), FakeReader::default());
        let response = handle_events(
            State(state),
            auth_headers(),
            Path(OWNER.to_string()),
            Query(EventsQuery::default()),
        )
        .await
        .unwrap()
        .0;
        assert!(response.events.is_empty());
    }

    /// 不正なアドレス・ロール・件数は400
    #[tokio::test]
    async fn test_invalid_parameters() {
        let state = test_state(Default::default(), reader());
        let cases = [
            ("not a pubkey", EventsQuery::default()),
            (
                OWNER,
                EventsQuery {
                    role: Some("driver".into()),
                    limit: None,
                },
            ),
            (
                OWNER,
                EventsQuery {
                    role: None,
                    limit: Some(0),
                },
            ),
        ];
        for (owner, query) in cases {
            let err = handle_events(
                State(state.clone()),
                auth_headers(),
                Path(owner.to_string()),
                Query(query),
            )
            .await
            .unwrap_err();
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    /// 不明なトークンは401
    #[tokio::test]
    async fn test_events_rejects_unknown_token() {
        let state = test_state(Default::default(), reader());
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer other-token".parse().unwrap(),
        );
        let err = handle_events(
            State(state),
            headers,
            Path(OWNER.to_string()),
            Query(EventsQuery::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
