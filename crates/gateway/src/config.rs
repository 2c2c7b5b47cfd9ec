//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//! チェーンクライアント等の依存はプロセス起動時に一度だけ構築し、共有状態として注入する。

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use scantrail_core::{ChainReader, ChainWriter, ScanConfig};

use crate::auth::IdentityProvider;
use crate::vault::KeyVault;

/// getSignaturesForAddressで指定できる件数の上限
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// ファイナリティ待機の上限（秒）
pub const MAX_FINALITY_TIMEOUT_SECS: u64 = 600;

/// ファイナリティ確認のポーリング間隔の下限（ミリ秒）
pub const MIN_FINALITY_POLL_MS: u64 = 10;

/// 環境変数から読み込むGateway設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 待ち受けアドレス
    pub bind_addr: String,
    /// Sui JSON-RPC URL（記録トランザクション用）
    pub sui_rpc_url: String,
    /// Solana JSON-RPC URL（履歴の読み取り用）
    pub solana_rpc_url: String,
    /// 記録トランザクションの固定パラメータ
    pub scan: ScanConfig,
    /// ガス予算（MIST）
    pub gas_budget: u64,
    /// ファイナリティ待機の上限
    pub finality_timeout: Duration,
    /// ファイナリティ確認のポーリング間隔
    pub finality_poll_interval: Duration,
    /// アドレスごとの履歴取得件数
    pub history_limit: usize,
    /// `sha256hex:principal` のカンマ区切り
    pub api_tokens: String,
    /// Key Vaultの初期データ（JSONファイル）
    pub key_vault_path: Option<PathBuf>,
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の変数ソースから構築する。
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let package = lookup("SCAN_PACKAGE_ID")
            .filter(|v| !v.trim().is_empty())
            .context("SCAN_PACKAGE_IDが設定されていません")?;

        let threshold: u16 = parse_var(&lookup, "SCAN_MULTISIG_THRESHOLD", 1)?;
        if !(1..=2).contains(&threshold) {
            anyhow::bail!("SCAN_MULTISIG_THRESHOLDは1または2である必要があります: {threshold}");
        }

        let history_limit: usize = parse_var(&lookup, "HISTORY_LIMIT", 10)?;
        if history_limit == 0 || history_limit > MAX_HISTORY_LIMIT {
            anyhow::bail!("HISTORY_LIMITは1以上{MAX_HISTORY_LIMIT}以下である必要があります");
        }

        let finality_timeout_secs: u64 = parse_var(&lookup, "FINALITY_TIMEOUT_SECS", 60)?;
        if !(1..=MAX_FINALITY_TIMEOUT_SECS).contains(&finality_timeout_secs) {
            anyhow::bail!(
                "FINALITY_TIMEOUT_SECSは1以上{MAX_FINALITY_TIMEOUT_SECS}以下である必要があります: {finality_timeout_secs}"
            );
        }
        let finality_timeout = Duration::from_secs(finality_timeout_secs);

        let poll_ms: u64 = parse_var(&lookup, "FINALITY_POLL_MS", 500)?;
        let finality_poll_interval = Duration::from_millis(poll_ms);
        if poll_ms < MIN_FINALITY_POLL_MS || finality_poll_interval > finality_timeout {
            anyhow::bail!(
                "FINALITY_POLL_MSは{MIN_FINALITY_POLL_MS}以上かつ待機上限以下である必要があります: {poll_ms}"
            );
        }

        Ok(Self {
            bind_addr: var("BIND_ADDR", "0.0.0.0:3000"),
            sui_rpc_url: var("SUI_RPC_URL", "https://fullnode.devnet.sui.io:443"),
            solana_rpc_url: var("SOLANA_RPC_URL", "https://api.devnet.solana.com"),
            scan: ScanConfig {
                package,
                module: var("SCAN_MODULE", "scan"),
                function: var("SCAN_FUNCTION", "mint"),
                label: var("SCAN_LABEL", "Scan"),
                icon_uri: var("SCAN_ICON_URI", ""),
                threshold,
            },
            gas_budget: parse_var(&lookup, "SUI_GAS_BUDGET", 10_000_000)?,
            finality_timeout,
            finality_poll_interval,
            history_limit,
            api_tokens: var("API_TOKENS", ""),
            key_vault_path: lookup("KEY_VAULT_PATH").map(PathBuf::from),
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{name}の値が不正です ({raw}): {e}")),
        None => Ok(default),
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// 記録トランザクションの送信クライアント（Sui）
    pub writer: Box<dyn ChainWriter>,
    /// 所有オブジェクト・履歴の読み取りクライアント（Solana）
    pub reader: Box<dyn ChainReader>,
    /// Bearerトークンからプリンシパルを解決する
    pub identity: Box<dyn IdentityProvider>,
    /// プリンシパルごとのデバイス鍵
    pub vault: Box<dyn KeyVault>,
    /// 記録トランザクションの固定パラメータ
    pub scan_config: ScanConfig,
    /// アドレスごとの履歴取得件数（デフォルト）
    pub history_limit: usize,
}
