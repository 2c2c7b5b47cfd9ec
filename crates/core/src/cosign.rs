//! # 共同署名によるスキャン記録
//!
//! ## 処理フロー
//! 1. 入力（スキャナー秘密鍵・アイテム秘密鍵・メッセージ）の存在を確認する
//! 2. 両者の秘密鍵をデコードし、2者マルチシグ公開鍵を導出する
//! 3. 両者がメッセージをパーソナルメッセージとして個別に署名する
//! 4. 部分署名を結合し、結合署名を検証する（失敗した場合は送信しない）
//! 5. 記録用のMove呼び出しを構築し、スキャナー鍵で署名して送信する
//! 6. ファイナリティを待ってダイジェストを返す
//!
//! 1回の呼び出しで状態を変更するトランザクションはちょうど1件。リトライはしない。

use base64::Engine;
use scantrail_crypto::{
    decode_secret, sign_personal_message, sign_transaction, sui_address, CryptoError,
    Ed25519SigningKey, MultiSigPublicKey, SuiAddress,
};
use scantrail_types::{MoveCall, SignedTransaction};

use crate::chain::{ChainError, ChainWriter};

/// 記録トランザクションの固定パラメータ。
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// 記録用Moveパッケージ
    pub package: String,
    /// モジュール名
    pub module: String,
    /// 関数名
    pub function: String,
    /// 記録オブジェクトのラベル
    pub label: String,
    /// 記録オブジェクトのアイコンURI
    pub icon_uri: String,
    /// マルチシグの閾値（メンバーは重み1の2者）
    pub threshold: u16,
}

/// 共同署名の入力。いずれも必須。
#[derive(Debug, Clone, Default)]
pub struct ScanInput {
    /// スキャナーのエンコード済み秘密鍵
    pub scanner_secret: Option<String>,
    /// アイテムのエンコード済み秘密鍵
    pub item_secret: Option<String>,
    /// 記録するメッセージ
    pub message: Option<String>,
}

/// 記録結果。
#[derive(Debug, Clone)]
pub struct ScanReceipt {
    /// トランザクションダイジェスト
    pub digest: String,
    /// 取り込まれたチェックポイント
    pub checkpoint: Option<u64>,
    /// 2者マルチシグのアドレス
    pub multisig_address: SuiAddress,
    /// Base64エンコードされた結合署名
    pub combined_signature: String,
    /// スキャナー（送信者）のアドレス
    pub scanner_address: SuiAddress,
    /// アイテムのアドレス
    pub item_address: SuiAddress,
}

/// 共同署名処理のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 必須入力の欠落
    #[error("入力が不正です: {0}")]
    Validation(String),
    /// 秘密鍵のデコード失敗
    #[error("鍵のデコードに失敗: {0}")]
    Decode(#[source] CryptoError),
    /// 結合署名の検証失敗（送信前に中断）
    #[error("結合署名の検証に失敗: {0}")]
    Verification(#[source] CryptoError),
    /// 署名・結合処理の内部エラー
    #[error("署名処理に失敗: {0}")]
    Signing(#[source] CryptoError),
    /// チェーンRPCのエラー
    #[error(transparent)]
    Chain(#[from] ChainError),
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ScanError> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ScanError::Validation(format!("{name}は必須です"))),
    }
}

/// 2者の共同署名を検証し、スキャンイベントを記録する。
pub async fn record_scan(
    writer: &dyn ChainWriter,
    config: &ScanConfig,
    input: &ScanInput,
) -> Result<ScanReceipt, ScanError> {
    // Step 1: 入力チェック（ネットワーク呼び出しの前に行う）
    let scanner_secret = require(&input.scanner_secret, "scanner_secret")?;
    let item_secret = require(&input.item_secret, "item_secret")?;
    let message = require(&input.message, "message")?;

    // Step 2: 鍵のデコードとマルチシグ公開鍵の導出
    let scanner_key = decode_secret(scanner_secret).map_err(ScanError::Decode)?;
    let item_key = decode_secret(item_secret).map_err(ScanError::Decode)?;
    if scanner_key.verifying_key() == item_key.verifying_key() {
        return Err(ScanError::Validation(
            "スキャナーとアイテムに同じ鍵は使用できません".into(),
        ));
    }

    let multisig_pk = MultiSigPublicKey::new(
        vec![(scanner_key.verifying_key(), 1), (item_key.verifying_key(), 1)],
        config.threshold,
    )
    .map_err(ScanError::Signing)?;
    let multisig_address = multisig_pk.address();

    // Step 3-4: 個別署名 → 結合 → 検証
    let combined_signature = cosign(&multisig_pk, &scanner_key, &item_key, message.as_bytes())?;

    // Step 5: 記録トランザクションの構築・署名・送信
    let scanner_address = sui_address(&scanner_key.verifying_key());
    let item_address = sui_address(&item_key.verifying_key());
    let call = MoveCall {
        package: config.package.clone(),
        module: config.module.clone(),
        function: config.function.clone(),
        arguments: vec![
            config.label.clone().into(),
            config.icon_uri.clone().into(),
            scanner_address.to_string().into(),
            item_address.to_string().into(),
            message.into(),
        ],
    };

    let tx_bytes = writer.prepare(&call, &scanner_address.to_string()).await?;
    let tx_signature = sign_transaction(&scanner_key, &tx_bytes).map_err(ScanError::Signing)?;
    let signed = SignedTransaction {
        tx_bytes: b64().encode(&tx_bytes),
        signatures: vec![tx_signature.to_base64()],
    };
    let digest = writer.submit(&signed).await?;
    tracing::info!(
        digest = %digest,
        multisig = %multisig_address,
        scanner = %scanner_address,
        "記録トランザクションを送信しました"
    );

    // Step 6: ファイナリティ待機
    let receipt = writer.wait_for_finality(&digest).await?;
    tracing::info!(digest = %receipt.digest, checkpoint = ?receipt.checkpoint, "ファイナリティに到達しました");

    Ok(ScanReceipt {
        digest: receipt.digest,
        checkpoint: receipt.checkpoint,
        multisig_address,
        combined_signature,
        scanner_address,
        item_address,
    })
}

/// 両者の部分署名を結合・検証し、Base64エンコードした結合署名を返す。
fn cosign(
    multisig_pk: &MultiSigPublicKey,
    scanner_key: &Ed25519SigningKey,
    item_key: &Ed25519SigningKey,
    message: &[u8],
) -> Result<String, ScanError> {
    let partials = vec![
        sign_personal_message(scanner_key, message).map_err(ScanError::Signing)?,
        sign_personal_message(item_key, message).map_err(ScanError::Signing)?,
    ];
    let combined = multisig_pk
        .combine(message, partials)
        .map_err(ScanError::Verification)?;

    multisig_pk
        .verify_personal_message(message, &combined)
        .map_err(ScanError::Verification)?;

    Ok(combined.to_base64())
}

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}
