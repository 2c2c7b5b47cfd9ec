//! # Scantrail 暗号処理
//!
//! スキャンイベントの共同署名で使用する鍵・署名プリミティブを実装する。
//! Suiのワイヤ形式（インテント、ユーザー署名、マルチシグ）は `sui-sdk-types`、
//! 署名・集約・検証は `sui-crypto` に任せる。
//!
//! ## 暗号アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 署名 | Ed25519 |
//! | ダイジェスト・アドレス導出 | Blake2b-256 |
//! | メッセージ直列化 | BCS |
//! | 秘密鍵エンコーディング | 0x付き16進数 / bech32 (`suiprivkey`) / Base64 |

mod intent;
mod keys;
mod multisig;

pub use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
pub use intent::{sign_personal_message, sign_transaction};
pub use keys::{decode_secret, encode_sui_private_key};
pub use multisig::{MultiSigPublicKey, Weight};
pub use sui_sdk_types::{Address as SuiAddress, UserSignature};

/// Ed25519署名スキームのフラグ
pub const ED25519_FLAG: u8 = 0x00;

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// 秘密鍵のデコードに失敗
    #[error("秘密鍵のデコードに失敗しました: {0}")]
    InvalidSecret(String),
    /// マルチシグ委員会の構成が不正
    #[error("マルチシグ構成が不正です: {0}")]
    InvalidMultisig(String),
    /// 署名の生成・集約に失敗
    #[error("署名に失敗しました: {0}")]
    Signing(String),
    /// 署名検証エラー
    #[error("署名検証に失敗しました: {0}")]
    SignatureVerifyError(String),
}

/// Ed25519公開鍵のSuiアドレス: `Blake2b-256(flag || pubkey)`
pub fn sui_address(public_key: &Ed25519VerifyingKey) -> SuiAddress {
    sui_public_key(public_key).derive_address()
}

pub(crate) fn sui_public_key(public_key: &Ed25519VerifyingKey) -> sui_sdk_types::Ed25519PublicKey {
    sui_sdk_types::Ed25519PublicKey::new(public_key.to_bytes())
}

pub(crate) fn sui_private_key(
    signing_key: &Ed25519SigningKey,
) -> sui_crypto::ed25519::Ed25519PrivateKey {
    sui_crypto::ed25519::Ed25519PrivateKey::new(signing_key.to_bytes())
}

/// Base64エンジン（Standard）
pub(crate) fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}
