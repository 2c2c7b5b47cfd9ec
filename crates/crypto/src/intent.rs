//! # インテント署名
//!
//! 署名対象は `intent || payload` のBlake2b-256ダイジェスト。
//! intentは `[scope, version = 0, app_id = 0]` の3バイト。
//!
//! - パーソナルメッセージ: scope = 3、payloadはメッセージバイト列のBCS表現
//! - トランザクション: scope = 0、payloadはTransactionDataのBCSバイト列そのもの

use std::borrow::Cow;

use sui_crypto::{Signer, SuiSigner};
use sui_sdk_types::hash::Hasher;
use sui_sdk_types::{Intent, IntentAppId, IntentScope, IntentVersion, PersonalMessage};

use crate::{sui_private_key, CryptoError, Ed25519SigningKey, UserSignature};

const TRANSACTION_INTENT: Intent = Intent {
    scope: IntentScope::TransactionData,
    version: IntentVersion::V0,
    app_id: IntentAppId::Sui,
};

pub(crate) fn personal_message(message: &[u8]) -> PersonalMessage<'_> {
    PersonalMessage(Cow::Borrowed(message))
}

/// トランザクションの署名対象ダイジェスト。
///
/// `tx_bytes` はフルノードが返したTransactionDataのBCSバイト列。
fn transaction_digest(tx_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(TRANSACTION_INTENT.to_bytes());
    hasher.update(tx_bytes);
    hasher.finalize().into_inner()
}

/// メッセージをパーソナルメッセージとして署名する。
pub fn sign_personal_message(
    signing_key: &Ed25519SigningKey,
    message: &[u8],
) -> Result<UserSignature, CryptoError> {
    sui_private_key(signing_key)
        .sign_personal_message(&personal_message(message))
        .map_err(|e| CryptoError::Signing(e.to_string()))
}

/// TransactionDataのBCSバイト列に署名する。
pub fn sign_transaction(
    signing_key: &Ed25519SigningKey,
    tx_bytes: &[u8],
) -> Result<UserSignature, CryptoError> {
    let digest = transaction_digest(tx_bytes);
    Signer::<UserSignature>::try_sign(&sui_private_key(signing_key), &digest)
        .map_err(|e| CryptoError::Signing(e.to_string()))
}
