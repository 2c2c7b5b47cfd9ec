//! # 秘密鍵のデコード
//!
//! 呼び出し元から渡されるエンコード済み秘密鍵をEd25519署名鍵に変換する。
//!
//! ## 受け付ける形式
//! - `suiprivkey1...` — bech32 (`flag || 32バイトseed`)
//! - `0x...` — 16進数
//! - それ以外 — Base64
//!
//! バイト列は 32バイト (seed)、33バイト (`0x00 || seed`)、
//! 64バイト (`seed || pubkey`、Solanaキーペア形式) のいずれか。

use base64::Engine;
use bech32::{FromBase32, ToBase32, Variant};
use ed25519_dalek::SigningKey;

use crate::{b64, CryptoError, ED25519_FLAG};

/// bech32秘密鍵のHRP
const SUI_PRIVATE_KEY_PREFIX: &str = "suiprivkey";

/// エンコード済み秘密鍵をデコードする。
pub fn decode_secret(encoded: &str) -> Result<SigningKey, CryptoError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(CryptoError::InvalidSecret("秘密鍵が空です".into()));
    }

    if encoded.starts_with(SUI_PRIVATE_KEY_PREFIX) {
        return decode_bech32(encoded);
    }

    let bytes = if let Some(hex_str) = encoded.strip_prefix("0x") {
        hex::decode(hex_str)
            .map_err(|e| CryptoError::InvalidSecret(format!("16進数のデコードに失敗: {e}")))?
    } else {
        b64()
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidSecret(format!("Base64のデコードに失敗: {e}")))?
    };

    signing_key_from_bytes(&bytes)
}

/// 署名鍵を `suiprivkey` bech32形式にエンコードする。
pub fn encode_sui_private_key(key: &SigningKey) -> Result<String, CryptoError> {
    let mut payload = Vec::with_capacity(33);
    payload.push(ED25519_FLAG);
    payload.extend_from_slice(&key.to_bytes());
    bech32::encode(SUI_PRIVATE_KEY_PREFIX, payload.to_base32(), Variant::Bech32)
        .map_err(|e| CryptoError::InvalidSecret(format!("bech32エンコードに失敗: {e}")))
}

fn decode_bech32(encoded: &str) -> Result<SigningKey, CryptoError> {
    let (hrp, data, _variant) = bech32::decode(encoded)
        .map_err(|e| CryptoError::InvalidSecret(format!("bech32のデコードに失敗: {e}")))?;
    if hrp != SUI_PRIVATE_KEY_PREFIX {
        return Err(CryptoError::InvalidSecret(format!("不正なHRP: {hrp}")));
    }
    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| CryptoError::InvalidSecret(format!("bech32ペイロードの変換に失敗: {e}")))?;
    if bytes.len() != 33 {
        return Err(CryptoError::InvalidSecret(format!(
            "bech32ペイロードは33バイトである必要があります: {} bytes",
            bytes.len()
        )));
    }
    signing_key_from_bytes(&bytes)
}

fn signing_key_from_bytes(bytes: &[u8]) -> Result<SigningKey, CryptoError> {
    match bytes.len() {
        32 => Ok(SigningKey::from_bytes(&seed(bytes))),
        33 => {
            if bytes[0] != ED25519_FLAG {
                return Err(CryptoError::InvalidSecret(format!(
                    "未対応の署名スキームです (flag = {:#04x})",
                    bytes[0]
                )));
            }
            Ok(SigningKey::from_bytes(&seed(&bytes[1..])))
        }
        64 => {
            let key = SigningKey::from_bytes(&seed(&bytes[..32]));
            if key.verifying_key().as_bytes() != &bytes[32..] {
                return Err(CryptoError::InvalidSecret(
                    "キーペアの公開鍵部分が秘密鍵と一致しません".into(),
                ));
            }
            Ok(key)
        }
        n => Err(CryptoError::InvalidSecret(format!(
            "秘密鍵の長さが不正です: {n} bytes"
        ))),
    }
}

fn seed(bytes: &[u8]) -> [u8; 32] {
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&bytes[..32]);
    seed
}
