//! # マルチシグ
//!
//! 重み付き公開鍵の集合と閾値からなるマルチシグ委員会と、
//! メンバーの部分署名を結合したマルチシグ署名を扱う。
//!
//! ## 結合規則
//! 部分署名はメンバーのインデックス順に並べ、ビットマップの該当ビットを立てる。
//! 結合時に各部分署名を検証し、重みの合計が閾値に届かなければ失敗する。
//!
//! ## 直列化
//! - アドレス: `Blake2b-256(0x03 || threshold(LE u16) || Σ(flag || pk || weight))`
//! - 署名: `0x03 || BCS(signatures, bitmap, committee)`

use sui_crypto::multisig::{MultisigAggregator, MultisigVerifier};
use sui_crypto::SuiVerifier;
use sui_sdk_types::{MultisigCommittee, MultisigMember, MultisigMemberPublicKey};

use crate::intent::personal_message;
use crate::{sui_public_key, CryptoError, Ed25519VerifyingKey, SuiAddress, UserSignature};

/// メンバーの重み
pub type Weight = u8;

/// マルチシグ委員会（公開鍵と重みの組、閾値）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSigPublicKey {
    committee: MultisigCommittee,
}

impl MultiSigPublicKey {
    /// メンバーと閾値からマルチシグ公開鍵を構築する。
    ///
    /// メンバーの順序はアドレスと署名のビット位置に影響する。
    /// メンバー数1〜10、重み非0、公開鍵の重複なし、`1 <= threshold <= 重みの合計` を要求する。
    pub fn new(
        members: Vec<(Ed25519VerifyingKey, Weight)>,
        threshold: u16,
    ) -> Result<Self, CryptoError> {
        let members = members
            .iter()
            .map(|(key, weight)| {
                MultisigMember::new(MultisigMemberPublicKey::Ed25519(sui_public_key(key)), *weight)
            })
            .collect();
        let committee = MultisigCommittee::new(members, threshold);
        if !committee.is_valid() {
            return Err(CryptoError::InvalidMultisig(format!(
                "メンバー数・重み・閾値の組み合わせが不正です (members = {}, threshold = {threshold})",
                committee.members().len()
            )));
        }
        Ok(Self { committee })
    }

    /// マルチシグのSuiアドレスを導出する。
    pub fn address(&self) -> SuiAddress {
        self.committee.derive_address()
    }

    /// メンバーのパーソナルメッセージ署名を結合する。
    ///
    /// 渡す順序は問わない。各部分署名は結合時に検証される。
    pub fn combine(
        &self,
        message: &[u8],
        signatures: Vec<UserSignature>,
    ) -> Result<UserSignature, CryptoError> {
        let mut aggregator =
            MultisigAggregator::new_with_message(self.committee.clone(), &personal_message(message));
        for signature in signatures {
            aggregator
                .add_signature(signature)
                .map_err(|e| CryptoError::Signing(e.to_string()))?;
        }
        aggregator
            .finish()
            .map(UserSignature::Multisig)
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }

    /// 結合署名をパーソナルメッセージに対して検証する。
    pub fn verify_personal_message(
        &self,
        message: &[u8],
        signature: &UserSignature,
    ) -> Result<(), CryptoError> {
        match signature {
            UserSignature::Multisig(multisig) if multisig.committee() == &self.committee => {}
            _ => {
                return Err(CryptoError::InvalidMultisig(
                    "署名に含まれるマルチシグ委員会が一致しません".into(),
                ))
            }
        }
        MultisigVerifier::new()
            .verify_personal_message(&personal_message(message), signature)
            .map_err(|e| CryptoError::SignatureVerifyError(e.to_string()))
    }
}
