//! secp256k1 wallet used as the agent's on-chain identity.

use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::core::config::{EVM_ADDRESS, EVM_PRIVATE_KEY, SkillConfig};
use crate::core::error::SetupResult;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("private key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("private key is not a valid secp256k1 scalar")]
    InvalidKey,

    #[error("signing failed: {0}")]
    Signing(String),
}

pub struct Wallet {
    key: SigningKey,
}

impl Wallet {
    pub fn generate() -> Self {
        Self {
            key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    pub fn from_private_key(raw: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(strip_0x(raw.trim()))?;
        let key = SigningKey::from_slice(&bytes).map_err(|_| WalletError::InvalidKey)?;
        Ok(Self { key })
    }

    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.key.to_bytes()))
    }

    /// EIP-55 checksummed address.
    pub fn address(&self) -> String {
        let public = k256::PublicKey::from(self.key.verifying_key()).to_encoded_point(false);
        // Skip the 0x04 SEC1 tag.
        let hash = keccak256(&public.as_bytes()[1..]);
        to_checksum_address(&hash[12..])
    }

    /// EIP-191 `personal_sign`; returns `0x`-prefixed `r || s || v`.
    pub fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let digest = personal_message_hash(message);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| WalletError::Signing(e.to_string()))?;

        let mut out = Vec::with_capacity(65);
        out.extend_from_slice(&signature.to_bytes());
        out.push(27 + recovery_id.to_byte());
        Ok(format!("0x{}", hex::encode(out)))
    }
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let mut data = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    data.extend_from_slice(message.as_bytes());
    keccak256(&data)
}

pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = hex::encode(keccak256(lower.as_bytes()));
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (c, h) in lower.chars().zip(hash.chars()) {
        if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub fn registration_message(agent_name: &str, address: &str) -> String {
    format!(
        "Register ClawFriend agent\nName: {}\nWallet: {}",
        agent_name, address
    )
}

/// Load the wallet from config, generating and persisting one when absent.
/// Returns the wallet and whether it was newly created.
pub async fn ensure_wallet(config: &SkillConfig) -> SetupResult<(Wallet, bool)> {
    if let Some(raw) = config.get(EVM_PRIVATE_KEY).await? {
        let wallet = Wallet::from_private_key(&raw)?;
        if config.get(EVM_ADDRESS).await?.as_deref() != Some(wallet.address().as_str()) {
            config.set([(EVM_ADDRESS, wallet.address())]).await?;
        }
        return Ok((wallet, false));
    }

    let wallet = Wallet::generate();
    config
        .set([
            (EVM_PRIVATE_KEY, wallet.private_key_hex()),
            (EVM_ADDRESS, wallet.address()),
        ])
        .await?;
    tracing::info!(address = %wallet.address(), "generated new agent wallet");
    Ok((wallet, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    const KNOWN_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn derives_known_address() {
        let wallet = Wallet::from_private_key(KNOWN_KEY).unwrap();
        assert_eq!(wallet.address(), "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23");
        assert_eq!(wallet.private_key_hex(), KNOWN_KEY);
    }

    #[test]
    fn checksum_matches_eip55_vector() {
        let raw = hex::decode("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(
            to_checksum_address(&raw),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(
            Wallet::from_private_key("0xnothex"),
            Err(WalletError::Hex(_))
        ));
        assert!(matches!(
            Wallet::from_private_key(&"00".repeat(32)),
            Err(WalletError::InvalidKey)
        ));
    }

    #[test]
    fn signature_recovers_signer() {
        let wallet = Wallet::generate();
        let message = registration_message("alpha", &wallet.address());
        let sig_hex = wallet.sign_message(&message).unwrap();
        let bytes = hex::decode(sig_hex.trim_start_matches("0x")).unwrap();
        assert_eq!(bytes.len(), 65);
        assert!(bytes[64] == 27 || bytes[64] == 28);

        let signature = Signature::from_slice(&bytes[..64]).unwrap();
        let recovery_id = RecoveryId::from_byte(bytes[64] - 27).unwrap();
        let recovered = VerifyingKey::recover_from_prehash(
            &personal_message_hash(&message),
            &signature,
            recovery_id,
        )
        .unwrap();
        assert_eq!(&recovered, wallet.key.verifying_key());
    }

    #[tokio::test]
    async fn ensure_wallet_is_stable_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let config = SkillConfig::new(dir.path().join("config.json"));

        let (first, created) = ensure_wallet(&config).await.unwrap();
        assert!(created);
        let (second, created_again) = ensure_wallet(&config).await.unwrap();
        assert!(!created_again);
        assert_eq!(first.address(), second.address());
        assert_eq!(
            config.get(EVM_ADDRESS).await.unwrap().as_deref(),
            Some(first.address().as_str())
        );
    }
}
