use solana_sdk::pubkey::{ParsePubkeyError, Pubkey};
use solana_sdk::signature::{ParseSignatureError, Signature};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolanaError {
    #[error("Invalid public address: {0}")]
    ParsePubkey(#[from] ParsePubkeyError),
    #[error("Invalid signature encoding: {0}")]
    ParseSignature(#[from] ParseSignatureError),
}

/// Wallet-side checks for public addresses bound to users.
///
/// Built once at start-up and shared through the application state.
#[derive(Debug, Clone)]
pub struct WalletVerifier {
    challenge_prefix: String,
}

impl Default for WalletVerifier {
    fn default() -> Self {
        Self::new("MedipolDAO Digiathon login nonce")
    }
}

impl WalletVerifier {
    pub fn new(challenge_prefix: &str) -> Self {
        Self {
            challenge_prefix: challenge_prefix.to_string(),
        }
    }

    /// Parses a base58 address and returns its canonical string form.
    pub fn parse_address(&self, address: &str) -> Result<String, SolanaError> {
        let pubkey = Pubkey::from_str(address.trim())?;
        Ok(pubkey.to_string())
    }

    /// The message a wallet signs to prove control of its address for `nonce`.
    pub fn challenge_message(&self, nonce: i64) -> String {
        format!("{}: {}", self.challenge_prefix, nonce)
    }

    pub fn verify_signature(
        &self,
        address: &str,
        signature: &str,
        message: &str,
    ) -> Result<bool, SolanaError> {
        let pubkey = Pubkey::from_str(address)?;
        let signature = Signature::from_str(signature)?;
        Ok(signature.verify(&pubkey.to_bytes(), message.as_bytes()))
    }
}
