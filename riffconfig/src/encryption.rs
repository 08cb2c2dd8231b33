//! Encryption of secrets stored in the configuration file
//!
//! Secrets such as the Spotify client secret or Lavalink node passwords can
//! be stored as `encrypted:<base64>`. The AES-256 key is derived from the
//! machine id, so an encrypted config file only decrypts on the machine that
//! produced it.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Result, anyhow};
use base64::Engine;
use sha2::{Digest, Sha256};

/// Prefix marking an encrypted value
const ENCRYPTED_PREFIX: &str = "encrypted:";

const NONCE_LEN: usize = 12;

/// Reads the machine id
///
/// Linux: `/etc/machine-id` then `/var/lib/dbus/machine-id`.
/// macOS: `IOPlatformUUID` from `ioreg`.
/// Windows: `wmic csproduct get UUID`.
fn get_machine_id() -> Result<String> {
    #[cfg(target_os = "linux")]
    {
        use std::fs;

        for candidate in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = fs::read_to_string(candidate) {
                let id = id.trim();
                if !id.is_empty() {
                    return Ok(id.to_string());
                }
            }
        }

        Err(anyhow!("Failed to read machine-id"))
    }

    #[cfg(target_os = "macos")]
    {
        use std::process::Command;

        let output = Command::new("ioreg")
            .args(["-d2", "-c", "IOPlatformExpertDevice"])
            .output()?;
        let output_str = String::from_utf8_lossy(&output.stdout);

        // "IOPlatformUUID" = "XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX"
        output_str
            .lines()
            .find(|line| line.contains("IOPlatformUUID"))
            .and_then(|line| line.split('"').nth(3))
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Failed to extract IOPlatformUUID from ioreg"))
    }

    #[cfg(target_os = "windows")]
    {
        use std::process::Command;

        let output = Command::new("wmic")
            .args(["csproduct", "get", "UUID"])
            .output()?;
        let output_str = String::from_utf8_lossy(&output.stdout);

        output_str
            .lines()
            .nth(1)
            .map(|uuid| uuid.trim().to_string())
            .ok_or_else(|| anyhow!("Failed to extract UUID from wmic"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        Err(anyhow!("Unsupported platform for machine id extraction"))
    }
}

/// Derives the AES-256 key from the machine id
fn derive_key() -> Result<[u8; 32]> {
    let machine_id = get_machine_id()?;

    let mut hasher = Sha256::new();
    hasher.update(machine_id.as_bytes());
    hasher.update(b"riffbot-config-encryption-v1");

    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    Ok(key)
}

fn cipher() -> Result<Aes256Gcm> {
    let key = derive_key()?;
    Aes256Gcm::new_from_slice(&key).map_err(|e| anyhow!("Failed to create cipher: {}", e))
}

/// Encrypts a secret with the machine key
///
/// The nonce is derived from the secret itself, so encrypting the same value
/// twice yields the same string and an unchanged config file stays unchanged.
/// The stored payload is `nonce (12 bytes) || ciphertext`.
pub fn encrypt_password(password: &str) -> Result<String> {
    let cipher = cipher()?;

    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(b"riffbot-nonce-v1");
    let nonce_hash = hasher.finalize();
    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&nonce_hash[..NONCE_LEN]);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), password.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(format!(
        "{}{}",
        ENCRYPTED_PREFIX,
        base64::engine::general_purpose::STANDARD.encode(&combined)
    ))
}

/// Decrypts an `encrypted:<base64>` value
pub fn decrypt_password(encrypted: &str) -> Result<String> {
    let base64_data = encrypted
        .strip_prefix(ENCRYPTED_PREFIX)
        .ok_or_else(|| anyhow!("Invalid encrypted value format (missing prefix)"))?;

    let combined = base64::engine::general_purpose::STANDARD
        .decode(base64_data)
        .map_err(|e| anyhow!("Invalid base64: {}", e))?;

    if combined.len() < NONCE_LEN {
        return Err(anyhow!("Invalid ciphertext (too short)"));
    }
    let (nonce, ciphertext) = combined.split_at(NONCE_LEN);

    let plaintext = cipher()?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow!("Decryption failed (wrong machine or corrupted data): {}", e))?;

    String::from_utf8(plaintext).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
}

/// Returns `true` if the value carries the `encrypted:` prefix
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(ENCRYPTED_PREFIX)
}

/// Returns the clear-text secret, decrypting it when needed
pub fn get_password(value: &str) -> Result<String> {
    if is_encrypted(value) {
        decrypt_password(value)
    } else {
        Ok(value.to_string())
    }
}
