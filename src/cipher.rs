//! Text cipher used for auto-encrypted assets.
//!
//! Two-key Triple-DES (EDE) in ECB mode with PKCS#7 padding. The key is the
//! MD5 digest of the passphrase; ciphertext travels as standard Base64. Text is
//! reduced to ASCII first, with every non-ASCII character replaced by `?`,
//! which is what the game client expects to decrypt.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use des::TdesEde2;
use ecb::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use md5::{Digest, Md5};

type TdesEcbEnc = ecb::Encryptor<TdesEde2>;
type TdesEcbDec = ecb::Decryptor<TdesEde2>;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("ciphertext is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("ciphertext padding is invalid")]
    Padding,
}

fn to_ascii(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

/// Encrypt `text` with `key`, returning Base64.
pub fn encrypt(text: &str, key: &str) -> String {
    let key = Md5::digest(to_ascii(key));
    let ciphertext = TdesEcbEnc::new(&key).encrypt_padded_vec_mut::<Pkcs7>(&to_ascii(text));
    STANDARD.encode(ciphertext)
}

/// Reverse of [`encrypt`].
pub fn decrypt(ciphertext: &str, key: &str) -> Result<String, CipherError> {
    let key = Md5::digest(to_ascii(key));
    let bytes = STANDARD.decode(ciphertext)?;
    let plaintext = TdesEcbDec::new(&key)
        .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
        .map_err(|_| CipherError::Padding)?;
    Ok(String::from_utf8_lossy(&plaintext).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let xml = "<?xml version=\"1.0\"?><Data><Item id=\"1\"/></Data>";
        let encrypted = encrypt(xml, "56BB211B-CF06-48E1-9C1D-E40B5173D759");
        assert_ne!(encrypted, xml);
        assert_eq!(decrypt(&encrypted, "56BB211B-CF06-48E1-9C1D-E40B5173D759").unwrap(), xml);
    }

    #[test]
    fn deterministic_and_key_dependent() {
        assert_eq!(encrypt("payload", "k1"), encrypt("payload", "k1"));
        assert_ne!(encrypt("payload", "k1"), encrypt("payload", "k2"));
    }

    #[test]
    fn empty_text_is_one_padding_block() {
        // 8 bytes of padding → 12 base64 characters
        let encrypted = encrypt("", "key");
        assert_eq!(encrypted.len(), 12);
        assert_eq!(decrypt(&encrypted, "key").unwrap(), "");
    }

    #[test]
    fn non_ascii_becomes_question_mark() {
        let encrypted = encrypt("héllo", "key");
        assert_eq!(decrypt(&encrypted, "key").unwrap(), "h?llo");
    }

    #[test]
    fn wrong_key_fails_or_garbles() {
        let encrypted = encrypt("secret data here", "right");
        match decrypt(&encrypted, "wrong") {
            Ok(text) => assert_ne!(text, "secret data here"),
            Err(e) => assert!(matches!(e, CipherError::Padding)),
        }
    }
}
