use rand::{thread_rng, RngCore};
use std::fmt;

pub const LOCAL_KEY_LEN: usize = 32;
pub const ID_DISPLAY_LEN: usize = 16;

/// Toy XOR mask keyed by whatever the user typed in as the peer's ID.
///
/// This is not encryption in any meaningful sense:
/// - no key agreement, the peer key is typed in by hand
/// - no integrity check or authentication of any kind
/// - no forward secrecy
/// - the key stream repeats, and a short peer ID is zero-padded, so most of
///   the key stream is zero bytes and plaintext leaks straight through
///
/// Anything real should replace this outright.
pub struct MaskingCipher {
    local_key: [u8; LOCAL_KEY_LEN],
    peer_key: Option<Vec<u8>>,
}

impl MaskingCipher {
    /// Generate a fresh random local key
    pub fn new() -> Self {
        let mut local_key = [0u8; LOCAL_KEY_LEN];
        thread_rng().fill_bytes(&mut local_key);
        Self::with_local_key(local_key)
    }

    pub fn with_local_key(local_key: [u8; LOCAL_KEY_LEN]) -> Self {
        Self {
            local_key,
            peer_key: None,
        }
    }

    pub fn local_key_bytes(&self) -> &[u8; LOCAL_KEY_LEN] {
        &self.local_key
    }

    /// Shareable identity: the first 16 hex characters of the local key.
    pub fn local_id(&self) -> String {
        let mut id = hex::encode(self.local_key_bytes());
        id.truncate(ID_DISPLAY_LEN);
        id
    }

    pub fn set_peer_key(&mut self, peer_key: Vec<u8>) {
        self.peer_key = Some(peer_key);
    }

    pub fn has_peer_key(&self) -> bool {
        self.peer_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// XOR with the peer key repeated to the input's length. Without a peer key
    /// the input comes back unchanged.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        match self.peer_key.as_deref() {
            Some(key) if !key.is_empty() => plaintext
                .iter()
                .zip(key.iter().cycle())
                .map(|(p, k)| p ^ k)
                .collect(),
            _ => plaintext.to_vec(),
        }
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8> {
        self.encrypt(ciphertext)
    }
}

impl Default for MaskingCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MaskingCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskingCipher")
            .field("local_id", &self.local_id())
            .field("peer_key", &self.peer_key.as_ref().map(|k| format!("<{} bytes>", k.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher_with_peer(key: &[u8]) -> MaskingCipher {
        let mut cipher = MaskingCipher::with_local_key([7u8; LOCAL_KEY_LEN]);
        cipher.set_peer_key(key.to_vec());
        cipher
    }

    #[test]
    fn round_trip_restores_plaintext() {
        let plaintexts: [&[u8]; 4] = [b"", b"hi", b"a longer message than the key itself", &[0, 255, 128, 1]];
        let keys: [&[u8]; 3] = [&[0x42], &[1, 2, 3], &[0xaa; 32]];

        for key in keys {
            let cipher = cipher_with_peer(key);
            for plaintext in plaintexts {
                assert_eq!(cipher.decrypt(&cipher.encrypt(plaintext)), plaintext);
            }
        }
    }

    #[test]
    fn key_is_tiled_across_the_plaintext() {
        let cipher = cipher_with_peer(&[0x01, 0x02]);
        assert_eq!(cipher.encrypt(&[0x00, 0x00, 0x00, 0x00, 0x00]), vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn passes_through_without_peer_key() {
        let cipher = MaskingCipher::new();
        assert!(!cipher.has_peer_key());
        assert_eq!(cipher.encrypt(b"plain"), b"plain");
        assert_eq!(cipher.decrypt(b"\x01\x02"), b"\x01\x02");
    }

    #[test]
    fn empty_peer_key_passes_through() {
        let cipher = cipher_with_peer(&[]);
        assert!(!cipher.has_peer_key());
        assert_eq!(cipher.encrypt(b"plain"), b"plain");
    }

    #[test]
    fn setting_peer_key_overwrites() {
        let mut cipher = cipher_with_peer(&[0xff]);
        cipher.set_peer_key(vec![0x0f]);
        assert_eq!(cipher.encrypt(&[0x00]), vec![0x0f]);
    }

    #[test]
    fn local_key_is_not_used_for_masking() {
        let cipher = cipher_with_peer(&[0x00]);
        assert_eq!(cipher.encrypt(b"same"), b"same");
    }

    #[test]
    fn local_id_is_hex_prefix_of_key() {
        let mut key = [0u8; LOCAL_KEY_LEN];
        key[..8].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x01, 0x23, 0x45, 0x67]);
        let cipher = MaskingCipher::with_local_key(key);
        assert_eq!(cipher.local_id(), "deadbeef01234567");
        assert_eq!(cipher.local_key_bytes(), &key);
    }

    #[test]
    fn fresh_ciphers_get_distinct_identities() {
        assert_ne!(MaskingCipher::new().local_key_bytes(), MaskingCipher::new().local_key_bytes());
    }

    #[test]
    fn debug_output_hides_keys() {
        let cipher = cipher_with_peer(&[0xab; 4]);
        let rendered = format!("{:?}", cipher);
        assert!(rendered.contains("<4 bytes>"));
        assert!(!rendered.contains("abab"));
    }
}
