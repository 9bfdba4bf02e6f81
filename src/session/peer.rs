use thiserror::Error;

use crate::crypto::LOCAL_KEY_LEN;

/// Hex characters a peer identifier is padded out to before decoding.
pub const PEER_ID_HEX_LEN: usize = LOCAL_KEY_LEN * 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectError {
    #[error("peer ID is empty")]
    EmptyIdentifier,

    #[error("peer ID is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Turn a typed-in peer ID into key bytes.
///
/// The ID is right-padded with `'0'` to 64 characters and hex-decoded, so a
/// 16-character ID yields 8 meaningful bytes followed by 24 zero bytes.
/// Identifiers longer than 64 characters are decoded as-is.
pub fn peer_key_from_identifier(identifier: &str) -> Result<Vec<u8>, ConnectError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(ConnectError::EmptyIdentifier);
    }

    let padded = format!("{:0<width$}", identifier, width = PEER_ID_HEX_LEN);
    Ok(hex::decode(padded)?)
}

/// Short form of a peer ID used in notices and the status bar.
pub fn short_peer_id(peer_id: &str) -> String {
    peer_id.chars().take(8).collect()
}
