use std::sync::Arc;
use thiserror::Error;

use crate::chat::{ChatMessage, Clock, MessageStore, Sender};
use crate::crypto::MaskingCipher;

pub use peer::{peer_key_from_identifier, short_peer_id, ConnectError};

mod peer;

pub const WIPE_NOTICE: &str = "🔥 Chat wiped!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected { peer_id: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnmaskError {
    #[error("frame is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Everything below the UI: history, cipher and the peer we think we are talking to.
pub struct Session {
    store: MessageStore,
    cipher: MaskingCipher,
    state: ConnectionState,
}

impl Session {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_cipher(clock, MaskingCipher::new())
    }

    pub fn with_cipher(clock: Arc<dyn Clock>, cipher: MaskingCipher) -> Self {
        Self {
            store: MessageStore::new(clock),
            cipher,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    pub fn peer_id(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Connected { peer_id } => Some(peer_id),
            ConnectionState::Disconnected => None,
        }
    }

    pub fn local_id(&self) -> String {
        self.cipher.local_id()
    }

    #[cfg(test)]
    pub fn cipher(&self) -> &MaskingCipher {
        &self.cipher
    }

    /// "Connect" to a peer by adopting its typed-in ID as the mask key.
    ///
    /// Nothing leaves the process. On failure the previous state and key are
    /// kept and the error is handed back for the caller to present.
    pub fn connect(&mut self, identifier: &str) -> Result<(), ConnectError> {
        let peer_key = peer_key_from_identifier(identifier)?;
        let peer_id = identifier.trim().to_string();

        self.cipher.set_peer_key(peer_key);
        self.store.add(
            Sender::System,
            format!("Connected to peer {}...", short_peer_id(&peer_id)),
            None,
        );
        log::info!("Connected to peer {}", short_peer_id(&peer_id));
        self.state = ConnectionState::Connected { peer_id };
        Ok(())
    }

    /// Store our own message and return the masked frame that would go on the wire.
    pub fn send(&mut self, body: &str, ttl_secs: Option<u64>) -> Vec<u8> {
        self.store.add(Sender::You, body, ttl_secs);
        let frame = self.cipher.encrypt(body.as_bytes());
        log::debug!(
            "Masked outgoing frame: {} bytes, ttl {:?}, keyed: {}",
            frame.len(),
            ttl_secs,
            self.cipher.has_peer_key()
        );
        frame
    }

    /// Decode a hex frame, unmask it with the peer key and show it as a peer message.
    pub fn unmask(&mut self, frame_hex: &str) -> Result<String, UnmaskError> {
        let frame = hex::decode(frame_hex.trim())?;
        let body = String::from_utf8_lossy(&self.cipher.decrypt(&frame)).into_owned();
        let sender = Sender::Peer(
            self.peer_id()
                .map(short_peer_id)
                .unwrap_or_else(|| "Peer".to_string()),
        );
        self.store.add(sender, body.clone(), None);
        Ok(body)
    }

    pub fn notice(&mut self, text: impl Into<String>) {
        self.store.add(Sender::System, text, None);
    }

    pub fn wipe(&mut self) {
        let cleared = self.store.len();
        self.store.delete_all();
        self.store.add(Sender::System, WIPE_NOTICE, None);
        log::info!("Chat wiped ({} messages)", cleared);
    }

    /// Prune expired messages and copy out what remains for rendering.
    pub fn snapshot(&mut self) -> Vec<ChatMessage> {
        self.store.get_all().to_vec()
    }
}
