use serde::Serialize;
use serde::de::DeserializeOwned;

use super::messages::{ClientEvent, ServerEvent};

/// Hard upper bound on a single encoded event, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty message")]
    EmptyMessage,
    #[error("payload too large: {0} bytes (max {MAX_MESSAGE_SIZE})")]
    PayloadTooLarge(usize),
    #[error("serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("malformed event: {0}")]
    Malformed(#[source] serde_json::Error),
}

fn encode<T: Serialize>(event: &T) -> Result<Vec<u8>, ProtocolError> {
    let buf = serde_json::to_vec(event).map_err(ProtocolError::Serialize)?;
    if buf.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(buf.len()));
    }
    Ok(buf)
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    if data.is_empty() {
        return Err(ProtocolError::EmptyMessage);
    }
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge(data.len()));
    }
    serde_json::from_slice(data).map_err(ProtocolError::Malformed)
}

/// Encode a `ServerEvent` as a UTF-8 JSON frame.
pub fn encode_server_event(event: &ServerEvent) -> Result<Vec<u8>, ProtocolError> {
    encode(event)
}

/// Encode a `ClientEvent` as a UTF-8 JSON frame.
pub fn encode_client_event(event: &ClientEvent) -> Result<Vec<u8>, ProtocolError> {
    encode(event)
}

/// Decode raw frame data into a `ClientEvent`.
pub fn decode_client_event(data: &[u8]) -> Result<ClientEvent, ProtocolError> {
    decode(data)
}

/// Decode raw frame data into a `ServerEvent`.
pub fn decode_server_event(data: &[u8]) -> Result<ServerEvent, ProtocolError> {
    decode(data)
}
