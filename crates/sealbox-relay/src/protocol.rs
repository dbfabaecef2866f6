use serde::{Deserialize, Serialize};

use sealbox_core::types::MessageId;

/// Frames a client may send on a notification socket. Anything that fails
/// to parse into one of these is dropped without a response — logging or
/// answering malformed frames would open a metadata side channel.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Must be the first frame on every socket.
    Auth { token: String },
    Ping,
}

/// Frames the server emits. Notification envelopes carry a queue cursor
/// hint only — ciphertext never traverses the fabric.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    AuthOk,
    Pong,
    NewMessage { message_id: MessageId },
}

impl ClientFrame {
    /// Parse a text frame. `None` means "drop silently".
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

impl ServerFrame {
    pub fn to_json(&self) -> String {
        // Serialization of these enums cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_frame_parses() {
        let frame = ClientFrame::parse(r#"{"type":"auth","token":"abc"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::Auth { token } if token == "abc"));
    }

    #[test]
    fn ping_frame_parses() {
        assert!(matches!(
            ClientFrame::parse(r#"{"type":"ping"}"#),
            Some(ClientFrame::Ping)
        ));
    }

    #[test]
    fn unknown_and_malformed_frames_are_none() {
        assert!(ClientFrame::parse(r#"{"type":"subscribe"}"#).is_none());
        assert!(ClientFrame::parse("not json").is_none());
        assert!(ClientFrame::parse(r#"{"type":"auth"}"#).is_none());
    }

    #[test]
    fn server_frames_serialize_to_wire_shape() {
        assert_eq!(ServerFrame::AuthOk.to_json(), r#"{"type":"auth_ok"}"#);
        assert_eq!(ServerFrame::Pong.to_json(), r#"{"type":"pong"}"#);

        let id = MessageId::new();
        let json = ServerFrame::NewMessage { message_id: id }.to_json();
        assert_eq!(
            json,
            format!(r#"{{"type":"new_message","message_id":"{id}"}}"#)
        );
    }
}
