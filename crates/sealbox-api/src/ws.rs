use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tokio::sync::mpsc;

use sealbox_core::constants::{WS_CLOSE_AUTH_REQUIRED, WS_CLOSE_INVALID_TOKEN};
use sealbox_relay::{ClientFrame, ServerFrame};

use crate::router::ApiState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<ApiState>) -> Response {
    ws.on_upgrade(move |socket| socket_session(socket, state))
}

/// One notification socket, from open to close.
///
///   Opened ──valid auth──▶ Authenticated ──close/error──▶ Closed
///      │ non-auth first frame → Closed(4001)
///      │ invalid token        → Closed(4002)
///
/// While authenticated the socket answers `ping` with `pong` and forwards
/// fabric notifications. Every other inbound frame is dropped without a
/// response or a log line.
async fn socket_session(mut socket: WebSocket, state: ApiState) {
    // First frame must be auth.
    let first = match socket.recv().await {
        Some(Ok(Message::Text(text))) => ClientFrame::parse(text.as_str()),
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
        Some(Ok(_)) => None,
    };

    let token = match first {
        Some(ClientFrame::Auth { token }) => token,
        _ => {
            close(socket, WS_CLOSE_AUTH_REQUIRED, "auth required").await;
            return;
        }
    };

    let account = match state.auth.authenticate(&token).await {
        Ok(account) => account,
        Err(_) => {
            close(socket, WS_CLOSE_INVALID_TOKEN, "invalid token").await;
            return;
        }
    };

    // Register with the fabric. The guard deregisters on every exit path.
    let (sender, mut outbound) = mpsc::unbounded_channel::<String>();
    let _guard = state.relay.fabric().register(account, sender);

    if send_frame(&mut socket, &ServerFrame::AuthOk).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            notification = outbound.recv() => {
                let Some(payload) = notification else { break };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(ClientFrame::Ping) = ClientFrame::parse(text.as_str()) {
                            if send_frame(&mut socket, &ServerFrame::Pong).await.is_err() {
                                break;
                            }
                        }
                        // Anything else: silently dropped.
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) -> Result<(), axum::Error> {
    socket.send(Message::Text(frame.to_json().into())).await
}

async fn close(mut socket: WebSocket, code: u16, reason: &'static str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: Utf8Bytes::from_static(reason),
        })))
        .await;
}
