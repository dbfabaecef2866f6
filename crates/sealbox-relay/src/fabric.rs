use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;

use sealbox_core::types::AccountId;

use crate::protocol::ServerFrame;

/// Outbound half of one notification socket. The socket task owns the
/// receiving end and writes frames to the wire.
pub type SocketSender = mpsc::UnboundedSender<String>;

/// The notification fabric: a per-account set of open sockets.
///
/// Purely structural state — add on auth, remove on close — mutated under
/// concurrent send fanout and socket teardown. Readers may observe a set
/// that is shrinking; a missing socket is a no-op.
#[derive(Clone, Default)]
pub struct Fabric {
    inner: Arc<FabricInner>,
}

#[derive(Default)]
struct FabricInner {
    sockets: DashMap<AccountId, HashMap<u64, SocketSender>>,
    next_socket_id: AtomicU64,
}

impl Fabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an authenticated socket to `account`'s set.
    ///
    /// Returns a guard that deregisters on drop, so teardown happens on
    /// every exit path of the socket task, panics and errors included.
    pub fn register(&self, account: AccountId, sender: SocketSender) -> SocketGuard {
        let socket_id = self.inner.next_socket_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .sockets
            .entry(account)
            .or_default()
            .insert(socket_id, sender);
        SocketGuard {
            fabric: self.clone(),
            account,
            socket_id,
        }
    }

    /// Serialize `frame` once and hand it to every open socket of
    /// `account`. Sockets whose task has gone away are pruned; an account
    /// with no sockets is a no-op.
    pub fn notify(&self, account: AccountId, frame: &ServerFrame) {
        let payload = frame.to_json();

        let mut dead = Vec::new();
        if let Some(set) = self.inner.sockets.get(&account) {
            for (socket_id, sender) in set.iter() {
                if sender.send(payload.clone()).is_err() {
                    dead.push(*socket_id);
                }
            }
        }
        for socket_id in dead {
            self.deregister(account, socket_id);
        }
    }

    /// Number of open sockets for `account`.
    pub fn session_count(&self, account: AccountId) -> usize {
        self.inner
            .sockets
            .get(&account)
            .map(|set| set.len())
            .unwrap_or(0)
    }

    fn deregister(&self, account: AccountId, socket_id: u64) {
        if let Some(mut set) = self.inner.sockets.get_mut(&account) {
            set.remove(&socket_id);
            let empty = set.is_empty();
            drop(set);
            if empty {
                // Re-check under the write lock: a socket may have
                // registered between the drop above and here.
                self.inner.sockets.remove_if(&account, |_, s| s.is_empty());
            }
        }
    }
}

/// RAII registration handle for one socket.
pub struct SocketGuard {
    fabric: Fabric,
    account: AccountId,
    socket_id: u64,
}

impl Drop for SocketGuard {
    fn drop(&mut self) {
        self.fabric.deregister(self.account, self.socket_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealbox_core::types::MessageId;

    fn socket() -> (SocketSender, mpsc::UnboundedReceiver<String>) {
        mpsc::unbounded_channel()
    }

    #[test]
    fn notify_reaches_every_socket_of_the_account() {
        let fabric = Fabric::new();
        let account = AccountId::new();
        let (tx1, mut rx1) = socket();
        let (tx2, mut rx2) = socket();
        let _g1 = fabric.register(account, tx1);
        let _g2 = fabric.register(account, tx2);

        fabric.notify(account, &ServerFrame::Pong);

        assert_eq!(rx1.try_recv().unwrap(), r#"{"type":"pong"}"#);
        assert_eq!(rx2.try_recv().unwrap(), r#"{"type":"pong"}"#);
    }

    #[test]
    fn notify_does_not_cross_accounts() {
        let fabric = Fabric::new();
        let a = AccountId::new();
        let b = AccountId::new();
        let (tx, mut rx) = socket();
        let _g = fabric.register(b, tx);

        fabric.notify(
            a,
            &ServerFrame::NewMessage {
                message_id: MessageId::new(),
            },
        );

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropping_the_guard_deregisters() {
        let fabric = Fabric::new();
        let account = AccountId::new();
        let (tx, _rx) = socket();
        let guard = fabric.register(account, tx);
        assert_eq!(fabric.session_count(account), 1);

        drop(guard);
        assert_eq!(fabric.session_count(account), 0);
        assert!(fabric.inner.sockets.is_empty(), "empty set must be removed");
    }

    #[test]
    fn closed_sockets_are_pruned_on_notify() {
        let fabric = Fabric::new();
        let account = AccountId::new();
        let (tx, rx) = socket();
        let _guard = fabric.register(account, tx);
        drop(rx);

        fabric.notify(account, &ServerFrame::Pong);
        assert_eq!(fabric.session_count(account), 0);
    }

    #[test]
    fn notify_to_unknown_account_is_a_noop() {
        let fabric = Fabric::new();
        fabric.notify(AccountId::new(), &ServerFrame::AuthOk);
    }
}
