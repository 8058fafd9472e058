use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Open connections per user. A user may hold several (one per tab), each
/// tagged with its own id so a closing socket only removes itself.
#[derive(Debug)]
pub struct ConnectionRegistry<T> {
    connections: Arc<RwLock<HashMap<String, Vec<(Uuid, T)>>>>,
}

impl<T> Clone for ConnectionRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
        }
    }
}

impl<T> Default for ConnectionRegistry<T> {
    fn default() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Clone> ConnectionRegistry<T> {
    pub async fn register(&self, uid: &str, handle: T) -> Uuid {
        let id = Uuid::new_v4();
        self.connections
            .write()
            .await
            .entry(uid.to_string())
            .or_default()
            .push((id, handle));
        id
    }

    pub async fn unregister(&self, uid: &str, id: Uuid) {
        let mut connections = self.connections.write().await;
        if let Some(handles) = connections.get_mut(uid) {
            handles.retain(|(handle_id, _)| *handle_id != id);
            if handles.is_empty() {
                connections.remove(uid);
            }
        }
    }

    /// Snapshot of a user's handles; the lock is released before any send.
    pub async fn handles(&self, uid: &str) -> Vec<(Uuid, T)> {
        self.connections
            .read()
            .await
            .get(uid)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_online(&self, uid: &str) -> bool {
        self.connections.read().await.contains_key(uid)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.values().map(Vec::len).sum()
    }
}
