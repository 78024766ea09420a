use crate::models::connection::ConnectionStats;
use crate::utils::time::current_timestamp_millis;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Notify;

/// Live session bookkeeping owned by the protocol engine. The management API
/// only reads it and asks it to close sessions.
pub trait ConnectionTracker: Send + Sync {
    fn active_connections(&self) -> Vec<ConnectionStats>;

    /// Request that a session be closed. Returns false for an unknown id.
    fn close_connection(&self, connection_id: &str) -> bool;
}

struct TrackedConnection {
    stats: ConnectionStats,
    close: Arc<Notify>,
}

/// In-memory tracker the protocol engine registers sessions into.
#[derive(Default)]
pub struct ActiveConnections {
    connections: DashMap<String, TrackedConnection>,
}

impl ActiveConnections {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a session. The returned handle is notified when an operator
    /// asks for the session to be closed.
    pub fn register(&self, connection_id: &str, username: &str, remote_address: &str) -> Arc<Notify> {
        let now = current_timestamp_millis();
        let close = Arc::new(Notify::new());

        self.connections.insert(
            connection_id.to_string(),
            TrackedConnection {
                stats: ConnectionStats {
                    connection_id: connection_id.to_string(),
                    username: username.to_string(),
                    remote_address: remote_address.to_string(),
                    connection_time: now,
                    last_activity: now,
                },
                close: Arc::clone(&close),
            },
        );

        close
    }

    pub fn touch(&self, connection_id: &str) {
        if let Some(mut conn) = self.connections.get_mut(connection_id) {
            conn.stats.last_activity = current_timestamp_millis();
        }
    }

    pub fn unregister(&self, connection_id: &str) {
        self.connections.remove(connection_id);
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl ConnectionTracker for ActiveConnections {
    fn active_connections(&self) -> Vec<ConnectionStats> {
        let mut stats: Vec<ConnectionStats> = self
            .connections
            .iter()
            .map(|entry| entry.value().stats.clone())
            .collect();
        stats.sort_by(|a, b| a.connection_time.cmp(&b.connection_time));
        stats
    }

    fn close_connection(&self, connection_id: &str) -> bool {
        match self.connections.remove(connection_id) {
            Some((_, conn)) => {
                conn.close.notify_one();
                true
            }
            None => false,
        }
    }
}
