//! Per-conversation memory, keyed by conversation id.
//!
//! Each session is an `Arc<Mutex<ConversationMemory>>`. A chat turn holds
//! its session's lock for the whole turn, so turns of one conversation run
//! one at a time while different conversations proceed in parallel.

use deskmind_core::message::{ConversationId, ConversationMemory};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub type SessionHandle = Arc<Mutex<ConversationMemory>>;

struct Entry {
    memory: SessionHandle,
    last_used: u64,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<ConversationId, Entry>,
    clock: u64,
}

pub struct SessionRegistry {
    max_sessions: usize,
    inner: Mutex<Sessions>,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            max_sessions: max_sessions.max(1),
            inner: Mutex::new(Sessions::default()),
        }
    }

    /// The session for `id`, created when unknown. A fresh id is generated
    /// when none is given.
    pub async fn session(&self, id: Option<&str>) -> (ConversationId, SessionHandle) {
        let id = id.map(ConversationId::from).unwrap_or_default();
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let now = inner.clock;

        if let Some(entry) = inner.entries.get_mut(&id) {
            entry.last_used = now;
            return (id, entry.memory.clone());
        }

        if inner.entries.len() >= self.max_sessions {
            Self::evict_idle(&mut inner);
        }

        let memory = Arc::new(Mutex::new(ConversationMemory::with_id(id.clone())));
        inner.entries.insert(
            id.clone(),
            Entry {
                memory: memory.clone(),
                last_used: now,
            },
        );
        debug!(conversation_id = %id, sessions = inner.entries.len(), "Session created");
        (id, memory)
    }

    /// Drop the least recently used session nobody is holding.
    fn evict_idle(inner: &mut Sessions) {
        let victim = inner
            .entries
            .iter()
            .filter(|(_, entry)| Arc::strong_count(&entry.memory) == 1)
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(id, _)| id.clone());

        match victim {
            Some(id) => {
                inner.entries.remove(&id);
                debug!(conversation_id = %id, "Evicted idle session");
            }
            None => warn!(
                sessions = inner.entries.len(),
                "Session limit reached but every session is busy"
            ),
        }
    }

    /// An existing session, without creating one.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut inner = self.inner.lock().await;
        inner.clock += 1;
        let now = inner.clock;
        inner
            .entries
            .get_mut(&ConversationId::from(id))
            .map(|entry| {
                entry.last_used = now;
                entry.memory.clone()
            })
    }

    pub async fn remove(&self, id: &str) -> bool {
        self.inner
            .lock()
            .await
            .entries
            .remove(&ConversationId::from(id))
            .is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Ids of all live sessions, sorted.
    pub async fn ids(&self) -> Vec<ConversationId> {
        let mut ids: Vec<_> = self.inner.lock().await.entries.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskmind_core::message::Message;

    #[tokio::test]
    async fn same_id_same_memory() {
        let registry = SessionRegistry::default();
        let (id, first) = registry.session(Some("conv-1")).await;
        first.lock().await.append(Message::user("hi")).unwrap();

        let (again, second) = registry.session(Some("conv-1")).await;
        assert_eq!(id, again);
        assert_eq!(second.lock().await.len(), 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn missing_id_creates_fresh_session() {
        let registry = SessionRegistry::default();
        let (a, _) = registry.session(None).await;
        let (b, _) = registry.session(None).await;
        assert_ne!(a, b);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn least_recently_used_idle_session_is_evicted() {
        let registry = SessionRegistry::new(2);
        registry.session(Some("a")).await;
        registry.session(Some("b")).await;
        // Touch "a" so "b" becomes the oldest
        registry.get("a").await;

        registry.session(Some("c")).await;
        let ids: Vec<_> = registry.ids().await.into_iter().map(|id| id.0).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[tokio::test]
    async fn busy_sessions_are_not_evicted() {
        let registry = SessionRegistry::new(1);
        let (_, held) = registry.session(Some("busy")).await;

        registry.session(Some("other")).await;
        assert!(registry.get("busy").await.is_some());
        assert_eq!(registry.len().await, 2);
        drop(held);
    }

    #[tokio::test]
    async fn remove_and_get() {
        let registry = SessionRegistry::default();
        registry.session(Some("x")).await;
        assert!(registry.get("x").await.is_some());
        assert!(registry.remove("x").await);
        assert!(!registry.remove("x").await);
        assert!(registry.get("x").await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn turns_on_one_session_are_serialized() {
        let registry = Arc::new(SessionRegistry::default());
        let mut handles = Vec::new();

        for n in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let (_, memory) = registry.session(Some("shared")).await;
                let mut memory = memory.lock().await;
                memory.append(Message::user(format!("q{n}"))).unwrap();
                tokio::task::yield_now().await;
                memory.append(Message::assistant(format!("a{n}"))).unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let (_, memory) = registry.session(Some("shared")).await;
        let memory = memory.lock().await;
        assert_eq!(memory.len(), 16);
        // Each question is immediately followed by its own answer
        for pair in memory.messages().chunks(2) {
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }
}
