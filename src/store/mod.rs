//! The four typed stores and the cross-store operations.
//!
//! The global namespace is flat: a key lives in at most one store at a time.
//! Commands that span types (`DEL`, `EXISTS`, `TYPE`, `KEYS`) consult every
//! store; everything else goes through a wrong-type check first.

pub mod list;
pub mod stream;
pub mod string;
pub mod zset;

pub use list::ListStore;
pub use stream::StreamStore;
pub use string::StringStore;
pub use zset::SortedSetStore;

/// The type a key currently resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    List,
    SortedSet,
    Stream,
}

impl ValueKind {
    /// Name as reported by `TYPE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::SortedSet => "zset",
            ValueKind::Stream => "stream",
        }
    }
}

/// Process-wide data state, owned by the server root and guarded by a single
/// lock so cross-store commands and the replication capture see one commit
/// order.
#[derive(Debug, Default)]
pub struct Stores {
    pub strings: StringStore,
    pub lists: ListStore,
    pub zsets: SortedSetStore,
    pub streams: StreamStore,
}

impl Stores {
    /// The kind currently stored under `key`, after lazy expiry. `None`
    /// means the key does not exist.
    pub fn kind_of(&mut self, key: &str) -> Option<ValueKind> {
        if self.strings.contains(key) {
            Some(ValueKind::String)
        } else if self.lists.contains(key) {
            Some(ValueKind::List)
        } else if self.zsets.contains(key) {
            Some(ValueKind::SortedSet)
        } else if self.streams.contains(key) {
            Some(ValueKind::Stream)
        } else {
            None
        }
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.kind_of(key).is_some()
    }

    /// Removes `key` from whichever store holds it.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.kind_of(key) {
            Some(ValueKind::String) => self.strings.remove(key),
            Some(ValueKind::List) => self.lists.remove_key(key),
            Some(ValueKind::SortedSet) => self.zsets.remove_key(key),
            Some(ValueKind::Stream) => self.streams.remove_key(key),
            None => false,
        }
    }

    /// All live keys across every store.
    pub fn live_keys(&mut self) -> Vec<String> {
        let mut keys = self.strings.live_keys();
        keys.extend(self.lists.keys().cloned());
        keys.extend(self.zsets.keys().cloned());
        keys.extend(self.streams.keys().cloned());
        keys
    }
}
