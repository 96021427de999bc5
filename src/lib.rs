//! A Redis-protocol-compatible in-memory data store.
//!
//! The crate serves concurrent clients over TCP using the Redis
//! Serialization Protocol (RESP) and supports:
//!
//! - Strings with millisecond expiry (GET, SET, INCR, DEL, EXISTS, TYPE, KEYS)
//! - Lists with blocking pops (RPUSH, LPUSH, LPOP, LLEN, LRANGE, BLPOP)
//! - Sorted sets (ZADD, ZSCORE, ZRANK, ZRANGE, ZREM, ZCARD)
//! - Streams with blocking reads (XADD, XRANGE, XREAD)
//! - Pub/sub channels (SUBSCRIBE, UNSUBSCRIBE, PUBLISH)
//! - Per-connection transactions (MULTI, EXEC, DISCARD)
//! - Master-to-replica command-stream replication
//!
//! Each connection is driven by its own Tokio task; the stores, the
//! blocking-wait coordinator, the pub/sub registry, and the replication log
//! are owned by a single [`server::Shared`] root handed to every session.

pub mod commands;
pub mod config;
pub mod pubsub;
pub mod replication;
pub mod resp;
pub mod server;
pub mod session;
pub mod store;
pub mod waiters;
