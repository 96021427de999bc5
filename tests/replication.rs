//! Replication: write capture, log order, fan-out, and replica-mode
//! write protection.

mod common;

use common::*;
use tokio::time::Duration;

async fn captured_frames(env: &TestEnv) -> Vec<String> {
    let replication = env.shared.replication.lock().await;
    replication
        .frames()
        .iter()
        .map(|frame| String::from_utf8_lossy(frame).to_string())
        .collect()
}

#[tokio::test]
async fn test_writes_are_captured_in_commit_order() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["SET", "k", "v"]).await;
    client.run(&["INCR", "n"]).await;
    client.run(&["RPUSH", "l", "a", "b"]).await;
    client.run(&["ZADD", "z", "1", "m"]).await;
    client.run(&["DEL", "k"]).await;

    let frames = captured_frames(&env).await;
    assert_eq!(frames.len(), 5);
    assert!(frames[0].contains("SET"));
    assert!(frames[1].contains("INCR"));
    assert!(frames[2].contains("RPUSH"));
    assert!(frames[3].contains("ZADD"));
    assert!(frames[4].contains("DEL"));
}

#[tokio::test]
async fn test_reads_and_meta_commands_are_not_captured() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["SET", "k", "v"]).await;
    client.run(&["GET", "k"]).await;
    client.run(&["TYPE", "k"]).await;
    client.run(&["EXISTS", "k"]).await;
    client.run(&["KEYS", "*"]).await;
    client.run(&["MULTI"]).await;
    client.run(&["GET", "k"]).await;
    client.run(&["EXEC"]).await;

    assert_eq!(captured_frames(&env).await.len(), 1);
}

#[tokio::test]
async fn test_ineffective_writes_are_not_captured() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["DEL", "missing"]).await;
    client.run(&["LPOP", "missing"]).await;
    client.run(&["ZADD", "z", "1", "m"]).await;
    client.run(&["ZREM", "z", "other"]).await;

    let frames = captured_frames(&env).await;
    assert_eq!(frames.len(), 1);
    assert!(frames[0].contains("ZADD"));
}

#[tokio::test]
async fn test_publish_is_captured_for_replica_fanout() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["PUBLISH", "ch", "hi"]).await;

    let frames = captured_frames(&env).await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0], "*3\r\n$7\r\nPUBLISH\r\n$2\r\nch\r\n$2\r\nhi\r\n");
}

#[tokio::test]
async fn test_xadd_is_captured_with_resolved_id() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["XADD", "s", "5-5", "a", "1"]).await;
    client.run(&["XADD", "s", "*", "b", "2"]).await;

    let frames = captured_frames(&env).await;
    assert_eq!(frames.len(), 2);
    assert!(frames[0].contains("5-5"));
    // The auto id is propagated in resolved form, never as `*`.
    assert!(!frames[1].contains("$1\r\n*\r\n"), "frame: {:?}", frames[1]);
    assert!(frames[1].contains('-'), "frame: {:?}", frames[1]);
}

#[tokio::test]
async fn test_blocking_handoff_is_captured_as_lpop() {
    let env = TestEnv::new();
    let mut waiter = env.client();
    let mut pusher = env.client();

    let parked = tokio::spawn(async move { waiter.run(&["BLPOP", "q", "5"]).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    pusher.run(&["RPUSH", "q", "x"]).await;
    parked.await.expect("waiter completes");

    let frames = captured_frames(&env).await;
    assert_eq!(frames.len(), 2);
    assert!(frames[0].contains("RPUSH"));
    assert_eq!(frames[1], "*2\r\n$4\r\nLPOP\r\n$1\r\nq\r\n");
}

#[tokio::test]
async fn test_immediate_blpop_is_captured_as_lpop() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["RPUSH", "q", "x"]).await;
    client.run(&["BLPOP", "q", "0"]).await;

    let frames = captured_frames(&env).await;
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1], "*2\r\n$4\r\nLPOP\r\n$1\r\nq\r\n");
}

#[tokio::test]
async fn test_attached_link_streams_subsequent_writes() {
    let env = TestEnv::new();
    let mut writer = env.client();
    let mut replica = env.client();

    writer.run(&["SET", "before", "1"]).await;

    // The replica handshake ends in PSYNC, which promotes the session.
    assert_eq!(replica.run(&["REPLCONF", "listening-port", "6380"]).await, simple("OK"));
    assert_eq!(replica.run(&["REPLCONF", "capa", "psync2"]).await, simple("OK"));
    assert_eq!(
        replica.run_outcome(&["PSYNC", "?", "-1"]).await,
        cinder::commands::Outcome::Quiet
    );

    let fullresync = replica.next_outbox_frame().expect("FULLRESYNC reply");
    assert!(fullresync.starts_with("+FULLRESYNC "), "{:?}", fullresync);
    assert!(fullresync.trim_end().ends_with(" 0"), "{:?}", fullresync);

    writer.run(&["SET", "after", "2"]).await;
    writer.run(&["DEL", "after"]).await;

    assert_eq!(
        replica.next_outbox_frame(),
        Some("*3\r\n$3\r\nSET\r\n$5\r\nafter\r\n$1\r\n2\r\n".to_string())
    );
    assert_eq!(
        replica.next_outbox_frame(),
        Some("*2\r\n$3\r\nDEL\r\n$5\r\nafter\r\n".to_string())
    );
    // Writes from before the attach never replay.
    assert_eq!(replica.next_outbox_frame(), None);
}

#[tokio::test]
async fn test_promoted_link_ignores_further_commands() {
    let env = TestEnv::new();
    let mut replica = env.client();

    replica.run_outcome(&["PSYNC", "?", "-1"]).await;
    replica.next_outbox_frame();

    assert_eq!(
        replica.run_outcome(&["SET", "k", "v"]).await,
        cinder::commands::Outcome::Quiet
    );
}

#[tokio::test]
async fn test_replica_mode_rejects_writes_from_clients() {
    let env = TestEnv::replica();
    let mut client = env.client();

    let readonly = error("READONLY You can't write against a read only replica.");
    assert_eq!(client.run(&["SET", "k", "v"]).await, readonly);
    assert_eq!(client.run(&["RPUSH", "l", "a"]).await, readonly);
    assert_eq!(client.run(&["ZADD", "z", "1", "m"]).await, readonly);
    assert_eq!(client.run(&["XADD", "s", "*", "f", "v"]).await, readonly);
    assert_eq!(client.run(&["PUBLISH", "ch", "m"]).await, readonly);

    // Reads keep working.
    assert_eq!(client.run(&["GET", "k"]).await, null_bulk());
    assert_eq!(client.run(&["LRANGE", "l", "0", "-1"]).await, "*0\r\n");
    assert_eq!(client.run(&["PING"]).await, simple("PONG"));
}

#[tokio::test]
async fn test_info_replication_sections() {
    let env = TestEnv::new();
    let mut client = env.client();

    let reply = client.run(&["INFO", "replication"]).await;
    assert!(reply.contains("role:master"), "unexpected reply {:?}", reply);
    assert!(reply.contains("master_replid:"));
    assert!(reply.contains("master_repl_offset:0"));
    assert!(reply.contains("connected_slaves:0"));

    let replica_env = TestEnv::replica();
    let mut replica_client = replica_env.client();
    let reply = replica_client.run(&["INFO", "replication"]).await;
    assert!(reply.contains("role:slave"), "unexpected reply {:?}", reply);
}

#[tokio::test]
async fn test_offset_grows_with_captures() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["SET", "k", "v"]).await;

    let reply = client.run(&["INFO", "replication"]).await;
    assert!(
        !reply.contains("master_repl_offset:0"),
        "offset should have advanced: {:?}",
        reply
    );
}
