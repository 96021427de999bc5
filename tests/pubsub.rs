//! Pub/sub: counts, fan-out, subscribe-mode restrictions.

mod common;

use common::*;

#[tokio::test]
async fn test_subscribe_counts_and_replies() {
    let env = TestEnv::new();
    let mut client = env.client();

    let reply = client.run(&["SUBSCRIBE", "a"]).await;
    assert_eq!(
        reply,
        format!("*3\r\n{}{}{}", bulk("subscribe"), bulk("a"), integer(1))
    );

    // Multi-channel subscribe emits one frame per channel.
    let reply = client.run(&["SUBSCRIBE", "b", "c"]).await;
    assert_eq!(
        reply,
        format!(
            "*3\r\n{}{}{}*3\r\n{}{}{}",
            bulk("subscribe"),
            bulk("b"),
            integer(2),
            bulk("subscribe"),
            bulk("c"),
            integer(3)
        )
    );

    // Re-subscribing does not change the count.
    let reply = client.run(&["SUBSCRIBE", "a"]).await;
    assert!(reply.ends_with(&integer(3)), "unexpected reply {:?}", reply);
}

#[tokio::test]
async fn test_publish_fans_out_to_each_subscriber() {
    let env = TestEnv::new();
    let mut first = env.client();
    let mut second = env.client();
    let mut publisher = env.client();

    first.run(&["SUBSCRIBE", "ch"]).await;
    second.run(&["SUBSCRIBE", "ch"]).await;

    assert_eq!(publisher.run(&["PUBLISH", "ch", "hi"]).await, integer(2));

    let expected = "*3\r\n$7\r\nmessage\r\n$2\r\nch\r\n$2\r\nhi\r\n".to_string();
    assert_eq!(first.next_outbox_frame(), Some(expected.clone()));
    assert_eq!(second.next_outbox_frame(), Some(expected));

    // Publishers that reach nobody report zero.
    assert_eq!(publisher.run(&["PUBLISH", "empty", "x"]).await, integer(0));
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let env = TestEnv::new();
    let mut subscriber = env.client();
    let mut publisher = env.client();

    subscriber.run(&["SUBSCRIBE", "ch", "other"]).await;
    let reply = subscriber.run(&["UNSUBSCRIBE", "ch"]).await;
    assert_eq!(
        reply,
        format!("*3\r\n{}{}{}", bulk("unsubscribe"), bulk("ch"), integer(1))
    );

    assert_eq!(publisher.run(&["PUBLISH", "ch", "hi"]).await, integer(0));
    assert_eq!(subscriber.next_outbox_frame(), None);
}

#[tokio::test]
async fn test_unsubscribe_without_arguments_drops_everything() {
    let env = TestEnv::new();
    let mut subscriber = env.client();
    let mut publisher = env.client();

    subscriber.run(&["SUBSCRIBE", "a", "b"]).await;
    let reply = subscriber.run(&["UNSUBSCRIBE"]).await;
    // One frame per channel, counts descending to zero.
    assert!(reply.contains("unsubscribe"), "unexpected reply {:?}", reply);
    assert!(reply.ends_with(&integer(0)), "unexpected reply {:?}", reply);

    assert_eq!(publisher.run(&["PUBLISH", "a", "x"]).await, integer(0));
    assert_eq!(publisher.run(&["PUBLISH", "b", "x"]).await, integer(0));
}

#[tokio::test]
async fn test_psubscribe_counts_without_delivery() {
    let env = TestEnv::new();
    let mut client = env.client();
    let mut publisher = env.client();

    let reply = client.run(&["PSUBSCRIBE", "news.*"]).await;
    assert_eq!(
        reply,
        format!("*3\r\n{}{}{}", bulk("psubscribe"), bulk("news.*"), integer(1))
    );

    // Channel subscriptions and patterns share one count.
    let reply = client.run(&["SUBSCRIBE", "direct"]).await;
    assert!(reply.ends_with(&integer(2)), "unexpected reply {:?}", reply);

    // Pattern delivery is not implemented: a matching publish reaches nobody.
    assert_eq!(publisher.run(&["PUBLISH", "news.sports", "x"]).await, integer(0));
    assert_eq!(client.next_outbox_frame(), None);

    let reply = client.run(&["PUNSUBSCRIBE", "news.*"]).await;
    assert_eq!(
        reply,
        format!(
            "*3\r\n{}{}{}",
            bulk("punsubscribe"),
            bulk("news.*"),
            integer(1)
        )
    );
}

#[tokio::test]
async fn test_subscribed_mode_restricts_commands() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["SUBSCRIBE", "ch"]).await;

    assert_eq!(
        client.run(&["GET", "k"]).await,
        error(
            "ERR Can't execute 'get': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context"
        )
    );
    assert_eq!(
        client.run(&["SET", "k", "v"]).await,
        error(
            "ERR Can't execute 'set': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context"
        )
    );
}

#[tokio::test]
async fn test_ping_in_subscribed_mode_is_an_array() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["SUBSCRIBE", "ch"]).await;
    assert_eq!(
        client.run(&["PING"]).await,
        format!("*2\r\n{}{}", bulk("pong"), bulk(""))
    );
    assert_eq!(
        client.run(&["PING", "hello"]).await,
        format!("*2\r\n{}{}", bulk("pong"), bulk("hello"))
    );
}

#[tokio::test]
async fn test_zero_subscriptions_do_not_exit_subscribe_mode() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["SUBSCRIBE", "ch"]).await;
    client.run(&["UNSUBSCRIBE", "ch"]).await;

    // Still restricted even with no subscriptions left.
    let reply = client.run(&["GET", "k"]).await;
    assert!(reply.starts_with("-ERR Can't execute 'get'"));
}

#[tokio::test]
async fn test_reset_clears_subscriptions_and_transaction() {
    let env = TestEnv::new();
    let mut client = env.client();
    let mut publisher = env.client();

    client.run(&["SUBSCRIBE", "ch"]).await;
    assert_eq!(client.run(&["RESET"]).await, simple("RESET"));

    assert_eq!(publisher.run(&["PUBLISH", "ch", "x"]).await, integer(0));
}

#[tokio::test]
async fn test_quit_is_allowed_while_subscribed() {
    let env = TestEnv::new();
    let mut client = env.client();

    client.run(&["SUBSCRIBE", "ch"]).await;
    assert_eq!(
        client.run_outcome(&["QUIT"]).await,
        cinder::commands::Outcome::Close(simple("OK"))
    );
}
