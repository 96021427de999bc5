use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;

pub struct PublishArguments {
    channel: String,
    message: String,
}

impl PublishArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 2 {
            return Err(CommandError::wrong_arity("PUBLISH"));
        }

        let mut iter = arguments.into_iter();
        Ok(Self {
            channel: iter.next().unwrap_or_default(),
            message: iter.next().unwrap_or_default(),
        })
    }
}

/// Handles PUBLISH.
///
/// The recipient count is fixed under the registry lock, so a concurrent
/// (un)subscribe either counts and receives or does neither. Delivery is
/// fire-and-forget per recipient. The command is always captured: replicas
/// fan the message out to their own subscribers.
pub async fn publish(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let publish_arguments = PublishArguments::parse(arguments.clone())?;

    let mut registry = shared.pubsub.lock().await;
    let count = registry.publish(&publish_arguments.channel, &publish_arguments.message);

    let mut replication = shared.replication.lock().await;
    replication.capture("PUBLISH", &arguments);

    Ok(RespValue::Integer(count as i64).encode())
}
