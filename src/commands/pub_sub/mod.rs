mod publish;
mod subscribe;
mod unsubscribe;

pub use publish::{publish, PublishArguments};
pub use subscribe::{psubscribe, subscribe, SubscribeArguments};
pub use unsubscribe::{punsubscribe, unsubscribe, UnsubscribeArguments};
