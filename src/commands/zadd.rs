use crate::commands::{ensure_kind, error::CommandError};
use crate::resp::RespValue;
use crate::server::Shared;
use crate::store::ValueKind;

pub struct ZaddArguments {
    key: String,
    score: f64,
    member: String,
}

impl ZaddArguments {
    /// Parses `ZADD key score member`. Scores are doubles; `inf`/`-inf`
    /// are accepted, `nan` is not.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() != 3 {
            return Err(CommandError::wrong_arity("ZADD"));
        }

        let score = arguments[1]
            .parse::<f64>()
            .map_err(|_| CommandError::NotAFloat)?;
        if score.is_nan() {
            return Err(CommandError::NotAFloat);
        }

        let mut iter = arguments.into_iter();
        let key = iter.next().unwrap_or_default();
        iter.next();
        Ok(Self {
            key,
            score,
            member: iter.next().unwrap_or_default(),
        })
    }
}

/// Handles ZADD: replies 1 for a fresh member, 0 for a score update (which
/// may move the member's rank). The write is captured either way.
pub async fn zadd(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let zadd_arguments = ZaddArguments::parse(arguments.clone())?;

    let mut stores = shared.stores.lock().await;
    ensure_kind(&mut stores, &zadd_arguments.key, ValueKind::SortedSet)?;

    let inserted = stores.zsets.add(
        &zadd_arguments.key,
        zadd_arguments.score,
        &zadd_arguments.member,
    );

    let mut replication = shared.replication.lock().await;
    replication.capture("ZADD", &arguments);

    Ok(RespValue::Integer(if inserted { 1 } else { 0 }).encode())
}
