use crate::commands::error::CommandError;
use crate::resp::RespValue;
use crate::server::Shared;

pub struct InfoArguments {
    section: Option<String>,
}

impl InfoArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::wrong_arity("INFO"));
        }

        Ok(Self {
            section: arguments.into_iter().next(),
        })
    }
}

/// Handles INFO. Only the replication section is maintained; asking for any
/// other section yields an empty bulk string.
pub async fn info(shared: &Shared, arguments: Vec<String>) -> Result<String, CommandError> {
    let info_arguments = InfoArguments::parse(arguments)?;

    if let Some(section) = &info_arguments.section {
        if !section.eq_ignore_ascii_case("replication") {
            return Ok(RespValue::BulkString(String::new()).encode());
        }
    }

    let replication = shared.replication.lock().await;
    let body = format!(
        "# Replication\r\nrole:{}\r\nconnected_slaves:{}\r\nmaster_replid:{}\r\nmaster_repl_offset:{}\r\n",
        shared.config.role.as_str(),
        replication.replica_count(),
        shared.repl_id,
        replication.offset(),
    );

    Ok(RespValue::BulkString(body).encode())
}
