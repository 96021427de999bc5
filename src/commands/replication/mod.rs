mod info;
mod psync;
mod replconf;

pub use info::{info, InfoArguments};
pub use psync::{psync, PsyncArguments};
pub use replconf::{replconf, ReplconfArguments};
