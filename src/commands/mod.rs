//! Typed wrappers over [`Client::execute`](crate::Client::execute), grouped by data type.
//!
//! Each wrapper builds one command, sends it, and checks that the reply has the shape the
//! command is documented to return.

pub mod key;
pub mod list;
pub mod server;
pub mod set;
pub mod string;

use crate::reply::Reply;
use crate::Result;

/// For commands answering with a status such as `+OK`.
fn ok(reply: Reply) -> Result<()> {
    reply.into_status().map(|_| ())
}

fn into_strings(reply: Reply) -> Result<Vec<String>> {
    Ok(reply
        .into_array()?
        .iter()
        .map(|item| String::from_utf8_lossy(item).into_owned())
        .collect())
}
