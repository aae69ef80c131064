/*!
Client library for querying and administering [`GoldSrc`] and [`Source`]
engine game servers: the [`A2S`] query family, both engines' RCON
protocols, and a UDP listener that turns a server's log stream into typed
events.

# Overview
- [`info`], [`player`], [`rules`] parse A2S responses; [`transport`] drives
  the query itself (request encoding, split-packet reassembly, challenge
  handling).
- [`rcon::goldsrc`] and [`rcon::source`] are the two RCON clients; they do
  not share a protocol, only a module namespace.
- [`status`] parses the RCON `status` command's free-text reply.
- [`log_event`] classifies raw log lines into [`log_event::Event`] variants;
  [`listener`] is the shared socket that receives them and routes them to
  the right [`server::Server`] handle.
- [`server::Server`] is the facade most callers want: one handle per remote
  server, fronting queries, RCON, and log subscription together.

[`GoldSrc`]: https://developer.valvesoftware.com/wiki/Goldsource
[`Source`]: https://developer.valvesoftware.com/wiki/Source
[`A2S`]: https://developer.valvesoftware.com/wiki/Server_queries
*/

pub mod error;
pub mod info;
pub mod listener;
pub mod log_event;
pub mod packet;
pub mod player;
pub mod rcon;
pub mod rules;
pub mod server;
pub mod status;
pub mod transport;
mod wire;

pub use error::{Error, Result};
pub use server::Server;
pub use transport::Engine;
