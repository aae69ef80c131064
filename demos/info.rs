//! Query a server's A2S_INFO over the wire and print it.
//!
//! Adapted from the teacher crate's `examples/info.rs`, which drove a raw
//! connected socket by hand; this goes through the public `Server` facade
//! instead now that it owns the query transport.

use std::net::SocketAddr;

use valve_query_rcon::{Engine, Server};

fn main() {
    env_logger::init();

    let remote: SocketAddr = "208.103.169.70:27022".parse().expect("bad address");
    let server = Server::new(remote, Engine::Source, "");

    match server.info() {
        Ok(info) => println!("INFO: {:?}", info),
        Err(e) => eprintln!("query failed: {}", e),
    }
}
