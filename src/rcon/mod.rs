//! RCON clients for both engine families.
//!
//! GoldSrc and Source RCON share nothing at the wire level — one is
//! stateless UDP with a per-command challenge, the other is a stateful TCP
//! session with its own packet framing — so each gets its own module rather
//! than a shared trait that would have to paper over the difference.

pub mod goldsrc;
pub mod packet;
pub mod source;
