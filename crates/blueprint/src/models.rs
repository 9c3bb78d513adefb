//! These models represent the objects passed around by the client
//!
//! There are a few related formats to interact with:
//! - the streamed generation protocol, where each data frame holds one
//!   agent result envelope
//! - the chat persistence API, which stores chats as full message logs
//! - the local snapshot, one serialized blob of the whole collection
//!
//! The wire formats are immediately converted into these internal structs;
//! assistant messages carry either plain text or a serialized envelope.
pub mod chat;
pub mod envelope;
pub mod message;
pub mod role;
