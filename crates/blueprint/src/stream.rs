//! Frame pipeline for the streamed generation response: raw bytes are
//! reassembled into lines, each line is classified, and data frames are
//! decoded into agent result envelopes.
pub mod classifier;
pub mod decoder;
pub mod parser;
