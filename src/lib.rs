pub mod byte_packet_buffer;
pub mod error;
pub mod resolver;
pub mod structure;

pub use error::{DnsError, Result};
