use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("truncated message: needed {needed} byte(s) at offset {offset}, buffer is {len} bytes")]
    TruncatedMessage {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("malformed compression pointer at offset {offset}: {reason}")]
    MalformedPointer { offset: usize, reason: &'static str },

    #[error("invalid label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: &'static str },

    #[error("transport failure: {context}")]
    TransportFailure {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl DnsError {
    pub fn transport(context: impl Into<String>, source: std::io::Error) -> Self {
        DnsError::TransportFailure {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DnsError>;
