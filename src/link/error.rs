use std::io;

use thiserror::Error;

pub type Result<T, E = LinkError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("failed to create CAN socket: {0}")]
    SocketCreation(#[source] io::Error),

    #[error("failed to resolve interface {iface}: {source}")]
    InterfaceLookup {
        iface: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind CAN socket to {iface}: {source}")]
    Bind {
        iface: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to configure CAN socket: {0}")]
    SocketOption(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("close failed: {0}")]
    Close(#[source] io::Error),

    #[error("invalid frame length {0}, at most 8 bytes")]
    InvalidLength(usize),

    #[error("invalid CAN identifier {0:#x}")]
    InvalidId(u32),

    #[error("link is closed")]
    Closed,
}

impl LinkError {
    pub(crate) fn lookup(iface: &str, source: io::Error) -> Self {
        Self::InterfaceLookup {
            iface: iface.to_owned(),
            source,
        }
    }

    pub(crate) fn bind(iface: &str, source: io::Error) -> Self {
        Self::Bind {
            iface: iface.to_owned(),
            source,
        }
    }

    /// The underlying OS error, if any.
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::SocketCreation(e)
            | Self::SocketOption(e)
            | Self::Write(e)
            | Self::Read(e)
            | Self::Close(e) => Some(e),
            Self::InterfaceLookup { source, .. } | Self::Bind { source, .. } => Some(source),
            Self::InvalidLength(_) | Self::InvalidId(_) | Self::Closed => None,
        }
    }
}
