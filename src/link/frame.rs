use std::fmt;

use socketcan::{CanFrame, EmbeddedFrame, ExtendedId, Id, StandardId};

use super::error::{LinkError, Result};

/// Payload capacity of a classic CAN frame.
pub const CAN_MAX_DLEN: usize = 8;
/// Largest 11-bit identifier.
pub const CAN_SFF_MAX: u32 = 0x7ff;
/// Largest 29-bit identifier.
pub const CAN_EFF_MAX: u32 = 0x1fff_ffff;

/// A classic CAN frame as it travels through the raw socket.
///
/// Bytes past `len` are always zero, so two frames with the same id, length
/// and meaningful payload compare equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RawFrame {
    id: u32,
    extended: bool,
    remote: bool,
    len: u8,
    data: [u8; CAN_MAX_DLEN],
}

impl RawFrame {
    /// Build a data frame from the first `len` bytes of `data`.
    ///
    /// Identifiers up to `0x7ff` use the standard format, larger ones the
    /// extended format.
    pub fn new(id: u32, data: &[u8], len: usize) -> Result<Self> {
        Self::build(id, id > CAN_SFF_MAX, data, len)
    }

    pub fn from_slice(id: u32, data: &[u8]) -> Result<Self> {
        Self::new(id, data, data.len())
    }

    /// Build a data frame that always uses the 29-bit identifier format.
    pub fn extended(id: u32, data: &[u8]) -> Result<Self> {
        Self::build(id, true, data, data.len())
    }

    /// Build a remote transmission request for `len` bytes.
    pub fn remote(id: u32, len: usize) -> Result<Self> {
        let mut frame = Self::build(id, id > CAN_SFF_MAX, &[0u8; CAN_MAX_DLEN], len)?;
        frame.remote = true;
        Ok(frame)
    }

    fn build(id: u32, extended: bool, data: &[u8], len: usize) -> Result<Self> {
        if len > CAN_MAX_DLEN || len > data.len() {
            return Err(LinkError::InvalidLength(len));
        }
        let max = if extended { CAN_EFF_MAX } else { CAN_SFF_MAX };
        if id > max {
            return Err(LinkError::InvalidId(id));
        }
        let mut buf = [0u8; CAN_MAX_DLEN];
        buf[..len].copy_from_slice(&data[..len]);
        Ok(Self {
            id,
            extended,
            remote: false,
            len: len as u8,
            data: buf,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The meaningful payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// The full zero-padded payload.
    pub fn padded(&self) -> &[u8; CAN_MAX_DLEN] {
        &self.data
    }

    pub(crate) fn to_can_frame(&self) -> Result<CanFrame> {
        let id: Id = if self.extended {
            ExtendedId::new(self.id)
                .ok_or(LinkError::InvalidId(self.id))?
                .into()
        } else {
            u16::try_from(self.id)
                .ok()
                .and_then(StandardId::new)
                .ok_or(LinkError::InvalidId(self.id))?
                .into()
        };
        let frame = if self.remote {
            CanFrame::new_remote(id, self.len())
        } else {
            CanFrame::new(id, self.data())
        };
        frame.ok_or(LinkError::InvalidLength(self.len()))
    }

    /// Convert a frame read from the socket. Error frames yield `None`.
    pub(crate) fn from_can_frame(frame: &CanFrame) -> Option<Self> {
        if let CanFrame::Error(_) = frame {
            return None;
        }
        let (id, extended) = match frame.id() {
            Id::Standard(id) => (u32::from(id.as_raw()), false),
            Id::Extended(id) => (id.as_raw(), true),
        };
        let remote = frame.is_remote_frame();
        let len = frame.dlc().min(CAN_MAX_DLEN);
        let mut data = [0u8; CAN_MAX_DLEN];
        if !remote {
            let payload = frame.data();
            let n = payload.len().min(len);
            data[..n].copy_from_slice(&payload[..n]);
        }
        Some(Self {
            id,
            extended,
            remote,
            len: len as u8,
            data,
        })
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extended {
            write!(f, "{:08X}", self.id)?;
        } else {
            write!(f, "{:03X}", self.id)?;
        }
        write!(f, "  [{}]", self.len)?;
        if self.remote {
            return write!(f, "  remote request");
        }
        for b in self.data() {
            write!(f, " {:02X}", b)?;
        }
        Ok(())
    }
}
