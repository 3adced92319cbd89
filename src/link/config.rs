use super::frame::CAN_SFF_MAX;

/// Default interface, matching the usual first SocketCAN device.
pub const DEFAULT_INTERFACE: &str = "can0";

/// An acceptance filter: a frame passes when `frame_id & mask == id & mask`
/// and its identifier format matches `extended`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdFilter {
    pub id: u32,
    pub mask: u32,
    pub extended: bool,
}

impl IdFilter {
    /// Ids up to `0x7ff` match standard frames, larger ones extended frames.
    pub fn new(id: u32, mask: u32) -> Self {
        Self {
            id,
            mask,
            extended: id > CAN_SFF_MAX,
        }
    }

    /// Match frames sent in the 29-bit format, whatever the id value.
    pub fn extended(id: u32, mask: u32) -> Self {
        Self {
            id,
            mask,
            extended: true,
        }
    }

    /// Kernel `can_filter` id and mask. The EFF bit is always part of the
    /// mask so standard and extended frames with equal low bits stay apart.
    pub(crate) fn to_raw(self) -> (u32, u32) {
        let id = if self.extended {
            self.id | libc::CAN_EFF_FLAG
        } else {
            self.id
        };
        (id, self.mask | libc::CAN_EFF_FLAG)
    }
}

/// How to open a [`CanLink`](super::CanLink).
///
/// The bus itself (bitrate, up/down) is configured outside this crate, e.g.
/// `ip link set can0 type can bitrate 1000000 && ip link set can0 up`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub(crate) interface: String,
    pub(crate) filters: Vec<IdFilter>,
    pub(crate) loopback: Option<bool>,
    pub(crate) recv_own_msgs: Option<bool>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERFACE)
    }
}

impl LinkConfig {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            filters: Vec::new(),
            loopback: None,
            recv_own_msgs: None,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Only deliver frames matching one of the filters. An empty list keeps
    /// the kernel default of receiving everything.
    pub fn with_filter(mut self, filter: IdFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Whether frames sent by this socket are echoed to other sockets on the
    /// same interface. Left at the kernel default (on) when unset.
    pub fn with_loopback(mut self, enabled: bool) -> Self {
        self.loopback = Some(enabled);
        self
    }

    /// Whether this socket receives its own frames. Kernel default is off.
    pub fn with_recv_own_msgs(mut self, enabled: bool) -> Self {
        self.recv_own_msgs = Some(enabled);
        self
    }
}
