use std::{
    fmt, io,
    os::fd::{AsRawFd, FromRawFd, IntoRawFd},
};

use socketcan::{CanFilter, CanSocket, Socket, SocketOptions};

mod channel;
mod config;
mod error;
mod frame;
mod sys;

pub use channel::Channel;
pub use config::{IdFilter, LinkConfig, DEFAULT_INTERFACE};
pub use error::{LinkError, Result};
pub use frame::{RawFrame, CAN_EFF_MAX, CAN_MAX_DLEN, CAN_SFF_MAX};

/// Something frames can be pushed into and polled out of.
pub trait Link {
    /// Send one frame, without retrying.
    fn send_frame(&mut self, frame: &RawFrame) -> Result<()>;

    /// Take one pending frame. `Ok(None)` means nothing is available yet.
    fn receive(&mut self) -> Result<Option<RawFrame>>;
}

/// A non-blocking raw CAN socket bound to one interface.
///
/// The link is either open and bound, or closed. Dropping an open link
/// releases the socket without reporting errors; call [`CanLink::close`] to
/// observe them.
pub struct CanLink {
    iface: String,
    socket: Option<CanSocket>,
}

impl fmt::Debug for CanLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanLink")
            .field("iface", &self.iface)
            .field("fd", &self.socket.as_ref().map(AsRawFd::as_raw_fd))
            .finish()
    }
}

impl CanLink {
    /// Open a raw socket on `iface` with kernel default options.
    pub fn open(iface: &str) -> Result<Self> {
        Self::open_with(&LinkConfig::new(iface))
    }

    pub fn open_with(config: &LinkConfig) -> Result<Self> {
        let iface = config.interface();
        let ifindex = sys::interface_index(iface).map_err(|e| LinkError::lookup(iface, e))?;
        let fd = sys::can_raw_socket().map_err(LinkError::SocketCreation)?;
        sys::bind_can(&fd, ifindex).map_err(|e| LinkError::bind(iface, e))?;

        let socket = unsafe { CanSocket::from_raw_fd(fd.into_raw_fd()) };
        socket
            .set_nonblocking(true)
            .map_err(LinkError::SocketOption)?;
        apply_options(&socket, config).map_err(LinkError::SocketOption)?;
        log::info!("CAN socket opened on interface {} (index {})", iface, ifindex);

        match sys::buffer_sizes(socket.as_raw_fd()) {
            Ok((rcvbuf, sndbuf)) => {
                log::info!("receive buffer size: {} bytes", rcvbuf);
                log::info!("send buffer size: {} bytes", sndbuf);
            }
            Err(e) => log::debug!("failed to query socket buffer sizes: {}", e),
        }
        if let Ok(false) = sys::interface_is_up(iface) {
            log::warn!("interface {} is down, writes will fail until it is up", iface);
        }

        Ok(Self {
            iface: iface.to_owned(),
            socket: Some(socket),
        })
    }

    pub fn interface(&self) -> &str {
        &self.iface
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Send the first `len` bytes of `data` under identifier `id`.
    ///
    /// `len` above 8 is rejected before anything is written.
    pub fn send(&mut self, id: u32, data: &[u8], len: usize) -> Result<()> {
        let frame = RawFrame::new(id, data, len)?;
        self.send_frame(&frame)
    }

    pub fn send_frame(&mut self, frame: &RawFrame) -> Result<()> {
        let can_frame = frame.to_can_frame()?;
        let socket = self.socket.as_ref().ok_or(LinkError::Closed)?;
        socket.write_frame(&can_frame).map_err(LinkError::Write)?;
        log::trace!("{} tx {}", self.iface, frame);
        Ok(())
    }

    /// Read one frame if one is waiting. Never blocks.
    pub fn receive(&mut self) -> Result<Option<RawFrame>> {
        let socket = self.socket.as_ref().ok_or(LinkError::Closed)?;
        let can_frame = match socket.read_frame() {
            Ok(frame) => frame,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                return Ok(None)
            }
            Err(e) => return Err(LinkError::Read(e)),
        };
        let frame = RawFrame::from_can_frame(&can_frame);
        match &frame {
            Some(f) => log::trace!("{} rx {}", self.iface, f),
            None => log::debug!("{} dropped an error frame", self.iface),
        }
        Ok(frame)
    }

    /// Release the socket, reporting a failed `close(2)`.
    ///
    /// The link is closed afterwards even when an error is returned. Closing
    /// a closed link fails with `EBADF`.
    pub fn close(&mut self) -> Result<()> {
        let socket = self
            .socket
            .take()
            .ok_or_else(|| LinkError::Close(io::Error::from_raw_os_error(libc::EBADF)))?;
        sys::close_fd(socket.into_raw_fd()).map_err(LinkError::Close)?;
        log::info!("CAN socket on {} closed", self.iface);
        Ok(())
    }
}

impl Link for CanLink {
    fn send_frame(&mut self, frame: &RawFrame) -> Result<()> {
        CanLink::send_frame(self, frame)
    }

    fn receive(&mut self) -> Result<Option<RawFrame>> {
        CanLink::receive(self)
    }
}

fn apply_options(socket: &CanSocket, config: &LinkConfig) -> io::Result<()> {
    if !config.filters.is_empty() {
        let filters = config
            .filters
            .iter()
            .map(|f| {
                let (id, mask) = f.to_raw();
                CanFilter::new(id, mask)
            })
            .collect::<Vec<_>>();
        socket.set_filters(&filters)?;
    }
    if let Some(enabled) = config.loopback {
        socket.set_loopback(enabled)?;
    }
    if let Some(enabled) = config.recv_own_msgs {
        socket.set_recv_own_msgs(enabled)?;
    }
    Ok(())
}

/// Whether `iface` exists and is administratively up.
pub fn interface_is_up(iface: &str) -> Result<bool> {
    sys::interface_index(iface).map_err(|e| LinkError::lookup(iface, e))?;
    sys::interface_is_up(iface).map_err(|e| LinkError::lookup(iface, e))
}
