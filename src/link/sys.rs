//! Raw syscalls behind [`CanLink::open`](super::CanLink::open) and
//! [`CanLink::close`](super::CanLink::close).
//!
//! Descriptors are held in [`OwnedFd`] until they are handed over to the
//! socket wrapper, so every early return releases them.

use std::{
    ffi::CString,
    io,
    mem::{size_of, zeroed},
    os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd},
};

/// `IFNAMSIZ - 1`
pub(crate) const MAX_IFACE_NAME_LEN: usize = 15;

/// Create a `PF_CAN` raw socket.
pub(crate) fn can_raw_socket() -> io::Result<OwnedFd> {
    let fd = unsafe { libc::socket(libc::PF_CAN, libc::SOCK_RAW | libc::SOCK_CLOEXEC, libc::CAN_RAW) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { OwnedFd::from_raw_fd(fd) })
}

/// Resolve an interface name to its kernel index.
pub(crate) fn interface_index(iface: &str) -> io::Result<u32> {
    if iface.is_empty() || iface.len() > MAX_IFACE_NAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("interface name must be 1..={} bytes", MAX_IFACE_NAME_LEN),
        ));
    }
    let name = CString::new(iface)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let index = unsafe { libc::if_nametoindex(name.as_ptr()) };
    if index == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(index)
}

/// Bind a CAN socket to the interface with the given index.
pub(crate) fn bind_can(fd: &OwnedFd, ifindex: u32) -> io::Result<()> {
    let mut addr: libc::sockaddr_can = unsafe { zeroed() };
    addr.can_family = libc::AF_CAN as libc::sa_family_t;
    addr.can_ifindex = ifindex as libc::c_int;
    let ret = unsafe {
        libc::bind(
            fd.as_raw_fd(),
            &addr as *const libc::sockaddr_can as *const libc::sockaddr,
            size_of::<libc::sockaddr_can>() as libc::socklen_t,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

fn getsockopt_int(fd: RawFd, option: libc::c_int) -> io::Result<i32> {
    let mut value: libc::c_int = 0;
    let mut len = size_of::<libc::c_int>() as libc::socklen_t;
    let ret = unsafe {
        libc::getsockopt(
            fd,
            libc::SOL_SOCKET,
            option,
            &mut value as *mut libc::c_int as *mut libc::c_void,
            &mut len,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(value)
}

/// `(SO_RCVBUF, SO_SNDBUF)` in bytes.
pub(crate) fn buffer_sizes(fd: RawFd) -> io::Result<(i32, i32)> {
    Ok((
        getsockopt_int(fd, libc::SO_RCVBUF)?,
        getsockopt_int(fd, libc::SO_SNDBUF)?,
    ))
}

/// Close a descriptor and report the result of `close(2)`.
///
/// The descriptor is gone afterwards whatever the outcome.
pub(crate) fn close_fd(fd: RawFd) -> io::Result<()> {
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Whether the interface is administratively up (`IFF_UP`).
pub(crate) fn interface_is_up(iface: &str) -> io::Result<bool> {
    if iface.len() > MAX_IFACE_NAME_LEN {
        return Err(io::Error::from(io::ErrorKind::InvalidInput));
    }
    let mut ifr: libc::ifreq = unsafe { zeroed() };
    for (dst, src) in ifr.ifr_name.iter_mut().zip(iface.as_bytes()) {
        *dst = *src as libc::c_char;
    }

    let sock = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM | libc::SOCK_CLOEXEC, 0) };
    if sock < 0 {
        return Err(io::Error::last_os_error());
    }
    let sock = unsafe { OwnedFd::from_raw_fd(sock) };

    let ret = unsafe {
        libc::ioctl(
            sock.as_raw_fd(),
            libc::SIOCGIFFLAGS,
            &mut ifr as *mut libc::ifreq as *mut libc::c_void,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    // ifru_flags is the leading c_short of the ifr_ifru union
    let flags = unsafe { *(std::ptr::addr_of!(ifr.ifr_ifru) as *const libc::c_short) };
    Ok(i32::from(flags) & libc::IFF_UP != 0)
}
