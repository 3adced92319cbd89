use std::{
    ops::ControlFlow,
    thread::sleep,
    time::{Duration, Instant},
};

use crate::{
    link::{CanLink, IdFilter, LinkConfig, LinkError, RawFrame, CAN_EFF_MAX, CAN_SFF_MAX},
    poll::poll_frames,
    tests::test_interface,
};

/// Open a link that only sees `id`, so tests sharing the bus stay apart.
fn open_filtered(iface: &str, id: u32) -> Option<CanLink> {
    let mask = if id > CAN_SFF_MAX { CAN_EFF_MAX } else { CAN_SFF_MAX };
    let config = LinkConfig::new(iface).with_filter(IdFilter::new(id, mask));
    match CanLink::open_with(&config) {
        Ok(link) => Some(link),
        // no CAN support in this kernel
        Err(LinkError::SocketCreation(e)) => {
            eprintln!("Skipping test: {}", e);
            None
        }
        Err(e) => panic!("failed to open {}: {}", iface, e),
    }
}

fn wait_for_frame(link: &mut CanLink) -> Option<RawFrame> {
    for _ in 0..200 {
        if let Some(frame) = link.receive().unwrap() {
            return Some(frame);
        }
        sleep(Duration::from_millis(1));
    }
    None
}

#[test]
fn test_send_receive_zero_padded() {
    let Some(iface) = test_interface() else { return };
    let Some(mut tx) = open_filtered(&iface, 0x100) else { return };
    let Some(mut rx) = open_filtered(&iface, 0x100) else { return };

    tx.send(0x100, &[1, 2, 3], 3).unwrap();

    let frame = wait_for_frame(&mut rx).unwrap();
    assert_eq!(frame.id(), 0x100);
    assert_eq!(frame.len(), 3);
    assert_eq!(frame.padded(), &[1, 2, 3, 0, 0, 0, 0, 0]);
    assert!(!frame.is_extended());

    // the sender does not see its own frame by default
    assert!(tx.receive().unwrap().is_none());
}

#[test]
fn test_round_trip_all_lengths() {
    let Some(iface) = test_interface() else { return };
    let Some(mut tx) = open_filtered(&iface, 0x321) else { return };
    let Some(mut rx) = open_filtered(&iface, 0x321) else { return };

    let payload = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    for len in 0..=8 {
        tx.send(0x321, &payload, len).unwrap();
        let frame = wait_for_frame(&mut rx).unwrap();
        assert_eq!(frame.id(), 0x321);
        assert_eq!(frame.len(), len);
        assert_eq!(frame.data(), &payload[..len]);
    }
}

#[test]
fn test_extended_round_trip() {
    let Some(iface) = test_interface() else { return };
    let Some(mut tx) = open_filtered(&iface, 0x123_4567) else { return };
    let Some(mut rx) = open_filtered(&iface, 0x123_4567) else { return };

    let sent = RawFrame::from_slice(0x123_4567, &[0xca, 0xfe]).unwrap();
    tx.send_frame(&sent).unwrap();
    assert_eq!(wait_for_frame(&mut rx), Some(sent));
}

#[test]
fn test_extended_filter_small_id() {
    let Some(iface) = test_interface() else { return };
    let Some(mut tx) = open_filtered(&iface, 0x0e5) else { return };
    let config = LinkConfig::new(iface.as_str()).with_filter(IdFilter::extended(0x0e5, CAN_EFF_MAX));
    let mut rx = match CanLink::open_with(&config) {
        Ok(link) => link,
        Err(LinkError::SocketCreation(_)) => return,
        Err(e) => panic!("{}", e),
    };

    // the standard frame with the same id is filtered out
    tx.send(0x0e5, &[1], 1).unwrap();
    let sent = RawFrame::extended(0x0e5, &[2]).unwrap();
    tx.send_frame(&sent).unwrap();
    assert_eq!(wait_for_frame(&mut rx), Some(sent));
    sleep(Duration::from_millis(20));
    assert!(rx.receive().unwrap().is_none());
}

#[test]
fn test_invalid_length_is_not_written() {
    let Some(iface) = test_interface() else { return };
    let Some(mut tx) = open_filtered(&iface, 0x0a1) else { return };
    let Some(mut rx) = open_filtered(&iface, 0x0a1) else { return };

    let err = tx.send(0x0a1, &[0u8; 12], 9).unwrap_err();
    assert!(matches!(err, LinkError::InvalidLength(9)));
    sleep(Duration::from_millis(20));
    assert!(rx.receive().unwrap().is_none());
}

#[test]
fn test_receive_would_block() {
    let Some(iface) = test_interface() else { return };
    let Some(mut link) = open_filtered(&iface, 0x7fe) else { return };

    let start = Instant::now();
    for _ in 0..10 {
        assert!(link.receive().unwrap().is_none());
    }
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[test]
fn test_recv_own_msgs() {
    let Some(iface) = test_interface() else { return };
    let config = LinkConfig::new(iface.as_str())
        .with_filter(IdFilter::new(0x0b2, CAN_SFF_MAX))
        .with_recv_own_msgs(true);
    let mut link = match CanLink::open_with(&config) {
        Ok(link) => link,
        Err(LinkError::SocketCreation(_)) => return,
        Err(e) => panic!("{}", e),
    };
    link.send(0x0b2, &[7], 1).unwrap();
    let frame = wait_for_frame(&mut link).unwrap();
    assert_eq!(frame.data(), &[7]);
}

#[test]
fn test_close_twice() {
    let Some(iface) = test_interface() else { return };
    let Some(mut link) = open_filtered(&iface, 0x0c3) else { return };
    assert!(link.is_open());
    assert_eq!(link.interface(), iface);

    link.close().unwrap();
    assert!(!link.is_open());

    let err = link.close().unwrap_err();
    assert!(
        matches!(err, LinkError::Close(ref e) if e.raw_os_error() == Some(libc::EBADF)),
        "unexpected error {:?}",
        err
    );
    assert!(matches!(link.send(0x0c3, &[1], 1), Err(LinkError::Closed)));
    assert!(matches!(link.receive(), Err(LinkError::Closed)));
}

#[tokio::test]
async fn test_poll_can_link() {
    let Some(iface) = test_interface() else { return };
    let Some(mut tx) = open_filtered(&iface, 0x0d4) else { return };
    let Some(mut rx) = open_filtered(&iface, 0x0d4) else { return };

    for i in 0..4u8 {
        tx.send(0x0d4, &[i], 1).unwrap();
    }
    let mut seen = Vec::new();
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        poll_frames(&mut rx, Duration::from_millis(2), |frame| {
            seen.push(frame.data()[0]);
            if seen.len() == 4 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }),
    )
    .await
    .expect("no frames within 2s");
    assert_eq!(result.unwrap(), 4);
    assert_eq!(seen, vec![0, 1, 2, 3]);
}
