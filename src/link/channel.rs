use std::io;

use tokio::sync::mpsc::{
    self,
    error::{TryRecvError, TrySendError},
    Receiver, Sender,
};

use super::{Link, LinkError, RawFrame, Result};

/// An in-memory [`Link`], useful to drive code written against a bus
/// without a CAN interface.
pub struct Channel {
    tx: Sender<RawFrame>,
    rx: Receiver<RawFrame>,
}

impl Channel {
    pub fn new(tx: Sender<RawFrame>, rx: Receiver<RawFrame>) -> Self {
        Self { tx, rx }
    }

    /// Two connected ends; frames sent on one are received on the other.
    pub fn pair(capacity: usize) -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::channel(capacity);
        let (b_tx, b_rx) = mpsc::channel(capacity);
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }
}

impl Link for Channel {
    fn send_frame(&mut self, frame: &RawFrame) -> Result<()> {
        self.tx.try_send(*frame).map_err(|e| match e {
            TrySendError::Full(_) => LinkError::Write(io::Error::from(io::ErrorKind::WouldBlock)),
            TrySendError::Closed(_) => LinkError::Closed,
        })
    }

    fn receive(&mut self) -> Result<Option<RawFrame>> {
        match self.rx.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(LinkError::Closed),
        }
    }
}
