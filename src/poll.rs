use std::{ops::ControlFlow, time::Duration};

use tokio::time::{interval, MissedTickBehavior};

use crate::link::{Link, RawFrame, Result};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Poll `link` on a fixed tick, handing every frame to `handler`.
///
/// Each tick drains all pending frames. Returns the number of frames handled
/// once `handler` breaks, or the first receive error.
pub async fn poll_frames<L, F>(link: &mut L, period: Duration, mut handler: F) -> Result<usize>
where
    L: Link + ?Sized,
    F: FnMut(RawFrame) -> ControlFlow<()>,
{
    let mut ticker = interval(period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut handled = 0;
    loop {
        ticker.tick().await;
        while let Some(frame) = link.receive()? {
            handled += 1;
            if handler(frame).is_break() {
                return Ok(handled);
            }
        }
    }
}

/// Collect every frame that is pending right now.
pub fn drain<L: Link + ?Sized>(link: &mut L) -> Result<Vec<RawFrame>> {
    let mut frames = Vec::new();
    while let Some(frame) = link.receive()? {
        frames.push(frame);
    }
    Ok(frames)
}
