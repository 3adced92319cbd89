use std::{ops::ControlFlow, process::ExitCode, time::Duration};

use canlink::{parse_can_id, parse_payload, poll_frames, CanLink, LinkError, RawFrame};
use chrono::Local;
use clap::{Parser, Subcommand};

#[derive(Clone, Debug)]
struct Payload(Vec<u8>);

fn payload(s: &str) -> Result<Payload, String> {
    parse_payload(s).map(Payload)
}

fn larger_than_zero(p: &str) -> Result<u64, String> {
    let n = p.parse::<u64>().map_err(|_| "Invalid number")?;
    if n == 0 {
        Err("Invalid number".to_owned())
    } else {
        Ok(n)
    }
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// CAN interface, configured and up beforehand (e.g. with `ip link`)
    #[arg(short, long, env = "CANLINK_IFACE", default_value = canlink::link::DEFAULT_INTERFACE)]
    iface: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one frame
    Send {
        /// Identifier, decimal or 0x-prefixed hex
        #[arg(value_parser = parse_can_id)]
        id: u32,

        /// Payload as hex bytes, e.g. 01,02,03
        #[arg(value_parser = payload, default_value = "")]
        data: Payload,

        /// Use a 29-bit identifier even when the id fits in 11 bits
        #[arg(short, long, default_value_t = false)]
        extended: bool,
    },
    /// Print received frames
    Dump {
        /// Polling period in milliseconds
        #[arg(short, long, default_value_t = 10, value_parser = larger_than_zero)]
        period_ms: u64,

        /// Stop after this many frames
        #[arg(short, long, value_parser = larger_than_zero)]
        count: Option<u64>,
    },
}

fn send(iface: &str, id: u32, data: &[u8], extended: bool) -> Result<(), LinkError> {
    let frame = if extended {
        RawFrame::extended(id, data)?
    } else {
        RawFrame::from_slice(id, data)?
    };
    let mut link = CanLink::open(iface)?;
    let result = link.send_frame(&frame);
    let closed = link.close();
    result?;
    closed
}

async fn dump(iface: &str, period: Duration, count: Option<u64>) -> Result<(), LinkError> {
    let mut link = CanLink::open(iface)?;
    let mut seen = 0u64;
    let result = tokio::select! {
        r = poll_frames(&mut link, period, |frame| {
            println!("({})  {}  {}", Local::now().format("%H:%M:%S%.6f"), iface, frame);
            seen += 1;
            match count {
                Some(count) if seen >= count => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        }) => r.map(|_| ()),
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted");
            Ok(())
        }
    };
    let closed = link.close();
    result?;
    closed
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let result = match args.command {
        Command::Send { id, data, extended } => send(&args.iface, id, &data.0, extended),
        Command::Dump { period_ms, count } => {
            dump(&args.iface, Duration::from_millis(period_ms), count).await
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
