use std::{process::Command, sync::OnceLock};

mod test_vcan;

/// Check if the current process has root privilege
fn has_root_privilege() -> bool {
    match Command::new("id").arg("-u").output() {
        Ok(output) => {
            let uid = String::from_utf8_lossy(&output.stdout);
            uid.trim() == "0"
        }
        Err(_) => false,
    }
}

fn interface_exists(iface: &str) -> bool {
    Command::new("ip")
        .args(["link", "show", iface])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Create and bring up a virtual CAN interface if it is missing. Needs root.
fn setup_vcan(iface: &str) -> bool {
    if interface_exists(iface) {
        return true;
    }
    if !has_root_privilege() {
        return false;
    }
    let run = |args: &[&str]| {
        Command::new("ip")
            .args(args)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    };
    run(&["link", "add", "dev", iface, "type", "vcan"]) && run(&["link", "set", "up", iface])
}

/// Number of descriptors this process holds.
pub(crate) fn open_fd_count() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .map(|dir| dir.count())
        .unwrap_or(0)
}

/// The virtual interface used by bus tests, or `None` to skip them.
pub(crate) fn test_interface() -> Option<String> {
    static IFACE: OnceLock<Option<String>> = OnceLock::new();
    IFACE
        .get_or_init(|| {
            let iface = std::env::var("CANLINK_TEST_IFACE").unwrap_or_else(|_| "vcan0".to_owned());
            setup_vcan(&iface).then_some(iface)
        })
        .clone()
        .or_else(|| {
            eprintln!("Skipping test: no virtual CAN interface");
            None
        })
}
