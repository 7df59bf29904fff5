//! [`BluetoothManager`] implementation backed by `bluetoothctl`.
//!
//! Device discovery merges `bluetoothctl devices` with
//! `bluetoothctl paired-devices` and then asks `bluetoothctl info <mac>`
//! for each device's flags:
//!
//! ```text
//! $ bluetoothctl devices
//! Device 11:22:33:44:55:66 WH-1000XM4
//! $ bluetoothctl info 11:22:33:44:55:66
//! Device 11:22:33:44:55:66 (public)
//!         Name: WH-1000XM4
//!         Paired: yes
//!         Trusted: yes
//!         Connected: no
//! ```
//!
//! Newer BlueZ releases dropped `paired-devices`; its failure is ignored.

use crate::command::{BluetoothAction, BluetoothDevice};
use crate::traits::{BluetoothManager, CommandRunner};
use log::{debug, info, warn};
use std::time::Duration;

const BLUETOOTHCTL: &str = "bluetoothctl";

/// Bluetooth backend that shells out to `bluetoothctl`.
#[derive(Debug, Clone, Default)]
pub struct BluetoothCtl<R> {
    runner: R,
}

impl<R: CommandRunner> BluetoothCtl<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn ctl(&self, args: &[&str]) -> Result<String, R::Error> {
        self.runner.output(BLUETOOTHCTL, args)
    }
}

/// `true` for a colon-separated 48-bit address (`AA:BB:CC:DD:EE:FF`).
pub fn is_mac(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parse `Device <MAC> <name…>` lines.
///
/// Anything before the `Device` token (an interactive prompt, colour
/// codes) is ignored, as are lines without a valid address.  Duplicate
/// addresses keep their first occurrence.
pub fn parse_device_list(text: &str) -> Vec<BluetoothDevice> {
    let mut devices: Vec<BluetoothDevice> = Vec::new();
    for line in text.lines() {
        let Some(pos) = line.find("Device ") else {
            continue;
        };
        let rest = &line[pos + "Device ".len()..];
        let mut parts = rest.trim().splitn(2, ' ');
        let mac = parts.next().unwrap_or("");
        if !is_mac(mac) {
            continue;
        }
        if devices.iter().any(|d| d.mac == mac) {
            continue;
        }
        let name = parts.next().unwrap_or("").trim();
        devices.push(BluetoothDevice::new(mac, name));
    }
    devices
}

/// Flags reported by `bluetoothctl info`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFlags {
    pub paired: bool,
    pub connected: bool,
    pub trusted: bool,
}

/// Read the yes/no value of `key` from `Key: value` lines.
fn yes_no(text: &str, key: &str) -> bool {
    text.lines().any(|line| {
        line.trim()
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .is_some_and(|v| v.trim() == "yes")
    })
}

/// Parse the output of `bluetoothctl info <mac>`.
pub fn parse_info(text: &str) -> DeviceFlags {
    DeviceFlags {
        paired: yes_no(text, "Paired"),
        connected: yes_no(text, "Connected"),
        trusted: yes_no(text, "Trusted"),
    }
}

/// Parse `Powered: yes` from `bluetoothctl show`.
pub fn parse_powered(text: &str) -> bool {
    yes_no(text, "Powered")
}

/// Connected first, then paired, then by name (case-insensitive).
pub fn sort_devices(devices: &mut [BluetoothDevice]) {
    devices.sort_by(|a, b| {
        b.connected
            .cmp(&a.connected)
            .then(b.paired.cmp(&a.paired))
            .then_with(|| {
                a.display_name()
                    .to_lowercase()
                    .cmp(&b.display_name().to_lowercase())
            })
    });
}

impl<R: CommandRunner> BluetoothManager for BluetoothCtl<R> {
    type Error = R::Error;

    fn prepare_adapter(&self) -> Result<(), Self::Error> {
        match self.runner.status("rfkill", &["unblock", "bluetooth"]) {
            Ok(true) => {}
            Ok(false) => warn!("rfkill unblock bluetooth failed"),
            Err(e) => warn!("rfkill unavailable: {}", e),
        }
        if !self.runner.status(BLUETOOTHCTL, &["power", "on"])? {
            warn!("bluetoothctl power on failed");
        }
        Ok(())
    }

    fn scan(&self, duration: Duration) -> Result<(), Self::Error> {
        let secs = duration.as_secs_f64().ceil().max(1.0) as u64;
        let secs = secs.to_string();
        // `--timeout` makes bluetoothctl exit on its own; its exit status
        // after a timeout is not meaningful.
        self.runner
            .status(BLUETOOTHCTL, &["--timeout", &secs, "scan", "on"])?;
        Ok(())
    }

    fn devices(&self) -> Result<Vec<BluetoothDevice>, Self::Error> {
        let mut devices = parse_device_list(&self.ctl(&["devices"])?);

        match self.ctl(&["paired-devices"]) {
            Ok(out) => {
                for dev in parse_device_list(&out) {
                    if !devices.iter().any(|d| d.mac == dev.mac) {
                        devices.push(dev);
                    }
                }
            }
            Err(e) => debug!("paired-devices unavailable: {}", e),
        }

        for dev in devices.iter_mut() {
            match self.ctl(&["info", &dev.mac]) {
                Ok(info) => {
                    let flags = parse_info(&info);
                    dev.paired = flags.paired;
                    dev.connected = flags.connected;
                    dev.trusted = flags.trusted;
                }
                Err(e) => warn!("info {} failed: {}", dev.mac, e),
            }
        }

        sort_devices(&mut devices);
        debug!("{} bluetooth device(s)", devices.len());
        Ok(devices)
    }

    fn powered(&self) -> Result<bool, Self::Error> {
        Ok(parse_powered(&self.ctl(&["show"])?))
    }

    fn set_power(&self, on: bool) -> Result<(), Self::Error> {
        let state = if on { "on" } else { "off" };
        info!("bluetooth power {}", state);
        self.ctl(&["power", state]).map(|_| ())
    }

    fn perform(&self, action: BluetoothAction, mac: &str) -> Result<(), Self::Error> {
        info!("bluetoothctl {} {}", action, mac);
        self.ctl(&[action.verb(), mac]).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::ScriptedRunner;

    const HEADSET: &str = "11:22:33:44:55:66";
    const MOUSE: &str = "AA:BB:CC:DD:EE:FF";
    const SPEAKER: &str = "00:1A:7D:DA:71:13";

    fn info(paired: bool, connected: bool, trusted: bool) -> String {
        let yn = |b| if b { "yes" } else { "no" };
        format!(
            "Device X (public)\n\tName: X\n\tPaired: {}\n\tBonded: {}\n\tTrusted: {}\n\tBlocked: no\n\tConnected: {}\n",
            yn(paired),
            yn(paired),
            yn(trusted),
            yn(connected)
        )
    }

    #[test]
    fn parses_device_lines() {
        let text = "Device 11:22:33:44:55:66 WH-1000XM4\nDevice AA:BB:CC:DD:EE:FF MX Master 3\n";
        let devs = parse_device_list(text);
        assert_eq!(devs.len(), 2);
        assert_eq!(devs[0].mac, HEADSET);
        assert_eq!(devs[0].name, "WH-1000XM4");
        assert_eq!(devs[1].name, "MX Master 3");
    }

    #[test]
    fn skips_noise_and_duplicates() {
        let text = "Agent registered\n\
                    [bluetooth]# Device 11:22:33:44:55:66 Headset\n\
                    Device not-a-mac Foo\n\
                    Device 11:22:33:44:55:66 Headset again\n\
                    Device AA:BB:CC:DD:EE:FF\n";
        let devs = parse_device_list(text);
        assert_eq!(devs.len(), 2);
        assert_eq!(devs[0].name, "Headset");
        assert_eq!(devs[1].mac, MOUSE);
        assert_eq!(devs[1].name, "");
    }

    #[test]
    fn mac_validation() {
        assert!(is_mac("aa:bb:cc:dd:ee:ff"));
        assert!(!is_mac("aa:bb:cc:dd:ee"));
        assert!(!is_mac("aa:bb:cc:dd:ee:fg"));
        assert!(!is_mac("aabb:cc:dd:ee:ff:00"));
    }

    #[test]
    fn parses_info_flags() {
        let flags = parse_info(&info(true, false, true));
        assert_eq!(
            flags,
            DeviceFlags {
                paired: true,
                connected: false,
                trusted: true
            }
        );
    }

    #[test]
    fn info_keys_must_match_exactly() {
        // "PairedDevice: yes" must not count as "Paired: yes".
        let flags = parse_info("\tPairedDevice: yes\n\tConnected: yes\n");
        assert!(!flags.paired);
        assert!(flags.connected);
    }

    #[test]
    fn parses_powered() {
        assert!(parse_powered("Controller 00:00 (public)\n\tPowered: yes\n"));
        assert!(!parse_powered("Controller 00:00 (public)\n\tPowered: no\n"));
    }

    #[test]
    fn sorts_connected_then_paired_then_name() {
        let mut devs = vec![
            BluetoothDevice::new("1", "zeta"),
            BluetoothDevice {
                paired: true,
                ..BluetoothDevice::new("2", "beta")
            },
            BluetoothDevice {
                paired: true,
                connected: true,
                ..BluetoothDevice::new("3", "omega")
            },
            BluetoothDevice::new("4", "Alpha"),
        ];
        sort_devices(&mut devs);
        let names: Vec<&str> = devs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["omega", "beta", "Alpha", "zeta"]);
    }

    #[test]
    fn devices_merges_lists_and_reads_info() {
        let runner = ScriptedRunner::new()
            .with_output(
                "bluetoothctl devices",
                &format!("Device {} Headset\nDevice {} Mouse\n", HEADSET, MOUSE),
            )
            .with_output(
                "bluetoothctl paired-devices",
                &format!("Device {} Speaker\nDevice {} Headset\n", SPEAKER, HEADSET),
            )
            .with_output(&format!("bluetoothctl info {}", HEADSET), &info(true, true, true))
            .with_output(&format!("bluetoothctl info {}", MOUSE), &info(false, false, false))
            .with_output(&format!("bluetoothctl info {}", SPEAKER), &info(true, false, false));

        let bt = BluetoothCtl::new(runner);
        let devs = bt.devices().unwrap();
        let names: Vec<&str> = devs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Headset", "Speaker", "Mouse"]);
        assert!(devs[0].connected && devs[0].trusted);
        assert!(devs[1].paired && !devs[1].connected);
        assert!(!devs[2].paired);
    }

    #[test]
    fn devices_tolerates_missing_paired_devices_command() {
        let runner = ScriptedRunner::new()
            .with_output("bluetoothctl devices", &format!("Device {} Mouse\n", MOUSE))
            .with_failure("bluetoothctl paired-devices")
            .with_output(&format!("bluetoothctl info {}", MOUSE), &info(true, false, false));
        let devs = BluetoothCtl::new(runner).devices().unwrap();
        assert_eq!(devs.len(), 1);
        assert!(devs[0].paired);
    }

    #[test]
    fn devices_fails_when_listing_fails() {
        let runner = ScriptedRunner::new().with_failure("bluetoothctl devices");
        assert!(BluetoothCtl::new(runner).devices().is_err());
    }

    #[test]
    fn perform_uses_action_verb() {
        let runner = ScriptedRunner::new()
            .with_output(&format!("bluetoothctl untrust {}", MOUSE), "")
            .with_output(&format!("bluetoothctl connect {}", MOUSE), "");
        let bt = BluetoothCtl::new(runner);
        bt.perform(BluetoothAction::Untrust, MOUSE).unwrap();
        bt.perform(BluetoothAction::Connect, MOUSE).unwrap();
        assert_eq!(
            bt.runner.calls(),
            vec![
                format!("bluetoothctl untrust {}", MOUSE),
                format!("bluetoothctl connect {}", MOUSE)
            ]
        );
    }

    #[test]
    fn prepare_adapter_unblocks_then_powers_on() {
        let bt = BluetoothCtl::new(ScriptedRunner::new());
        bt.prepare_adapter().unwrap();
        assert_eq!(
            bt.runner.calls(),
            vec!["rfkill unblock bluetooth", "bluetoothctl power on"]
        );
    }

    #[test]
    fn prepare_adapter_without_rfkill_still_powers_on() {
        let runner = ScriptedRunner::new().with_missing("rfkill unblock bluetooth");
        let bt = BluetoothCtl::new(runner);
        bt.prepare_adapter().unwrap();
        assert_eq!(
            bt.runner.calls(),
            vec!["rfkill unblock bluetooth", "bluetoothctl power on"]
        );
    }

    #[test]
    fn scan_rounds_up_to_whole_seconds() {
        let bt = BluetoothCtl::new(ScriptedRunner::new());
        bt.scan(Duration::from_millis(1500)).unwrap();
        bt.scan(Duration::from_millis(10)).unwrap();
        assert_eq!(
            bt.runner.calls(),
            vec![
                "bluetoothctl --timeout 2 scan on",
                "bluetoothctl --timeout 1 scan on"
            ]
        );
    }

    #[test]
    fn set_power_off() {
        let runner = ScriptedRunner::new().with_output("bluetoothctl power off", "");
        let bt = BluetoothCtl::new(runner);
        bt.set_power(false).unwrap();
        assert_eq!(bt.runner.calls(), vec!["bluetoothctl power off"]);
    }
}
