//! [`WifiManager`] implementation backed by NetworkManager's `nmcli`.
//!
//! Networks are listed in terse mode:
//!
//! ```text
//! $ nmcli -t -f ACTIVE,SSID,BARS,SIGNAL,SECURITY device wifi list
//! yes:HomeNet:▂▄▆█:92:WPA2
//! no:Cafe\:Guest:▂▄__:41:
//! ```
//!
//! Terse output escapes `:` as `\:` and `\` as `\\` inside values.

use crate::command::WifiNetwork;
use crate::traits::{CommandRunner, WifiManager};
use log::{debug, info};
use std::collections::HashMap;

const NMCLI: &str = "nmcli";

/// Wi-Fi backend that shells out to `nmcli`.
#[derive(Debug, Clone, Default)]
pub struct Nmcli<R> {
    runner: R,
}

impl<R: CommandRunner> Nmcli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

/// Split one line of `nmcli -t` output into its fields, undoing the
/// `\:` and `\\` escapes.
pub fn split_terse(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => current.push(next),
                None => current.push('\\'),
            },
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse `ACTIVE,SSID,BARS,SIGNAL[,SECURITY]` terse lines.
///
/// Hidden networks (empty SSID) are skipped.  Each SSID appears once: the
/// first line wins unless a later line for the same SSID is the active
/// one.  The result is sorted active first, then by signal, strongest
/// first.
pub fn parse_wifi_list(text: &str) -> Vec<WifiNetwork> {
    let mut networks: Vec<WifiNetwork> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for line in text.lines() {
        let fields = split_terse(line);
        if fields.len() < 4 {
            continue;
        }
        let ssid = fields[1].trim();
        if ssid.is_empty() {
            continue;
        }
        let net = WifiNetwork {
            ssid: ssid.to_string(),
            active: matches!(fields[0].trim(), "yes" | "*"),
            bars: fields[2].trim().to_string(),
            signal: fields[3].trim().parse::<u8>().map(|s| s.min(100)).unwrap_or(0),
            security: fields.get(4).map(|s| s.trim().to_string()).unwrap_or_default(),
        };

        match seen.get(&net.ssid) {
            Some(&idx) => {
                if net.active && !networks[idx].active {
                    networks[idx] = net;
                }
            }
            None => {
                seen.insert(net.ssid.clone(), networks.len());
                networks.push(net);
            }
        }
    }

    networks.sort_by(|a, b| b.active.cmp(&a.active).then(b.signal.cmp(&a.signal)));
    networks
}

impl<R: CommandRunner> WifiManager for Nmcli<R> {
    type Error = R::Error;

    fn set_radio(&self, on: bool) -> Result<(), Self::Error> {
        let state = if on { "on" } else { "off" };
        self.runner
            .output(NMCLI, &["radio", "wifi", state])
            .map(|_| ())
    }

    fn rescan(&self) -> Result<(), Self::Error> {
        self.runner
            .output(NMCLI, &["device", "wifi", "rescan"])
            .map(|_| ())
    }

    fn networks(&self) -> Result<Vec<WifiNetwork>, Self::Error> {
        let out = self.runner.output(
            NMCLI,
            &[
                "-t",
                "-f",
                "ACTIVE,SSID,BARS,SIGNAL,SECURITY",
                "device",
                "wifi",
                "list",
            ],
        )?;
        let networks = parse_wifi_list(&out);
        debug!("{} wifi network(s)", networks.len());
        Ok(networks)
    }

    fn connect(&self, ssid: &str, password: Option<&str>) -> Result<(), Self::Error> {
        // A stale profile with a wrong password would otherwise be reused.
        if self
            .runner
            .status(NMCLI, &["connection", "delete", "id", ssid])?
        {
            debug!("removed saved profile for '{}'", ssid);
        }

        info!("connecting to '{}'", ssid);
        let mut args = vec!["device", "wifi", "connect", ssid];
        if let Some(pw) = password.filter(|p| !p.is_empty()) {
            args.push("password");
            args.push(pw);
        }
        self.runner.output(NMCLI, &args).map(|_| ())
    }

    fn forget(&self, ssid: &str) -> Result<(), Self::Error> {
        info!("forgetting '{}'", ssid);
        self.runner
            .output(NMCLI, &["connection", "delete", "id", ssid])
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::ScriptedRunner;

    const LIST_CMD: &str = "nmcli -t -f ACTIVE,SSID,BARS,SIGNAL,SECURITY device wifi list";

    #[test]
    fn terse_split_handles_escapes() {
        assert_eq!(split_terse("yes:Home:92"), vec!["yes", "Home", "92"]);
        assert_eq!(
            split_terse(r"no:Cafe\:Guest:41"),
            vec!["no", "Cafe:Guest", "41"]
        );
        assert_eq!(split_terse(r"no:back\\slash:7"), vec!["no", r"back\slash", "7"]);
        assert_eq!(split_terse("a::b"), vec!["a", "", "b"]);
    }

    #[test]
    fn parses_and_sorts_networks() {
        let text = "no:Neighbour:▂▄__:40:WPA2\n\
                    yes:HomeNet:▂▄▆█:92:WPA2\n\
                    no:Cafe:▂▄▆_:67:\n";
        let nets = parse_wifi_list(text);
        let ssids: Vec<&str> = nets.iter().map(|n| n.ssid.as_str()).collect();
        assert_eq!(ssids, vec!["HomeNet", "Cafe", "Neighbour"]);
        assert!(nets[0].active);
        assert_eq!(nets[0].signal, 92);
        assert_eq!(nets[0].bars, "▂▄▆█");
        assert!(nets[1].is_open());
        assert!(!nets[2].is_open());
    }

    #[test]
    fn active_network_sorts_first_even_when_weak() {
        let text = "no:Strong:x:99:WPA2\nyes:Weak:x:20:WPA2\n";
        let nets = parse_wifi_list(text);
        assert_eq!(nets[0].ssid, "Weak");
    }

    #[test]
    fn skips_hidden_and_short_lines() {
        let text = "no::▂___:30:WPA2\ngarbage\nno:Ok:▂▄__:50\n";
        let nets = parse_wifi_list(text);
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].ssid, "Ok");
        assert_eq!(nets[0].security, "");
    }

    #[test]
    fn duplicate_ssids_collapse_preferring_active() {
        let text = "no:Mesh:x:80:WPA2\nno:Mesh:x:60:WPA2\nyes:Mesh:x:55:WPA2\n";
        let nets = parse_wifi_list(text);
        assert_eq!(nets.len(), 1);
        assert!(nets[0].active);
        assert_eq!(nets[0].signal, 55);
    }

    #[test]
    fn bad_signal_is_clamped_or_zeroed() {
        let nets = parse_wifi_list("no:Odd:x:??:WPA2\nno:Loud:x:250:WPA2\n");
        let odd = nets.iter().find(|n| n.ssid == "Odd").unwrap();
        assert_eq!(odd.signal, 0);
        let loud = nets.iter().find(|n| n.ssid == "Loud").unwrap();
        assert_eq!(loud.signal, 100);
    }

    #[test]
    fn networks_runs_terse_listing() {
        let runner = ScriptedRunner::new().with_output(LIST_CMD, "yes:Home:▂▄▆█:92:WPA2\n");
        let nm = Nmcli::new(runner);
        let nets = nm.networks().unwrap();
        assert_eq!(nets.len(), 1);
        assert_eq!(nm.runner.calls(), vec![LIST_CMD]);
    }

    #[test]
    fn connect_deletes_profile_then_connects_with_password() {
        let runner = ScriptedRunner::new()
            .with_output("nmcli device wifi connect Home password hunter2", "ok");
        let nm = Nmcli::new(runner);
        nm.connect("Home", Some("hunter2")).unwrap();
        assert_eq!(
            nm.runner.calls(),
            vec![
                "nmcli connection delete id Home",
                "nmcli device wifi connect Home password hunter2"
            ]
        );
    }

    #[test]
    fn connect_open_network_omits_password() {
        let runner = ScriptedRunner::new()
            .with_failure("nmcli connection delete id Cafe")
            .with_output("nmcli device wifi connect Cafe", "ok");
        let nm = Nmcli::new(runner);
        nm.connect("Cafe", Some("")).unwrap();
        assert_eq!(
            nm.runner.calls().last().unwrap(),
            "nmcli device wifi connect Cafe"
        );
    }

    #[test]
    fn connect_failure_propagates() {
        let runner =
            ScriptedRunner::new().with_failure("nmcli device wifi connect Home password wrong");
        assert!(Nmcli::new(runner).connect("Home", Some("wrong")).is_err());
    }

    #[test]
    fn forget_deletes_profile() {
        let runner = ScriptedRunner::new().with_output("nmcli connection delete id Home", "");
        let nm = Nmcli::new(runner);
        nm.forget("Home").unwrap();
        assert_eq!(nm.runner.calls(), vec!["nmcli connection delete id Home"]);
    }

    #[test]
    fn radio_toggle() {
        let runner = ScriptedRunner::new().with_output("nmcli radio wifi on", "");
        let nm = Nmcli::new(runner);
        nm.set_radio(true).unwrap();
        assert_eq!(nm.runner.calls(), vec!["nmcli radio wifi on"]);
    }
}
