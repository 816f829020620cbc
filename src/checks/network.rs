//! Network checks: source IP reputation and destination port risk.

use std::net::IpAddr;

use crate::model::{CheckOutcome, CheckStatus, FieldValue};

use super::{Check, scalar_text};

/// Addresses with a known-bad reputation. Exact match.
const KNOWN_BAD_IPS: &[&str] = &["192.168.1.100", "10.0.0.50", "203.0.113.66"];

/// Ranges under active monitoring. Prefix match on the textual address.
const MONITORED_PREFIXES: &[&str] = &["172.16.", "198.51.100."];

/// Administrative and remote-access ports.
const HIGH_RISK_PORTS: &[u16] = &[22, 23, 3389, 445, 135];

/// Legacy cleartext mail and file-transfer ports.
const ELEVATED_PORTS: &[u16] = &[21, 25, 110, 143];

pub(super) fn ip_reputation(check: Check, value: &FieldValue) -> CheckOutcome {
    let Some(ip) = scalar_text(value) else {
        return check.malformed("expected an IP address");
    };
    if ip.parse::<IpAddr>().is_err() {
        return check.malformed(&format!("'{ip}' is not an IP address"));
    }

    if KNOWN_BAD_IPS.contains(&ip) {
        check.outcome(
            CheckStatus::Failed,
            4,
            format!("IP {ip} is on the known-bad reputation list"),
        )
    } else if let Some(range) = MONITORED_PREFIXES.iter().find(|p| ip.starts_with(*p)) {
        check.outcome(
            CheckStatus::Warning,
            2,
            format!("IP {ip} is in monitored range {range}*"),
        )
    } else {
        check.outcome(
            CheckStatus::Passed,
            0,
            format!("IP {ip} has no adverse reputation"),
        )
    }
}

pub(super) fn port_risk(check: Check, value: &FieldValue) -> CheckOutcome {
    let Some(port) = value.as_number().and_then(to_port) else {
        return check.malformed(&format!("'{}' is not a port number", value.to_text()));
    };

    if HIGH_RISK_PORTS.contains(&port) {
        check.outcome(
            CheckStatus::Failed,
            4,
            format!("Port {port} is a high-risk administrative port"),
        )
    } else if ELEVATED_PORTS.contains(&port) {
        check.outcome(
            CheckStatus::Warning,
            2,
            format!("Port {port} carries a cleartext legacy protocol"),
        )
    } else if port == 443 || port == 80 {
        check.outcome(
            CheckStatus::Passed,
            0,
            format!("Port {port} is a standard web port"),
        )
    } else {
        check.outcome(
            CheckStatus::Passed,
            1,
            format!("Port {port} is non-standard"),
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_port(n: f64) -> Option<u16> {
    (n.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&n)).then(|| n as u16)
}
