//! Software checks: security posture of the requested software and license cost.

use crate::model::{CheckOutcome, CheckStatus, FieldValue};

use super::{Check, scalar_text};

/// Never installable. Case-insensitive substring match.
const BLOCKED_SOFTWARE: &[&str] = &[
    "bittorrent",
    "utorrent",
    "mimikatz",
    "cheat engine",
    "tor browser",
];

/// Installable after security review. Case-insensitive substring match.
const REVIEW_REQUIRED: &[&str] = &["teamviewer", "anydesk", "dropbox", "wireshark"];

/// License types that carry a cost.
const PAID_LICENSES: &[&str] = &["Paid", "Enterprise"];

pub(super) fn software_security(check: Check, value: &FieldValue) -> CheckOutcome {
    let Some(name) = scalar_text(value) else {
        return check.malformed("expected a software name");
    };
    let lowered = name.to_lowercase();

    if let Some(hit) = BLOCKED_SOFTWARE.iter().find(|b| lowered.contains(*b)) {
        check.outcome(
            CheckStatus::Failed,
            5,
            format!("{name} matches blocked software '{hit}'"),
        )
    } else if let Some(hit) = REVIEW_REQUIRED.iter().find(|r| lowered.contains(*r)) {
        check.outcome(
            CheckStatus::Warning,
            2,
            format!("{name} matches '{hit}', which requires security review"),
        )
    } else {
        check.outcome(
            CheckStatus::Passed,
            0,
            format!("{name} has no known security concerns"),
        )
    }
}

pub(super) fn license_cost(check: Check, value: &FieldValue) -> CheckOutcome {
    let Some(license) = scalar_text(value) else {
        return check.malformed("expected a license type");
    };

    if PAID_LICENSES.contains(&license) {
        check.outcome(
            CheckStatus::Warning,
            1,
            format!("{license} license incurs a cost"),
        )
    } else {
        check.outcome(
            CheckStatus::Passed,
            0,
            format!("{license} license has no cost"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn software(s: &str) -> (CheckStatus, u32) {
        let o = software_security(Check::SoftwareSecurity, &s.into());
        (o.status, o.risk_contribution)
    }

    fn license(s: &str) -> (CheckStatus, u32) {
        let o = license_cost(Check::LicenseCost, &s.into());
        (o.status, o.risk_contribution)
    }

    #[test]
    fn blocked_software_fails() {
        assert_eq!(software("uTorrent Pro"), (CheckStatus::Failed, 5));
        assert_eq!(software("MIMIKATZ"), (CheckStatus::Failed, 5));
    }

    #[test]
    fn review_required_software_warns() {
        assert_eq!(software("TeamViewer"), (CheckStatus::Warning, 2));
        assert_eq!(software("AnyDesk 8"), (CheckStatus::Warning, 2));
    }

    #[test]
    fn ordinary_software_passes() {
        assert_eq!(software("Visual Studio Code"), (CheckStatus::Passed, 0));
    }

    #[test]
    fn blank_software_fails_at_max() {
        assert_eq!(software("  "), (CheckStatus::Failed, 5));
    }

    #[test]
    fn paid_licenses_warn() {
        assert_eq!(license("Paid"), (CheckStatus::Warning, 1));
        assert_eq!(license("Enterprise"), (CheckStatus::Warning, 1));
        assert_eq!(license("Free"), (CheckStatus::Passed, 0));
        assert_eq!(license("Open Source"), (CheckStatus::Passed, 0));
    }

    #[test]
    fn non_text_license_fails_at_max() {
        let o = license_cost(Check::LicenseCost, &FieldValue::Number(1.0));
        assert_eq!((o.status, o.risk_contribution), (CheckStatus::Failed, 1));
    }
}
