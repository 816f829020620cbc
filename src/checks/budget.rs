//! Budget check: monetary amount against approval limits.

use crate::model::{CheckOutcome, CheckStatus, FieldValue};

use super::Check;

/// Above this, the amount needs a budget owner.
const HARD_LIMIT: f64 = 5000.0;

/// Above this, the amount is worth flagging.
const SOFT_LIMIT: f64 = 1000.0;

pub(super) fn budget(check: Check, value: &FieldValue) -> CheckOutcome {
    let amount = match value.as_number() {
        Some(n) if n.is_finite() && n >= 0.0 => n,
        _ => return check.malformed(&format!("'{}' is not an amount", value.to_text())),
    };

    if amount > HARD_LIMIT {
        check.outcome(
            CheckStatus::Failed,
            3,
            format!("Amount {amount} exceeds the {HARD_LIMIT} limit"),
        )
    } else if amount > SOFT_LIMIT {
        check.outcome(
            CheckStatus::Warning,
            1,
            format!("Amount {amount} exceeds {SOFT_LIMIT}"),
        )
    } else {
        check.outcome(
            CheckStatus::Passed,
            0,
            format!("Amount {amount} is within budget"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(v: impl Into<FieldValue>) -> (CheckStatus, u32) {
        let o = budget(Check::Budget, &v.into());
        (o.status, o.risk_contribution)
    }

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(run(6000), (CheckStatus::Failed, 3));
        assert_eq!(run(5000), (CheckStatus::Warning, 1));
        assert_eq!(run(5000.01), (CheckStatus::Failed, 3));
        assert_eq!(run(1000), (CheckStatus::Passed, 0));
        assert_eq!(run(1000.5), (CheckStatus::Warning, 1));
        assert_eq!(run(0), (CheckStatus::Passed, 0));
    }

    #[test]
    fn string_amounts_are_parsed() {
        assert_eq!(run("2500"), (CheckStatus::Warning, 1));
    }

    #[test]
    fn malformed_amount_fails_at_max() {
        assert_eq!(run("a lot"), (CheckStatus::Failed, 3));
        assert_eq!(run(-10), (CheckStatus::Failed, 3));
        assert_eq!(run(f64::INFINITY), (CheckStatus::Failed, 3));
    }
}
