use std::borrow::Cow;

use tracing::warn;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::account::dto::{AccountChanges, NewAccount};
use crate::error::{AccountError, AccountResult, FieldViolation};

/// Report order for violations, matching the column order.
const FIELDS: [&str; 3] = ["username", "email", "password"];

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Rejects blank text (whitespace only counts as missing).
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule("required", "is required"));
    }
    Ok(())
}

/// Rules `validator`'s email check leaves open: dots at the edges of the
/// local part or doubled, a domain without a TLD, and TLDs that are numeric
/// or a single character long.
pub(crate) fn email_rules(email: &str) -> Result<(), ValidationError> {
    let invalid = || rule("email", "must be a valid email address");
    let (local, domain) = email.rsplit_once('@').ok_or_else(invalid)?;

    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return Err(invalid());
    }
    if local
        .chars()
        .any(|c| matches!(c, '(' | ')' | '<' | '>' | '[' | ']' | ',' | ';' | ':' | '\\' | '"'))
    {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid());
    }
    if labels
        .iter()
        .any(|l| l.is_empty() || l.starts_with('-') || l.ends_with('-') || l.contains('_'))
    {
        return Err(invalid());
    }

    let tld = labels[labels.len() - 1];
    let punycode = tld.starts_with("xn--") && tld.len() > 4;
    if !punycode && (tld.chars().count() < 2 || !tld.chars().all(char::is_alphabetic)) {
        return Err(invalid());
    }
    Ok(())
}

pub fn is_valid_email(email: &str) -> bool {
    email.validate_email() && email_rules(email).is_ok()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn into_account_error(errors: ValidationErrors) -> AccountError {
    let mut violations: Vec<(usize, FieldViolation)> = Vec::new();
    for (field, errs) in errors.field_errors() {
        let name: &str = &field;
        let Some(pos) = FIELDS.iter().position(|f| *f == name) else {
            continue;
        };
        let message = errs
            .first()
            .map(|e| match &e.message {
                Some(m) => m.to_string(),
                None => e.code.to_string(),
            })
            .unwrap_or_else(|| "is invalid".to_string());
        violations.push((pos, FieldViolation::new(FIELDS[pos], message)));
    }
    violations.sort_by_key(|(pos, _)| *pos);

    let violations: Vec<FieldViolation> = violations.into_iter().map(|(_, v)| v).collect();
    let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
    warn!(?fields, "account rejected by validation");
    AccountError::Validation(violations)
}

/// Expects an already normalized email.
pub fn validate_new(account: &NewAccount) -> AccountResult<()> {
    account.validate().map_err(into_account_error)
}

/// Checks only the fields present in the patch.
pub fn validate_changes(changes: &AccountChanges) -> AccountResult<()> {
    changes.validate().map_err(into_account_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(err: AccountError) -> Vec<&'static str> {
        err.violations().iter().map(|v| v.field).collect()
    }

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("ann@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.uk"));
        assert!(is_valid_email("o'brien@xn--bcher-kva.example"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "plainaddress",
            "@example.com",
            "ann@",
            "ann@example",
            "ann@@example.com",
            "ann @example.com",
            "ann@.example.com",
            "ann@example..com",
            "ann@example.com.",
            "a..b@example.com",
            ".ann@example.com",
            "ann.@example.com",
            "ann@example.c",
            "ann@-example.com",
            "ann@exa_mple.com",
            "a(b@example.com",
            "ann@example.123",
            "a<b>@x.com",
            "ann@[127.0.0.1]",
        ] {
            assert!(!is_valid_email(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[test]
    fn valid_new_account_passes() {
        let new = NewAccount::new("ann", "ann@example.com", "abcd");
        assert!(validate_new(&new).is_ok());
    }

    #[test]
    fn short_password_is_rejected() {
        let new = NewAccount::new("ann", "ann@example.com", "abc");
        let err = validate_new(&new).unwrap_err();
        assert_eq!(err.violations()[0].message, "must be at least 4 characters");
        assert_eq!(fields(err), vec!["password"]);
    }

    #[test]
    fn password_length_counts_characters_not_bytes() {
        // three characters, six bytes
        let new = NewAccount::new("ann", "ann@example.com", "äöü");
        assert!(validate_new(&new).is_err());
        let new = NewAccount::new("ann", "ann@example.com", "äöüß");
        assert!(validate_new(&new).is_ok());
    }

    #[test]
    fn every_violation_is_reported_in_column_order() {
        let new = NewAccount::new(" ", "not-an-email", "");
        assert_eq!(
            fields(validate_new(&new).unwrap_err()),
            vec!["username", "email", "password"]
        );
    }

    #[test]
    fn blank_username_reads_as_missing() {
        let new = NewAccount::new("   ", "ann@example.com", "abcd");
        let err = validate_new(&new).unwrap_err();
        assert_eq!(err.violations()[0].message, "is required");
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let new = NewAccount::new("x".repeat(256), "ann@example.com", "abcd");
        assert_eq!(fields(validate_new(&new).unwrap_err()), vec!["username"]);

        let email = format!("{}@example.com", "a".repeat(250));
        let new = NewAccount::new("ann", email, "abcd");
        assert_eq!(fields(validate_new(&new).unwrap_err()), vec!["email"]);
    }

    #[test]
    fn patch_checks_only_present_fields() {
        assert!(validate_changes(&AccountChanges::default()).is_ok());
        assert!(validate_changes(&AccountChanges::default().username("bob")).is_ok());

        let err = validate_changes(&AccountChanges::default().password("xyz")).unwrap_err();
        assert_eq!(fields(err), vec!["password"]);

        let err = validate_changes(&AccountChanges::default().email("a..b@example.com")).unwrap_err();
        assert_eq!(fields(err), vec!["email"]);

        let err = validate_changes(&AccountChanges::default().username(" ")).unwrap_err();
        assert_eq!(fields(err), vec!["username"]);
    }
}
