use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a key name")]
    EmptyName,

    #[error("Please enter a valid max usage limit")]
    InvalidMaxUsage,
}

/// A creation request that passed client-side checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCreate {
    pub name: String,
    pub max_usage: i64,
}

pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(name.to_string())
}

/// Parse a usage limit typed by the user. Must be a whole number above zero.
pub fn parse_max_usage(raw: &str) -> Result<i64, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::InvalidMaxUsage),
    }
}

pub fn validate_create(name: &str, max_usage: &str) -> Result<ValidCreate, ValidationError> {
    Ok(ValidCreate {
        name: validate_name(name)?,
        max_usage: parse_max_usage(max_usage)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_limit() {
        assert_eq!(parse_max_usage("10"), Ok(10));
        assert_eq!(parse_max_usage(" 1 "), Ok(1));
    }

    #[test]
    fn rejects_zero_negative_and_garbage() {
        for raw in ["0", "-5", "", "abc", "1.5", "12abc"] {
            assert_eq!(
                parse_max_usage(raw),
                Err(ValidationError::InvalidMaxUsage),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn name_is_trimmed_and_required() {
        assert_eq!(validate_name("  Test "), Ok("Test".to_string()));
        assert_eq!(validate_name("   "), Err(ValidationError::EmptyName));
    }

    #[test]
    fn create_checks_name_before_limit() {
        assert_eq!(
            validate_create("", "0"),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            validate_create("Test", "10"),
            Ok(ValidCreate {
                name: "Test".into(),
                max_usage: 10
            })
        );
    }

    #[test]
    fn messages_match_notifications() {
        assert_eq!(
            ValidationError::InvalidMaxUsage.to_string(),
            "Please enter a valid max usage limit"
        );
    }
}
