//! Precondition helpers. Each helper returns an [AssertionError] instead of panicking, so callers
//! can propagate violations with `?`.

use crate::error::AssertionError;

/// Fails with [AssertionError::IllegalArgument] if the expression is false.
pub fn is_true<M: Into<String>>(expression: bool, message: M) -> Result<(), AssertionError> {
    if expression {
        Ok(())
    } else {
        Err(AssertionError::IllegalArgument(message.into()))
    }
}

/// Unwraps a required value, failing with [AssertionError::IllegalArgument] if it's missing.
pub fn not_null<T, M: Into<String>>(object: Option<T>, message: M) -> Result<T, AssertionError> {
    object.ok_or_else(|| AssertionError::IllegalArgument(message.into()))
}

/// Fails with [AssertionError::IllegalState] if the expression is false.
pub fn state<M: Into<String>>(expression: bool, message: M) -> Result<(), AssertionError> {
    if expression {
        Ok(())
    } else {
        Err(AssertionError::IllegalState(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use crate::assert::{is_true, not_null, state};
    use crate::error::AssertionError;

    #[test]
    fn should_report_illegal_arguments() {
        assert!(is_true(true, "unused").is_ok());
        assert_eq!(
            is_true(false, "must hold").unwrap_err(),
            AssertionError::IllegalArgument("must hold".to_string())
        );
    }

    #[test]
    fn should_unwrap_present_values() {
        assert_eq!(not_null(Some(1), "unused").unwrap(), 1);
        assert_eq!(
            not_null(None::<i8>, "Field must not be null").unwrap_err(),
            AssertionError::IllegalArgument("Field must not be null".to_string())
        );
    }

    #[test]
    fn should_report_illegal_state() {
        assert!(matches!(
            state(false, "broken").unwrap_err(),
            AssertionError::IllegalState(_)
        ));
    }
}
