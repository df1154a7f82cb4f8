//! Handler outcome conversion.

use crate::error::BoxError;

/// Trait for converting a handler's output into a task outcome.
///
/// # Default Implementations
///
/// - `()` → success
/// - `Result<T, E>` → delegates to `T`, or fails with `E` boxed
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `IntoOutcome`",
    label = "missing `IntoOutcome` implementation",
    note = "Handlers must return `()` or a `Result` whose error converts into `BoxError`."
)]
pub trait IntoOutcome {
    /// Convert the output into success or a boxed error.
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<(), BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_is_success() {
        assert!(().into_outcome().is_ok());
    }

    #[test]
    fn test_result_errors_are_boxed() {
        let ok: Result<(), std::io::Error> = Ok(());
        assert!(ok.into_outcome().is_ok());

        let err: Result<(), std::io::Error> = Err(std::io::Error::other("nope"));
        assert_eq!(err.into_outcome().unwrap_err().to_string(), "nope");

        let err: Result<(), String> = Err("plain".to_owned());
        assert_eq!(err.into_outcome().unwrap_err().to_string(), "plain");
    }
}
