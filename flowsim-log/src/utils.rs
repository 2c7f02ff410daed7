use std::error::Error;
use std::fmt;

/// Returns `true` if backtrace printing is enabled.
///
/// # Example
///
/// ```
/// if flowsim_log::backtrace_enabled() {
///     flowsim_log::debug!("backtraces are enabled");
/// }
/// ```
pub fn backtrace_enabled() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_ref().map(String::as_str),
        Ok("1") | Ok("full")
    )
}

/// Logs an error to the configured logger or `stderr` if not yet configured.
///
/// Prefer to use [`flowsim_log::error`](crate::error) over this function whenever possible. This
/// function is intended to be used during startup, where initializing the logger may fail or when
/// errors need to be logged before the logger has been initialized.
///
/// # Example
///
/// ```
/// let error: Box<dyn std::error::Error> = "missing configuration".into();
/// flowsim_log::ensure_error(error);
/// ```
#[allow(clippy::print_stderr)]
pub fn ensure_error<E: AsRef<dyn Error>>(error: E) {
    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!("{}", LogError(error.as_ref()));
    } else {
        eprintln!("error: {}", LogError(error.as_ref()));
    }
}

/// A wrapper around an [`Error`] that prints its causes.
///
/// # Example
///
/// ```
/// use flowsim_log::LogError;
///
/// if let Err(error) = std::env::var("FOO") {
///     flowsim_log::error!("env failed: {}", LogError(&error));
/// }
/// ```
pub struct LogError<'a, E: Error + ?Sized>(pub &'a E);

impl<E: Error + ?Sized> fmt::Display for LogError<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        let mut source = self.0.source();
        while let Some(s) = source {
            write!(f, "\n  caused by: {s}")?;
            source = s.source();
        }

        Ok(())
    }
}
