use nix::sys::signal::Signal;
use thiserror::Error;

/// Failure modes of [`resolve`]. Both variants carry the offending token
/// verbatim so configuration errors can be reported against the user's input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The token is not a recognized signal name on this platform: unknown
    /// name, underscore-containing pseudo-name, or malformed string.
    #[error("could not convert {0:?} to a signal name")]
    InvalidSignalName(String),
    /// The token is an integer that is out of range or not an assigned
    /// signal number on this platform.
    #[error("unsupported signal on this platform: {0}")]
    UnsupportedSignal(String),
}

/// Converts a signal token to its canonical uppercase `SIG`-prefixed name.
///
/// Accepted inputs are signal names in any case (`hup`, `SigHup`, `SIGHUP`),
/// with or without the `SIG` prefix, and decimal signal numbers (`1`).
/// Anything else is rejected, never coerced. The returned name always maps
/// back to a real signal number via the platform signal table.
pub fn resolve(token: &str) -> Result<&'static str, ResolveError> {
    match token.parse::<i32>() {
        Ok(number) => resolve_number(token, number),
        Err(_) => resolve_name(token),
    }
}

fn resolve_number(token: &str, number: i32) -> Result<&'static str, ResolveError> {
    if number <= 0 {
        return Err(ResolveError::UnsupportedSignal(token.to_string()));
    }
    Signal::iterator()
        .find(|signal| *signal as i32 == number)
        .map(Signal::as_str)
        .ok_or_else(|| ResolveError::UnsupportedSignal(token.to_string()))
}

fn resolve_name(token: &str) -> Result<&'static str, ResolveError> {
    // Underscored tokens are pseudo-entries (SIG_DFL, SIG_IGN) or private
    // names, never real signals.
    if token.contains('_') {
        return Err(ResolveError::InvalidSignalName(token.to_string()));
    }
    let mut candidate = token.to_ascii_uppercase();
    if !candidate.starts_with("SIG") {
        candidate.insert_str(0, "SIG");
    }
    signal_for_name(&candidate)
        .map(Signal::as_str)
        .ok_or_else(|| ResolveError::InvalidSignalName(token.to_string()))
}

/// Exact lookup of an already-canonical name in the platform signal table.
pub fn signal_for_name(name: &str) -> Option<Signal> {
    Signal::iterator().find(|signal| signal.as_str() == name)
}
