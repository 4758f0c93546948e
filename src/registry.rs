use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use libc::c_int;
use nix::{
    errno::Errno,
    sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction},
};
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::warn;

use crate::resolve::signal_for_name;

/// A zero-argument handler action. The configuration that builds the
/// registry owns the closure; the registry only holds `Arc` references.
pub type SignalCallback = Arc<dyn Fn() + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A mapping key was not a canonical signal name. Callers are expected
    /// to run tokens through [`crate::resolve`] first; an unknown name here
    /// is a contract violation and fails the whole construction.
    #[error("unknown canonical signal name: {0:?}")]
    UnknownSignalName(String),
    /// The kernel refused to change the disposition for a signal.
    #[error("sigaction for {signal}")]
    Disposition {
        signal: &'static str,
        #[source]
        source: Errno,
    },
}

// Callback lists for every currently trapped signal number. The OS hands the
// C-level handler nothing but the number, so dispatch has to go through
// process-wide state no matter how the registry itself is owned.
static DISPATCH_TABLE: Lazy<RwLock<HashMap<c_int, Arc<Vec<SignalCallback>>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

// The single OS-level handler shared by all trapped numbers. Runs in signal
// context; the callback list is cloned out so the table lock is not held
// while user callbacks execute.
extern "C" fn dispatch(signum: c_int) {
    let callbacks = match DISPATCH_TABLE.read() {
        Ok(table) => table.get(&signum).cloned(),
        Err(_) => None,
    };
    if let Some(callbacks) = callbacks {
        for callback in callbacks.iter() {
            callback();
        }
    }
}

/// Maps signal numbers to ordered callback chains and owns the install /
/// uninstall lifecycle of the corresponding OS dispositions.
///
/// Construction installs immediately; the traps stay armed until
/// [`uninstall`](SignalRegistry::uninstall) or process exit. Dropping an
/// installed registry does not restore dispositions. While installed, the
/// registry must be the only code changing dispositions for its numbers;
/// concurrent raw `sigaction` calls on them invalidate the saved previous
/// handlers.
pub struct SignalRegistry {
    handlers: HashMap<Signal, Arc<Vec<SignalCallback>>>,
    saved: HashMap<Signal, SigAction>,
}

impl SignalRegistry {
    /// Builds a registry from an order-preserving sequence of
    /// `(canonical name, callbacks)` entries and installs it.
    ///
    /// Names are looked up verbatim, not re-canonicalized. When two entries
    /// land on the same signal number the later one wins and a warning is
    /// logged; per-number keying means only one chain can survive.
    pub fn new<I, S>(mapping: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, Vec<SignalCallback>)>,
        S: AsRef<str>,
    {
        let mut handlers = HashMap::new();
        for (name, callbacks) in mapping {
            let name = name.as_ref();
            let signal = signal_for_name(name)
                .ok_or_else(|| RegistryError::UnknownSignalName(name.to_string()))?;
            if handlers.insert(signal, Arc::new(callbacks)).is_some() {
                warn!(
                    signal = signal.as_str(),
                    "duplicate handler list for one signal number; keeping the later entry"
                );
            }
        }
        let mut registry = Self {
            handlers,
            saved: HashMap::new(),
        };
        registry.install()?;
        Ok(registry)
    }

    /// Arms the dispatch routine for every configured signal, capturing the
    /// dispositions that were in effect. No-op while already installed, so
    /// a repeated call can never save the dispatch routine as the
    /// "previous" handler.
    pub fn install(&mut self) -> Result<(), RegistryError> {
        if self.installed() {
            return Ok(());
        }
        let action = SigAction::new(
            SigHandler::Handler(dispatch),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        for (&signal, callbacks) in &self.handlers {
            if let Ok(mut table) = DISPATCH_TABLE.write() {
                table.insert(signal as c_int, Arc::clone(callbacks));
            }
            let previous = unsafe { sigaction(signal, &action) }.map_err(|source| {
                RegistryError::Disposition {
                    signal: signal.as_str(),
                    source,
                }
            })?;
            self.saved.insert(signal, previous);
        }
        Ok(())
    }

    /// Restores every saved disposition and retires the matching dispatch
    /// entries until nothing remains saved. No-op while not installed. On
    /// failure the entries not yet restored stay saved, so a retry finishes
    /// the job.
    pub fn uninstall(&mut self) -> Result<(), RegistryError> {
        while let Some((signal, previous)) = self.pop_saved() {
            unsafe { sigaction(signal, &previous) }.map_err(|source| {
                RegistryError::Disposition {
                    signal: signal.as_str(),
                    source,
                }
            })?;
            if let Ok(mut table) = DISPATCH_TABLE.write() {
                table.remove(&(signal as c_int));
            }
        }
        Ok(())
    }

    /// True iff the registry currently holds saved previous dispositions.
    pub fn installed(&self) -> bool {
        !self.saved.is_empty()
    }

    fn pop_saved(&mut self) -> Option<(Signal, SigAction)> {
        let signal = self.saved.keys().next().copied()?;
        let previous = self.saved.remove(&signal)?;
        Some((signal, previous))
    }
}

// Callbacks are opaque, so only the trapped signals and the lifecycle state
// are shown.
impl fmt::Debug for SignalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalRegistry")
            .field("signals", &self.handlers.keys().collect::<Vec<_>>())
            .field("installed", &self.installed())
            .finish()
    }
}
