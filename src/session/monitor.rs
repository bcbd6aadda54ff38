use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::config::SessionConfig;
use super::guard::Redirect;
use super::store::SessionStore;
use crate::token;

pub(crate) const EXPIRED_REASON: &str = "Session expired. Please login again.";

/// Consumer-provided navigation seam to the view layer's router.
///
/// # Example
///
/// ```rust,ignore
/// impl Navigator for AppRouter {
///     fn current_path(&self) -> String {
///         self.location().path_and_query()
///     }
///     fn navigate(&self, redirect: &Redirect) {
///         self.push(&redirect.location());
///     }
/// }
/// ```
pub trait Navigator: Send + Sync {
    /// The path the user is currently on.
    fn current_path(&self) -> String;

    /// Send the user somewhere else.
    fn navigate(&self, redirect: &Redirect);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorState {
    Idle,
    Armed,
    Disarmed,
}

struct MonitorInner {
    state: MonitorState,
    last_logout: Option<Instant>,
}

/// Detects token expiry outside of direct user action (idle tab) and forces
/// logout exactly once.
///
/// Lifecycle: `Idle` until [`arm`](Self::arm), then each tick checks the
/// stored token; an expired or undecodable token fires the forced-logout
/// sequence and disarms the monitor. [`disarm`](Self::disarm) (or dropping
/// the [`MonitorHandle`]) stops it at teardown.
///
/// The re-entrancy guard is owned by the instance: at most one forced-logout
/// sequence runs, and concurrent triggers — including ticks racing a
/// user-initiated logout — are coalesced, not queued.
pub struct ExpiryMonitor {
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    interval: Duration,
    cooldown: Duration,
    inner: Mutex<MonitorInner>,
}

impl ExpiryMonitor {
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            store,
            navigator,
            login_path: config.routes().login().to_owned(),
            interval: config.monitor_interval(),
            cooldown: config.logout_cooldown(),
            inner: Mutex::new(MonitorInner {
                state: MonitorState::Idle,
                last_logout: None,
            }),
        }
    }

    /// Start watching. Idempotent; also re-arms a disarmed monitor.
    pub fn arm(&self) {
        self.inner.lock().state = MonitorState::Armed;
    }

    /// Stop watching (teardown). The spawned loop exits on its next tick.
    pub fn disarm(&self) {
        self.inner.lock().state = MonitorState::Disarmed;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.inner.lock().state == MonitorState::Armed
    }

    /// One monitor tick: force logout if an expired or undecodable token is
    /// stored. Returns whether this call performed the logout.
    ///
    /// No stored token is a no-op — there is nothing to clean and nowhere to
    /// force the user out of. An undecodable token is treated exactly like an
    /// expired one (fail-closed).
    pub fn check_now(&self) -> bool {
        if !self.is_armed() {
            return false;
        }
        let Some(stored) = self.store.load_token() else {
            return false;
        };
        if !token::is_expired(stored.as_str()) {
            return false;
        }
        self.force_logout_once()
    }

    /// The single forced-logout entry point.
    ///
    /// Coalescing: returns `false` without side effects while another
    /// sequence runs, after the monitor has disarmed, and within the
    /// cooldown window of a previous firing. On the winning call: clears the
    /// store, then — unless the user is already on the login view — navigates
    /// to login carrying the reason and the originating path.
    pub fn force_logout_once(&self) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.state == MonitorState::Disarmed {
                return false;
            }
            if let Some(fired) = inner.last_logout {
                if fired.elapsed() < self.cooldown {
                    return false;
                }
            }
            inner.state = MonitorState::Disarmed;
            inner.last_logout = Some(Instant::now());
        }

        self.store.clear();

        let current = self.navigator.current_path();
        if !current.starts_with(&self.login_path) {
            let redirect = Redirect::to(self.login_path.clone())
                .with_reason(EXPIRED_REASON)
                .with_return_to(current.as_str());
            tracing::info!(from = %current, "session expired, forcing logout");
            self.navigator.navigate(&redirect);
        } else {
            tracing::debug!("session expired on the login view, cleared without redirect");
        }
        true
    }

    /// Arm the monitor and run its tick loop on a background task.
    ///
    /// The loop exits once the monitor disarms — after a forced logout or an
    /// explicit [`disarm`](Self::disarm). Dropping the returned handle
    /// disarms and aborts, so an unmounted view never acts on a stale
    /// session.
    #[must_use]
    pub fn spawn(self: &Arc<Self>) -> MonitorHandle {
        self.arm();
        let monitor = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.interval);
            ticker.tick().await; // Skip first immediate tick

            loop {
                ticker.tick().await;
                if !monitor.is_armed() {
                    break;
                }
                if monitor.check_now() {
                    break;
                }
            }
        });
        MonitorHandle {
            monitor: Arc::clone(self),
            task,
        }
    }
}

/// Owns the monitor's background task; disarms and aborts on drop.
pub struct MonitorHandle {
    monitor: Arc<ExpiryMonitor>,
    task: tokio::task::JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the monitor explicitly (same as dropping the handle).
    pub fn disarm(self) {}
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.monitor.disarm();
        self.task.abort();
    }
}
