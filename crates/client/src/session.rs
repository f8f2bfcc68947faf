//! Collaborators the pipeline drives when a request fails.
//!
//! A [`Navigator`] performs the whole-page redirect to the login route after
//! the session ends, and a [`Notifier`] shows user-visible notices for
//! permission and server failures. Front ends supply their own; the `Log*`
//! implementations record through `tracing` and suit headless use.

use std::sync::Arc;

use tracing::{error, warn};

/// User-visible notice raised by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The backend answered 403.
    AccessDenied,
    /// The backend answered 500.
    ServerError,
}

impl Notice {
    /// Text shown to the user.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AccessDenied => "Access denied",
            Self::ServerError => "Server error, please try again later",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Sends the user to another route.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`, discarding the current view.
    fn redirect(&self, route: &str);
}

/// Shows transient notices to the user.
pub trait Notifier: Send + Sync {
    /// Display `notice`.
    fn notify(&self, notice: Notice);
}

/// Navigator that only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, route: &str) {
        warn!(route, "Session ended, redirecting to login");
    }
}

/// Notifier that writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        error!(notice = %notice, "Request failed");
    }
}

/// Issues the login redirect when dropped.
///
/// Held across the best-effort logout call so that the redirect happens
/// whether that call succeeds, fails, or its future is dropped.
pub(crate) struct RedirectOnDrop {
    navigator: Arc<dyn Navigator>,
    route: String,
}

impl RedirectOnDrop {
    pub(crate) fn new(navigator: Arc<dyn Navigator>, route: impl Into<String>) -> Self {
        Self {
            navigator,
            route: route.into(),
        }
    }
}

impl Drop for RedirectOnDrop {
    fn drop(&mut self) {
        self.navigator.redirect(&self.route);
    }
}
