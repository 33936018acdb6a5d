//! Home-page gate in front of first-run setup.

use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

/// Remembers that setup finished in this process a moment ago, so a home
/// page load that races CMS propagation renders instead of bouncing back to
/// the setup form.
#[derive(Debug)]
pub struct RecentCompletion {
    window: Duration,
    completed_at: Mutex<Option<Instant>>,
}

impl RecentCompletion {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            completed_at: Mutex::new(None),
        }
    }

    pub fn mark(&self) {
        self.mark_at(Instant::now());
    }

    fn mark_at(&self, at: Instant) {
        *self.lock() = Some(at);
    }

    pub fn is_recent(&self) -> bool {
        self.is_recent_at(Instant::now())
    }

    fn is_recent_at(&self, now: Instant) -> bool {
        self.lock()
            .is_some_and(|at| now.saturating_duration_since(at) < self.window)
    }

    /// Returns whether the flag was recent and clears it either way.
    pub fn take_recent(&self) -> bool {
        self.take_recent_at(Instant::now())
    }

    fn take_recent_at(&self, now: Instant) -> bool {
        self.lock()
            .take()
            .is_some_and(|at| now.saturating_duration_since(at) < self.window)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.completed_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Render,
    /// No configuration is visible yet but setup just completed.
    RenderAfterRecentSetup,
    RedirectToSetup,
}

impl GateDecision {
    pub fn allows_render(self) -> bool {
        !matches!(self, GateDecision::RedirectToSetup)
    }
}

/// Setup counts as completed once a configuration entry exists.
pub fn decide(configuration_exists: bool, recent: &RecentCompletion) -> GateDecision {
    if configuration_exists {
        GateDecision::Render
    } else if recent.take_recent() {
        GateDecision::RenderAfterRecentSetup
    } else {
        GateDecision::RedirectToSetup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_configuration_always_renders() {
        let recent = RecentCompletion::new(Duration::from_secs(30));
        assert_eq!(decide(true, &recent), GateDecision::Render);
    }

    #[test]
    fn missing_configuration_redirects() {
        let recent = RecentCompletion::new(Duration::from_secs(30));
        let decision = decide(false, &recent);
        assert_eq!(decision, GateDecision::RedirectToSetup);
        assert!(!decision.allows_render());
    }

    #[test]
    fn recent_setup_suppresses_one_redirect() {
        let recent = RecentCompletion::new(Duration::from_secs(30));
        recent.mark();

        assert_eq!(decide(false, &recent), GateDecision::RenderAfterRecentSetup);
        assert_eq!(decide(false, &recent), GateDecision::RedirectToSetup);
    }

    #[test]
    fn stale_completion_is_ignored() {
        let recent = RecentCompletion::new(Duration::from_secs(30));
        let start = Instant::now();
        recent.mark_at(start);

        assert!(recent.is_recent_at(start + Duration::from_secs(29)));
        assert!(!recent.is_recent_at(start + Duration::from_secs(31)));
        assert!(!recent.take_recent_at(start + Duration::from_secs(31)));
        assert!(!recent.is_recent_at(start));
    }
}
