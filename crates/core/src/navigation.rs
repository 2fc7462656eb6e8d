//! App mode machine and its reset policy.
//!
//! The session layer asks [`Navigator::transition`] what a mode change
//! implies and then performs the side effects: tearing down media when
//! the detection screen is left, and clearing transient detection state
//! when a reset mode is entered.

use serde::Serialize;

/// Top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AppMode {
    #[default]
    Home,
    Catalog,
    Detecting,
    ResultReview,
    Report,
    Community,
    Settings,
}

/// Modes whose entry wipes transient detection state.
pub const RESET_MODES: &[AppMode] = &[
    AppMode::Home,
    AppMode::Report,
    AppMode::Community,
    AppMode::Settings,
];

impl AppMode {
    /// Entering this mode clears selected input, result, error and live
    /// flag, and closes the camera.
    pub fn resets_session(self) -> bool {
        RESET_MODES.contains(&self)
    }
}

/// What the session must do for a mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: AppMode,
    pub to: AppMode,
    /// Clear transient detection state.
    pub reset: bool,
    /// Release the camera and cancel live sampling.
    pub release_media: bool,
}

impl Transition {
    /// A transition to the mode we are already in.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}

/// Tracks the current mode.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: AppMode,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> AppMode {
        self.current
    }

    /// Move to `to` and describe the side effects the caller owes.
    ///
    /// Re-entering the current mode yields a no-op transition with no
    /// side effects.
    pub fn transition(&mut self, to: AppMode) -> Transition {
        let from = self.current;
        self.current = to;

        if from == to {
            return Transition {
                from,
                to,
                reset: false,
                release_media: false,
            };
        }

        let reset = to.resets_session();
        Transition {
            from,
            to,
            reset,
            release_media: reset || from == AppMode::Detecting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_modes() {
        assert!(AppMode::Home.resets_session());
        assert!(AppMode::Report.resets_session());
        assert!(AppMode::Community.resets_session());
        assert!(AppMode::Settings.resets_session());
        assert!(!AppMode::Detecting.resets_session());
        assert!(!AppMode::ResultReview.resets_session());
        assert!(!AppMode::Catalog.resets_session());
    }

    #[test]
    fn detecting_to_result_review_keeps_state_but_releases_media() {
        let mut nav = Navigator::new();
        nav.transition(AppMode::Detecting);
        let t = nav.transition(AppMode::ResultReview);
        assert!(!t.reset);
        assert!(t.release_media);
    }

    #[test]
    fn result_review_back_to_detecting_is_state_preserving() {
        let mut nav = Navigator::new();
        nav.transition(AppMode::Detecting);
        nav.transition(AppMode::ResultReview);
        let t = nav.transition(AppMode::Detecting);
        assert!(!t.reset);
        assert!(!t.release_media);
        assert_eq!(nav.current(), AppMode::Detecting);
    }

    #[test]
    fn entering_report_resets_from_anywhere() {
        for from in [AppMode::Home, AppMode::Detecting, AppMode::ResultReview, AppMode::Catalog] {
            let mut nav = Navigator { current: from };
            let t = nav.transition(AppMode::Report);
            assert!(t.reset, "from {from:?}");
            assert!(t.release_media);
        }
    }

    #[test]
    fn same_mode_is_noop() {
        let mut nav = Navigator::new();
        let t = nav.transition(AppMode::Home);
        assert!(t.is_noop());
        assert!(!t.reset);
    }
}
