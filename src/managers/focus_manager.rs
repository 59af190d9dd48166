//! Input focus arbitration
//!
//! Single source of truth for which window receives keyboard/pointer input.
//! A focus lock pins input to one window (a modal dialog) so background
//! windows cannot take focus back while it is open.

use std::collections::VecDeque;
use std::time::Instant;

use casement_core::{WindowHandle, WindowRegistry, WindowState};

/// Immutable record of a focus transition, kept for diagnostics only
#[derive(Debug, Clone, PartialEq)]
pub struct FocusChange {
    pub old_window_id: Option<String>,
    pub new_window_id: Option<String>,
    pub timestamp: Instant,
}

/// Callback notified after every focus change
pub type FocusListener = Box<dyn FnMut(&FocusChange) -> anyhow::Result<()>>;

/// Tracks the focused window, the focus lock and recent focus history
pub struct FocusManager {
    current: Option<WindowHandle>,
    /// Id of `current`, kept so it can be reported after the window is gone
    current_id: Option<String>,
    locked: Option<WindowHandle>,
    history: VecDeque<FocusChange>,
    history_capacity: usize,
    listeners: Vec<FocusListener>,
    listener_errors: u64,
}

impl std::fmt::Debug for FocusManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusManager")
            .field("current", &self.current)
            .field("locked", &self.locked)
            .field("history", &self.history.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for FocusManager {
    fn default() -> Self {
        Self::new(100)
    }
}

impl FocusManager {
    /// Create a focus manager keeping at most `history_capacity` changes
    pub fn new(history_capacity: usize) -> Self {
        Self {
            current: None,
            current_id: None,
            locked: None,
            history: VecDeque::with_capacity(history_capacity.min(1024)),
            history_capacity,
            listeners: Vec::new(),
            listener_errors: 0,
        }
    }

    /// Currently focused window
    pub fn current(&self) -> Option<WindowHandle> {
        self.current
    }

    pub fn is_focused(&self, handle: WindowHandle) -> bool {
        self.current == Some(handle)
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Window focus is pinned to, if any
    pub fn locked_window(&self) -> Option<WindowHandle> {
        self.locked
    }

    /// Whether `handle` may take focus right now
    ///
    /// Destroyed or unknown windows never can. While locked only the lock
    /// holder can; otherwise the window must be shown.
    pub fn can_receive_focus(&self, handle: WindowHandle, windows: &WindowRegistry) -> bool {
        let Some(window) = windows.get(handle) else {
            return false;
        };
        if window.state() == WindowState::Destroyed {
            return false;
        }
        match self.locked {
            Some(locked) => locked == handle,
            None => window.state() == WindowState::Shown,
        }
    }

    /// Move focus to `target` (or clear it with `None`)
    ///
    /// Returns `false` when focus is locked to another window or the target
    /// cannot receive focus. Focusing the current window again is accepted
    /// without recording a change.
    pub fn set_focus(&mut self, target: Option<WindowHandle>, windows: &WindowRegistry) -> bool {
        if let Some(locked) = self.locked
            && target != Some(locked)
        {
            log::debug!(
                "Focus change to {:?} rejected: locked to '{}'",
                target.and_then(|h| windows.id_of(h)),
                windows.id_of(locked).unwrap_or("<stale>")
            );
            return false;
        }

        if let Some(handle) = target
            && !self.can_receive_focus(handle, windows)
        {
            log::debug!(
                "Focus change rejected: '{}' cannot receive focus",
                windows.id_of(handle).unwrap_or("<stale>")
            );
            return false;
        }

        if self.current == target {
            return true;
        }

        self.apply(target, windows);
        true
    }

    /// Pin focus to `target`, or to the current focus when `None`
    ///
    /// Replaces any existing lock and moves focus to the new holder.
    /// Returns `false` if there is nothing to lock to or the target is gone.
    pub fn lock_focus(&mut self, target: Option<WindowHandle>, windows: &WindowRegistry) -> bool {
        let Some(handle) = target.or(self.current) else {
            log::debug!("Focus lock requested with no target and no current focus");
            return false;
        };
        match windows.get(handle) {
            Some(window) if window.state() != WindowState::Destroyed => {}
            _ => return false,
        }

        self.locked = Some(handle);
        if self.current != Some(handle) {
            self.apply(Some(handle), windows);
        }
        log::debug!("Focus locked to '{}'", windows.id_of(handle).unwrap_or("<stale>"));
        true
    }

    /// Release the lock without changing focus
    pub fn unlock_focus(&mut self) {
        if self.locked.take().is_some() {
            log::debug!("Focus unlocked");
        }
    }

    /// Drop references to windows destroyed behind the manager's back
    ///
    /// Returns `true` if focus or the lock was cleared.
    pub fn cleanup_destroyed_windows(&mut self, windows: &WindowRegistry) -> bool {
        let is_gone = |handle: WindowHandle| {
            windows
                .get(handle)
                .is_none_or(|w| w.state() == WindowState::Destroyed)
        };

        let mut changed = false;
        if self.locked.is_some_and(is_gone) {
            log::debug!("Clearing focus lock held by a destroyed window");
            self.locked = None;
            changed = true;
        }
        if self.current.is_some_and(is_gone) {
            log::debug!("Clearing focus held by a destroyed window");
            let change = FocusChange {
                old_window_id: self.current_id.take(),
                new_window_id: None,
                timestamp: Instant::now(),
            };
            self.current = None;
            self.record(change);
            changed = true;
        }
        changed
    }

    /// Forget focus and lock entirely
    pub fn reset(&mut self) {
        self.current = None;
        self.current_id = None;
        self.locked = None;
    }

    pub fn add_listener(&mut self, listener: FocusListener) {
        self.listeners.push(listener);
    }

    /// Recent focus changes, oldest first
    pub fn history(&self) -> impl Iterator<Item = &FocusChange> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Number of listener failures caught so far
    pub fn listener_errors(&self) -> u64 {
        self.listener_errors
    }

    fn apply(&mut self, target: Option<WindowHandle>, windows: &WindowRegistry) {
        let change = FocusChange {
            old_window_id: self.current.and_then(|h| windows.id_of(h)).map(str::to_string),
            new_window_id: target.and_then(|h| windows.id_of(h)).map(str::to_string),
            timestamp: Instant::now(),
        };
        log::debug!(
            "Focus: {} -> {}",
            change.old_window_id.as_deref().unwrap_or("<none>"),
            change.new_window_id.as_deref().unwrap_or("<none>")
        );
        self.current = target;
        self.current_id = change.new_window_id.clone();
        self.record(change);
    }

    fn record(&mut self, change: FocusChange) {
        for listener in &mut self.listeners {
            if let Err(e) = listener(&change) {
                self.listener_errors += 1;
                log::error!("Focus listener failed: {:#}", e);
            }
        }

        self.history.push_back(change);
        while self.history.len() > self.history_capacity {
            self.history.pop_front();
        }
    }
}
