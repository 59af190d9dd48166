//! Navigation stack with modal occlusion
//!
//! LIFO history of pushed windows; the top entry is the active one. Pushing a
//! non-modal window hides the previous top, pushing a modal one only disables
//! its input so it stays visible underneath. Popping restores the new top.
//!
//! The stack only arranges windows. Releasing a popped window (destroy or
//! pool return) is delegated to a [`StackHost`], so `go_back` never leaves a
//! half-destroyed window behind.

use std::fmt;

use casement_core::{WindowHandle, WindowRegistry, WindowState};

/// Owner of the windows the stack arranges
pub trait StackHost {
    fn windows(&mut self) -> &mut WindowRegistry;

    /// Fully release a window that has been popped off the stack
    fn release(&mut self, handle: WindowHandle);
}

/// Integrity problem found by [`WindowStack::validate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackIssue {
    /// The same window occupies more than one slot
    Duplicate(String),
    /// A slot points at a window that is gone or destroyed
    Destroyed(String),
    /// A window below the top is visible without a modal above it
    UnexpectedlyShown(String),
}

impl fmt::Display for StackIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackIssue::Duplicate(id) => write!(f, "window '{}' appears more than once", id),
            StackIssue::Destroyed(id) => write!(f, "window '{}' is destroyed but still stacked", id),
            StackIssue::UnexpectedlyShown(id) => {
                write!(f, "window '{}' is shown below a non-modal window", id)
            }
        }
    }
}

/// LIFO navigation history
#[derive(Debug, Default, Clone)]
pub struct WindowStack {
    entries: Vec<WindowHandle>,
}

impl WindowStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active window
    pub fn top(&self) -> Option<WindowHandle> {
        self.entries.last().copied()
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.entries.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from bottom (root) to top
    pub fn entries(&self) -> &[WindowHandle] {
        &self.entries
    }

    /// Push a window on top
    ///
    /// Returns `false` (and changes nothing) if the window is already stacked
    /// or unknown. The previous top is hidden, or only input-disabled when the
    /// new window is modal.
    pub fn push(&mut self, handle: WindowHandle, windows: &mut WindowRegistry) -> bool {
        if self.contains(handle) {
            log::warn!(
                "Ignoring push of '{}': already on the window stack",
                windows.id_of(handle).unwrap_or("<stale>")
            );
            return false;
        }
        let Some(modal) = windows.get(handle).map(|w| w.is_modal()) else {
            log::warn!("Ignoring push of unregistered window {}", handle);
            return false;
        };

        if modal {
            if let Some(previous) = self.top().and_then(|top| windows.get_mut(top)) {
                previous.set_input_enabled(false);
            }
        } else {
            // The old top plus anything a modal chain kept visible beneath it
            for entry in self.visible_run(windows) {
                let Some(window) = windows.get_mut(entry) else {
                    continue;
                };
                if let Err(e) = window.hide() {
                    log::warn!("Could not hide '{}' under new top: {}", window.id(), e);
                }
            }
        }

        self.entries.push(handle);
        log::debug!(
            "Stack push '{}' (depth {})",
            windows.id_of(handle).unwrap_or("<stale>"),
            self.entries.len()
        );
        true
    }

    /// Remove and return the top window, restoring the one beneath
    pub fn pop(&mut self, windows: &mut WindowRegistry) -> Option<WindowHandle> {
        let popped = self.entries.pop()?;
        log::debug!(
            "Stack pop '{}' (depth {})",
            windows.id_of(popped).unwrap_or("<stale>"),
            self.entries.len()
        );
        self.restore_top(windows);
        Some(popped)
    }

    /// Remove a window wherever it sits; restores the top if it changed
    pub fn remove(&mut self, handle: WindowHandle, windows: &mut WindowRegistry) -> bool {
        self.remove_many(&[handle], windows) > 0
    }

    /// Remove several windows at once; restores the top if it changed
    ///
    /// Returns how many entries were removed.
    pub fn remove_many(&mut self, handles: &[WindowHandle], windows: &mut WindowRegistry) -> usize {
        let old_top = self.top();
        let before = self.entries.len();
        self.entries.retain(|entry| !handles.contains(entry));
        let removed = before - self.entries.len();
        if removed > 0 && self.top() != old_top {
            self.restore_top(windows);
        }
        removed
    }

    /// Drop entries whose window no longer exists, without restoring anything
    pub fn purge_stale(&mut self, windows: &WindowRegistry) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| windows.contains(*entry));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Shown entries from the top down, continuing only past shown modals
    fn visible_run(&self, windows: &WindowRegistry) -> Vec<WindowHandle> {
        let mut run = Vec::new();
        for entry in self.entries.iter().rev() {
            let Some(window) = windows.get(*entry) else {
                break;
            };
            if !window.is_shown() {
                break;
            }
            run.push(*entry);
            if !window.is_modal() {
                break;
            }
        }
        run
    }

    /// Re-show the top with input, then the windows its modal chain keeps
    /// visible, with input disabled
    fn restore_top(&mut self, windows: &mut WindowRegistry) {
        for (depth, entry) in self.entries.iter().rev().enumerate() {
            let Some(window) = windows.get_mut(*entry) else {
                break;
            };
            window.set_input_enabled(depth == 0);
            if window.state() != WindowState::Shown
                && let Err(e) = window.show()
            {
                log::warn!("Could not re-show '{}' on the stack: {}", window.id(), e);
                break;
            }
            if !window.is_modal() {
                break;
            }
        }
    }

    // === Navigation ===

    /// Pop the top window and have the host release it
    ///
    /// The root window is never popped: returns `false` with one entry or less.
    pub fn go_back(&mut self, host: &mut impl StackHost) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        let Some(popped) = self.pop(host.windows()) else {
            return false;
        };

        // Stacked descendants leave the stack before anything is released
        let doomed = host.windows().subtree(popped);
        self.remove_many(&doomed, host.windows());
        host.release(popped);
        true
    }

    /// Pop and release until only the root remains
    ///
    /// Returns `false` if the stack is empty.
    pub fn go_back_to_root(&mut self, host: &mut impl StackHost) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        while self.go_back(host) {}
        true
    }

    /// Pop and release until the window with `id` is on top
    ///
    /// Returns `false`, popping nothing, if no stacked window has that id.
    pub fn go_back_to_window(&mut self, id: &str, host: &mut impl StackHost) -> bool {
        let Some(target) = host.windows().find(id).filter(|h| self.contains(*h)) else {
            log::debug!("go_back_to_window: '{}' is not on the stack", id);
            return false;
        };
        while self.top().is_some_and(|top| top != target) && self.contains(target) {
            if !self.go_back(host) {
                break;
            }
        }
        self.top() == Some(target)
    }

    // === Integrity ===

    /// Check stack invariants
    ///
    /// No duplicates, no destroyed entries, and below the top only windows
    /// covered by a chain of shown modals may themselves be shown.
    pub fn validate(&self, windows: &WindowRegistry) -> Vec<StackIssue> {
        let mut issues = Vec::new();
        let name = |handle: WindowHandle| {
            windows
                .id_of(handle)
                .map(str::to_string)
                .unwrap_or_else(|| handle.to_string())
        };

        for (i, entry) in self.entries.iter().enumerate() {
            if self.entries[..i].contains(entry) {
                issues.push(StackIssue::Duplicate(name(*entry)));
            }
            match windows.get(*entry) {
                Some(window) if window.state() != WindowState::Destroyed => {}
                _ => issues.push(StackIssue::Destroyed(name(*entry))),
            }
        }

        // Walk down from the top: visibility is allowed while the window above is a shown modal
        let mut covered_by_modal = true;
        for entry in self.entries.iter().rev() {
            let Some(window) = windows.get(*entry) else {
                covered_by_modal = false;
                continue;
            };
            if window.is_shown() && !covered_by_modal {
                issues.push(StackIssue::UnexpectedlyShown(window.id().to_string()));
            }
            covered_by_modal = window.is_shown() && window.is_modal();
        }

        issues
    }

    pub fn is_valid(&self, windows: &WindowRegistry) -> bool {
        self.validate(windows).is_empty()
    }
}
