//! Live window registry
//!
//! Windows live in a dense slot vector addressed by [`WindowHandle`], a
//! generational index. Removing a window bumps its slot's generation, so any
//! handle still pointing at the old occupant resolves to `None` instead of
//! silently aliasing whatever window reuses the slot.

use std::collections::HashMap;
use std::fmt;

use crate::error::WindowError;
use crate::window::Window;

/// Generational handle to a registered window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle {
    index: u32,
    generation: u32,
}

impl WindowHandle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

struct Slot {
    generation: u32,
    window: Option<Window>,
}

/// Arena of live windows with id lookup and parent/child bookkeeping
#[derive(Default)]
pub struct WindowRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_id: HashMap<String, WindowHandle>,
}

impl fmt::Debug for WindowRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowRegistry")
            .field("live", &self.by_id.len())
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .finish()
    }
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a window under its id
    pub fn insert(&mut self, window: Window) -> Result<WindowHandle, WindowError> {
        if self.by_id.contains_key(window.id()) {
            return Err(WindowError::DuplicateId(window.id().to_string()));
        }

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.window.is_none(), "free list points at an occupied slot");
                WindowHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    window: None,
                });
                WindowHandle {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };

        self.by_id.insert(window.id().to_string(), handle);
        self.slots[handle.index as usize].window = Some(window);
        Ok(handle)
    }

    /// Remove a window, unlinking it from its parent
    ///
    /// The slot's generation is bumped so `handle` goes stale. The window's
    /// own children list is left as-is; callers remove the subtree first.
    pub fn take(&mut self, handle: WindowHandle) -> Option<Window> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let mut window = slot.window.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.by_id.remove(window.id());

        if let Some(parent) = window.parent() {
            if let Some(parent_window) = self.get_mut(parent) {
                parent_window.remove_child(handle);
            }
            window.set_parent(None);
        }
        // Children left behind become roots rather than point at a dead slot
        for child in window.children().to_vec() {
            if let Some(child_window) = self.get_mut(child) {
                child_window.set_parent(None);
            }
        }
        Some(window)
    }

    pub fn get(&self, handle: WindowHandle) -> Option<&Window> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.window.as_ref())
    }

    pub fn get_mut(&mut self, handle: WindowHandle) -> Option<&mut Window> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.window.as_mut())
    }

    /// Look up a live window by id
    pub fn find(&self, id: &str) -> Option<WindowHandle> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Id of a live window, for logging and messages
    pub fn id_of(&self, handle: WindowHandle) -> Option<&str> {
        self.get(handle).map(Window::id)
    }

    /// Link `child` under `parent`
    pub fn attach_child(&mut self, parent: WindowHandle, child: WindowHandle) -> Result<(), WindowError> {
        if !self.contains(parent) {
            return Err(WindowError::NotRegistered(parent.to_string()));
        }
        let previous = match self.get_mut(child) {
            Some(window) => {
                let previous = window.parent();
                window.set_parent(Some(parent));
                previous
            }
            None => return Err(WindowError::NotRegistered(child.to_string())),
        };
        if let Some(previous) = previous.filter(|p| *p != parent)
            && let Some(old_parent) = self.get_mut(previous)
        {
            old_parent.remove_child(child);
        }
        if let Some(parent_window) = self.get_mut(parent) {
            parent_window.add_child(child);
        }
        Ok(())
    }

    /// `handle` and all of its descendants, children before parents
    ///
    /// Returns an empty list for a stale handle.
    pub fn subtree(&self, handle: WindowHandle) -> Vec<WindowHandle> {
        let mut order = Vec::new();
        if self.contains(handle) {
            self.collect_post_order(handle, &mut order);
        }
        order
    }

    fn collect_post_order(&self, handle: WindowHandle, order: &mut Vec<WindowHandle>) {
        if order.contains(&handle) {
            return;
        }
        if let Some(window) = self.get(handle) {
            for &child in window.children() {
                self.collect_post_order(child, order);
            }
            order.push(handle);
        }
    }

    /// Handles of every live window, in slot order
    pub fn handles(&self) -> Vec<WindowHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.window.is_some())
            .map(|(index, slot)| WindowHandle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    /// Ids of every live window
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WindowHandle, &Window)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.window.as_ref().map(|window| {
                (
                    WindowHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    window,
                )
            })
        })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
