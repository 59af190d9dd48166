//! Window manager: the orchestrator the host loop talks to
//!
//! Owns the live window registry and composes the pool, focus manager,
//! event router and navigation stack into one API. The host drives it once
//! per frame:
//!
//! ```ignore
//! manager.handle_global_events(&events);
//! manager.update(dt);
//! manager.draw(&mut surface);
//! ```

use casement_config::Config;
use casement_core::{
    Color, InputEvent, Payload, Rect, Surface, Window, WindowArgs, WindowClass, WindowError,
    WindowHandle, WindowRegistry,
};

use crate::managers::event_router::{EventRouter, GlobalListener, MessagePriority};
use crate::managers::focus_manager::FocusManager;
use crate::pool::{PoolReturn, WindowPool};
use crate::state::{StackHost, StackIssue, WindowStack};

/// Custom "back" handler consulted before the active window on Escape
pub type EscapeHandler = Box<dyn FnMut() -> bool>;

/// UI toolkit pass-through; sees every event first and cannot consume it
pub type ToolkitHook = Box<dyn FnMut(&InputEvent)>;

/// Everything except the stack, so the stack can call back into it
struct ManagerCore {
    windows: WindowRegistry,
    pool: WindowPool,
    focus: FocusManager,
    router: EventRouter,
}

impl StackHost for ManagerCore {
    fn windows(&mut self) -> &mut WindowRegistry {
        &mut self.windows
    }

    fn release(&mut self, handle: WindowHandle) {
        self.release_subtree(handle);
    }
}

impl ManagerCore {
    /// Take `handle` and its descendants out of the registry, children first,
    /// offering each to the pool and destroying whatever it rejects
    fn release_subtree(&mut self, handle: WindowHandle) -> usize {
        let mut released = 0;
        for h in self.windows.subtree(handle) {
            let Some(window) = self.windows.take(h) else {
                continue;
            };
            released += 1;
            match self.pool.return_window(window) {
                PoolReturn::Pooled => {}
                PoolReturn::Rejected { mut window, reason } => {
                    log::debug!("Destroying '{}' outright: {}", window.id(), reason);
                    window.destroy();
                }
            }
        }
        self.focus.cleanup_destroyed_windows(&self.windows);
        released
    }

    /// Drop a focus lock whose holder is no longer visible
    fn release_hidden_lock(&mut self) {
        if let Some(locked) = self.focus.locked_window()
            && !self.windows.get(locked).is_some_and(Window::is_shown)
        {
            self.focus.unlock_focus();
        }
    }
}

/// Root orchestrator for window lifecycle, navigation, focus and messaging
pub struct WindowManager {
    stack: WindowStack,
    core: ManagerCore,
    escape_handlers: Vec<EscapeHandler>,
    toolkit_hook: Option<ToolkitHook>,
    viewport: Option<Rect>,
    running: bool,
    next_id: u64,
    dim_alpha: f32,
    optimize_interval: Option<f32>,
    optimize_elapsed: f32,
}

impl std::fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowManager")
            .field("windows", &self.core.windows)
            .field("stack", &self.stack)
            .field("focus", &self.core.focus)
            .field("router", &self.core.router)
            .field("pool", &self.core.pool)
            .field("running", &self.running)
            .finish()
    }
}

impl Default for WindowManager {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl WindowManager {
    /// Create a manager sized from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            stack: WindowStack::new(),
            core: ManagerCore {
                windows: WindowRegistry::new(),
                pool: WindowPool::new(config.pool.max_pool_size),
                focus: FocusManager::new(config.focus.history_capacity),
                router: EventRouter::new(config.messaging.max_queue_size),
            },
            escape_handlers: Vec::new(),
            toolkit_hook: None,
            viewport: None,
            running: false,
            next_id: 0,
            dim_alpha: config.overlay.dim_alpha,
            optimize_interval: config.pool.optimize_interval_secs,
            optimize_elapsed: 0.0,
        }
    }

    // === Host lifecycle ===

    /// Record the drawable area and start accepting frames
    pub fn initialize(&mut self, viewport: Rect) {
        self.viewport = Some(viewport);
        self.running = true;
        log::info!(
            "Window manager initialized ({}x{})",
            viewport.width,
            viewport.height
        );
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Destroy every window, drain queues and empty the pool
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.stack.clear();

        // Every live window, not only roots: each subtree walk goes children first
        let mut destroyed = 0;
        for start in self.core.windows.handles() {
            for handle in self.core.windows.subtree(start) {
                if let Some(mut window) = self.core.windows.take(handle) {
                    window.destroy();
                    destroyed += 1;
                }
            }
        }

        let dropped = self.core.router.clear_queues();
        self.core.focus.reset();
        let discarded = self.core.pool.clear();

        if self.running {
            log::info!(
                "Window manager shut down: {} windows destroyed, {} messages dropped, {} pooled discarded",
                destroyed,
                dropped,
                discarded
            );
        }
        self.running = false;
    }

    // === Lifecycle ===

    /// Create and register a window of class `W`
    ///
    /// A missing id is generated from the class name. The instance comes
    /// from the pool when one is free.
    pub fn create_window<W: WindowClass>(
        &mut self,
        id: Option<&str>,
        parent: Option<WindowHandle>,
        args: &WindowArgs,
    ) -> Result<WindowHandle, WindowError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self.generate_id(W::class_name()),
        };
        if self.core.windows.find(&id).is_some() {
            return Err(WindowError::DuplicateId(id));
        }
        if let Some(parent) = parent
            && !self.core.windows.contains(parent)
        {
            return Err(WindowError::NotRegistered(parent.to_string()));
        }

        let (window, reused) = self.core.pool.get_window::<W>(&id, args);
        let handle = self.core.windows.insert(window)?;
        if let Some(parent) = parent {
            self.core.windows.attach_child(parent, handle)?;
        }

        log::debug!(
            "Created {} '{}'{}",
            W::class_name(),
            id,
            if reused { " from pool" } else { "" }
        );
        Ok(handle)
    }

    /// Show a window, optionally pushing it on the stack, and focus it
    ///
    /// Modal windows take the focus lock.
    pub fn show_window(&mut self, handle: WindowHandle, push_to_stack: bool) -> Result<(), WindowError> {
        let window = self.registered_mut(handle)?;
        window.show()?;
        let modal = window.is_modal();

        if push_to_stack && !self.stack.contains(handle) {
            self.stack.push(handle, &mut self.core.windows);
        }

        let core = &mut self.core;
        core.release_hidden_lock();
        if modal {
            core.focus.lock_focus(Some(handle), &core.windows);
        } else if !core.focus.set_focus(Some(handle), &core.windows) {
            log::debug!(
                "'{}' shown without focus",
                core.windows.id_of(handle).unwrap_or("<stale>")
            );
        }
        Ok(())
    }

    /// Hide a window, optionally removing it from the stack, and refocus
    pub fn hide_window(&mut self, handle: WindowHandle, remove_from_stack: bool) -> Result<(), WindowError> {
        self.registered_mut(handle)?.hide()?;

        if remove_from_stack {
            self.stack.remove(handle, &mut self.core.windows);
        }

        let core = &mut self.core;
        if core.focus.locked_window() == Some(handle) {
            core.focus.unlock_focus();
        }
        if core.focus.is_focused(handle) {
            core.focus.set_focus(None, &core.windows);
        }
        self.refocus_top();
        Ok(())
    }

    /// Hide (when shown) and then destroy a window
    pub fn close_window(&mut self, handle: WindowHandle) -> Result<(), WindowError> {
        if self.registered_mut(handle)?.is_shown() {
            self.hide_window(handle, true)?;
        }
        self.destroy_window(handle)
    }

    /// Destroy a window and its descendants
    ///
    /// The subtree leaves the stack before any of it is offered to the pool;
    /// instances the pool rejects are destroyed outright.
    pub fn destroy_window(&mut self, handle: WindowHandle) -> Result<(), WindowError> {
        self.registered_mut(handle)?;

        let doomed = self.core.windows.subtree(handle);
        self.stack.remove_many(&doomed, &mut self.core.windows);
        let released = self.core.release_subtree(handle);
        log::debug!("Released {} window(s) rooted at {}", released, handle);

        self.refocus_top();
        Ok(())
    }

    // === Navigation ===

    /// Pop and release the top window; the root is never popped
    pub fn go_back(&mut self) -> bool {
        let moved = self.stack.go_back(&mut self.core);
        if moved {
            self.refocus_top();
        }
        moved
    }

    pub fn go_back_to_root(&mut self) -> bool {
        let moved = self.stack.go_back_to_root(&mut self.core);
        self.refocus_top();
        moved
    }

    /// Unwind the stack until the window with `id` is on top
    ///
    /// Returns `false` without popping anything if it is not stacked.
    pub fn go_back_to_window(&mut self, id: &str) -> bool {
        let reached = self.stack.go_back_to_window(id, &mut self.core);
        self.refocus_top();
        reached
    }

    pub fn validate_stack(&self) -> Vec<StackIssue> {
        self.stack.validate(&self.core.windows)
    }

    // === Frame ===

    /// Process one frame's input, then deliver queued messages
    ///
    /// Per event: toolkit pass-through, then Escape handling (custom handlers,
    /// the active window's `handle_escape`, then `go_back`), then routing to
    /// the active window. A handled Escape is not routed further. Returns the
    /// number of events consumed.
    pub fn handle_global_events(&mut self, events: &[InputEvent]) -> usize {
        let mut consumed = 0;

        for event in events {
            if let Some(hook) = self.toolkit_hook.as_mut() {
                hook(event);
            }

            if event.is_escape_press() && self.handle_escape() {
                consumed += 1;
                continue;
            }

            let target = self.active_window();
            if self.core.router.route_event(event, target, &mut self.core.windows) {
                consumed += 1;
            }
        }

        self.core.router.process_message_queue(&mut self.core.windows);
        consumed
    }

    fn handle_escape(&mut self) -> bool {
        if self.escape_handlers.iter_mut().any(|handler| handler()) {
            log::debug!("Escape handled by custom handler");
            return true;
        }

        if let Some(active) = self.active_window()
            && let Some(window) = self.core.windows.get_mut(active)
            && window.is_shown()
            && window.is_input_enabled()
            && window.handle_escape()
        {
            log::debug!("Escape handled by '{}'", window.id());
            return true;
        }

        self.go_back()
    }

    /// Update every shown window and run periodic housekeeping
    pub fn update(&mut self, dt: f32) {
        for handle in self.core.windows.handles() {
            if let Some(window) = self.core.windows.get_mut(handle)
                && window.is_shown()
            {
                window.update(dt);
            }
        }

        self.core.focus.cleanup_destroyed_windows(&self.core.windows);

        if let Some(interval) = self.optimize_interval {
            self.optimize_elapsed += dt;
            if self.optimize_elapsed >= interval {
                self.optimize_elapsed = 0.0;
                self.core.pool.optimize_pools();
            }
        }
    }

    /// Draw shown windows
    ///
    /// A shown modal on top of the stack is drawn alone over a dimming
    /// overlay. Otherwise off-stack windows are drawn first, then the stack
    /// from bottom to top.
    pub fn draw(&self, surface: &mut dyn Surface) {
        if let Some(modal) = self
            .stack
            .top()
            .and_then(|top| self.core.windows.get(top))
            .filter(|window| window.is_shown() && window.is_modal())
        {
            let bounds = self.viewport.unwrap_or_else(|| surface.bounds());
            surface.fill_rect(bounds, Color::rgba(0.0, 0.0, 0.0, self.dim_alpha));
            modal.draw(surface);
            return;
        }

        for (handle, window) in self.core.windows.iter() {
            if window.is_shown() && !self.stack.contains(handle) {
                window.draw(surface);
            }
        }
        for handle in self.stack.entries() {
            if let Some(window) = self.core.windows.get(*handle)
                && window.is_shown()
            {
                window.draw(surface);
            }
        }
    }

    // === Messaging ===

    pub fn send_message(
        &mut self,
        sender_id: &str,
        receiver_id: &str,
        message_type: &str,
        payload: Payload,
        priority: MessagePriority,
    ) -> bool {
        self.core
            .router
            .send_message(sender_id, receiver_id, message_type, payload, priority)
    }

    /// Send a copy of a message to every live window except the sender
    pub fn broadcast_message(
        &mut self,
        sender_id: &str,
        message_type: &str,
        payload: &Payload,
        priority: MessagePriority,
    ) -> usize {
        let core = &mut self.core;
        core.router
            .broadcast_message(sender_id, core.windows.ids(), message_type, payload, priority)
    }

    /// Deliver queued messages now instead of at the end of the next frame
    pub fn process_message_queue(&mut self) -> usize {
        self.core.router.process_message_queue(&mut self.core.windows)
    }

    // === Hooks ===

    pub fn add_escape_handler(&mut self, handler: EscapeHandler) {
        self.escape_handlers.push(handler);
    }

    pub fn set_toolkit_hook(&mut self, hook: ToolkitHook) {
        self.toolkit_hook = Some(hook);
    }

    pub fn add_global_listener(&mut self, listener: GlobalListener) {
        self.core.router.add_global_listener(listener);
    }

    // === Accessors ===

    /// Window receiving input: the focused window, else the stack top
    pub fn active_window(&self) -> Option<WindowHandle> {
        self.core
            .focus
            .current()
            .filter(|handle| self.core.windows.contains(*handle))
            .or_else(|| self.stack.top())
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&Window> {
        self.core.windows.get(handle)
    }

    pub fn window_mut(&mut self, handle: WindowHandle) -> Option<&mut Window> {
        self.core.windows.get_mut(handle)
    }

    pub fn find(&self, id: &str) -> Option<WindowHandle> {
        self.core.windows.find(id)
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.core.windows
    }

    pub fn window_count(&self) -> usize {
        self.core.windows.len()
    }

    pub fn stack(&self) -> &WindowStack {
        &self.stack
    }

    pub fn focus(&self) -> &FocusManager {
        &self.core.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusManager {
        &mut self.core.focus
    }

    /// Move focus, subject to the focus lock
    pub fn set_focus(&mut self, handle: Option<WindowHandle>) -> bool {
        let core = &mut self.core;
        core.focus.set_focus(handle, &core.windows)
    }

    pub fn router(&self) -> &EventRouter {
        &self.core.router
    }

    pub fn pool(&self) -> &WindowPool {
        &self.core.pool
    }

    /// Trim idle pooled instances now
    pub fn optimize_pools(&mut self) -> usize {
        self.core.pool.optimize_pools()
    }

    pub fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    // === Internals ===

    fn registered_mut(&mut self, handle: WindowHandle) -> Result<&mut Window, WindowError> {
        self.core
            .windows
            .get_mut(handle)
            .ok_or_else(|| WindowError::NotRegistered(handle.to_string()))
    }

    fn generate_id(&mut self, class_name: &str) -> String {
        let prefix = class_name.to_lowercase();
        loop {
            self.next_id += 1;
            let id = format!("{}_{}", prefix, self.next_id);
            if self.core.windows.find(&id).is_none() {
                return id;
            }
        }
    }

    /// Focus the stack top, re-arming the lock when it is a shown modal
    fn refocus_top(&mut self) {
        let core = &mut self.core;
        core.focus.cleanup_destroyed_windows(&core.windows);
        core.release_hidden_lock();

        let Some(top) = self.stack.top() else {
            return;
        };
        match core.windows.get(top) {
            Some(window) if window.is_shown() && window.is_modal() => {
                core.focus.lock_focus(Some(top), &core.windows);
            }
            Some(window) if window.is_shown() => {
                core.focus.set_focus(Some(top), &core.windows);
            }
            _ => {}
        }
    }
}
