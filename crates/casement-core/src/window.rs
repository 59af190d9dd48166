//! Window entity and lifecycle state machine
//!
//! ```text
//! Created --show--> Shown <--hide/show--> Hidden
//!    \                |                     /
//!     `----------> Destroyed <-------------'
//! ```
//!
//! `Destroyed` is terminal for a given identity. Parent/child links are
//! stored as registry handles; cascading destroy is driven by
//! [`crate::WindowRegistry::subtree`], which yields children before parents.

use std::any::Any;
use std::fmt;

use crate::behavior::{Payload, WindowArgs, WindowBehavior, WindowClass, WindowKind};
use crate::error::WindowError;
use crate::event::InputEvent;
use crate::registry::WindowHandle;
use crate::surface::Surface;

/// Lifecycle state of a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowState {
    Created,
    Shown,
    Hidden,
    Destroyed,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowState::Created => "created",
            WindowState::Shown => "shown",
            WindowState::Hidden => "hidden",
            WindowState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Window-specific event listener. Returns `true` to consume the event.
pub type EventListener = Box<dyn FnMut(&InputEvent) -> bool>;

/// One logical UI surface
pub struct Window {
    id: String,
    modal: bool,
    state: WindowState,
    kind: WindowKind,
    parent: Option<WindowHandle>,
    children: Vec<WindowHandle>,
    input_enabled: bool,
    listeners: Vec<EventListener>,
    behavior: Box<dyn WindowBehavior>,
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("kind", &self.kind.name())
            .field("modal", &self.modal)
            .field("state", &self.state)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("input_enabled", &self.input_enabled)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Window {
    /// Construct a fresh window of class `W`
    pub fn new<W: WindowClass>(id: impl Into<String>, args: &WindowArgs) -> Self {
        Self {
            id: id.into(),
            modal: args.modal,
            state: WindowState::Created,
            kind: WindowKind::of::<W>(),
            parent: None,
            children: Vec::new(),
            input_enabled: true,
            listeners: Vec::new(),
            behavior: Box::new(W::construct(args)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_modal(&self) -> bool {
        self.modal
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn is_shown(&self) -> bool {
        self.state == WindowState::Shown
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == WindowState::Destroyed
    }

    pub fn parent(&self) -> Option<WindowHandle> {
        self.parent
    }

    pub fn children(&self) -> &[WindowHandle] {
        &self.children
    }

    /// Whether the window currently accepts input (modal occlusion disables it)
    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        if self.input_enabled != enabled {
            log::debug!("Window '{}' input {}", self.id, if enabled { "enabled" } else { "disabled" });
        }
        self.input_enabled = enabled;
    }

    // === Lifecycle ===

    /// Show the window
    ///
    /// From `Created` the content hook runs once (skipped when visuals already
    /// exist, e.g. a recycled instance); from `Hidden` the visuals are
    /// re-shown instead of rebuilt. Showing a shown window is a no-op.
    pub fn show(&mut self) -> Result<(), WindowError> {
        match self.state {
            WindowState::Destroyed => {
                return Err(WindowError::invalid_state(&self.id, "show", self.state));
            }
            WindowState::Shown => return Ok(()),
            WindowState::Created => {
                if self.behavior.has_visuals() {
                    self.behavior.show_visuals();
                } else {
                    self.behavior.create();
                }
            }
            WindowState::Hidden => self.behavior.show_visuals(),
        }
        self.transition(WindowState::Shown);
        self.behavior.on_show();
        Ok(())
    }

    /// Hide the window, keeping its visuals allocated
    ///
    /// Hiding a hidden window is a no-op; hiding a window that was never
    /// shown or is destroyed is an error.
    pub fn hide(&mut self) -> Result<(), WindowError> {
        match self.state {
            WindowState::Shown => {}
            WindowState::Hidden => return Ok(()),
            WindowState::Created | WindowState::Destroyed => {
                return Err(WindowError::invalid_state(&self.id, "hide", self.state));
            }
        }
        self.behavior.hide_visuals();
        self.transition(WindowState::Hidden);
        self.behavior.on_hide();
        Ok(())
    }

    /// Destroy this window's own visuals and enter the terminal state
    ///
    /// Idempotent. Children are not touched here: callers walk
    /// [`crate::WindowRegistry::subtree`] so children go first. Parent and
    /// child links stay in place until the registry takes the window out, so
    /// a later cascade still reaches every descendant.
    pub fn destroy(&mut self) {
        if self.state == WindowState::Destroyed {
            return;
        }
        self.listeners.clear();
        self.behavior.destroy_visuals();
        self.transition(WindowState::Destroyed);
        self.behavior.on_destroy();
    }

    fn transition(&mut self, next: WindowState) {
        log::debug!("Window '{}' ({}): {} -> {}", self.id, self.kind.name(), self.state, next);
        self.state = next;
    }

    // === Events ===

    /// Run window-specific listeners. Returns `true` if one consumed the event.
    pub fn dispatch_listeners(&mut self, event: &InputEvent) -> bool {
        self.listeners.iter_mut().any(|listener| listener(event))
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        self.behavior.handle_event(event)
    }

    pub fn handle_escape(&mut self) -> bool {
        self.behavior.handle_escape()
    }

    pub fn add_event_listener(&mut self, listener: EventListener) {
        self.listeners.push(listener);
    }

    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver a message through the receiver capability
    ///
    /// Returns `None` when the window type has no message hook.
    pub fn receive_message(
        &mut self,
        sender: &str,
        message_type: &str,
        payload: &Payload,
    ) -> Option<anyhow::Result<()>> {
        self.behavior
            .as_receiver()
            .map(|receiver| receiver.receive_message(sender, message_type, payload))
    }

    // === Frame ===

    pub fn update(&mut self, dt: f32) {
        self.behavior.update(dt);
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        self.behavior.draw(surface);
    }

    // === Typed access ===

    /// Borrow the concrete behavior as `T`
    pub fn behavior<T: WindowBehavior>(&self) -> Option<&T> {
        let any: &dyn Any = &*self.behavior;
        any.downcast_ref::<T>()
    }

    /// Mutably borrow the concrete behavior as `T`
    pub fn behavior_mut<T: WindowBehavior>(&mut self) -> Option<&mut T> {
        let any: &mut dyn Any = &mut *self.behavior;
        any.downcast_mut::<T>()
    }

    // === Relationships (maintained by the registry) ===

    pub(crate) fn set_parent(&mut self, parent: Option<WindowHandle>) {
        self.parent = parent;
    }

    pub(crate) fn add_child(&mut self, child: WindowHandle) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: WindowHandle) {
        self.children.retain(|c| *c != child);
    }

    // === Pooling ===

    /// Strip everything that must not survive into a pooled instance
    ///
    /// Visible visuals are hidden (not destroyed) so reuse stays cheap, then
    /// the subtype's cleanup hook runs. The instance ends up `Destroyed`; if
    /// the hook fails the error is returned with the window `Hidden`, and the
    /// caller must destroy the instance outright.
    pub fn prepare_for_pool(&mut self) -> anyhow::Result<()> {
        if self.state == WindowState::Shown {
            self.hide()?;
        }
        self.listeners.clear();
        self.children.clear();
        self.parent = None;
        self.input_enabled = true;
        if let Some(poolable) = self.behavior.as_poolable() {
            poolable.cleanup_for_pool()?;
        }
        if self.state != WindowState::Destroyed {
            self.transition(WindowState::Destroyed);
            self.behavior.on_destroy();
        }
        Ok(())
    }

    /// Give a pooled instance a new identity
    ///
    /// Resets identity and state fields, then runs the subtype's reuse hook.
    pub fn reset_for_reuse(&mut self, id: impl Into<String>, args: &WindowArgs) -> anyhow::Result<()> {
        self.id = id.into();
        self.modal = args.modal;
        self.state = WindowState::Created;
        self.parent = None;
        self.children.clear();
        self.listeners.clear();
        self.input_enabled = true;
        if let Some(poolable) = self.behavior.as_poolable() {
            poolable.reset_for_reuse(args)?;
        }
        log::debug!("Window '{}' ({}) reset for reuse", self.id, self.kind.name());
        Ok(())
    }

    /// Drop a pooled instance for good, releasing the visuals it kept hidden
    pub fn discard(mut self) {
        self.behavior.destroy_visuals();
        log::debug!("Window '{}' ({}) discarded", self.id, self.kind.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::Poolable;

    #[derive(Default)]
    struct Probe {
        visuals: bool,
        visible: bool,
        creates: usize,
        shows: usize,
        hides: usize,
        destroys: usize,
        fail_cleanup: bool,
        reuse_title: Option<String>,
    }

    impl WindowBehavior for Probe {
        fn create(&mut self) {
            self.creates += 1;
            self.visuals = true;
            self.visible = true;
        }
        fn has_visuals(&self) -> bool {
            self.visuals
        }
        fn show_visuals(&mut self) {
            self.visible = true;
        }
        fn hide_visuals(&mut self) {
            self.visible = false;
        }
        fn destroy_visuals(&mut self) {
            self.visuals = false;
            self.visible = false;
        }
        fn on_show(&mut self) {
            self.shows += 1;
        }
        fn on_hide(&mut self) {
            self.hides += 1;
        }
        fn on_destroy(&mut self) {
            self.destroys += 1;
        }
        fn as_poolable(&mut self) -> Option<&mut dyn Poolable> {
            Some(self)
        }
    }

    impl Poolable for Probe {
        fn reset_for_reuse(&mut self, args: &WindowArgs) -> anyhow::Result<()> {
            self.reuse_title = args.str_param("title").map(str::to_string);
            Ok(())
        }
        fn cleanup_for_pool(&mut self) -> anyhow::Result<()> {
            if self.fail_cleanup {
                anyhow::bail!("probe refuses pooling");
            }
            Ok(())
        }
    }

    impl WindowClass for Probe {
        fn construct(_args: &WindowArgs) -> Self {
            Probe::default()
        }
    }

    fn probe(window: &Window) -> &Probe {
        window.behavior::<Probe>().unwrap()
    }

    // === Lifecycle ===

    #[test]
    fn test_new_window_is_created() {
        let window = Window::new::<Probe>("a", &WindowArgs::new());
        assert_eq!(window.state(), WindowState::Created);
        assert!(!window.is_modal());
        assert!(window.is_input_enabled());
        assert_eq!(window.kind().name(), "Probe");
    }

    #[test]
    fn test_show_creates_once() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        window.show().unwrap();
        window.show().unwrap();
        assert_eq!(window.state(), WindowState::Shown);
        assert_eq!(probe(&window).creates, 1);
        assert_eq!(probe(&window).shows, 1);
    }

    #[test]
    fn test_hide_then_show_reuses_visuals() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        window.show().unwrap();
        window.hide().unwrap();
        assert_eq!(window.state(), WindowState::Hidden);
        assert!(!probe(&window).visible);
        assert!(probe(&window).visuals);

        window.show().unwrap();
        assert!(probe(&window).visible);
        assert_eq!(probe(&window).creates, 1);
        assert_eq!(probe(&window).shows, 2);
        assert_eq!(probe(&window).hides, 1);
    }

    #[test]
    fn test_hide_requires_shown() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        assert!(matches!(window.hide(), Err(WindowError::InvalidState { .. })));

        window.show().unwrap();
        window.hide().unwrap();
        // Hiding again is harmless
        window.hide().unwrap();
        assert_eq!(probe(&window).hides, 1);
    }

    #[test]
    fn test_show_after_destroy_fails() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        window.destroy();
        let err = window.show().unwrap_err();
        assert_eq!(err, WindowError::invalid_state("a", "show", WindowState::Destroyed));
        assert!(window.hide().is_err());
        assert_eq!(window.state(), WindowState::Destroyed);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        window.show().unwrap();
        window.destroy();
        window.destroy();
        assert!(window.is_destroyed());
        assert_eq!(probe(&window).destroys, 1);
        assert!(!probe(&window).visuals);
    }

    #[test]
    fn test_destroy_keeps_tree_links() {
        let mut registry = crate::WindowRegistry::new();
        let parent = registry.insert(Window::new::<Probe>("p", &WindowArgs::new())).unwrap();
        let child = registry.insert(Window::new::<Probe>("c", &WindowArgs::new())).unwrap();
        registry.attach_child(parent, child).unwrap();

        registry.get_mut(parent).unwrap().destroy();
        assert_eq!(registry.get(parent).unwrap().children(), &[child]);
        assert_eq!(registry.subtree(parent), vec![child, parent]);
    }

    #[test]
    fn test_show_hide_never_destroys() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        for i in 0..20 {
            if i % 3 == 0 {
                window.hide().ok();
            } else {
                window.show().unwrap();
            }
            assert!(matches!(
                window.state(),
                WindowState::Created | WindowState::Shown | WindowState::Hidden
            ));
        }
    }

    // === Listeners ===

    #[test]
    fn test_listeners_run_until_consumed() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        window.add_event_listener(Box::new(|e: &InputEvent| e.is_escape_press()));
        window.add_event_listener(Box::new(|_: &InputEvent| true));
        assert_eq!(window.listener_count(), 2);
        assert!(window.dispatch_listeners(&InputEvent::escape()));
        assert!(window.dispatch_listeners(&InputEvent::char_press('x')));
        window.clear_listeners();
        assert!(!window.dispatch_listeners(&InputEvent::escape()));
    }

    #[test]
    fn test_receive_message_without_capability() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        assert!(window.receive_message("b", "ping", &Payload::new()).is_none());
    }

    // === Pooling ===

    #[test]
    fn test_prepare_for_pool_hides_and_clears() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        window.show().unwrap();
        window.add_event_listener(Box::new(|_: &InputEvent| false));
        window.set_input_enabled(false);

        window.prepare_for_pool().unwrap();
        assert!(window.is_destroyed());
        assert_eq!(window.listener_count(), 0);
        assert!(window.is_input_enabled());
        // Visuals stay allocated for cheap reuse
        assert!(probe(&window).visuals);
        assert!(!probe(&window).visible);
    }

    #[test]
    fn test_prepare_for_pool_propagates_hook_failure() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        window.show().unwrap();
        window.behavior_mut::<Probe>().unwrap().fail_cleanup = true;
        assert!(window.prepare_for_pool().is_err());

        // Hidden before the hook ran, so the rejected instance is consistent
        assert_eq!(window.state(), WindowState::Hidden);
        assert_eq!(probe(&window).hides, 1);
        window.destroy();
        assert!(window.is_destroyed());
        assert_eq!(probe(&window).hides, 1);
        assert_eq!(probe(&window).destroys, 1);
    }

    #[test]
    fn test_reset_for_reuse() {
        let mut window = Window::new::<Probe>("a", &WindowArgs::new());
        window.show().unwrap();
        window.prepare_for_pool().unwrap();

        let args = WindowArgs::modal().with("title", "Again");
        window.reset_for_reuse("b", &args).unwrap();
        assert_eq!(window.id(), "b");
        assert!(window.is_modal());
        assert_eq!(window.state(), WindowState::Created);
        assert_eq!(probe(&window).reuse_title.as_deref(), Some("Again"));

        // Existing visuals are re-shown rather than rebuilt
        window.show().unwrap();
        assert_eq!(probe(&window).creates, 1);
        assert!(probe(&window).visible);
    }
}
