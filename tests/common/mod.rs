//! Common test utilities and harness
//!
//! Provides reusable pieces for functional testing of the window manager:
//! - Probe window classes that journal every lifecycle hook
//! - A manager harness that drives frames into a recording surface
//! - Assertion utilities

#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

use casement::{
    Color, Config, InputEvent, MessageReceiver, Payload, Poolable, Surface, WindowArgs, WindowBehavior,
    WindowClass, WindowHandle, WindowManager, WindowState,
};
use casement_core::mock::RecordingSurface;

thread_local! {
    static JOURNAL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Append an entry to this test's journal
pub fn record(entry: String) {
    JOURNAL.with(|j| j.borrow_mut().push(entry));
}

/// Everything recorded on this thread so far
pub fn journal() -> Vec<String> {
    JOURNAL.with(|j| j.borrow().clone())
}

pub fn clear_journal() {
    JOURNAL.with(|j| j.borrow_mut().clear());
}

/// Position of `entry` in the journal, panicking if absent
pub fn journal_index(entry: &str) -> usize {
    journal()
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("'{}' not in journal: {:?}", entry, journal()))
}

fn label_from(args: &WindowArgs) -> String {
    args.str_param("label").unwrap_or("probe").to_string()
}

/// Window that journals its hooks and records received messages
pub struct Probe {
    pub label: String,
    visuals: bool,
    pub received: Vec<String>,
    pub consume_keys: bool,
    pub escape_consumes: bool,
    pub fail_messages: bool,
}

impl WindowBehavior for Probe {
    fn create(&mut self) {
        self.visuals = true;
        record(format!("create {}", self.label));
    }

    fn has_visuals(&self) -> bool {
        self.visuals
    }

    fn destroy_visuals(&mut self) {
        self.visuals = false;
    }

    fn handle_event(&mut self, event: &InputEvent) -> bool {
        if self.consume_keys && matches!(event, InputEvent::Key { .. }) {
            record(format!("key {}", self.label));
            return true;
        }
        false
    }

    fn handle_escape(&mut self) -> bool {
        self.escape_consumes
    }

    fn on_show(&mut self) {
        record(format!("show {}", self.label));
    }

    fn on_hide(&mut self) {
        record(format!("hide {}", self.label));
    }

    fn on_destroy(&mut self) {
        record(format!("destroy {}", self.label));
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.draw_text(&self.label, 0.0, 0.0, Color::WHITE);
    }

    fn as_receiver(&mut self) -> Option<&mut dyn MessageReceiver> {
        Some(self)
    }
}

impl MessageReceiver for Probe {
    fn receive_message(&mut self, sender: &str, message_type: &str, _payload: &Payload) -> anyhow::Result<()> {
        if self.fail_messages {
            anyhow::bail!("{} refuses '{}'", self.label, message_type);
        }
        self.received.push(format!("{} from {}", message_type, sender));
        Ok(())
    }
}

impl WindowClass for Probe {
    fn construct(args: &WindowArgs) -> Self {
        Probe {
            label: label_from(args),
            visuals: false,
            received: Vec::new(),
            consume_keys: args
                .params
                .get("consume_keys")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            escape_consumes: false,
            fail_messages: false,
        }
    }
}

/// Window with pool hooks and a construction serial to prove instance reuse
pub struct PooledProbe {
    pub serial: u64,
    pub label: String,
    visuals: bool,
    pub fail_cleanup: bool,
    pub resets: usize,
}

impl WindowBehavior for PooledProbe {
    fn create(&mut self) {
        self.visuals = true;
        record(format!("create {}", self.label));
    }

    fn has_visuals(&self) -> bool {
        self.visuals
    }

    fn destroy_visuals(&mut self) {
        self.visuals = false;
    }

    fn on_destroy(&mut self) {
        record(format!("destroy {}", self.label));
    }

    fn as_poolable(&mut self) -> Option<&mut dyn Poolable> {
        Some(self)
    }
}

impl Poolable for PooledProbe {
    fn reset_for_reuse(&mut self, args: &WindowArgs) -> anyhow::Result<()> {
        self.label = label_from(args);
        self.resets += 1;
        Ok(())
    }

    fn cleanup_for_pool(&mut self) -> anyhow::Result<()> {
        if self.fail_cleanup {
            anyhow::bail!("{} cannot be pooled", self.label);
        }
        Ok(())
    }
}

impl WindowClass for PooledProbe {
    fn construct(args: &WindowArgs) -> Self {
        PooledProbe {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            label: label_from(args),
            visuals: false,
            fail_cleanup: false,
            resets: 0,
        }
    }
}

/// Arguments labelling a probe with its id
pub fn args(id: &str, modal: bool) -> WindowArgs {
    WindowArgs {
        modal,
        ..Default::default()
    }
    .with("label", id)
}

/// Test harness wrapping a manager and a recording surface
pub struct ManagerHarness {
    pub manager: WindowManager,
    pub surface: RecordingSurface,
}

impl ManagerHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        clear_journal();
        let mut manager = WindowManager::new(&config);
        let surface = RecordingSurface::new(800.0, 600.0);
        manager.initialize(surface.bounds());
        Self { manager, surface }
    }

    /// Create a probe, show it and push it on the stack
    pub fn open(&mut self, id: &str, modal: bool) -> WindowHandle {
        let handle = self.create(id, modal);
        self.manager
            .show_window(handle, true)
            .expect("Failed to show probe");
        handle
    }

    /// Create a probe without showing it
    pub fn create(&mut self, id: &str, modal: bool) -> WindowHandle {
        self.manager
            .create_window::<Probe>(Some(id), None, &args(id, modal))
            .expect("Failed to create probe")
    }

    /// Run one full frame, redrawing into a cleared surface
    pub fn frame(&mut self, events: &[InputEvent]) -> usize {
        let consumed = self.manager.handle_global_events(events);
        self.manager.update(1.0 / 60.0);
        self.surface.clear_calls();
        self.manager.draw(&mut self.surface);
        consumed
    }

    pub fn state(&self, handle: WindowHandle) -> Option<WindowState> {
        self.manager.window(handle).map(|w| w.state())
    }

    pub fn probe(&self, handle: WindowHandle) -> &Probe {
        self.manager
            .window(handle)
            .and_then(|w| w.behavior::<Probe>())
            .expect("Window is not a live probe")
    }

    pub fn probe_mut(&mut self, handle: WindowHandle) -> &mut Probe {
        self.manager
            .window_mut(handle)
            .and_then(|w| w.behavior_mut::<Probe>())
            .expect("Window is not a live probe")
    }

    /// Ids on the stack, bottom to top
    pub fn stack_ids(&self) -> Vec<String> {
        self.manager
            .stack()
            .entries()
            .iter()
            .filter_map(|h| self.manager.windows().id_of(*h))
            .map(str::to_string)
            .collect()
    }

    pub fn assert_stack(&self, expected: &[&str]) {
        assert_eq!(
            self.stack_ids(),
            expected,
            "Stack mismatch. Expected: {:?}, Actual: {:?}",
            expected,
            self.stack_ids()
        );
    }

    pub fn assert_focused(&self, handle: WindowHandle) {
        assert_eq!(
            self.manager.focus().current(),
            Some(handle),
            "Expected focus on '{}', got {:?}",
            self.manager.windows().id_of(handle).unwrap_or("<stale>"),
            self.manager
                .focus()
                .current()
                .and_then(|h| self.manager.windows().id_of(h))
        );
    }

    pub fn assert_stack_valid(&self) {
        let issues = self.manager.validate_stack();
        assert!(issues.is_empty(), "Stack issues: {:?}", issues);
    }
}

impl Default for ManagerHarness {
    fn default() -> Self {
        Self::new()
    }
}
