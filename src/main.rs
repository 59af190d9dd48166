//! Casement demo host
//!
//! Drives the window manager through a scripted sequence of frames without a
//! real renderer: a main menu opens a modal settings dialog, the two exchange
//! messages, Escape navigates back, and the dialog is reopened from the pool.
//! Draw calls are logged at debug level (`RUST_LOG=casement=debug`).

use anyhow::Context;
use casement::{
    Color, Config, InputEvent, MessagePriority, MessageReceiver, Payload, Poolable, Rect, Surface,
    WindowArgs, WindowBehavior, WindowClass, WindowManager,
};

const FRAME_DT: f32 = 1.0 / 60.0;

/// Surface that logs what would have been drawn
struct LogSurface {
    bounds: Rect,
    calls: usize,
}

impl Surface for LogSurface {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.calls += 1;
        log::debug!("fill {:?} with alpha {:.2}", rect, color.a);
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, _color: Color) {
        self.calls += 1;
        log::debug!("text {:?} at ({}, {})", text, x, y);
    }
}

struct MainMenu {
    items: Vec<&'static str>,
}

impl WindowBehavior for MainMenu {
    fn create(&mut self) {
        log::info!("Main menu built with {} items", self.items.len());
    }

    fn has_visuals(&self) -> bool {
        false
    }

    fn draw(&self, surface: &mut dyn Surface) {
        for (row, item) in self.items.iter().enumerate() {
            surface.draw_text(item, 16.0, 16.0 + row as f32 * 20.0, Color::WHITE);
        }
    }
}

impl WindowClass for MainMenu {
    fn construct(_args: &WindowArgs) -> Self {
        MainMenu {
            items: vec!["Continue", "Settings", "Quit"],
        }
    }
}

#[derive(Default)]
struct SettingsDialog {
    built: bool,
    theme: String,
    keys_typed: usize,
}

impl WindowBehavior for SettingsDialog {
    fn create(&mut self) {
        self.built = true;
        log::info!("Settings dialog visuals built");
    }

    fn has_visuals(&self) -> bool {
        self.built
    }

    fn destroy_visuals(&mut self) {
        self.built = false;
    }

    fn handle_event(&mut self, event: &InputEvent) -> bool {
        if let InputEvent::Key { .. } = event {
            self.keys_typed += 1;
            return true;
        }
        false
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_rect(Rect::new(200.0, 150.0, 400.0, 300.0), Color::rgb(0.15, 0.15, 0.2));
        surface.draw_text(&format!("Theme: {}", self.theme), 216.0, 166.0, Color::WHITE);
    }

    fn as_poolable(&mut self) -> Option<&mut dyn Poolable> {
        Some(self)
    }

    fn as_receiver(&mut self) -> Option<&mut dyn MessageReceiver> {
        Some(self)
    }
}

impl Poolable for SettingsDialog {
    fn reset_for_reuse(&mut self, args: &WindowArgs) -> anyhow::Result<()> {
        self.theme = args.str_param("theme").unwrap_or("default").to_string();
        Ok(())
    }

    fn cleanup_for_pool(&mut self) -> anyhow::Result<()> {
        self.keys_typed = 0;
        Ok(())
    }
}

impl MessageReceiver for SettingsDialog {
    fn receive_message(&mut self, sender: &str, message_type: &str, payload: &Payload) -> anyhow::Result<()> {
        match message_type {
            "set_theme" => {
                let theme = payload
                    .get("theme")
                    .and_then(|v| v.as_str())
                    .context("set_theme without a theme")?;
                log::info!("'{}' switched theme to {}", sender, theme);
                self.theme = theme.to_string();
            }
            other => log::debug!("Settings ignoring '{}' from '{}'", other, sender),
        }
        Ok(())
    }
}

impl WindowClass for SettingsDialog {
    fn construct(args: &WindowArgs) -> Self {
        SettingsDialog {
            theme: args.str_param("theme").unwrap_or("default").to_string(),
            ..Default::default()
        }
    }
}

fn frame(manager: &mut WindowManager, surface: &mut LogSurface, events: &[InputEvent]) {
    let consumed = manager.handle_global_events(events);
    manager.update(FRAME_DT);
    surface.calls = 0;
    manager.draw(surface);
    log::info!(
        "Frame: {} event(s), {} consumed, {} draw call(s), stack depth {}",
        events.len(),
        consumed,
        surface.calls,
        manager.stack().len()
    );
}

fn main() -> anyhow::Result<()> {
    let config = Config::load_or_default();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.logging.filter)).init();
    log::info!("Casement demo starting");

    let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);
    let mut surface = LogSurface {
        bounds: viewport,
        calls: 0,
    };
    let mut manager = WindowManager::new(&config);
    manager.initialize(viewport);

    let menu = manager.create_window::<MainMenu>(Some("main_menu"), None, &WindowArgs::new())?;
    manager.show_window(menu, true)?;
    frame(&mut manager, &mut surface, &[]);

    let settings_args = WindowArgs::modal().with("theme", "dark");
    let settings = manager.create_window::<SettingsDialog>(None, Some(menu), &settings_args)?;
    manager.show_window(settings, true)?;
    let settings_id = manager
        .window(settings)
        .map(|w| w.id().to_string())
        .context("settings dialog vanished")?;

    let mut payload = Payload::new();
    payload.insert("theme".into(), serde_json::json!("synthwave"));
    manager.send_message("main_menu", &settings_id, "set_theme", payload, MessagePriority::High);
    let reached = manager.broadcast_message("main_menu", "tick", &Payload::new(), MessagePriority::Low);
    log::info!("Broadcast reached {} window(s)", reached);

    frame(&mut manager, &mut surface, &[InputEvent::char_press('s'), InputEvent::click(10.0, 10.0)]);
    frame(&mut manager, &mut surface, &[InputEvent::escape()]);

    let settings = manager.create_window::<SettingsDialog>(None, Some(menu), &settings_args)?;
    manager.show_window(settings, true)?;
    frame(&mut manager, &mut surface, &[]);

    let pool = manager.pool().stats();
    let router = manager.router().stats();
    log::info!(
        "Pool: {} created, {} reused, {} returned; messages: {} delivered, {} failed",
        pool.created,
        pool.reused,
        pool.returned,
        router.delivered,
        router.failed_deliveries
    );
    for issue in manager.validate_stack() {
        log::warn!("Stack issue: {}", issue);
    }

    manager.shutdown();
    Ok(())
}
