//! slot-studio - A terminal editor for slot-filling rules
//!
//! Browse an utterance dataset in a virtualized table and edit the
//! slot-filling rules of one slot side by side. It uses the Component
//! Architecture pattern from ratatui.

mod action;
mod app;
mod component;
mod components;
mod config;
mod debounce;
mod logging;
mod model;
mod services;
mod tui;

use crate::action::Action;
use crate::app::App;
use crate::component::Component;
use crate::config::Config;
use crate::services::CapabilityAuthorizer;
use crate::tui::Tui;
use anyhow::Result;
use crossterm::event::Event;
use std::time::Duration;

fn main() -> Result<()> {
    let config = Config::load()?;
    if Config::config_dir().is_some_and(|dir| !dir.join("config.json").exists()) {
        // First run: leave an editable copy of the defaults behind
        if let Err(e) = config.save() {
            eprintln!("Warning: could not write default config: {}", e);
        }
    }
    logging::init_logging(config.log_dir().as_deref())?;
    tracing::info!(
        project = %config.project_path,
        dataset = %config.dataset_path,
        "starting slot-studio"
    );

    let authorizer = Box::new(CapabilityAuthorizer::new(config.capabilities.clone()));
    let tick_rate = Duration::from_millis(config.tick_rate_ms);

    // Create app state
    let mut app = App::new(config, authorizer)?;

    // Setup terminal
    tui::install_panic_hook();
    let mut tui = Tui::new()?.with_tick_rate(tick_rate);
    tui.enter()?;

    app.init()?;

    // Main event loop
    let result = run_app(&mut tui, &mut app);

    app.teardown();

    // Cleanup terminal
    tui.exit()?;

    // Handle any errors
    if let Err(err) = result {
        tracing::error!(error = ?err, "application error");
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }

    tracing::info!("exiting");
    Ok(())
}

/// Run the main application loop
fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        // Draw the UI
        tui.draw(|frame| {
            if let Err(e) = app.draw(frame, frame.area()) {
                tracing::error!(error = %e, "draw error");
            }
        })?;

        // Poll for events
        if let Some(event) = tui.next_event()? {
            // Convert event to action
            let action = match event {
                Event::Key(key) => app.handle_key_event(key)?,
                Event::Mouse(mouse) => app.handle_mouse_event(mouse)?,
                Event::Resize(w, h) => Some(Action::Resize(w, h)),
                _ => None,
            };

            // Process the action
            if let Some(action) = action {
                // Action might produce a follow-up action
                let mut current_action = Some(action);
                while let Some(a) = current_action {
                    current_action = app.update(a)?;
                }
            }
        }

        // Timers and background fetches advance on every pass
        app.update(Action::Tick)?;
    }

    Ok(())
}
