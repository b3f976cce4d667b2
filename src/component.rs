//! Component trait - Interface for UI components
//!
//! Components turn terminal events into Actions and render themselves.
//! State they do not own (rows, rules, permissions) is handed to them by
//! the App, either through setters before drawing or through a render
//! context passed to a dedicated draw method.

use crate::action::Action;
use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

/// Trait for UI components
///
/// The lifecycle is:
/// 1. `init` - One-time setup once the App is built
/// 2. `handle_key_event` / `handle_mouse_event` - Convert events to Actions
/// 3. `update` - React to Actions routed to the component
/// 4. `draw` - Render into the given area
/// 5. `teardown` - Release timers before the component is discarded
pub trait Component {
    /// Initialize the component
    ///
    /// Called once before the event loop starts.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Handle a key event, returning an optional Action
    ///
    /// Purely local state such as a cursor or an open dropdown may change
    /// here. Anything owned by the App changes only through the returned
    /// Action.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let _ = key;
        Ok(None)
    }

    /// Handle a mouse event, returning an optional Action
    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let _ = mouse;
        Ok(None)
    }

    /// Update component state based on an Action
    ///
    /// May return a follow-up Action, which the event loop processes next.
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let _ = action;
        Ok(None)
    }

    /// Draw the component to the frame
    ///
    /// Rendering only, apart from recording layout measurements such as
    /// the number of visible rows.
    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()>;

    /// Release resources tied to the component's lifetime
    ///
    /// Called before the component is dropped. Pending timers must be
    /// cancelled here so no Action is emitted after teardown.
    fn teardown(&mut self) {}
}
