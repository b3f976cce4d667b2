//! Layout calculations for the UI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Main screen layout areas
pub struct MainLayout {
    pub table: Rect,
    pub rules: Rect,
    pub status: Rect,
    pub help: Rect,
}

/// Calculate centered popup area
pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_x = area.x + (area.width.saturating_sub(width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(
        popup_x,
        popup_y,
        width.min(area.width),
        height.min(area.height),
    )
}

/// Calculate main screen layout
///
/// Utterance table on the left, rule cards on the right, then a status
/// line and the help bar.
pub fn calculate_main_layout(area: Rect) -> MainLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);

    // Narrow terminals stack the panes
    let direction = if area.width < 100 {
        Direction::Vertical
    } else {
        Direction::Horizontal
    };
    let panes = Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(main_chunks[0]);

    MainLayout {
        table: panes[0],
        rules: panes[1],
        status: main_chunks[1],
        help: main_chunks[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_layout_splits_horizontally() {
        let layout = calculate_main_layout(Rect::new(0, 0, 160, 40));
        assert_eq!(layout.table.y, layout.rules.y);
        assert!(layout.table.x < layout.rules.x);
        assert_eq!(layout.status.height, 1);
        assert_eq!(layout.help.height, 3);
    }

    #[test]
    fn test_narrow_layout_stacks() {
        let layout = calculate_main_layout(Rect::new(0, 0, 80, 40));
        assert_eq!(layout.table.x, layout.rules.x);
        assert!(layout.table.y < layout.rules.y);
    }

    #[test]
    fn test_popup_is_centered_and_clamped() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_popup(area, 10, 4), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_popup(area, 40, 40), Rect::new(0, 0, 20, 10));
    }
}
