//! Screen layout calculation

use ratatui::layout::{Constraint, Layout, Rect};

/// The main screen areas, top to bottom.
pub struct AppLayout {
    pub title_area: Rect,
    pub feed_area: Rect,
    pub picker_area: Rect,
    pub status_area: Rect,
    pub input_area: Rect,
}

impl AppLayout {
    pub fn calculate(area: Rect) -> Self {
        let [title_area, feed_area, picker_area, status_area, input_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .areas(area);

        Self {
            title_area,
            feed_area,
            picker_area,
            status_area,
            input_area,
        }
    }
}

/// Center a fixed-size popup within an area.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_fills_area() {
        let area = Rect::new(0, 0, 80, 24);
        let layout = AppLayout::calculate(area);

        assert_eq!(layout.title_area.height, 1);
        assert_eq!(layout.picker_area.height, 1);
        assert_eq!(layout.input_area.height, 3);
        assert!(layout.feed_area.height >= 5);

        let total: u16 = [
            layout.title_area,
            layout.feed_area,
            layout.picker_area,
            layout.status_area,
            layout.input_area,
        ]
        .iter()
        .map(|r| r.height)
        .sum();
        assert_eq!(total, 24);
    }

    #[test]
    fn test_centered_rect_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        let popup = centered_rect_fixed(50, 20, area);
        assert!(popup.width <= area.width);
        assert!(popup.height <= area.height);
    }
}
