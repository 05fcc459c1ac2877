use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

/// Unread-count badge drawn beside the bell glyph. A zero count draws
/// nothing, which is how the badge hides; a zero-sized area (the header had
/// no room for it) is a silent no-op. Text that does not fit is clipped.
pub struct Badge {
    count: usize,
}

impl Badge {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl Widget for Badge {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.count == 0 || area.width == 0 || area.height == 0 {
            return;
        }
        let text = self.count.to_string();
        let style = Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD);
        buf.set_stringn(area.x, area.y, &text, area.width as usize, style);
    }
}
