use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, AppState, MenuSection};
use crate::badge::Badge;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20), Constraint::Percentage(80)])
        .split(chunks[1]);

    draw_menu(f, app, main_chunks[0]);

    match app.current_section {
        MenuSection::Inbox => draw_inbox(f, app, main_chunks[1]),
        MenuSection::Locker => draw_locker(f, app, main_chunks[1]),
    }

    draw_status(f, app, chunks[2]);

    if app.state == AppState::Input {
        draw_input_popup(f, app);
    } else if app.state == AppState::Confirm {
        draw_confirm_popup(f, app);
    } else if app.show_help {
        draw_help_popup(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(9)])
        .split(area);

    let time_str = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let synced = match app.store.last_synced() {
        Some(t) => format!("synced {}", t.format("%H:%M:%S")),
        None => "never synced".to_string(),
    };
    let mut header = format!(
        "belfry | {} | filter: {} | {}",
        time_str,
        app.store.filter().label(),
        synced
    );
    if app.store.fetching() {
        header.push_str(" | syncing...");
    }
    if !app.signed_in() {
        header.push_str(" | signed out");
    }

    let title = Paragraph::new(header)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    draw_bell(f, app, chunks[1]);
}

fn draw_bell(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let bell_width = inner.width.min(3);
    let bell_area = Rect {
        width: bell_width,
        ..inner
    };
    f.render_widget(Paragraph::new("🔔"), bell_area);

    // Badge cell right of the glyph. Collapses to zero width on terminals
    // too narrow to fit it, which the badge treats as a no-op.
    let badge_area = Rect {
        x: inner.x + bell_width,
        width: inner.width.saturating_sub(bell_width),
        ..inner
    };
    f.render_widget(Badge::new(app.store.unread_count()), badge_area);
}

fn draw_menu(f: &mut Frame, app: &App, area: Rect) {
    let menu_items = vec![
        (
            "1",
            format!("Inbox ({})", app.store.unread_count()),
            MenuSection::Inbox,
        ),
        ("2", "Locker".to_string(), MenuSection::Locker),
    ];

    let items: Vec<ListItem> = menu_items
        .into_iter()
        .map(|(key, name, section)| {
            let style = if section == app.current_section {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{} {}", key, name)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title("Menu")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(list, area);
}

fn draw_inbox(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(7)])
        .split(area);

    let title = format!(
        "Inbox ({} unread, filter: {})",
        app.store.unread_count(),
        app.store.filter().label()
    );

    let visible = app.store.visible();
    if visible.is_empty() {
        let hint = if !app.signed_in() {
            "Signed out. Add an [identity] table to the config and press 'r'"
        } else if app.store.is_empty() {
            "No notifications. Press 'r' to refresh"
        } else {
            "Nothing matches the current filter. Press 'f' to cycle"
        };
        let empty =
            Paragraph::new(hint).block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(empty, chunks[0]);
    } else {
        let window_height = chunks[0].height.saturating_sub(2) as usize;
        let (start, end) = scroll_window(app.selected_index, visible.len(), window_height);

        let items: Vec<ListItem> = visible[start..end]
            .iter()
            .enumerate()
            .map(|(offset, n)| {
                let i = start + offset;
                let style = if i == app.selected_index {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if !n.read {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                let marker = if n.read { "  " } else { "● " };
                ListItem::new(format!(
                    "{}[{}] {}",
                    marker,
                    n.created_at.format("%m-%d %H:%M"),
                    n.message
                ))
                .style(style)
            })
            .collect();

        let list =
            List::new(items).block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(list, chunks[0]);
    }

    if app.show_detail {
        let mut lines: Vec<Line> = Vec::new();
        if let Some(n) = visible.get(app.selected_index) {
            lines.push(Line::from(format!("Id: {}", n.id)));
            lines.push(Line::from(format!(
                "Received: {}",
                n.created_at.format("%Y-%m-%d %H:%M:%S")
            )));
            lines.push(Line::from(format!(
                "Status: {}",
                if n.read { "read" } else { "unread" }
            )));
            lines.push(Line::from(n.message.clone()));
        } else {
            lines.push(Line::from("Nothing selected"));
        }
        if let Some(err) = app.store.last_error() {
            lines.push(Line::from(format!("Last sync error: {}", err)));
        }
        let detail = Paragraph::new(lines)
            .block(Block::default().title("Details (t to toggle)").borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        f.render_widget(detail, chunks[1]);
    } else {
        let help = Paragraph::new("Press 't' to toggle details")
            .block(Block::default().title("Details").borders(Borders::ALL));
        f.render_widget(help, chunks[1]);
    }
}

fn draw_locker(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .locker_module
        .documents
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let style = if i == app.selected_index {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let icon = match d.kind.as_str() {
                "directory" => "📁",
                "url" => "🌐",
                _ => "📄",
            };
            let missing = if app.locker_module.missing(i) { " ⚠ missing" } else { "" };
            ListItem::new(format!(
                "{} {} → {}{}",
                icon,
                d.name,
                d.path.display(),
                missing
            ))
            .style(style)
        })
        .collect();

    if items.is_empty() {
        let empty = Paragraph::new("Locker is empty. Press 'n' to add a document")
            .block(Block::default().title("Locker").borders(Borders::ALL));
        f.render_widget(empty, area);
    } else {
        let list = List::new(items).block(
            Block::default()
                .title("Locker (n: new, d: delete, Enter: open)")
                .borders(Borders::ALL),
        );
        f.render_widget(list, area);
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let help_text = match app.state {
        AppState::Normal => {
            "q: Quit | Tab: Section | b: Bell | r: Refresh | f: Filter | m/M: Read | n/d: New/Delete | ?: Help"
        }
        AppState::Input => "Enter: Submit | Esc: Cancel | Type your input",
        AppState::Confirm => "y: Yes | n: No | Esc: Cancel",
    };

    let status = Paragraph::new(vec![
        Line::from(app.status_message.as_str()),
        Line::from(help_text),
    ])
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(status, area);
}

fn draw_input_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 20, f.area());
    let input_text = format!("{}{}", app.input_prompt, app.input_buffer);
    let input = Paragraph::new(input_text)
        .block(
            Block::default()
                .title("Input")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(input, area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 15, f.area());
    let confirm = Paragraph::new(app.confirm_message.as_str())
        .block(
            Block::default()
                .title("Confirm")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(Clear, area);
    f.render_widget(confirm, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(70, 70, f.area());
    let help = "belfry Help\n\nKeys:\n  q: Quit\n  1/2 or Tab: Switch section\n  b: Jump to the inbox (bell)\n  j/k or ↑/↓: Navigate\n  PgUp/PgDn, Home/End: Page/Jump\n  r: Refresh notifications\n  f: Cycle filter (all/unread/read)\n  m: Toggle read on selection\n  M: Mark all read\n  c: Copy message to clipboard\n  t: Toggle details\n  n: Add locker document\n  d: Remove locker document\n  Enter: Open locker document\n  ?: Toggle this help";

    let paragraph = Paragraph::new(help)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

// Selection-centered list window; stays full-height at the end of the list.
fn scroll_window(selected: usize, len: usize, height: usize) -> (usize, usize) {
    let start = selected
        .saturating_sub(height / 2)
        .min(len.saturating_sub(height));
    let end = usize::min(start + height, len);
    (start, end)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
