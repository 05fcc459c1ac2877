use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Duration;

mod app;
mod badge;
mod config;
mod modules;
mod ui;

use app::{App, AppState, MenuSection};

#[tokio::main]
async fn main() -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = match App::new() {
        Ok(mut app) => run_app(&mut terminal, &mut app).await,
        Err(e) => Err(e),
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
        {
            if kind != KeyEventKind::Press {
                continue;
            }
            match app.state {
                AppState::Normal => match code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Char('?') => {
                        app.show_help = !app.show_help;
                    }
                    KeyCode::Char('1') => app.set_section(MenuSection::Inbox),
                    KeyCode::Char('2') => app.set_section(MenuSection::Locker),
                    KeyCode::Char('b') => app.ring_bell(),
                    KeyCode::Tab => app.next_section(),
                    KeyCode::BackTab => app.previous_section(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous_item(),
                    KeyCode::Down | KeyCode::Char('j') => app.next_item(),
                    KeyCode::PageUp => app.page_up(),
                    KeyCode::PageDown => app.page_down(),
                    KeyCode::Home => app.go_home(),
                    KeyCode::End => app.go_end(),
                    KeyCode::Char('r') => app.request_refresh(),
                    KeyCode::Char('f') => app.cycle_filter(),
                    KeyCode::Char('m') => app.toggle_read_selected(),
                    KeyCode::Char('M') => app.mark_all_read(),
                    KeyCode::Char('c') => {
                        if let Err(e) = app.copy_selected() {
                            app.report_error("Copy failed", e);
                        }
                    }
                    KeyCode::Char('t') => app.toggle_detail(),
                    KeyCode::Char('n') => app.new_item(),
                    KeyCode::Char('d') => app.delete_item(),
                    KeyCode::Enter => {
                        if let Err(e) = app.activate_item() {
                            app.report_error("Action failed", e);
                        }
                    }
                    KeyCode::Esc => app.cancel_input(),
                    _ => {}
                },
                AppState::Input => match code {
                    KeyCode::Enter => {
                        if let Err(e) = app.submit_input() {
                            app.report_error("Submit failed", e);
                        }
                    }
                    KeyCode::Esc => app.cancel_input(),
                    KeyCode::Backspace => app.input_backspace(),
                    KeyCode::Char(c) => app.input_char(c),
                    KeyCode::Left => app.input_move_left(),
                    KeyCode::Right => app.input_move_right(),
                    _ => {}
                },
                AppState::Confirm => match code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => {
                        if let Err(e) = app.confirm_action() {
                            app.report_error("Confirm failed", e);
                        }
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_confirm(),
                    _ => {}
                },
            }
        }

        app.tick().await;
    }
}
