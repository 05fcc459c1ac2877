use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::modules::feed::{FetchError, HttpFeed, Identity};
use crate::modules::locker::LockerModule;
use crate::modules::store::{NotificationRecord, NotificationStore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuSection {
    Inbox,
    Locker,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Normal,
    Input,
    Confirm,
}

/// Owns every component for the process lifetime: the store and feed are
/// constructed here and injected, never reached through globals.
pub struct App {
    pub current_section: MenuSection,
    pub state: AppState,
    pub selected_index: usize,
    pub input_buffer: String,
    pub input_cursor: usize,
    pub input_prompt: String,
    pub confirm_message: String,
    pub status_message: String,
    pub show_detail: bool,
    pub show_help: bool,

    pub store: NotificationStore,
    pub locker_module: LockerModule,
    feed: HttpFeed,
    fetch_task: Option<JoinHandle<Result<Vec<NotificationRecord>, FetchError>>>,
    last_request: Instant,
    poll_interval: Duration,
    desktop_toasts: bool,
}

impl App {
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load()?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let identity = config.identity.as_ref().map(|i| Identity {
            account: i.account.clone(),
            token: i.token.clone(),
        });
        let feed = HttpFeed::new(
            config.service.base_url.clone(),
            Duration::from_secs(config.service.timeout_secs),
            identity,
        )?;
        let locker_module = LockerModule::new(config.locker_path.clone())?;
        let mut store = NotificationStore::new();
        store.open();

        let status_message = if feed.signed_in() {
            "Welcome to belfry! Press '?' for help".to_string()
        } else {
            "Signed out. Add an [identity] table to the config to fetch notifications".to_string()
        };

        Ok(Self {
            current_section: MenuSection::Inbox,
            state: AppState::Normal,
            selected_index: 0,
            input_buffer: String::new(),
            input_cursor: 0,
            input_prompt: String::new(),
            confirm_message: String::new(),
            status_message,
            show_detail: false,
            show_help: false,
            store,
            locker_module,
            feed,
            fetch_task: None,
            last_request: Instant::now(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            desktop_toasts: config.desktop_toasts,
        })
    }

    pub fn signed_in(&self) -> bool {
        self.feed.signed_in()
    }

    /// Starts a background fetch unless one is already outstanding, in which
    /// case the request is dropped and announced.
    pub fn request_refresh(&mut self) {
        if !self.store.begin_fetch() {
            self.status_message = "Refresh already in progress, request dropped".to_string();
            return;
        }
        let feed = self.feed.clone();
        self.fetch_task = Some(tokio::spawn(async move { feed.list_notifications().await }));
        self.last_request = Instant::now();
        self.status_message = "Refreshing notifications...".to_string();
    }

    /// Per-tick work on the event-loop task: apply a finished fetch to the
    /// store, toast fresh arrivals, and kick the periodic refresh.
    pub async fn tick(&mut self) {
        if self.fetch_task.as_ref().is_some_and(|t| t.is_finished())
            && let Some(task) = self.fetch_task.take()
        {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(FetchError::Network(format!("fetch task panicked: {}", e))),
            };
            let failed = outcome.is_err();
            let fresh = self.store.complete_fetch(outcome);
            if failed {
                self.status_message = format!(
                    "Refresh failed: {}",
                    self.store.last_error().unwrap_or("unknown error")
                );
            } else {
                self.status_message = format!(
                    "Synced {} notifications, {} new",
                    self.store.len(),
                    fresh
                );
                if fresh > 0 && self.desktop_toasts {
                    toast_fresh_arrivals(fresh);
                }
            }
            self.clamp_selection();
        }

        // Periodic refresh only makes sense with an identity; manual refresh
        // still goes through and surfaces the Auth error.
        if self.feed.signed_in()
            && !self.store.fetching()
            && self.last_request.elapsed() >= self.poll_interval
        {
            self.request_refresh();
        }
    }

    pub fn set_section(&mut self, section: MenuSection) {
        if self.current_section == MenuSection::Inbox && section != MenuSection::Inbox {
            self.store.close();
        }
        if section == MenuSection::Inbox {
            self.store.open();
        }
        self.current_section = section;
        self.selected_index = 0;
    }

    /// Bell activation: jump to the inbox and open the detail panel.
    pub fn ring_bell(&mut self) {
        self.set_section(MenuSection::Inbox);
        self.status_message = format!("{} unread", self.store.unread_count());
    }

    pub fn next_section(&mut self) {
        let next = match self.current_section {
            MenuSection::Inbox => MenuSection::Locker,
            MenuSection::Locker => MenuSection::Inbox,
        };
        self.set_section(next);
    }

    pub fn previous_section(&mut self) {
        self.next_section();
    }

    pub fn cycle_filter(&mut self) {
        self.store.cycle_filter();
        self.selected_index = 0;
        self.status_message = format!("Filter: {}", self.store.filter().label());
    }

    pub fn toggle_read_selected(&mut self) {
        if self.current_section != MenuSection::Inbox {
            return;
        }
        let id = self
            .store
            .visible()
            .get(self.selected_index)
            .map(|r| r.id.clone());
        let Some(id) = id else { return };
        match self.store.toggle_read(&id) {
            Some(true) => self.status_message = "Marked read".to_string(),
            Some(false) => self.status_message = "Marked unread".to_string(),
            None => {}
        }
        self.clamp_selection();
    }

    pub fn mark_all_read(&mut self) {
        if self.current_section != MenuSection::Inbox {
            return;
        }
        let changed = self.store.mark_all_read();
        self.status_message = format!("Marked {} notifications read", changed);
        self.clamp_selection();
    }

    pub fn copy_selected(&mut self) -> Result<()> {
        if self.current_section != MenuSection::Inbox {
            return Ok(());
        }
        let Some(message) = self
            .store
            .visible()
            .get(self.selected_index)
            .map(|r| r.message.clone())
        else {
            return Ok(());
        };

        #[cfg(feature = "clipboard")]
        {
            use clipboard::{ClipboardContext, ClipboardProvider};
            let mut ctx = ClipboardContext::new()
                .map_err(|e| anyhow::anyhow!("Clipboard unavailable: {}", e))?;
            ctx.set_contents(message)
                .map_err(|e| anyhow::anyhow!("Clipboard write failed: {}", e))?;
            self.status_message = "Copied message to clipboard".to_string();
        }

        #[cfg(not(feature = "clipboard"))]
        {
            let _ = message;
            self.status_message = "Built without clipboard support".to_string();
        }

        Ok(())
    }

    pub fn activate_item(&mut self) -> Result<()> {
        match self.current_section {
            MenuSection::Inbox => {
                self.status_message =
                    "m: toggle read | M: mark all | f: filter | c: copy | t: details".to_string();
            }
            MenuSection::Locker => {
                if self.selected_index < self.locker_module.documents.len() {
                    if self.locker_module.missing(self.selected_index) {
                        let doc = &self.locker_module.documents[self.selected_index];
                        self.status_message =
                            format!("Missing file: {}", doc.path.display());
                    } else {
                        self.locker_module.open_document(self.selected_index)?;
                        let doc = &self.locker_module.documents[self.selected_index];
                        self.status_message = format!("Opened: {}", doc.name);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn new_item(&mut self) {
        if self.current_section != MenuSection::Locker {
            return;
        }
        self.state = AppState::Input;
        self.input_buffer.clear();
        self.input_cursor = 0;
        self.input_prompt = "Enter document (name|path|kind): ".to_string();
    }

    pub fn delete_item(&mut self) {
        if self.current_section != MenuSection::Locker
            || self.selected_index >= self.locker_module.documents.len()
        {
            return;
        }
        self.state = AppState::Confirm;
        self.confirm_message = format!(
            "Remove \"{}\" from the locker? (y/n)",
            self.locker_module.documents[self.selected_index].name
        );
    }

    pub fn submit_input(&mut self) -> Result<()> {
        let input = self.input_buffer.clone();
        if self.current_section == MenuSection::Locker {
            self.locker_module.add_from_string(&input)?;
            self.status_message = "Document added to locker".to_string();
        }
        self.cancel_input();
        Ok(())
    }

    pub fn confirm_action(&mut self) -> Result<()> {
        if self.current_section == MenuSection::Locker {
            self.locker_module.delete(self.selected_index)?;
            self.status_message = "Document removed".to_string();
        }
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
        self.cancel_confirm();
        Ok(())
    }

    pub fn cancel_input(&mut self) {
        self.state = AppState::Normal;
        self.input_buffer.clear();
        self.input_cursor = 0;
    }

    pub fn cancel_confirm(&mut self) {
        self.state = AppState::Normal;
        self.confirm_message.clear();
    }

    pub fn input_char(&mut self, c: char) {
        self.input_buffer.insert(self.input_cursor, c);
        self.input_cursor += 1;
    }

    pub fn input_backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_buffer.remove(self.input_cursor - 1);
            self.input_cursor -= 1;
        }
    }

    pub fn input_move_left(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
        }
    }

    pub fn input_move_right(&mut self) {
        if self.input_cursor < self.input_buffer.len() {
            self.input_cursor += 1;
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_item(&mut self) {
        let max = self.current_list_len();
        if max > 0 {
            self.selected_index = (self.selected_index + 1) % max;
        }
    }

    pub fn previous_item(&mut self) {
        let max = self.current_list_len();
        if max > 0 {
            self.selected_index = if self.selected_index == 0 {
                max - 1
            } else {
                self.selected_index - 1
            };
        }
    }

    pub fn page_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(10);
    }

    pub fn page_down(&mut self) {
        let len = self.current_list_len();
        if len == 0 {
            return;
        }
        self.selected_index = usize::min(self.selected_index + 10, len - 1);
    }

    pub fn go_home(&mut self) {
        self.selected_index = 0;
    }

    pub fn go_end(&mut self) {
        let len = self.current_list_len();
        if len == 0 {
            return;
        }
        self.selected_index = len - 1;
    }

    pub fn report_error(&mut self, context: &str, err: anyhow::Error) {
        self.status_message = format!("{}: {}", context, err);
    }

    fn current_list_len(&self) -> usize {
        match self.current_section {
            MenuSection::Inbox => self.store.visible().len(),
            MenuSection::Locker => self.locker_module.documents.len(),
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.current_list_len();
        if len == 0 {
            self.selected_index = 0;
        } else if self.selected_index >= len {
            self.selected_index = len - 1;
        }
    }
}

fn toast_fresh_arrivals(fresh: usize) {
    // Best effort: headless sessions have no notification daemon.
    let body = if fresh == 1 {
        "1 new notification".to_string()
    } else {
        format!("{} new notifications", fresh)
    };
    let _ = notify_rust::Notification::new()
        .summary("belfry")
        .body(&body)
        .show();
}
