use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use scriptchat_core::template::ALIAS_TARGET;
use scriptchat_core::theme::{self, Theme};
use scriptchat_core::{
    AnalysisFeed, EmissionTimer, Generation, PlaybackSession, Scheduled, SiteConfig, TemplateStore,
    ThemeName, Timing,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Startup choices resolved from CLI flags and the config file
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub theme: ThemeName,
    /// Template loaded on startup
    pub initial_template: String,
    pub timing: Timing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Message input
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars
    // Last suggestion copied into the input, so each one is only applied once
    prefilled: Option<String>,

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    // Keep the newest message in view until the user scrolls up
    follow_chat: bool,

    // Template picker
    pub show_template_picker: bool,
    pub template_keys: Vec<String>,
    pub template_state: ListState,
    pub selected_template: String,

    // Theme
    pub theme: ThemeName,
    pub site: SiteConfig,

    // Playback
    pub session: PlaybackSession,
    pub feed: AnalysisFeed,
    pub store: TemplateStore,
    timer: EmissionTimer<AppEvent>,

    // Animation state
    pub animation_frame: u8,
    ticks: u32,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(
        store: TemplateStore,
        site: SiteConfig,
        options: AppOptions,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let template_keys: Vec<String> = store.keys().into_iter().map(str::to_string).collect();
        let selected_template = if template_keys.iter().any(|k| k == ALIAS_TARGET) {
            ALIAS_TARGET.to_string()
        } else {
            template_keys.first().cloned().unwrap_or_default()
        };

        let mut app = Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            input: String::new(),
            input_cursor: 0,
            prefilled: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_chat: true,

            show_template_picker: false,
            template_keys,
            template_state: ListState::default(),
            selected_template,

            theme: options.theme,
            site,

            session: PlaybackSession::new(options.timing.reply_delay.clone()),
            feed: AnalysisFeed::new(options.timing.lead_in),
            store,
            timer: EmissionTimer::new(events, AppEvent::Emission),

            animation_frame: 0,
            ticks: 0,

            chat_area: None,
        };
        app.load_template(&options.initial_template);
        app
    }

    pub fn current_theme(&self) -> &Theme {
        self.site.theme(self.theme)
    }

    pub fn partner_name(&self) -> &str {
        theme::partner_name(self.session.partner_name(), self.current_theme())
    }

    /// Throw away the current conversation and replay `key` from its cursor
    pub fn load_template(&mut self, key: &str) {
        tracing::info!(template = key, "loading template");
        let scheduled = self.session.load(self.store.get(key));
        self.apply_schedule(scheduled);

        self.input.clear();
        self.input_cursor = 0;
        self.prefilled = None;
        self.sync_suggestion();

        self.replay_feed();
        self.scroll_chat_to_bottom();
    }

    /// Send whatever is in the input box
    pub fn send_input(&mut self) {
        let before = self.session.history().len();
        let scheduled = self.session.send(&self.input);
        if self.session.history().len() == before {
            return;
        }
        self.apply_schedule(scheduled);

        self.input.clear();
        self.input_cursor = 0;
        self.prefilled = None;
        self.sync_suggestion();

        self.replay_feed();
        self.scroll_chat_to_bottom();
    }

    /// A reply timer went off
    pub fn on_emission(&mut self, generation: Generation) {
        let before = self.session.history().len();
        let scheduled = self.session.fire(generation);
        if self.session.history().len() == before {
            return;
        }
        self.apply_schedule(scheduled);
        self.sync_suggestion();
        self.replay_feed();
        self.scroll_chat_to_bottom();
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.feed.tick(now);

        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % 12 == 0 {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.next();
        tracing::debug!(theme = self.theme.as_str(), "switched theme");
    }

    fn apply_schedule(&mut self, scheduled: Option<Scheduled>) {
        match scheduled {
            Some(scheduled) => self.timer.schedule(scheduled),
            None => self.timer.cancel(),
        }
    }

    // The analysis view restarts whenever the conversation changes
    fn replay_feed(&mut self) {
        self.feed.restart(self.session.analysis(), Instant::now());
    }

    /// Pre-fill the input when a new suggestion shows up
    fn sync_suggestion(&mut self) {
        match self.session.suggestion() {
            Some(suggestion) if self.prefilled.as_deref() != Some(suggestion) => {
                self.input = suggestion.to_string();
                self.input_cursor = self.input.chars().count();
                self.prefilled = Some(suggestion.to_string());
            }
            Some(_) => {}
            None => self.prefilled = None,
        }
    }

    // Template picker
    pub fn open_template_picker(&mut self) {
        let idx = self
            .template_keys
            .iter()
            .position(|k| *k == self.selected_template)
            .unwrap_or(0);
        self.template_state
            .select(if self.template_keys.is_empty() { None } else { Some(idx) });
        self.show_template_picker = true;
    }

    pub fn template_picker_nav_down(&mut self) {
        let len = self.template_keys.len();
        if len > 0 {
            let i = self.template_state.selected().unwrap_or(0);
            self.template_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn template_picker_nav_up(&mut self) {
        let i = self.template_state.selected().unwrap_or(0);
        self.template_state.select(Some(i.saturating_sub(1)));
    }

    /// Load the highlighted template and close the picker
    pub fn confirm_template_picker(&mut self) {
        self.show_template_picker = false;
        let Some(key) = self
            .template_state
            .selected()
            .and_then(|i| self.template_keys.get(i))
            .cloned()
        else {
            return;
        };
        self.selected_template = key.clone();
        self.load_template(&key);
    }

    // Chat scrolling
    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_chat = false;
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_chat = self.chat_scroll >= max;
    }

    pub fn scroll_chat_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_chat = false;
    }

    /// Scroll chat to bottom so the newest message is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
        self.follow_chat = true;
    }

    /// Record the inner size of the chat pane and re-clamp the scroll offset.
    ///
    /// Called on every render, since the size is unknown before the first frame.
    pub fn set_chat_viewport(&mut self, height: u16, width: u16) {
        self.chat_height = height;
        self.chat_width = width;
        if self.follow_chat {
            self.chat_scroll = self.max_chat_scroll();
        } else {
            self.chat_scroll = self.chat_scroll.min(self.max_chat_scroll());
        }
    }

    fn max_chat_scroll(&self) -> u16 {
        if self.chat_height == 0 {
            return 0;
        }
        self.chat_content_lines().saturating_sub(self.chat_height)
    }

    /// Wrapped line count of the chat, matching what `ui` renders
    fn chat_content_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.session.history() {
            total_lines = total_lines.saturating_add(1); // Sender line
            for line in msg.content.lines() {
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 {
                    1
                } else {
                    char_count.div_ceil(wrap_width)
                };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Spacer
        }
        if self.session.is_pending() {
            total_lines = total_lines.saturating_add(2);
        }
        total_lines
    }
}
