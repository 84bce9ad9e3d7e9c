use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use scriptchat_core::{DisplayRole, Stage};

use crate::app::{App, InputMode};

/// Parse `#RRGGBB` into a terminal color
fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn palette_color(hex: &str, fallback: Color) -> Color {
    hex_color(hex).unwrap_or(fallback)
}

fn color_or(hex: Option<&str>, fallback: Color) -> Color {
    hex.and_then(hex_color).unwrap_or(fallback)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let theme = app.current_theme().clone();

    let background = palette_color(&theme.background.color, Color::Reset);
    frame.render_widget(Block::default().style(Style::default().bg(background)), area);

    let info_height = theme
        .info_links()
        .map(|info| (info.links.len() as u16) + 2)
        .unwrap_or(0);

    // Main layout: header, landing band, body, info section, footer
    let [header_area, landing_area, body_area, info_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(info_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_landing(app, frame, landing_area);

    let [chat_area, terminal_area] = Layout::horizontal([
        Constraint::Percentage(55),
        Constraint::Percentage(45),
    ])
    .areas(body_area);

    render_chat(app, frame, chat_area);
    render_terminal(app, frame, terminal_area);

    if info_height > 0 {
        render_info(app, frame, info_area);
    }
    render_footer(app, frame, footer_area);

    if app.show_template_picker {
        render_template_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let theme = app.current_theme();
    let accent = palette_color(&theme.palette.accent, Color::Cyan);

    let toggle = theme
        .toggle_label
        .clone()
        .unwrap_or_else(|| format!("THEME: {}", app.theme.as_str().to_uppercase()));

    let title = Line::from(vec![
        Span::styled(" scriptchat ", Style::default().fg(accent).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(format!("[t] {}", toggle), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_landing(app: &App, frame: &mut Frame, area: Rect) {
    let theme = app.current_theme();
    let headline_color = color_or(theme.headline.color.as_deref(), Color::White);
    let intro_color = color_or(theme.intro.font_color.as_deref(), Color::Gray);

    let lines = vec![
        Line::from(Span::styled(
            theme.headline.text.clone(),
            Style::default().fg(headline_color).add_modifier(Modifier::BOLD),
        ))
        .centered(),
        Line::from(Span::styled(theme.intro.text.clone(), Style::default().fg(intro_color)))
            .centered(),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let theme = app.current_theme().clone();
    let accent = palette_color(&theme.palette.accent, Color::Cyan);
    let user_color = palette_color(&theme.palette.user, Color::Cyan);
    let bot_color = palette_color(&theme.palette.bot, Color::White);
    let muted = palette_color(&theme.palette.muted, Color::DarkGray);

    let [history_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    // Store area and inner size for scrolling and mouse hit-testing
    app.chat_area = Some(history_area);
    app.set_chat_viewport(
        history_area.height.saturating_sub(2),
        history_area.width.saturating_sub(2),
    );

    let partner = app.partner_name().to_string();
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent))
        .title(format!(" {} ", partner))
        .title(Line::from(Span::styled(" online ", Style::default().fg(muted))).right_aligned());

    let chat_text = if app.session.history().is_empty() && !app.session.is_pending() {
        Text::from(Span::styled(
            "No messages yet. Press l to load a conversation.",
            Style::default().fg(muted),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.session.history() {
            let (label, color) = match msg.role {
                DisplayRole::User => ("You", user_color),
                DisplayRole::Bot => (partner.as_str(), bot_color),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{}:", label),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {}", msg.timestamp), Style::default().fg(muted)),
            ]));
            for line in msg.content.lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::default());
        }

        if app.session.is_pending() {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("{} is typing{}", partner, dots),
                Style::default().fg(muted).add_modifier(Modifier::ITALIC),
            )));
            lines.push(Line::default());
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, history_area);

    render_input(app, frame, input_area, accent, user_color);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, accent: Color, text_color: Color) {
    let border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        accent
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Type a message... ")
        .title(
            Line::from(format!(" {} [l] load ", app.selected_template)).right_aligned(),
        );

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(text_color))
        .block(input_block);
    frame.render_widget(input, area);

    // Show cursor when editing
    if app.input_mode == InputMode::Editing && !app.show_template_picker {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_terminal(app: &App, frame: &mut Frame, area: Rect) {
    let theme = app.current_theme();
    let green = palette_color(&theme.palette.terminal, Color::Green);
    let prompt = Style::default().fg(green).add_modifier(Modifier::BOLD);
    let text = Style::default().fg(green);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" analysis_feed.log ");

    let mut lines: Vec<Line> = Vec::new();

    if !app.feed.has_analysis() {
        lines.push(Line::from(vec![
            Span::styled("> ", prompt),
            Span::styled("Analysis pending...", text),
        ]));
    } else {
        let summary = app.feed.text(Stage::Summary);
        if !summary.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("> ", prompt),
                Span::styled("SUMMARY:", prompt),
            ]));
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(summary.to_string(), text),
            ]));
        }

        let label = app.feed.text(Stage::PredictionsLabel);
        if !label.is_empty() {
            lines.push(Line::from(Span::styled(label.to_string(), prompt)));
        }

        for stage in [Stage::TopPrediction, Stage::SecondPrediction] {
            let prediction = app.feed.text(stage);
            if !prediction.is_empty() {
                lines.push(Line::from(Span::styled(prediction.to_string(), text)));
            }
        }

        let cursor = if app.animation_frame % 2 == 0 { "_" } else { " " };
        lines.push(Line::from(vec![
            Span::styled("> ", prompt),
            Span::styled(cursor, text),
        ]));
    }

    let terminal = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(Color::Black))
        .wrap(Wrap { trim: false });
    frame.render_widget(terminal, area);
}

fn render_info(app: &App, frame: &mut Frame, area: Rect) {
    let theme = app.current_theme();
    let Some(info) = theme.info_links() else {
        return;
    };
    let link_color = palette_color(&theme.palette.accent, Color::Blue);

    let lines: Vec<Line> = info
        .links
        .iter()
        .map(|link| {
            Line::from(vec![
                Span::styled(link.label.clone(), Style::default().fg(link_color).underlined()),
                Span::styled(format!("  {}", link.url), Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" {} ", info.title));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" CHAT ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" TYPE ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    let hints: &[(&str, &str)] = if app.show_template_picker {
        &[(" j/k ", " nav "), (" Enter ", " load "), (" Esc ", " cancel ")]
    } else {
        match app.input_mode {
            InputMode::Normal => &[
                (" i ", " type "),
                (" l ", " load "),
                (" t ", " theme "),
                (" j/k ", " scroll "),
                (" q ", " quit "),
            ],
            InputMode::Editing => &[(" Enter ", " send "), (" Esc ", " done ")],
        }
    };
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Center a `width` x `height` box inside `area`
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_template_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let height = (app.template_keys.len() as u16) + 2;
    let popup_area = centered_rect(36, height, area);

    let items: Vec<ListItem> = app
        .template_keys
        .iter()
        .map(|key| {
            let marker = if *key == app.selected_template { "*" } else { " " };
            ListItem::new(format!(" {} {} ", marker, key))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Load conversation "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_widget(Clear, popup_area);
    frame.render_stateful_widget(list, popup_area, &mut app.template_state);
}
