//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, Focus, Transport};
use crate::config::{ControlsSettings, UiSettings};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("h/l", "sidebar/songs");
    map.insert("enter", "open/play");
    map.insert("space", "play/pause");
    map.insert("s", "stop");
    map.insert("n/N", "next/prev song");
    // H/L and +/- are filled from config.
    map.insert("r", "repeat");
    map.insert("a", "autoplay");
    map.insert("u", "rescan");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating the configured steps.
fn controls_text(controls: &ControlsSettings) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "enter", "space", "s", "n/N", "H/L", "+/-", "r", "a", "u", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "H/L" => Some(format!("[H/L] seek -/+{}s", controls.seek_seconds)),
            "+/-" => Some(format!(
                "[+/-] volume ±{:.0}%",
                controls.volume_step * 100.0
            )),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v)),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn transport_label(transport: Transport) -> &'static str {
    match transport {
        Transport::Playing => "▶ Playing",
        Transport::Paused => "⏸ Paused",
        Transport::Stopped => "■ Stopped",
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block.border_style(Style::default().add_modifier(Modifier::BOLD))
    } else {
        block.border_style(Style::default().add_modifier(Modifier::DIM))
    }
}

/// Window of `len` rows of height `height` that keeps `selected` centered
/// when possible. Returns `(start, end, selected_in_window)`.
fn visible_window(len: usize, height: usize, selected: usize) -> (usize, usize, usize) {
    if len <= height || height == 0 {
        return (0, len, selected);
    }
    let half = height / 2;
    let mut start = selected.saturating_sub(half);
    if start + height > len {
        start = len - height;
    }
    (start, start + height, selected - start)
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings, controls: &ControlsSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(5),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" cadenza ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4), Constraint::Ratio(3, 4)])
        .split(chunks[1]);
    draw_sidebar(frame, app, panes[0]);
    draw_songs(frame, app, panes[1]);
    draw_now_playing(frame, app, chunks[2]);

    let footer = Paragraph::new(controls_text(controls))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let rows = app.sidebar();
    let height = area.height.saturating_sub(2) as usize;
    let (start, end, selected) = visible_window(rows.len(), height, app.sidebar_selected);

    let items: Vec<ListItem> = rows[start..end]
        .iter()
        .map(|row| ListItem::new(format!("{}{}", "  ".repeat(row.depth), row.name)))
        .collect();

    let list = List::new(items)
        .block(pane_block(" library ", app.focus == Focus::Sidebar))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_songs(frame: &mut Frame, app: &App, area: Rect) {
    let songs = app.shown_songs();
    let height = area.height.saturating_sub(2) as usize;
    let (start, end, selected) = visible_window(songs.len(), height, app.song_selected);
    let playing = app.now_playing.as_ref().map(|s| s.path.as_path());

    // Only build ListItems for the visible window.
    let items: Vec<ListItem> = songs[start..end]
        .iter()
        .map(|song| {
            let mut label = song.label();
            if let Some(d) = song.duration {
                label = format!("{label}  [{}]", format_mmss(d));
            }
            if playing == Some(song.path.as_path()) {
                ListItem::new(format!("♪ {label}")).bold()
            } else {
                ListItem::new(format!("  {label}"))
            }
        })
        .collect();

    let title = app
        .shown_directory()
        .map_or_else(|| " songs ".to_string(), |d| format!(" {} ", d.name));
    let list = List::new(items)
        .block(pane_block(&title, app.focus == Focus::Songs))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if !songs.is_empty() && app.focus == Focus::Songs {
        state.select(Some(selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_now_playing(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::bordered()
        .padding(Padding {
            left: 1,
            right: 1,
            top: 0,
            bottom: 0,
        })
        .title(" now playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let song = app
        .now_playing
        .as_ref()
        .map_or_else(|| "-".to_string(), |s| s.label());
    let mut parts = vec![
        transport_label(app.transport).to_string(),
        song,
        format!("Vol: {:.0}%", app.volume * 100.0),
        format!("Autoplay: {}", on_off(app.autoplay)),
        format!("Repeat: {}", on_off(app.repeat)),
    ];
    if let Some(status) = &app.status {
        parts.push(status.clone());
    }
    frame.render_widget(Paragraph::new(parts.join(" • ")), rows[0]);

    let gauge = Gauge::default()
        .ratio(app.progress_ratio())
        .label(format!(
            "{} / {}",
            format_mmss(app.elapsed),
            format_mmss(app.total)
        ))
        .use_unicode(true);
    frame.render_widget(gauge, rows[1]);
}
