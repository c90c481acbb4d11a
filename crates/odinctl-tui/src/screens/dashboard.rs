//! Dashboard screen: the mirrored adapter and its parameter form.
//!
//! Four panels: server (API version and adapter list), background task
//! (counters, enable checkbox and interval), device (read-only parameter
//! and server info), and the settable-parameter form. Form fields are
//! `tui-input` buffers; a field being edited is not overwritten by
//! incoming data until it is submitted or abandoned with Esc.

use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use serde_json::Value;
use tui_input::{Input, InputRequest};

use odinctl_core::{
    ApiVersion, BackgroundTask, DeviceStatus, Resource, ResourceStatus, SettableField,
    SettableParameters, SyncState,
};

use crate::action::{Action, EditRequest, Notification};
use crate::component::Component;
use crate::theme;

/// Values offered by the `m` key, in cycle order.
const MODES: [&str; 3] = ["Mode1", "Mode2", "Mode3"];

const LABEL_WIDTH: usize = 22;

// ── Form fields ──────────────────────────────────────────────────────

/// A focusable form element, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Param(SettableField),
    Enable,
    Interval,
}

impl FormField {
    const ALL: [FormField; 6] = [
        Self::Param(SettableField::Value),
        Self::Param(SettableField::Value2),
        Self::Param(SettableField::Text),
        Self::Param(SettableField::Mode),
        Self::Enable,
        Self::Interval,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|&f| f == self).unwrap_or(0)
    }

    /// Whether the field has a text buffer.
    fn is_text(self) -> bool {
        !matches!(self, Self::Enable)
    }
}

/// Mode following `current` in [`MODES`]; unknown modes restart the cycle.
pub fn next_mode(current: Option<&str>) -> &'static str {
    let next = current
        .and_then(|c| MODES.iter().position(|m| *m == c))
        .map_or(0, |i| (i + 1) % MODES.len());
    MODES[next]
}

/// Render a JSON scalar without string quotes.
fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "—".into(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Component ────────────────────────────────────────────────────────

pub struct DashboardScreen {
    server: String,
    adapter: String,
    state: SyncState,
    disconnected: Option<String>,
    api_version: Option<ApiVersion>,
    adapters: Option<Arc<Vec<String>>>,
    task: Option<Arc<BackgroundTask>>,
    device: Option<Arc<DeviceStatus>>,
    settable: Option<Arc<SettableParameters>>,
    statuses: HashMap<Resource, ResourceStatus>,
    polls: u64,
    /// `None` while browsing; global keys are live.
    focus: Option<FormField>,
    inputs: HashMap<FormField, Input>,
    /// Fields edited locally and not yet submitted.
    dirty: Vec<FormField>,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl DashboardScreen {
    pub fn new(server: impl Into<String>, adapter: impl Into<String>) -> Self {
        let inputs = FormField::ALL
            .iter()
            .filter(|f| f.is_text())
            .map(|&f| (f, Input::default()))
            .collect();

        Self {
            server: server.into(),
            adapter: adapter.into(),
            state: SyncState::Idle,
            disconnected: None,
            api_version: None,
            adapters: None,
            task: None,
            device: None,
            settable: None,
            statuses: HashMap::new(),
            polls: 0,
            focus: None,
            inputs,
            dirty: Vec::new(),
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    // ── Form state ───────────────────────────────────────────────────

    pub fn focus(&self) -> Option<FormField> {
        self.focus
    }

    /// Current text of a form buffer.
    pub fn input_value(&self, field: FormField) -> &str {
        self.inputs.get(&field).map_or("", Input::value)
    }

    fn focus_next(&mut self) {
        let next = self
            .focus
            .map_or(0, |f| (f.position() + 1) % FormField::ALL.len());
        self.focus = Some(FormField::ALL[next]);
    }

    fn focus_prev(&mut self) {
        let len = FormField::ALL.len();
        let prev = self
            .focus
            .map_or(len - 1, |f| (f.position() + len - 1) % len);
        self.focus = Some(FormField::ALL[prev]);
    }

    /// Text a field shows when it is not being edited.
    fn loaded_text(&self, field: FormField) -> String {
        match field {
            FormField::Param(p) => self
                .settable
                .as_ref()
                .map(|s| s.input_text(p))
                .unwrap_or_default(),
            FormField::Interval => self
                .task
                .as_ref()
                .and_then(|t| t.interval)
                .map(|i| i.to_string())
                .unwrap_or_default(),
            FormField::Enable => String::new(),
        }
    }

    /// Refresh every buffer that has no pending local edit.
    fn sync_inputs(&mut self) {
        let fields: Vec<FormField> = self.inputs.keys().copied().collect();
        for field in fields {
            if !self.dirty.contains(&field) {
                let text = self.loaded_text(field);
                if let Some(input) = self.inputs.get_mut(&field) {
                    if input.value() != text {
                        *input = Input::new(text);
                    }
                }
            }
        }
    }

    fn mark_clean(&mut self, field: FormField) {
        self.dirty.retain(|f| *f != field);
    }

    /// Drop the pending edit of the focused field and leave the form.
    fn abandon_edit(&mut self) {
        if let Some(field) = self.focus.take() {
            self.mark_clean(field);
            self.sync_inputs();
        }
    }

    fn edit_input(&mut self, field: FormField, request: InputRequest) {
        if let Some(input) = self.inputs.get_mut(&field) {
            if input.handle(request).is_some() && !self.dirty.contains(&field) {
                self.dirty.push(field);
            }
        }
    }

    fn toggle_enable(&self) -> Action {
        match self.task {
            Some(ref task) => Action::Edit(EditRequest::Enable(!task.enable)),
            None => Action::Notify(Notification::warning(
                "Background task status has not loaded yet",
            )),
        }
    }

    fn cycle_mode(&self) -> Action {
        let current = self.settable.as_ref().and_then(|s| s.mode.as_deref());
        Action::Edit(EditRequest::Field(
            SettableField::Mode,
            next_mode(current).to_owned(),
        ))
    }

    /// Build the write for the focused field.
    fn submit(&mut self, field: FormField) -> Action {
        let text = self.input_value(field).to_owned();
        self.mark_clean(field);
        match field {
            FormField::Param(p) => Action::Edit(EditRequest::Field(p, text)),
            FormField::Interval => Action::Edit(EditRequest::Interval(text)),
            FormField::Enable => self.toggle_enable(),
        }
    }

    fn is_stale(&self, resource: Resource) -> Option<&str> {
        self.statuses
            .get(&resource)
            .and_then(|s| s.last_error.as_deref())
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn panel(&self, title: &str, resource: Option<Resource>, focused: bool) -> Block<'static> {
        let mut spans = vec![Span::styled(format!(" {title} "), theme::title_style())];
        if resource.and_then(|r| self.is_stale(r)).is_some() {
            spans.push(Span::styled("stale ", theme::stale()));
        }
        Block::default()
            .title(Line::from(spans))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if focused {
                theme::border_focused()
            } else {
                theme::border_default()
            })
    }

    fn detail_line(label: &str, value: String) -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("  {label:<LABEL_WIDTH$}"), theme::label()),
            Span::styled(value, theme::value()),
        ])
    }

    fn error_line(&self, resource: Resource) -> Option<Line<'static>> {
        self.is_stale(resource)
            .map(|e| Line::from(Span::styled(format!("  ✗ {e}"), theme::error())))
    }

    fn render_server(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel("Server", Some(Resource::Adapters), false);
        let mut lines = vec![
            Self::detail_line("URL", self.server.clone()),
            Self::detail_line(
                "API version",
                self.api_version
                    .as_ref()
                    .map_or_else(|| "—".into(), ToString::to_string),
            ),
            Line::from(Span::styled("  Adapters", theme::label())),
        ];
        match self.adapters {
            Some(ref adapters) if !adapters.is_empty() => {
                for name in adapters.iter() {
                    let (marker, style) = if *name == self.adapter {
                        ("●", theme::success())
                    } else {
                        ("○", theme::value())
                    };
                    lines.push(Line::from(Span::styled(format!("    {marker} {name}"), style)));
                }
            }
            Some(_) => lines.push(Line::from(Span::styled("    (none)", theme::label()))),
            None => lines.push(Line::from(Span::styled("    loading…", theme::label()))),
        }
        lines.extend(self.error_line(Resource::Adapters));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_device(&self, frame: &mut Frame, area: Rect) {
        let block = self.panel("Device", Some(Resource::Device), false);
        let dash = || "—".to_owned();
        let lines: Vec<Line> = match self.device {
            Some(ref d) => {
                let mut lines = vec![
                    Self::detail_line("my_parameter", scalar(&d.my_parameter)),
                    Self::detail_line("ODIN version", d.odin_version.clone().unwrap_or_else(dash)),
                    Self::detail_line(
                        "Tornado version",
                        d.tornado_version.clone().unwrap_or_else(dash),
                    ),
                    Self::detail_line(
                        "Server uptime",
                        d.server_uptime.map_or_else(dash, format_uptime),
                    ),
                    Self::detail_line("Polls", self.polls.to_string()),
                ];
                lines.extend(self.error_line(Resource::Device));
                lines
            }
            None => {
                let mut lines = vec![Line::from(Span::styled("  waiting for data…", theme::label()))];
                lines.extend(self.error_line(Resource::Device));
                lines
            }
        };
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_task(&self, frame: &mut Frame, area: Rect) {
        let focused = matches!(self.focus, Some(FormField::Enable | FormField::Interval));
        let block = self.panel("Background task", Some(Resource::BackgroundTask), focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1), // ioloop
            Constraint::Length(1), // thread
            Constraint::Length(1), // enable
            Constraint::Length(1), // interval
            Constraint::Min(0),    // error
        ])
        .split(inner);

        let count = |f: fn(&BackgroundTask) -> u64| {
            self.task
                .as_ref()
                .map_or_else(|| "—".into(), |t| f(t).to_string())
        };
        frame.render_widget(
            Paragraph::new(Self::detail_line("IOLoop count", count(|t| t.ioloop_count))),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(Self::detail_line("Thread count", count(|t| t.thread_count))),
            rows[1],
        );

        let enabled = self.task.as_ref().is_some_and(|t| t.enable);
        let active = self.focus == Some(FormField::Enable);
        let marker = if enabled { "[✓]" } else { "[ ]" };
        let marker_style = if active {
            Style::default().fg(theme::ELECTRIC_PURPLE)
        } else if enabled {
            theme::success()
        } else {
            theme::label()
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!("  {:<LABEL_WIDTH$}", "Enable"), theme::label()),
                Span::styled(marker, marker_style),
            ])),
            rows[2],
        );

        self.render_input(frame, rows[3], "Interval (s)", FormField::Interval);

        if let Some(line) = self.error_line(Resource::BackgroundTask) {
            frame.render_widget(Paragraph::new(line), rows[4]);
        }
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let focused = matches!(self.focus, Some(FormField::Param(_)));
        let block = self.panel("Settable parameters", Some(Resource::Settable), focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

        for (i, field) in SettableField::all().enumerate() {
            self.render_input(frame, rows[i], field.label(), FormField::Param(field));
        }
        if let Some(line) = self.error_line(Resource::Settable) {
            frame.render_widget(Paragraph::new(line), rows[4]);
        }
    }

    fn render_input(&self, frame: &mut Frame, area: Rect, label: &str, field: FormField) {
        let active = self.focus == Some(field);
        let pending = self.dirty.contains(&field);
        let value = self.input_value(field);
        let label_text = format!("  {label:<LABEL_WIDTH$}");
        let label_width = u16::try_from(label_text.chars().count()).unwrap_or(u16::MAX);

        let value_style = if active {
            theme::input_active()
        } else if pending {
            theme::stale()
        } else {
            theme::value()
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(label_text, theme::label()),
                Span::styled(value.to_owned(), value_style),
            ])),
            area,
        );

        if active {
            let cursor = self
                .inputs
                .get(&field)
                .map_or(0, Input::visual_cursor);
            let offset = u16::try_from(cursor).unwrap_or(u16::MAX);
            let x = area
                .x
                .saturating_add(label_width)
                .saturating_add(offset)
                .min(area.right().saturating_sub(1));
            frame.set_cursor_position((x, area.y));
        }
    }

    fn render_connecting(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

        let throbber = throbber_widgets_tui::Throbber::default()
            .label(format!("  Connecting to {}", self.server))
            .style(Style::default().fg(theme::NEON_CYAN))
            .throbber_style(Style::default().fg(theme::ELECTRIC_PURPLE));
        frame.render_stateful_widget(throbber, layout[1], &mut self.throbber_state.clone());

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("adapter {}", self.adapter),
                theme::key_hint(),
            ))
            .alignment(Alignment::Center),
            layout[2],
        );
    }

    fn render_failed(&self, frame: &mut Frame, area: Rect, reason: &str) {
        let layout = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("Could not connect to {}", self.server),
                theme::error(),
            ))
            .alignment(Alignment::Center),
            layout[1],
        );
        frame.render_widget(
            Paragraph::new(Span::styled(reason.to_owned(), theme::label()))
                .alignment(Alignment::Center),
            layout[2],
        );
    }
}

fn format_uptime(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return format!("{secs}s");
    }
    let whole = std::time::Duration::from_secs_f64(secs.floor());
    humantime::format_duration(whole).to_string()
}

// ── Component impl ───────────────────────────────────────────────────

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let Some(field) = self.focus else {
            // Browsing: only the screen's own shortcuts.
            return Ok(match key.code {
                KeyCode::Char(' ') => Some(self.toggle_enable()),
                KeyCode::Char('m') => Some(self.cycle_mode()),
                KeyCode::Char('r') => Some(Action::Reload),
                _ => None,
            });
        };

        let action = match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => {
                self.abandon_edit();
                None
            }
            (_, KeyCode::Enter) => Some(self.submit(field)),
            _ if field == FormField::Enable => match key.code {
                KeyCode::Char(' ') => Some(self.toggle_enable()),
                KeyCode::Char('m') => Some(self.cycle_mode()),
                KeyCode::Char('r') => Some(Action::Reload),
                _ => None,
            },
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                self.edit_input(field, InputRequest::InsertChar(c));
                None
            }
            (_, KeyCode::Backspace) => {
                self.edit_input(field, InputRequest::DeletePrevChar);
                None
            }
            (_, KeyCode::Delete) => {
                self.edit_input(field, InputRequest::DeleteNextChar);
                None
            }
            (_, KeyCode::Left) => {
                self.edit_input(field, InputRequest::GoToPrevChar);
                None
            }
            (_, KeyCode::Right) => {
                self.edit_input(field, InputRequest::GoToNextChar);
                None
            }
            (_, KeyCode::Home) => {
                self.edit_input(field, InputRequest::GoToStart);
                None
            }
            (_, KeyCode::End) => {
                self.edit_input(field, InputRequest::GoToEnd);
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::FocusNext => self.focus_next(),
            Action::FocusPrev => self.focus_prev(),
            Action::StateChanged(state) => {
                self.state = *state;
                if state.is_connected() {
                    self.disconnected = None;
                }
            }
            Action::Disconnected(reason) => self.disconnected = Some(reason.clone()),
            Action::ApiVersionUpdated(v) => self.api_version = Some(v.clone()),
            Action::AdaptersUpdated(a) => self.adapters = Some(Arc::clone(a)),
            Action::BackgroundTaskUpdated(t) => {
                self.task = Some(Arc::clone(t));
                self.sync_inputs();
            }
            Action::DeviceUpdated(d) => self.device = Some(Arc::clone(d)),
            Action::SettableUpdated(s) => {
                self.settable = Some(Arc::clone(s));
                self.sync_inputs();
            }
            Action::ResourceStatusChanged(resource, status) => {
                self.statuses.insert(*resource, status.clone());
            }
            Action::Polled(n) => self.polls = *n,
            Action::Tick => {
                if matches!(self.state, SyncState::Idle | SyncState::Initializing) {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        if let Some(ref reason) = self.disconnected {
            self.render_failed(frame, area, reason);
            return;
        }
        if !self.state.is_connected() && self.state != SyncState::Stopped {
            self.render_connecting(frame, area);
            return;
        }

        let columns =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(area);
        let left = Layout::vertical([Constraint::Min(6), Constraint::Length(8)]).split(columns[0]);
        let right = Layout::vertical([Constraint::Min(6), Constraint::Length(8)]).split(columns[1]);

        self.render_server(frame, left[0]);
        self.render_task(frame, left[1]);
        self.render_device(frame, right[0]);
        self.render_form(frame, right[1]);
    }

    fn captures_text(&self) -> bool {
        self.focus.is_some_and(FormField::is_text)
    }
}
