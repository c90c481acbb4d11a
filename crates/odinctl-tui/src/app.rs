//! Application core: event loop, key routing and action dispatch.

use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use odinctl_core::{Dashboard, SyncState};

use crate::action::{Action, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge;
use crate::event::{Event, EventReader};
use crate::screens::DashboardScreen;
use crate::theme;
use crate::tui::Tui;

const TICK_RATE: Duration = Duration::from_millis(250);
const RENDER_RATE: Duration = Duration::from_millis(33);
/// Ticks a notification stays on screen (4 s at 4 Hz).
const NOTIFICATION_TICKS: u16 = 16;

/// Top-level application state and event loop.
pub struct App {
    dashboard: Dashboard,
    screen: DashboardScreen,
    running: bool,
    sync_state: SyncState,
    polls: u64,
    help_visible: bool,
    notification: Option<(Notification, u16)>,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let config = dashboard.config();
        let screen = DashboardScreen::new(config.server.to_string(), config.adapter.clone());

        Self {
            dashboard,
            screen,
            running: true,
            sync_state: SyncState::Idle,
            polls: 0,
            help_visible: false,
            notification: None,
            action_tx,
            action_rx,
        }
    }

    /// Run the main event loop until the user quits.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.screen.init(self.action_tx.clone())?;

        let cancel = CancellationToken::new();
        let bridge = tokio::spawn(data_bridge::spawn_data_bridge(
            self.dashboard.clone(),
            self.action_tx.clone(),
            cancel.clone(),
        ));

        let mut events = EventReader::new(TICK_RATE, RENDER_RATE);
        info!(size = ?tui.size().unwrap_or((80, 24)), "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize | Event::Render => self.action_tx.send(Action::Render)?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        cancel.cancel();
        // The bridge stops the dashboard on its way out.
        let _ = bridge.await;
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key to an action. Global keys are handled here unless the
    /// screen is editing text; everything else goes to the screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (key.modifiers, key.code) {
            return Ok(Some(Action::Quit));
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?' | 'q') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Tab) => return Ok(Some(Action::FocusNext)),
            (_, KeyCode::BackTab) => return Ok(Some(Action::FocusPrev)),
            _ => {}
        }

        if !self.screen.captures_text() {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                KeyCode::Esc if self.notification.is_some() && self.screen.focus().is_none() => {
                    return Ok(Some(Action::DismissNotification));
                }
                _ => {}
            }
        }

        self.screen.handle_key_event(key)
    }

    /// Process a single action: update app state, run commands, and
    /// propagate to the screen.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::Render => {}

            Action::Edit(request) => {
                debug!(?request, "submitting edit");
                data_bridge::spawn_edit(&self.dashboard, request.clone(), self.action_tx.clone());
            }
            Action::Reload => {
                data_bridge::spawn_reload(&self.dashboard, self.action_tx.clone());
            }

            Action::Notify(note) => {
                self.notification = Some((note.clone(), NOTIFICATION_TICKS));
            }
            Action::DismissNotification => self.notification = None,

            other => {
                match other {
                    Action::Tick => self.expire_notification(),
                    Action::StateChanged(state) => self.sync_state = *state,
                    Action::Polled(n) => self.polls = *n,
                    Action::Disconnected(reason) => {
                        self.notification = Some((
                            Notification::error(reason.clone()),
                            NOTIFICATION_TICKS,
                        ));
                    }
                    _ => {}
                }
                if let Some(follow_up) = self.screen.update(other)? {
                    self.action_tx.send(follow_up)?;
                }
            }
        }
        Ok(())
    }

    fn expire_notification(&mut self) {
        if let Some((_, ref mut ticks)) = self.notification {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.notification = None;
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let layout = Layout::vertical([
            Constraint::Min(1),    // screen
            Constraint::Length(1), // notification
            Constraint::Length(1), // status bar
        ])
        .split(area);

        self.screen.render(frame, layout[0]);
        self.render_notification(frame, layout[1]);
        self.render_status_bar(frame, layout[2]);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_notification(&self, frame: &mut Frame, area: Rect) {
        let Some((ref note, _)) = self.notification else {
            return;
        };
        let (icon, style) = match note.level {
            NotificationLevel::Success => ("✓", theme::success()),
            NotificationLevel::Warning => ("!", theme::stale()),
            NotificationLevel::Error => ("✗", theme::error()),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {icon} {}", note.message), style)),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let indicator = match self.sync_state {
            SyncState::Polling => Span::styled("● polling", theme::success()),
            SyncState::Ready => Span::styled("● connected", theme::success()),
            SyncState::Idle | SyncState::Initializing => {
                Span::styled("◐ connecting", Style::default().fg(theme::ELECTRIC_YELLOW))
            }
            SyncState::Stopped => Span::styled("○ stopped", theme::key_hint()),
            SyncState::Failed => Span::styled("○ failed", theme::error()),
        };

        let line = Line::from(vec![
            Span::raw(" "),
            indicator,
            Span::styled(format!(" │ {} polls", self.polls), theme::key_hint()),
            Span::styled(" │ Tab field  Enter set  Space enable  ? help  q quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let width = 56u16.min(area.width.saturating_sub(4));
        let height = 16u16.min(area.height.saturating_sub(2));
        let help_area = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, help_area);
        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(help_area);
        frame.render_widget(block, help_area);

        let row = |key: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<12}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };
        let lines = vec![
            Line::from(""),
            row("Tab", "Next field"),
            row("Shift+Tab", "Previous field"),
            row("Enter", "Send the focused field"),
            row("Esc", "Leave the field, discard edits"),
            row("Space", "Toggle background task"),
            row("m", "Cycle mode"),
            row("r", "Reload adapters and parameters"),
            row("?", "This help"),
            row("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled(
                "  Letters type into a focused text field;",
                theme::key_hint(),
            )),
            Line::from(Span::styled("  press Esc first to use shortcuts.", theme::key_hint())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }
}
