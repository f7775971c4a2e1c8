use chrono::NaiveDateTime;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout},
    text::Line,
    widgets::{Cell, Paragraph, Row, Table, TableState},
    DefaultTerminal, Frame,
};
use rusqlite::Connection;

use crate::error::Result;
use crate::fmt::{display_date, display_when};
use crate::models::Assignment;
use crate::register::{self, RegisterCounts};
use crate::tui::{paid_span, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

const PAGE_SIZE: usize = 20;

enum BoardAction {
    Continue,
    Close,
    Sync,
    TogglePaid,
    Reload,
}

/// Why the board handed the terminal back. A sync request closes the
/// alternate screen; the caller runs the sync and reopens the board with
/// the outcome in its status line.
pub enum DashboardExit {
    Quit,
    Sync,
}

pub struct Dashboard {
    rows: Vec<Assignment>,
    counts: RegisterCounts,
    person: String,
    show_all: bool,
    unpaid_only: bool,
    offset: usize,
    visible_count: usize,
    selected: usize,
    status_message: Option<String>,
    table_state: TableState,
    now: NaiveDateTime,
}

impl Dashboard {
    pub fn new(conn: &Connection, person: String, now: NaiveDateTime) -> Result<Self> {
        let rows = register::list_assignments(conn, false, false, None, None, now)?;
        let counts = register::counts(conn, now)?;
        let status_message = if rows.is_empty() {
            Some("No upcoming assignments. Press s to sync, a to show past ones.".to_string())
        } else {
            None
        };
        Ok(Self {
            rows,
            counts,
            person,
            show_all: false,
            unpaid_only: false,
            offset: 0,
            visible_count: PAGE_SIZE,
            selected: 0,
            status_message,
            table_state: TableState::default(),
            now,
        })
    }

    pub fn run(&mut self, conn: &Connection) -> Result<DashboardExit> {
        let hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            ratatui::restore();
            hook(info);
        }));

        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal, conn);
        ratatui::restore();
        result
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_message = Some(msg);
    }

    /// Re-query with the current filters. Unpaid-only includes past dates,
    /// otherwise an unpaid game from last month would be invisible.
    pub fn reload(&mut self, conn: &Connection) -> Result<()> {
        let include_past = self.show_all || self.unpaid_only;
        self.rows =
            register::list_assignments(conn, include_past, self.unpaid_only, None, None, self.now)?;
        self.counts = register::counts(conn, self.now)?;
        if self.offset >= self.rows.len() {
            self.offset = 0;
            self.selected = 0;
        }
        let visible = self.visible_count.min(self.rows.len() - self.offset);
        if visible == 0 {
            self.selected = 0;
        } else if self.selected >= visible {
            self.selected = visible - 1;
        }
        Ok(())
    }

    /// Position the view on the first upcoming row after switching to all
    /// dates, so history scrolls up instead of burying today.
    fn scroll_to_upcoming(&mut self) {
        let today = self.now.format("%Y-%m-%d").to_string();
        if let Some(idx) = self.rows.iter().position(|a| a.date.as_str() >= today.as_str()) {
            self.offset = idx.saturating_sub(PAGE_SIZE / 2);
            self.selected = idx - self.offset;
        } else if !self.rows.is_empty() {
            self.offset = self.rows.len().saturating_sub(PAGE_SIZE);
            self.selected = 0;
        }
    }

    pub fn draw_frame(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let narrow = area.width < 100;

        let areas = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Fill(1),   // table
            Constraint::Length(3), // detail
            Constraint::Length(1), // status
            Constraint::Length(1), // keys
        ])
        .split(area);
        let title_area = areas[0];
        let table_area = areas[1];
        let detail_area = areas[2];
        let status_area = areas[3];
        let keys_area = areas[4];

        frame.render_widget(
            Paragraph::new(format!("Assignments: {}", self.person)).style(HEADER_STYLE),
            title_area,
        );

        let header_overhead = 2u16; // header row + bottom_margin
        let available = table_area.height.saturating_sub(header_overhead) as usize;
        let end = (self.offset + available).min(self.rows.len());
        self.visible_count = end.saturating_sub(self.offset).max(1);

        let rendered_rows: Vec<Row> = self.rows[self.offset..end]
            .iter()
            .map(|a| {
                let time = a.time.clone().unwrap_or_default();
                let paid = Cell::from(paid_span(a.payment_eligible, a.is_paid));
                let cells: Vec<Cell> = if narrow {
                    vec![
                        Cell::from(a.id.to_string()),
                        Cell::from(display_date(&a.date)),
                        Cell::from(time),
                        Cell::from(a.duty.label()),
                        Cell::from(a.home_team.clone()),
                        Cell::from(a.away_team.clone()),
                        paid,
                    ]
                } else {
                    vec![
                        Cell::from(a.id.to_string()),
                        Cell::from(display_date(&a.date)),
                        Cell::from(time),
                        Cell::from(a.duty.label()),
                        Cell::from(a.home_team.clone()),
                        Cell::from(a.away_team.clone()),
                        Cell::from(a.venue.clone()),
                        paid,
                    ]
                };
                Row::new(cells)
            })
            .collect();

        let widths: Vec<Constraint> = if narrow {
            vec![
                Constraint::Length(5),
                Constraint::Length(10),
                Constraint::Length(5),
                Constraint::Length(10),
                Constraint::Fill(1),
                Constraint::Fill(1),
                Constraint::Length(7),
            ]
        } else {
            vec![
                Constraint::Length(5),
                Constraint::Length(10),
                Constraint::Length(5),
                Constraint::Length(10),
                Constraint::Fill(1),
                Constraint::Fill(1),
                Constraint::Fill(1),
                Constraint::Length(7),
            ]
        };

        let header_cells: Vec<&str> = if narrow {
            vec!["ID", "Date", "Time", "Duty", "Home", "Away", "Paid"]
        } else {
            vec!["ID", "Date", "Time", "Duty", "Home", "Away", "Venue", "Paid"]
        };

        self.table_state.select(Some(self.selected));
        let table = Table::new(rendered_rows, widths)
            .header(Row::new(header_cells).style(HEADER_STYLE).bottom_margin(1))
            .column_spacing(1)
            .row_highlight_style(SELECTED_STYLE);
        frame.render_stateful_widget(table, table_area, &mut self.table_state);

        frame.render_widget(Paragraph::new(self.detail_lines()), detail_area);

        let mut filters = vec![if self.show_all { "all dates" } else { "upcoming" }];
        if self.unpaid_only {
            filters.push("unpaid only");
        }
        let end_row = (self.offset + self.visible_count).min(self.rows.len());
        let first_row = if self.rows.is_empty() { 0 } else { self.offset + 1 };
        let mut status = format!(
            "Rows {}-{} of {} | Upcoming: {} | Awaiting payment: {} | {}",
            first_row,
            end_row,
            self.rows.len(),
            self.counts.upcoming,
            self.counts.unpaid,
            filters.join(", "),
        );
        if let Some(ref msg) = self.status_message {
            status.push_str(" | ");
            status.push_str(msg);
        }
        frame.render_widget(Paragraph::new(status).style(FOOTER_STYLE), status_area);

        frame.render_widget(
            Paragraph::new(
                "\u{2191}/\u{2193}:select  p:toggle paid  a:all dates  u:unpaid  s:sync  r:reload  \u{2190}/\u{2192}:page  q:quit",
            )
            .style(FOOTER_STYLE),
            keys_area,
        );
    }

    fn detail_lines(&self) -> Vec<Line<'static>> {
        let Some(a) = self.rows.get(self.offset + self.selected) else {
            return vec![];
        };
        let mut lines = vec![Line::from(format!(
            "  {}  {} vs {}  ({})",
            display_when(&a.date, a.time.as_deref()),
            a.home_team,
            a.away_team,
            a.duty.label(),
        ))];

        let mut origin = Vec::new();
        if !a.venue.is_empty() {
            origin.push(format!("Venue: {}", a.venue));
        }
        if let Some(ref f) = a.file_name {
            origin.push(format!("File: {f}"));
        }
        if !origin.is_empty() {
            lines.push(Line::from(format!("  {}", origin.join("   "))));
        }

        let payment = if !a.payment_eligible {
            "No payment expected".to_string()
        } else if a.is_paid {
            match a.paid_at.as_deref().and_then(|t| t.split(' ').next()) {
                Some(day) => format!("Paid on {day}"),
                None => "Paid".to_string(),
            }
        } else {
            "Unpaid".to_string()
        };
        let added = a.first_seen_at.split(' ').next().unwrap_or("");
        lines.push(Line::from(format!("  Added {added}   {payment}")));
        lines
    }

    fn handle_key_event(&mut self, code: KeyCode) -> BoardAction {
        self.status_message = None;

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return BoardAction::Close,
            KeyCode::Char('s') => return BoardAction::Sync,
            KeyCode::Char('p') => return BoardAction::TogglePaid,
            KeyCode::Char('r') => return BoardAction::Reload,
            KeyCode::Char('a') => {
                self.show_all = !self.show_all;
                self.offset = 0;
                self.selected = 0;
                return BoardAction::Reload;
            }
            KeyCode::Char('u') => {
                self.unpaid_only = !self.unpaid_only;
                self.offset = 0;
                self.selected = 0;
                return BoardAction::Reload;
            }
            KeyCode::Down => {
                let visible = self
                    .visible_count
                    .min(self.rows.len().saturating_sub(self.offset));
                if self.selected + 1 < visible {
                    self.selected += 1;
                } else if self.offset + visible < self.rows.len() {
                    self.offset += 1;
                }
            }
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                } else if self.offset > 0 {
                    self.offset -= 1;
                }
            }
            KeyCode::Right | KeyCode::PageDown => {
                self.scroll_down();
                self.selected = 0;
            }
            KeyCode::Left | KeyCode::PageUp => {
                self.scroll_up();
                self.selected = 0;
            }
            KeyCode::Home => {
                self.offset = 0;
                self.selected = 0;
            }
            KeyCode::End => {
                self.scroll_to_end();
                self.selected = 0;
            }
            _ => {}
        }
        BoardAction::Continue
    }

    fn event_loop(
        &mut self,
        terminal: &mut DefaultTerminal,
        conn: &Connection,
    ) -> Result<DashboardExit> {
        loop {
            terminal.draw(|frame| self.draw_frame(frame))?;

            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind,
                ..
            }) = event::read()?
            {
                if kind != KeyEventKind::Press {
                    continue;
                }
                if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
                    return Ok(DashboardExit::Quit);
                }

                match self.handle_key_event(code) {
                    BoardAction::Close => return Ok(DashboardExit::Quit),
                    BoardAction::Sync => return Ok(DashboardExit::Sync),
                    BoardAction::Continue => {}
                    BoardAction::TogglePaid => {
                        if let Err(e) = self.toggle_paid(conn) {
                            self.status_message = Some(format!("Payment toggle failed: {e}"));
                        }
                    }
                    BoardAction::Reload => {
                        let jump = self.show_all && self.offset == 0 && self.selected == 0;
                        if let Err(e) = self.reload(conn) {
                            self.status_message = Some(format!("Reload failed: {e}"));
                        } else if jump {
                            self.scroll_to_upcoming();
                        }
                    }
                }
            }
        }
    }

    fn toggle_paid(&mut self, conn: &Connection) -> Result<()> {
        let abs_idx = self.offset + self.selected;
        let Some(row) = self.rows.get(abs_idx) else {
            return Ok(());
        };
        if !row.payment_eligible {
            self.status_message = Some(format!(
                "Assignment #{} is not payment-eligible",
                row.id
            ));
            return Ok(());
        }
        let updated = register::set_paid(conn, row.id, !row.is_paid)?;
        let label = if updated.is_paid { "paid" } else { "unpaid" };
        self.status_message = Some(format!("Assignment #{} marked {label}", updated.id));
        self.rows[abs_idx] = updated;
        self.counts = register::counts(conn, self.now)?;
        Ok(())
    }

    fn scroll_down(&mut self) {
        let new_offset = self.offset + self.visible_count;
        if new_offset < self.rows.len() {
            self.offset = new_offset;
        }
    }

    fn scroll_up(&mut self) {
        self.offset = self.offset.saturating_sub(self.visible_count);
    }

    fn scroll_to_end(&mut self) {
        self.offset = self.rows.len().saturating_sub(PAGE_SIZE);
    }
}
