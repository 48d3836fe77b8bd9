use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use spiermassa::{Computation, MeasurementRecord, Session, Sex};
use std::io;

const NOT_FILLED: &str = "Niet ingevuld";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Id,
    Height,
    Sex,
    Weight,
    Resistance,
}

impl Field {
    const ALL: [Field; 5] = [Field::Id, Field::Height, Field::Sex, Field::Weight, Field::Resistance];

    pub fn next(&self) -> Self {
        match self {
            Field::Id => Field::Height,
            Field::Height => Field::Sex,
            Field::Sex => Field::Weight,
            Field::Weight => Field::Resistance,
            Field::Resistance => Field::Id,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Field::Id => Field::Resistance,
            Field::Height => Field::Id,
            Field::Sex => Field::Height,
            Field::Weight => Field::Sex,
            Field::Resistance => Field::Weight,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Field::Id => "Selecteer ID",
            Field::Height => "Lengte (cm)",
            Field::Sex => "Geslacht",
            Field::Weight => "Gewicht (kg)",
            Field::Resistance => "Resistentie",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Field::Height | Field::Weight | Field::Resistance)
    }
}

/// Text being typed into a numeric field, committed on leave/Enter/save
#[derive(Debug, Default)]
struct EditBuffers {
    height: String,
    weight: String,
    resistance: String,
}

pub enum Notice {
    Info(String),
    Error(String),
}

pub struct App {
    pub session: Session,
    pub records: Vec<MeasurementRecord>,
    pub state: TableState,
    pub focus: Field,
    pub notice: Option<Notice>,
    buffers: EditBuffers,
}

impl App {
    pub fn new(session: Session) -> Self {
        let mut app = Self {
            session,
            records: Vec::new(),
            state: TableState::default(),
            focus: Field::Weight,
            notice: None,
            buffers: EditBuffers::default(),
        };
        app.sync_buffers();
        app.reload_log();
        app
    }

    /// Re-read the whole measurement log
    pub fn reload_log(&mut self) {
        match self.session.measurements() {
            Ok(records) => {
                self.records = records;
                if self.records.is_empty() {
                    self.state.select(None);
                } else {
                    self.state.select(Some(self.records.len() - 1));
                }
            }
            Err(err) => {
                self.records.clear();
                self.state.select(None);
                self.notice = Some(Notice::Error(err.to_string()));
            }
        }
    }

    fn sync_buffers(&mut self) {
        let input = self.session.input();
        self.buffers.height = format_value(input.height_cm());
        self.buffers.weight = format_value(input.weight_kg());
        self.buffers.resistance = format_value(input.resistance_ohm());
    }

    fn buffer_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Height => Some(&mut self.buffers.height),
            Field::Weight => Some(&mut self.buffers.weight),
            Field::Resistance => Some(&mut self.buffers.resistance),
            Field::Id | Field::Sex => None,
        }
    }

    /// Parse the focused buffer into the session input (clamped), then reformat it
    pub fn commit(&mut self) {
        let Some(buffer) = self.buffer_mut(self.focus) else {
            return;
        };
        let value = parse_number(buffer);
        let input = self.session.input_mut();
        match self.focus {
            Field::Height => input.set_height(value),
            Field::Weight => input.set_weight(value),
            Field::Resistance => input.set_resistance(value),
            Field::Id | Field::Sex => {}
        }
        self.sync_buffers();
    }

    pub fn next_field(&mut self) {
        self.commit();
        self.focus = self.focus.next();
    }

    pub fn previous_field(&mut self) {
        self.commit();
        self.focus = self.focus.previous();
    }

    pub fn type_char(&mut self, c: char) {
        if !self.focus.is_numeric() {
            return;
        }
        let c = if c == ',' { '.' } else { c };
        if let Some(buffer) = self.buffer_mut(self.focus) {
            if c.is_ascii_digit() || (c == '.' && !buffer.contains('.')) {
                buffer.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.buffer_mut(self.focus) {
            buffer.pop();
        }
    }

    /// Left/Right: cycle the person or the sex option
    pub fn cycle(&mut self, forward: bool) {
        match self.focus {
            Field::Id => {
                let len = self.session.store().len();
                if len == 0 {
                    return;
                }
                let current = self.session.selected_index().unwrap_or(0);
                let index = if forward {
                    (current + 1) % len
                } else if current == 0 {
                    len - 1
                } else {
                    current - 1
                };
                self.session.select(index);
                self.sync_buffers();
            }
            Field::Sex => {
                // Options: blank, Man, Vrouw
                let current = self.session.input().sex();
                let next = match (current, forward) {
                    (None, true) => Some(Sex::Male),
                    (Some(Sex::Male), true) => Some(Sex::Female),
                    (Some(Sex::Female), true) => None,
                    (None, false) => Some(Sex::Female),
                    (Some(Sex::Female), false) => Some(Sex::Male),
                    (Some(Sex::Male), false) => None,
                };
                self.session.input_mut().set_sex(next);
            }
            _ => {}
        }
    }

    pub fn save(&mut self) {
        self.commit();
        match self.session.save() {
            Ok(_) => {
                self.notice = Some(Notice::Info("Meting opgeslagen ✔".to_string()));
                self.reload_log();
            }
            Err(err) => self.notice = Some(Notice::Error(err.to_string())),
        }
    }

    pub fn next_row(&mut self) {
        let len = self.records.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous_row(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        if !self.records.is_empty() {
            self.state.select(Some(i));
        }
    }

    fn buffer(&self, field: Field) -> &str {
        match field {
            Field::Height => &self.buffers.height,
            Field::Weight => &self.buffers.weight,
            Field::Resistance => &self.buffers.resistance,
            Field::Id | Field::Sex => "",
        }
    }
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| format!("{}", v)).unwrap_or_default()
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        trimmed.parse().ok()
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Char('s') => app.save(),
                KeyCode::Tab | KeyCode::Down => app.next_field(),
                KeyCode::BackTab | KeyCode::Up => app.previous_field(),
                KeyCode::Enter => app.commit(),
                KeyCode::Left => app.cycle(false),
                KeyCode::Right => app.cycle(true),
                KeyCode::Backspace => app.backspace(),
                KeyCode::PageDown => app.next_row(),
                KeyCode::PageUp => app.previous_row(),
                KeyCode::Char(c) => app.type_char(c),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(7), // Form fields
            Constraint::Length(3), // Result
            Constraint::Min(0),    // Measurement log
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_form(f, chunks[1], app);
    render_result(f, chunks[2], app);
    render_log(f, chunks[3], app);
    render_status_bar(f, chunks[4], app);
}

fn header_spans(app: &App) -> Vec<Span<'static>> {
    vec![
        Span::styled(
            "Spiermassa Berekening",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" v{}", spiermassa::VERSION),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Personen: {}", app.session.store().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Metingen: {}", app.records.len()),
            Style::default().fg(Color::Green),
        ),
    ]
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let header = Paragraph::new(vec![Line::from(header_spans(app))])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let input = app.session.input();
    let lines: Vec<Line> = Field::ALL
        .iter()
        .map(|field| {
            let value = match field {
                Field::Id => app
                    .session
                    .selected_person()
                    .map(|p| format!("◀ {} ▶", p.identifier))
                    .unwrap_or_else(|| "(geen personen)".to_string()),
                Field::Sex => format!(
                    "◀ {} ▶",
                    input.sex().map(|s| s.label()).unwrap_or(NOT_FILLED)
                ),
                _ => {
                    let text = app.buffer(*field);
                    if text.is_empty() && *field != app.focus {
                        NOT_FILLED.to_string()
                    } else {
                        text.to_string()
                    }
                }
            };

            let focused = *field == app.focus;
            let marker = if focused {
                Span::styled("→ ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            } else {
                Span::raw("  ")
            };
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            let value_style = if focused {
                Style::default().fg(Color::White).add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(vec![
                marker,
                Span::styled(format!("{:<14}", field.label()), label_style),
                Span::styled(value, value_style),
            ])
        })
        .collect();

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Invoer "),
    );

    f.render_widget(form, area);
}

fn result_spans(computation: Computation) -> Vec<Span<'static>> {
    let label = Span::styled("Spiermassa: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    match computation {
        Computation::Incomplete => vec![
            label,
            Span::styled(
                NOT_FILLED,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ],
        Computation::Ready { mass_kg, .. } => vec![
            label,
            Span::styled(
                format!("{:.2} kg", mass_kg),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ],
        Computation::Failed(err) => vec![Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )],
    }
}

fn render_result(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = result_spans(app.session.evaluate());
    match &app.notice {
        Some(Notice::Info(msg)) => {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Green)));
        }
        Some(Notice::Error(msg)) => {
            spans.push(Span::raw("   "));
            spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Red)));
        }
        None => {}
    }

    let result = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Resultaat "),
    );

    f.render_widget(result, area);
}

fn render_log(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["ID", "Gender", "Lengte_cm", "Gewicht_kg", "Resistentie", "Spiermassa", "Datum"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.records.iter().map(|r| {
        let cells = vec![
            Cell::from(truncate(&r.identifier, 12)),
            Cell::from(r.sex_label.clone()),
            Cell::from(format!("{:.1}", r.height_cm)),
            Cell::from(format!("{:.1}", r.weight_kg)),
            Cell::from(format!("{:.1}", r.resistance_ohm)),
            Cell::from(format!("{:.2}", r.computed_mass_kg)).style(Style::default().fg(Color::Green)),
            Cell::from(r.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(12),
            Constraint::Length(11),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Alle opgeslagen metingen "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.records.len()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Tab/↑↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Field | "),
        Span::styled("←/→", Style::default().fg(Color::Yellow)),
        Span::raw(" Choose | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" Apply | "),
        Span::styled("s", Style::default().fg(Color::Yellow)),
        Span::raw(" Opslaan | "),
        Span::styled("PgUp/PgDn", Style::default().fg(Color::Yellow)),
        Span::raw(" Log | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiermassa::{Config, PersonRecord, ReferenceStore};

    fn app_in(dir: &std::path::Path) -> App {
        let store = ReferenceStore::from_records(vec![
            PersonRecord { identifier: "1".into(), height_cm: Some(170.0), sex: None },
            PersonRecord { identifier: "2".into(), height_cm: Some(182.0), sex: Some(Sex::Female) },
        ]);
        let config = Config::new(None, Some(dir.join("metingen.csv")));
        App::new(Session::with_store(config, store))
    }

    fn type_text(app: &mut App, text: &str) {
        text.chars().for_each(|c| app.type_char(c));
    }

    #[test]
    fn test_commit_clamps_and_reformats_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        assert_eq!(app.buffer(Field::Height), "170");

        app.focus = Field::Height;
        for _ in 0..3 {
            app.backspace();
        }
        type_text(&mut app, "300");
        app.commit();
        assert_eq!(app.session.input().height_cm(), Some(250.0));
        assert_eq!(app.buffer(Field::Height), "250");

        app.focus = Field::Weight;
        type_text(&mut app, "72,5");
        app.next_field();
        assert_eq!(app.focus, Field::Resistance);
        assert_eq!(app.session.input().weight_kg(), Some(72.5));
    }

    #[test]
    fn test_non_numeric_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.focus = Field::Resistance;
        type_text(&mut app, "4x5.0.1");
        assert_eq!(app.buffer(Field::Resistance), "45.01");
    }

    #[test]
    fn test_sex_cycles_blank_man_vrouw() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.focus = Field::Sex;
        assert_eq!(app.session.input().sex(), None);

        app.cycle(true);
        assert_eq!(app.session.input().sex(), Some(Sex::Male));
        app.cycle(true);
        assert_eq!(app.session.input().sex(), Some(Sex::Female));
        app.cycle(true);
        assert_eq!(app.session.input().sex(), None);
        app.cycle(false);
        assert_eq!(app.session.input().sex(), Some(Sex::Female));
    }

    #[test]
    fn test_id_cycle_keeps_live_measurements() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.focus = Field::Weight;
        type_text(&mut app, "70");
        app.next_field();
        type_text(&mut app, "500");
        app.commit();

        app.focus = Field::Id;
        app.cycle(true);
        assert_eq!(app.session.selected_person().unwrap().identifier, "2");
        assert_eq!(app.session.input().height_cm(), Some(182.0));
        assert_eq!(app.session.input().sex(), Some(Sex::Female));
        assert_eq!(app.session.input().weight_kg(), Some(70.0));
        assert_eq!(app.session.input().resistance_ohm(), Some(500.0));
        assert_eq!(app.buffer(Field::Height), "182");

        app.cycle(true);
        assert_eq!(app.session.selected_index(), Some(0));
        app.cycle(false);
        assert_eq!(app.session.selected_index(), Some(1));
    }

    #[test]
    fn test_save_appends_and_selects_last_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.focus = Field::Sex;
        app.cycle(true);
        app.focus = Field::Weight;
        type_text(&mut app, "70");
        app.next_field();
        type_text(&mut app, "500");

        app.save();
        assert!(matches!(app.notice, Some(Notice::Info(_))));
        assert_eq!(app.records.len(), 1);
        assert_eq!(app.state.selected(), Some(0));
        assert_eq!(app.records[0].sex_label, "Man");
    }

    fn text_of(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_result_line_per_computation_state() {
        assert_eq!(text_of(&result_spans(Computation::Incomplete)), "Spiermassa: Niet ingevuld");

        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.session.input_mut().set_sex(Some(Sex::Male));
        app.session.input_mut().set_weight(Some(70.0));
        app.session.input_mut().set_resistance(Some(500.0));
        assert_eq!(text_of(&result_spans(app.session.evaluate())), "Spiermassa: 6.73 kg");

        let failed = result_spans(Computation::Failed(spiermassa::FormulaError::DivisionByZero));
        assert_eq!(text_of(&failed), "Fout in berekening: Resistentie mag niet nul zijn.");
    }

    #[test]
    fn test_header_shows_version_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(dir.path());
        let header = text_of(&header_spans(&app));
        assert!(header.contains(&format!("v{}", spiermassa::VERSION)));
        assert!(header.contains("Personen: 2"));
        assert!(header.contains("Metingen: 0"));
    }

    #[test]
    fn test_save_incomplete_sets_error_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.save();
        assert!(matches!(app.notice, Some(Notice::Error(_))));
        assert!(app.records.is_empty());
        assert!(!dir.path().join("metingen.csv").exists());
    }
}
