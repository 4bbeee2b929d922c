use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use office_records::{
    CsvExporter, MailField, MailKind, MailRecord, MailSection, MailStats, Notification,
    ReconciledRow, SampleField, SortState, SqliteStore, SurveySection, UpdateDraft, UpdateStatus,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Survey,
    IncomingMail,
    OutgoingMail,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Survey => Page::IncomingMail,
            Page::IncomingMail => Page::OutgoingMail,
            Page::OutgoingMail => Page::Survey,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Survey => Page::OutgoingMail,
            Page::IncomingMail => Page::Survey,
            Page::OutgoingMail => Page::IncomingMail,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Survey => "Pemutakhiran",
            Page::IncomingMail => MailKind::Incoming.title(),
            Page::OutgoingMail => MailKind::Outgoing.title(),
        }
    }
}

/// Columns shown in the survey table; digit keys 1-9,0 toggle sort on them
const SURVEY_COLUMNS: [SampleField; 10] = [
    SampleField::SampleCode,
    SampleField::District,
    SampleField::Village,
    SampleField::Supervisor,
    SampleField::Enumerator,
    SampleField::FamiliesBefore,
    SampleField::HouseholdsBefore,
    SampleField::FamiliesAfter,
    SampleField::HouseholdsAfter,
    SampleField::Status,
];

const FORM_FIELDS: [&str; 5] = [
    "Sudah Selesai Dimutakhirkan",
    "Jumlah Keluarga Sebelum Pemutakhiran",
    "Jumlah Rumah Tangga Sebelum Pemutakhiran",
    "Jumlah Keluarga Hasil Pemutakhiran",
    "Jumlah Rumah Tangga Hasil Pemutakhiran",
];

/// Update form opened on a survey row
#[derive(Debug, Clone)]
pub struct UpdateForm {
    pub draft: UpdateDraft,
    pub field: usize,
}

impl UpdateForm {
    fn count_mut(&mut self) -> Option<&mut u32> {
        match self.field {
            1 => Some(&mut self.draft.families_before),
            2 => Some(&mut self.draft.households_before),
            3 => Some(&mut self.draft.families_after),
            4 => Some(&mut self.draft.households_after),
            _ => None,
        }
    }

    fn toggle_status(&mut self) {
        self.draft.status = match self.draft.status {
            UpdateStatus::NotDone => UpdateStatus::Done,
            UpdateStatus::Done => UpdateStatus::NotDone,
        };
    }

    fn push_digit(&mut self, digit: u32) {
        if let Some(value) = self.count_mut() {
            *value = value.saturating_mul(10).saturating_add(digit);
        }
    }

    fn pop_digit(&mut self) {
        if let Some(value) = self.count_mut() {
            *value /= 10;
        }
    }

    fn value_of(&self, field: usize) -> String {
        match field {
            0 => self.draft.status.label().to_string(),
            1 => self.draft.families_before.to_string(),
            2 => self.draft.households_before.to_string(),
            3 => self.draft.families_after.to_string(),
            _ => self.draft.households_after.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Mode {
    Browse,
    Search(String),
    Edit(UpdateForm),
    ConfirmDelete,
}

pub struct App {
    rt: Runtime,
    store: Arc<SqliteStore>,
    exporter: CsvExporter,
    pub survey: SurveySection<SqliteStore>,
    pub incoming: MailSection<SqliteStore>,
    pub outgoing: MailSection<SqliteStore>,
    pub stats: MailStats,
    pub state: TableState,
    pub current_page: Page,
    pub mode: Mode,
    pub show_detail: bool,
    pub notice: Option<Notification>,
}

impl App {
    pub fn new(
        rt: Runtime,
        store: Arc<SqliteStore>,
        survey: SurveySection<SqliteStore>,
        exporter: CsvExporter,
    ) -> Self {
        let incoming = MailSection::new(store.clone(), MailKind::Incoming);
        let outgoing = MailSection::new(store.clone(), MailKind::Outgoing);

        let mut app = Self {
            rt,
            store,
            exporter,
            survey,
            incoming,
            outgoing,
            stats: MailStats::default(),
            state: TableState::default(),
            current_page: Page::Survey,
            mode: Mode::Browse,
            show_detail: false,
            notice: None,
        };
        app.reload_all();
        app
    }

    pub fn reload_all(&mut self) {
        self.rt.block_on(self.survey.refresh());
        self.rt.block_on(self.incoming.refresh());
        self.rt.block_on(self.outgoing.refresh());
        self.reload_stats();
        self.collect_notices();
        self.reset_selection();
    }

    fn reload_stats(&mut self) {
        match self.rt.block_on(MailStats::collect(self.store.as_ref())) {
            Ok(stats) => self.stats = stats,
            Err(e) => tracing::warn!(error = %e, "failed to load mail stats"),
        }
    }

    /// Keep the newest notice from any section for the status bar
    fn collect_notices(&mut self) {
        let mut notices = self.survey.take_notices();
        notices.extend(self.incoming.take_notices());
        notices.extend(self.outgoing.take_notices());
        if let Some(last) = notices.pop() {
            self.notice = Some(last);
        }
    }

    fn mail_section(&self) -> Option<&MailSection<SqliteStore>> {
        match self.current_page {
            Page::IncomingMail => Some(&self.incoming),
            Page::OutgoingMail => Some(&self.outgoing),
            Page::Survey => None,
        }
    }

    fn row_count(&self) -> usize {
        match self.mail_section() {
            Some(section) => section.mails().len(),
            None => self.survey.rows().len(),
        }
    }

    fn reset_selection(&mut self) {
        let len = self.row_count();
        match self.state.selected() {
            Some(i) if i < len => {}
            _ if len > 0 => self.state.select(Some(0)),
            _ => self.state.select(None),
        }
    }

    pub fn selected_row(&self) -> Option<ReconciledRow> {
        let i = self.state.selected()?;
        self.survey.visible_rows().into_iter().nth(i)
    }

    pub fn selected_mail(&self) -> Option<MailRecord> {
        let i = self.state.selected()?;
        self.mail_section()?.visible_mails().into_iter().nth(i)
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.state.select(None);
        self.reset_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.state.select(None);
        self.reset_selection();
    }

    /// Digit key -> sort toggle on the matching column of the current page
    pub fn toggle_sort_column(&mut self, digit: u32) {
        let index = if digit == 0 { 9 } else { digit as usize - 1 };
        match self.current_page {
            Page::Survey => {
                if let Some(field) = SURVEY_COLUMNS.get(index) {
                    self.survey.toggle_sort(*field);
                }
            }
            Page::IncomingMail => {
                if let Some(field) = MailField::ALL.get(index) {
                    self.incoming.toggle_sort(*field);
                }
            }
            Page::OutgoingMail => {
                if let Some(field) = MailField::ALL.get(index) {
                    self.outgoing.toggle_sort(*field);
                }
            }
        }
    }

    pub fn apply_search(&mut self, query: &str) {
        match self.current_page {
            Page::Survey => {
                self.rt.block_on(self.survey.set_query(query));
            }
            Page::IncomingMail => {
                self.rt.block_on(self.incoming.set_query(query));
            }
            Page::OutgoingMail => {
                self.rt.block_on(self.outgoing.set_query(query));
            }
        }
        self.collect_notices();
        self.state.select(None);
        self.reset_selection();
    }

    fn current_query(&self) -> String {
        match self.mail_section() {
            Some(section) => section.query().to_string(),
            None => self.survey.query().to_string(),
        }
    }

    pub fn open_edit(&mut self) {
        if self.current_page != Page::Survey {
            return;
        }
        if let Some(row) = self.selected_row() {
            self.mode = Mode::Edit(UpdateForm {
                draft: row.edit_draft(),
                field: 0,
            });
        }
    }

    pub fn save_form(&mut self, form: UpdateForm) {
        self.rt.block_on(self.survey.submit(form.draft));
        self.collect_notices();
        self.reset_selection();
    }

    pub fn delete_selected(&mut self) {
        match self.current_page {
            Page::Survey => match self.selected_row().and_then(|r| r.update_id) {
                Some(id) => {
                    self.rt.block_on(self.survey.delete(id));
                }
                None => {
                    self.notice = Some(Notification::error("Sampel ini belum memiliki data pemutakhiran"));
                    return;
                }
            },
            Page::IncomingMail | Page::OutgoingMail => {
                if let Some(mail) = self.selected_mail() {
                    if self.current_page == Page::IncomingMail {
                        self.rt.block_on(self.incoming.delete(&mail.id));
                    } else {
                        self.rt.block_on(self.outgoing.delete(&mail.id));
                    }
                    self.reload_stats();
                }
            }
        }
        self.collect_notices();
        self.reset_selection();
    }

    pub fn export_current(&mut self) {
        match self.current_page {
            Page::Survey => {
                self.survey.export(&self.exporter);
            }
            Page::IncomingMail => {
                self.incoming.export(&self.exporter);
            }
            Page::OutgoingMail => {
                self.outgoing.export(&self.exporter);
            }
        }
        self.collect_notices();
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 20).min(len - 1),
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = match self.state.selected() {
            Some(i) => i.saturating_sub(20),
            None => 0,
        };
        self.state.select(Some(i));
    }

    /// Progress counts over the reconciled rows: (done, not done, no update)
    pub fn progress(&self) -> (usize, usize, usize) {
        let mut done = 0;
        let mut pending = 0;
        let mut missing = 0;
        for row in self.survey.rows() {
            match row.status {
                Some(UpdateStatus::Done) => done += 1,
                Some(UpdateStatus::NotDone) => pending += 1,
                None => missing += 1,
            }
        }
        (done, pending, missing)
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

        let key = match event::read()? {
            Event::Key(key) => key,
            _ => continue,
        };

        match std::mem::replace(&mut app.mode, Mode::Browse) {
            Mode::Search(mut buffer) => match key.code {
                KeyCode::Enter => app.apply_search(&buffer),
                KeyCode::Esc => {}
                KeyCode::Backspace => {
                    buffer.pop();
                    app.mode = Mode::Search(buffer);
                }
                KeyCode::Char(c) => {
                    buffer.push(c);
                    app.mode = Mode::Search(buffer);
                }
                _ => app.mode = Mode::Search(buffer),
            },
            Mode::Edit(mut form) => match key.code {
                KeyCode::Enter => app.save_form(form),
                KeyCode::Esc => {}
                KeyCode::Up => {
                    form.field = form.field.checked_sub(1).unwrap_or(FORM_FIELDS.len() - 1);
                    app.mode = Mode::Edit(form);
                }
                KeyCode::Down | KeyCode::Tab => {
                    form.field = (form.field + 1) % FORM_FIELDS.len();
                    app.mode = Mode::Edit(form);
                }
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if form.field == 0 => {
                    form.toggle_status();
                    app.mode = Mode::Edit(form);
                }
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    form.push_digit(c.to_digit(10).unwrap_or(0));
                    app.mode = Mode::Edit(form);
                }
                KeyCode::Backspace => {
                    form.pop_digit();
                    app.mode = Mode::Edit(form);
                }
                _ => app.mode = Mode::Edit(form),
            },
            Mode::ConfirmDelete => {
                if key.code == KeyCode::Char('y') {
                    app.delete_selected();
                }
            }
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => {
                    if app.current_page == Page::Survey {
                        app.open_edit();
                    } else {
                        app.toggle_detail();
                    }
                }
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('/') => app.mode = Mode::Search(app.current_query()),
                KeyCode::Char('c') => app.apply_search(""),
                KeyCode::Char('d') => app.mode = Mode::ConfirmDelete,
                KeyCode::Char('x') => app.export_current(),
                KeyCode::Char('r') => app.reload_all(),
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    app.toggle_sort_column(c.to_digit(10).unwrap_or(0));
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    let len = app.row_count();
                    if len > 0 {
                        app.state.select(Some(len - 1));
                    }
                }
                _ => {}
            },
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let side_panel = match (&app.mode, app.current_page) {
        (Mode::Edit(_), _) => true,
        (_, Page::Survey) => false,
        _ => app.show_detail,
    };

    if side_panel {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_page(f, content_chunks[0], app);
        match &app.mode {
            Mode::Edit(form) => render_form(f, content_chunks[1], form),
            _ => render_mail_detail(f, content_chunks[1], app),
        }
    } else {
        render_page(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_page(f: &mut Frame, area: Rect, app: &mut App) {
    match app.current_page {
        Page::Survey => render_survey_table(f, area, app),
        Page::IncomingMail | Page::OutgoingMail => render_mail_table(f, area, app),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let (done, pending, missing) = app.progress();

    let pages = [Page::Survey, Page::IncomingMail, Page::OutgoingMail];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{}: ", app.survey.survey()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::styled(format!("✓ {}", done), Style::default().fg(Color::Green)));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(format!("… {}", pending), Style::default().fg(Color::Yellow)));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(format!("- {}", missing), Style::default().fg(Color::Red)));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Surat: {} (↓ {} ↑ {})", app.stats.total, app.stats.incoming, app.stats.outgoing),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

/// Header cell with the key hint and the sort arrow when that column is active
fn header_cell<F: Copy + PartialEq>(index: usize, label: &str, field: F, sort: &SortState<F>) -> Cell<'static> {
    let key = (index + 1) % 10;
    let arrow = sort.direction_of(field).map(|d| d.arrow()).unwrap_or("");
    Cell::from(format!("{}:{}{}", key, label, arrow)).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

fn count_cell(value: Option<u32>) -> Cell<'static> {
    Cell::from(value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()))
}

fn render_survey_table(f: &mut Frame, area: Rect, app: &mut App) {
    let sort = app.survey.sort_state();
    let header_cells = SURVEY_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, field)| header_cell(i, field.header(), *field, &sort));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let visible = app.survey.visible_rows();
    let rows = visible.iter().map(|row| {
        let (status, color) = match row.status {
            Some(UpdateStatus::Done) => (UpdateStatus::Done.label(), Color::Green),
            Some(UpdateStatus::NotDone) => (UpdateStatus::NotDone.label(), Color::Yellow),
            None => ("-", Color::DarkGray),
        };

        let cells = vec![
            Cell::from(row.sample.sample_code.clone()),
            Cell::from(truncate(&row.sample.district, 16)),
            Cell::from(truncate(&row.sample.village, 20)),
            Cell::from(truncate(&row.sample.supervisor, 14)),
            Cell::from(truncate(&row.sample.enumerator, 14)),
            count_cell(row.families_before),
            count_cell(row.households_before),
            count_cell(row.families_after),
            count_cell(row.households_after),
            Cell::from(status).style(Style::default().fg(color)),
        ];

        Row::new(cells).height(1)
    });

    let title = if app.survey.query().is_empty() {
        format!(" Pemutakhiran {} ", app.survey.survey())
    } else {
        format!(" Pemutakhiran {} - cari: \"{}\" ", app.survey.survey(), app.survey.query())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(17),
            Constraint::Length(21),
            Constraint::Length(15),
            Constraint::Length(15),
            Constraint::Length(14),
            Constraint::Length(13),
            Constraint::Length(12),
            Constraint::Length(11),
            Constraint::Length(15),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_mail_table(f: &mut Frame, area: Rect, app: &mut App) {
    let section = match app.current_page {
        Page::IncomingMail => &app.incoming,
        _ => &app.outgoing,
    };

    let sort = section.sort_state();
    let header_cells = MailField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| header_cell(i, field.header(), *field, &sort));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let visible = section.visible_mails();
    let rows = visible.iter().map(|mail| {
        let cells = vec![
            Cell::from(truncate(&mail.number, 24)),
            Cell::from(mail.date_label()),
            Cell::from(truncate(&mail.origin, 20)),
            Cell::from(truncate(&mail.destination, 20)),
            Cell::from(mail.classification_label()),
            Cell::from(truncate(&mail.description, 30)),
            Cell::from(mail.delivery_label()),
            Cell::from(mail.reply_label()),
            Cell::from(truncate(&mail.reference, 16)),
            Cell::from(truncate(&mail.employee_name, 16)),
        ];
        Row::new(cells).height(1)
    });

    let title = if section.query().is_empty() {
        format!(" {} ", section.kind().title())
    } else {
        format!(" {} - cari: \"{}\" ", section.kind().title(), section.query())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(18),
            Constraint::Length(22),
            Constraint::Length(22),
            Constraint::Length(18),
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(15),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
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
    let total = app.row_count();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    match &app.mode {
        Mode::Search(buffer) => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled("Cari: ", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(format!("{}▏", buffer)));
            status_spans.push(Span::raw("  (Enter apply, Esc cancel)"));
        }
        Mode::ConfirmDelete => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(
                "Hapus data terpilih? (y/n)",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }
        Mode::Edit(_) => {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Field | "));
            status_spans.push(Span::styled("0-9", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Angka | "));
            status_spans.push(Span::styled("Space", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Status | "));
            status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Simpan | "));
            status_spans.push(Span::styled("Esc", Style::default().fg(Color::Red)));
            status_spans.push(Span::raw(" Batal"));
        }
        Mode::Browse => {
            if let Some(notice) = &app.notice {
                let color = if notice.is_error() { Color::Red } else { Color::Green };
                status_spans.push(Span::raw(" | "));
                status_spans.push(Span::styled(notice.message.clone(), Style::default().fg(color)));
            }
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled("/", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Cari | "));
            status_spans.push(Span::styled("0-9", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Urut | "));
            status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Edit/Detail | "));
            status_spans.push(Span::styled("d", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Hapus | "));
            status_spans.push(Span::styled("x", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Export | "));
            status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
            status_spans.push(Span::raw(" Page | "));
            status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            status_spans.push(Span::raw(" Quit"));
        }
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_form(f: &mut Frame, area: Rect, form: &UpdateForm) {
    let title = if form.draft.is_edit() { " Edit Data Pemutakhiran " } else { " Tambah Data Pemutakhiran " };

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  NKS: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(form.draft.sample_code.clone()),
        ]),
        Line::from(""),
    ];

    for (i, label) in FORM_FIELDS.iter().enumerate() {
        let marker = if i == form.field { "→ " } else { "  " };
        let style = if i == form.field {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        content.push(Line::from(vec![
            Span::styled(format!("{}{}: ", marker, label), Style::default().fg(Color::Cyan)),
            Span::styled(form.value_of(i), style),
        ]));
        content.push(Line::from(""));
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );

    f.render_widget(panel, area);
}

fn render_mail_detail(f: &mut Frame, area: Rect, app: &App) {
    let mail = match app.selected_mail() {
        Some(m) => m,
        None => {
            let no_selection = Paragraph::new("No mail selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Detail Surat "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let label = |text: &'static str| {
        Span::styled(text, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
    };

    let content = vec![
        Line::from(""),
        Line::from(vec![label("  No. Surat: "), Span::raw(mail.number.clone())]),
        Line::from(vec![label("  Tanggal: "), Span::raw(mail.date_label())]),
        Line::from(vec![label("  Pengirim: "), Span::raw(mail.origin.clone())]),
        Line::from(vec![label("  Tujuan: "), Span::raw(mail.destination.clone())]),
        Line::from(vec![label("  Klasifikasi: "), Span::raw(mail.classification_label())]),
        Line::from(vec![label("  Keterangan: "), Span::raw(mail.delivery_label())]),
        Line::from(vec![label("  Surat Balasan: "), Span::raw(mail.reply_label())]),
        Line::from(vec![label("  Referensi: "), Span::raw(mail.reference.clone())]),
        Line::from(vec![label("  Pembuat: "), Span::raw(mail.employee_name.clone())]),
        Line::from(vec![
            label("  Link: "),
            Span::styled(
                mail.link.clone().unwrap_or_else(|| "-".to_string()),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  URAIAN",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(
                wrap_text(&mail.description, 35),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  Press Enter to close",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )]),
    ];

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Detail Surat "),
    );

    f.render_widget(detail_panel, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    if text.len() <= width {
        return text.to_string();
    }

    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() < width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !result.is_empty() {
                result.push_str("\n  ");
            }
            result.push_str(&current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        if !result.is_empty() {
            result.push_str("\n  ");
        }
        result.push_str(&current_line);
    }

    result
}
