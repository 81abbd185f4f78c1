use crate::auth::AuthProvider;
use crate::dashboard::{DashboardScreen, RefreshTrigger, ScreenState};
use crate::models::TransactionType;
use crate::summary::{Dashboard, HighlightSummary, TransactionRow};
use anyhow::Result;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const PAGE_SIZE: usize = 10;

/// How the dashboard was left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiExit {
    Quit,
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardKind {
    Up,
    Down,
    Total,
}

impl CardKind {
    fn title(&self) -> &'static str {
        match self {
            CardKind::Up => "Entradas",
            CardKind::Down => "Saídas",
            CardKind::Total => "Total",
        }
    }

    fn arrow(&self) -> &'static str {
        match self {
            CardKind::Up => "↑",
            CardKind::Down => "↓",
            CardKind::Total => "$",
        }
    }

    fn color(&self) -> Color {
        match self {
            CardKind::Up => Color::Green,
            CardKind::Down => Color::Red,
            CardKind::Total => Color::Yellow,
        }
    }
}

pub struct App {
    pub screen: DashboardScreen,
    pub state: TableState,
    auth: Arc<dyn AuthProvider>,
    tick: usize,
}

impl App {
    pub fn new(screen: DashboardScreen, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            screen,
            state: TableState::default(),
            auth,
            tick: 0,
        }
    }

    /// First mount: kick off the initial load
    pub fn mount(&mut self) {
        self.screen.refresh(RefreshTrigger::Mount);
    }

    pub fn on_focus(&mut self) {
        self.screen.refresh(RefreshTrigger::Focus);
    }

    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Pick up a finished load and keep the selection inside the new list
    pub fn sync(&mut self) {
        if self.screen.poll() {
            let len = self.row_count();
            let selected = match self.state.selected() {
                _ if len == 0 => None,
                Some(i) if i < len => Some(i),
                _ => Some(0),
            };
            self.state.select(selected);
        }
    }

    fn row_count(&self) -> usize {
        self.screen
            .dashboard()
            .map(|d| d.transactions.len())
            .unwrap_or(0)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<Option<UiExit>> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(UiExit::Quit)),
            // The sign-out affordance only exists once the header is shown
            KeyCode::Char('s') if !self.screen.is_loading() => {
                self.auth.sign_out()?;
                return Ok(Some(UiExit::SignedOut));
            }
            KeyCode::Char('r') => {
                self.screen.refresh(RefreshTrigger::Manual);
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if self.row_count() > 0 {
                    self.state.select(Some(0));
                }
            }
            KeyCode::End => {
                let len = self.row_count();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        Ok(None)
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }

        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(_) => 0,
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
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }

        let i = self.state.selected().map_or(0, |i| (i + PAGE_SIZE).min(len - 1));
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        if self.row_count() == 0 {
            return;
        }

        let i = self.state.selected().map_or(0, |i| i.saturating_sub(PAGE_SIZE));
        self.state.select(Some(i));
    }

    fn spinner(&self) -> &'static str {
        SPINNER[self.tick % SPINNER.len()]
    }
}

pub fn run_ui(app: &mut App, tick_rate: Duration) -> Result<UiExit> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<UiExit> {
    app.mount();

    loop {
        app.sync();
        terminal.draw(|f| draw(f, app))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(exit) = app.handle_key(key.code)? {
                        return Ok(exit);
                    }
                }
                Event::FocusGained => app.on_focus(),
                _ => {}
            }
        }

        app.on_tick();
    }
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.size();

    // Cheap handle on the snapshot so the table can borrow `app` mutably
    let dashboard = match app.screen.state() {
        ScreenState::Loading => {
            render_loading(f, area, app);
            return;
        }
        ScreenState::Failed(message) => Err(message.clone()),
        ScreenState::Loaded(dashboard) => Ok(Arc::clone(dashboard)),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header with user
            Constraint::Min(0),    // Cards + list
            Constraint::Length(3), // Status bar
        ])
        .split(area);

    render_header(f, chunks[0], app);

    match dashboard {
        Ok(dashboard) => render_dashboard(f, chunks[1], app, &dashboard),
        Err(message) => render_failure(f, chunks[1], &message),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let user = app.screen.user();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" GoFinances ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(12)])
        .split(inner);

    let photo = user.photo.as_deref().unwrap_or("sem foto");
    let greeting = vec![
        Line::from(vec![
            Span::styled("Olá, ", Style::default().fg(Color::White)),
            Span::styled(
                user.name.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            photo.to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(greeting), halves[0]);

    let logout = Paragraph::new(Line::from(vec![
        Span::styled("s", Style::default().fg(Color::Yellow)),
        Span::styled(" ⏻ Sair", Style::default().fg(Color::Red)),
    ]))
    .alignment(Alignment::Right);
    f.render_widget(logout, halves[1]);
}

fn render_loading(f: &mut Frame, area: Rect, app: &App) {
    let top = area.height.saturating_sub(1) / 2;
    let mut lines: Vec<Line> = (0..top).map(|_| Line::from("")).collect();
    lines.push(Line::from(vec![
        Span::styled(app.spinner(), Style::default().fg(Color::Magenta)),
        Span::raw(" Carregando..."),
    ]));

    let loading = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(loading, area);
}

fn render_failure(f: &mut Frame, area: Rect, message: &str) {
    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Erro ao carregar o painel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("  {}", message)),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Pressione "),
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(" para tentar novamente"),
        ]),
    ];

    let failure = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(failure, area);
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &mut App, dashboard: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(chunks[0]);

    let highlights = &dashboard.highlights;
    render_card(f, cards[0], CardKind::Up, &highlights.entries);
    render_card(f, cards[1], CardKind::Down, &highlights.expenses);
    render_card(f, cards[2], CardKind::Total, &highlights.total);

    render_table(f, chunks[1], app, &dashboard.transactions);
}

fn render_card(f: &mut Frame, area: Rect, kind: CardKind, summary: &HighlightSummary) {
    let color = kind.color();
    let border = if kind == CardKind::Total {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };

    let content = vec![
        Line::from(Span::styled(
            summary.amount.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            summary.last_transaction.clone(),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let card = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!(" {} {} ", kind.title(), kind.arrow())),
    );
    f.render_widget(card, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App, rows: &[TransactionRow]) {
    let header_cells = ["Nome", "Valor", "Categoria", "Data"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let body = rows.iter().map(|row| {
        let (color, amount) = match row.transaction_type {
            TransactionType::Positive => (Color::Green, row.amount.clone()),
            TransactionType::Negative => (Color::Red, format!("- {}", row.amount)),
        };

        Row::new(vec![
            Cell::from(truncate(&row.name, 30)),
            Cell::from(amount).style(Style::default().fg(color)),
            Cell::from(truncate(&row.category.name, 18)),
            Cell::from(row.date.clone()).style(Style::default().fg(Color::DarkGray)),
        ])
        .height(1)
    });

    let title = if rows.is_empty() {
        " Listagem (nenhuma transação) ".to_string()
    } else {
        format!(" Listagem ({}) ", rows.len())
    };

    let table = Table::new(
        body,
        [
            Constraint::Min(20),
            Constraint::Length(18),
            Constraint::Length(20),
            Constraint::Length(10),
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
        format!(" Linha: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Atualizar | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Navegar | "));
    status_spans.push(Span::styled("s", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Sair da conta | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Fechar"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_aware() {
        assert_eq!(truncate("Alimentação", 20), "Alimentação");
        assert_eq!(truncate("Alimentação saudável", 10), "Aliment...");
    }

    #[test]
    fn test_card_titles() {
        assert_eq!(CardKind::Up.title(), "Entradas");
        assert_eq!(CardKind::Down.title(), "Saídas");
        assert_eq!(CardKind::Total.title(), "Total");
    }
}
