use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::{info, warn};

use scout_xi::app::{
    AppState, CURSOR_STEP, EditField, Facet, FavoritesFocus, PITCH_HEIGHT, PITCH_WIDTH,
};
use scout_xi::config::Config;
use scout_xi::http_client::http_client;
use scout_xi::local_store::SqliteStore;
use scout_xi::logging;
use scout_xi::model::Player;
use scout_xi::preferences::{Preferences, SearchMode, Tab};
use scout_xi::remote::ApiClient;
use scout_xi::search::{ProfileUrlPattern, SearchResolver};
use scout_xi::session::Session;
use scout_xi::sync::SyncCoordinator;

struct App<'a> {
    state: AppState,
    resolver: &'a SearchResolver<'a>,
    sync: &'a SyncCoordinator<'a>,
}

impl App<'_> {
    fn on_key(&mut self, key: KeyEvent) {
        if self.state.editing.is_some() {
            self.on_edit_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.state.should_quit = true,
            KeyCode::Char('1') => self.state.tab = Tab::Search,
            KeyCode::Char('2') => self.state.tab = Tab::Favorites,
            KeyCode::Char('3') => self.state.tab = Tab::Team,
            KeyCode::Char('x') | KeyCode::Esc => self.state.dismiss_notice(),
            KeyCode::Char('j') | KeyCode::Down if self.state.tab != Tab::Team => {
                self.state.select_next()
            }
            KeyCode::Char('k') | KeyCode::Up if self.state.tab != Tab::Team => {
                self.state.select_prev()
            }
            _ => match self.state.tab {
                Tab::Search => self.on_search_key(key),
                Tab::Favorites => self.on_favorites_key(key),
                Tab::Team => self.on_team_key(key),
            },
        }
    }

    fn on_edit_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if self.state.commit_edit() == Some(EditField::Query) {
                    self.state.run_search(self.resolver);
                }
            }
            KeyCode::Esc => self.state.cancel_edit(),
            KeyCode::Backspace => {
                self.state.input.pop();
            }
            KeyCode::Char(ch) => self.state.input.push(ch),
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('/') | KeyCode::Char('e') => self.state.begin_edit(EditField::Query),
            KeyCode::Char('m') => self.state.toggle_search_mode(),
            KeyCode::Char('a') | KeyCode::Enter => self.state.add_selected_favorite(self.sync),
            KeyCode::Char('r') => self.state.show_similar(self.resolver),
            _ => {}
        }
    }

    fn on_favorites_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('f') | KeyCode::Tab => {
                self.state.favorites_focus = match self.state.favorites_focus {
                    FavoritesFocus::List => FavoritesFocus::Filters,
                    FavoritesFocus::Filters => FavoritesFocus::List,
                };
            }
            KeyCode::Char('d') | KeyCode::Delete
                if self.state.favorites_focus == FavoritesFocus::List =>
            {
                self.state.remove_selected_favorite(self.sync)
            }
            KeyCode::Char(' ') | KeyCode::Enter
                if self.state.favorites_focus == FavoritesFocus::Filters =>
            {
                self.state.toggle_selected_facet()
            }
            KeyCode::Char('a') => self.state.begin_edit(EditField::AgeMin),
            KeyCode::Char('A') => self.state.begin_edit(EditField::AgeMax),
            KeyCode::Char('v') => self.state.begin_edit(EditField::ValueMin),
            KeyCode::Char('V') => self.state.begin_edit(EditField::ValueMax),
            KeyCode::Char('c') => self.state.clear_filters(),
            _ => {}
        }
    }

    fn on_team_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') => self.state.select_next(),
            KeyCode::Char('k') => self.state.select_prev(),
            KeyCode::Left | KeyCode::Char('h') => self.state.move_cursor(-CURSOR_STEP, 0.0),
            KeyCode::Right | KeyCode::Char('l') => self.state.move_cursor(CURSOR_STEP, 0.0),
            KeyCode::Up => self.state.move_cursor(0.0, -CURSOR_STEP),
            KeyCode::Down => self.state.move_cursor(0.0, CURSOR_STEP),
            KeyCode::Char(' ') | KeyCode::Enter => self.state.drop_selected_at_cursor(self.sync),
            KeyCode::Char('d') | KeyCode::Delete => self.state.lift_selected(self.sync),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let config = Config::load();
    logging::init_file_logging(config.log_path.as_deref());

    let db_path = config
        .db_path
        .clone()
        .context("unable to resolve local store path")?;
    let store = SqliteStore::open(&db_path).context("open local store")?;
    let api = ApiClient::new(http_client(&config)?, config.api_base.clone());
    let session = Session::new(&store, &api);
    let sync = SyncCoordinator::new(&store, &api, &session);
    let resolver = SearchResolver::new(&api, ProfileUrlPattern::new(&config.profile_domain));

    let mut state = AppState::new(Preferences::load(&store));
    sign_in(&config, &session, &mut state);
    state.load_user_data(&sync);
    info!(user = state.user_id(), "session ready");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App {
        state,
        resolver: &resolver,
        sync: &sync,
    };
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.state.preferences().save(&store);
    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn sign_in(config: &Config, session: &Session<'_>, state: &mut AppState) {
    if !session.is_authenticated() {
        if let Some((email, password)) = config.credentials() {
            if let Err(err) = session.login(email, password) {
                warn!(error = %err, "auto login failed");
                state.set_notice(format!("Login failed: {err}"));
            }
        }
    }
    if !session.is_authenticated() {
        state.push_log("[INFO] Not signed in, favorites stay on this machine");
        return;
    }
    match session.current_user() {
        Ok(user) => {
            state.push_log(format!("[INFO] Signed in as {}", user.display_name()));
            state.user = Some(user);
        }
        Err(err) => state.set_notice(format!("Session expired: {err}")),
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App<'_>) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, &app.state))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.state.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, state: &AppState) {
    let notice_height = if state.notice.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(notice_height),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if let Some(notice) = &state.notice {
        let notice = Paragraph::new(format!("{notice}  (x to dismiss)"))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(notice, chunks[1]);
    }

    match state.tab {
        Tab::Search => render_search(frame, chunks[2], state),
        Tab::Favorites => render_favorites(frame, chunks[2], state),
        Tab::Team => render_team(frame, chunks[2], state),
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[3]);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[4]);

    if let Some(field) = state.editing {
        render_input_overlay(frame, field, &state.input);
    }
}

fn header_text(state: &AppState) -> String {
    let tabs = [
        (Tab::Search, "1 Search"),
        (Tab::Favorites, "2 Favorites"),
        (Tab::Team, "3 Team"),
    ]
    .iter()
    .map(|(tab, label)| {
        if *tab == state.tab {
            format!("[{label}]")
        } else {
            format!(" {label} ")
        }
    })
    .collect::<Vec<_>>()
    .join(" ");
    let who = state
        .user
        .as_ref()
        .map(|u| u.display_name().to_string())
        .unwrap_or_else(|| "offline".to_string());
    let busy = if state.loading { " | loading..." } else { "" };
    format!("SCOUT XI | {tabs} | {who}{busy}")
}

fn footer_text(state: &AppState) -> String {
    if state.editing.is_some() {
        return "Enter Apply | Esc Cancel".to_string();
    }
    match state.tab {
        Tab::Search => {
            "/ Edit query | m Name/Link | j/k Move | a Add favorite | r Similar | q Quit".to_string()
        }
        Tab::Favorites => {
            "f Focus list/filters | Space Toggle | a/A Age | v/V Value | c Clear | d Remove | q Quit"
                .to_string()
        }
        Tab::Team => {
            "j/k Player | ←/→/↑/↓ Cursor | Space Drop | d Lift | q Quit".to_string()
        }
    }
}

fn render_search(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let (title, placeholder) = match state.search_mode {
        SearchMode::Name => ("Search by name", "Player name..."),
        SearchMode::Url => (
            "Search by link",
            "https://www.transfermarkt.com.tr/erling-haaland/profil/spieler/418560",
        ),
    };
    let query = if state.query.is_empty() {
        Paragraph::new(placeholder).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(state.query.as_str())
    };
    frame.render_widget(
        query.block(Block::default().title(title).borders(Borders::ALL)),
        rows[0],
    );

    let lines = if state.results.is_empty() {
        vec![Line::from("No results yet")]
    } else {
        state
            .results
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let star = if state.is_favorite(&p.id) { "★" } else { " " };
                player_line(p, star, idx == state.results_selected)
            })
            .collect()
    };
    let results = Paragraph::new(lines).block(
        Block::default()
            .title(state.results_title.as_str())
            .borders(Borders::ALL),
    );
    frame.render_widget(results, rows[1]);
}

fn render_favorites(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(32)])
        .split(area);

    let filtered = state.filtered_favorites();
    let lines = if state.favorites.is_empty() {
        vec![Line::from("No favorites yet")]
    } else if filtered.is_empty() {
        vec![Line::from("No favorites match the filters")]
    } else {
        filtered
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let selected =
                    state.favorites_focus == FavoritesFocus::List && idx == state.favorites_selected;
                player_line(p, " ", selected)
            })
            .collect()
    };
    let title = format!("Favorites ({}/{})", filtered.len(), state.favorites.len());
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        columns[0],
    );

    let filters = state.filters();
    let mut lines = Vec::new();
    for (idx, facet) in state.facets().iter().enumerate() {
        let (label, on) = match facet {
            Facet::Position(pos) => (format!("pos  {pos}"), filters.position.contains(pos)),
            Facet::Country(c) => (format!("nat  {c}"), filters.country.contains(c)),
        };
        let mark = if on { "[x]" } else { "[ ]" };
        let mut style = Style::default();
        if state.favorites_focus == FavoritesFocus::Filters && idx == state.facet_selected {
            style = style.bg(Color::DarkGray);
        }
        lines.push(Line::styled(format!("{mark} {label}"), style));
    }
    lines.push(Line::from(""));
    for label in filters.active_labels() {
        lines.push(Line::styled(label, Style::default().fg(Color::Cyan)));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().title("Filters").borders(Borders::ALL)),
        columns[1],
    );
}

fn render_team(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(20)])
        .split(area);

    let lines: Vec<Line> = if state.favorites.is_empty() {
        vec![Line::from("Add favorites first")]
    } else {
        state
            .favorites
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let placed = if state.formation.position_of(&p.id).is_some() { "•" } else { " " };
                let style = if idx == state.team_selected {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Line::styled(format!("{placed} {}", p.name), style)
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title("Favorites").borders(Borders::ALL)),
        columns[0],
    );

    let pitch_block = Block::default()
        .title("Pitch")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Green).fg(Color::White));
    let inner = pitch_block.inner(columns[1]);
    frame.render_widget(pitch_block, columns[1]);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let halfway = Rect {
        x: inner.x + inner.width / 2,
        y: inner.y,
        width: 1,
        height: inner.height,
    };
    frame.render_widget(
        Paragraph::new("│\n".repeat(inner.height as usize)).style(Style::default().fg(Color::Gray)),
        halfway,
    );

    for placement in state.placements() {
        let (x, y) = to_cell(inner, placement.at.x, placement.at.y);
        let label = short_name(&placement.player.name);
        let width = (label.chars().count() as u16).min(inner.right().saturating_sub(x));
        if width == 0 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Rect { x, y, width, height: 1 },
        );
    }

    let (cx, cy) = to_cell(inner, state.cursor.x, state.cursor.y);
    frame.render_widget(
        Paragraph::new("+").style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Rect { x: cx, y: cy, width: 1, height: 1 },
    );
}

/// Pitch pixels to a terminal cell inside `area`.
fn to_cell(area: Rect, x: f64, y: f64) -> (u16, u16) {
    let max_x = area.width.saturating_sub(1) as f64;
    let max_y = area.height.saturating_sub(1) as f64;
    let cx = (x / PITCH_WIDTH * max_x).round().clamp(0.0, max_x) as u16;
    let cy = (y / PITCH_HEIGHT * max_y).round().clamp(0.0, max_y) as u16;
    (area.x + cx, area.y + cy)
}

fn short_name(name: &str) -> String {
    name.split_whitespace()
        .last()
        .unwrap_or(name)
        .chars()
        .take(12)
        .collect()
}

fn player_line(p: &Player, marker: &str, selected: bool) -> Line<'static> {
    let age = p.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string());
    let text = format!(
        "{marker} {:<24} {:<18} {:>3} {:<14} {}",
        p.name, p.position, age, p.nationality, p.value
    );
    if selected {
        Line::styled(text, Style::default().fg(Color::White).bg(Color::DarkGray))
    } else {
        Line::from(text)
    }
}

fn console_text(state: &AppState) -> String {
    let lines: Vec<&str> = state.logs.iter().rev().take(3).map(String::as_str).collect();
    lines.into_iter().rev().collect::<Vec<_>>().join("\n")
}

fn render_input_overlay(frame: &mut Frame, field: EditField, input: &str) {
    let area = frame.size();
    let width = area.width.saturating_sub(8).min(80);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + area.height / 3,
        width,
        height: 3,
    };
    let title = match field {
        EditField::Query => "Search",
        EditField::AgeMin => "Minimum age",
        EditField::AgeMax => "Maximum age",
        EditField::ValueMin => "Minimum value (M€)",
        EditField::ValueMax => "Maximum value (M€)",
    };
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(format!("{input}_")).block(Block::default().title(title).borders(Borders::ALL)),
        popup,
    );
}
