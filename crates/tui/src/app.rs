use std::{
    io, thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use flagquiz_core::{
    session::STARTING_LIVES, GameSession, LeaderboardEntry, LeaderboardStore, Notification,
    Phase,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);
const MENU_ITEMS: [&str; 3] = ["Start Learning!", "Leaderboard", "Quit"];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    selection_fg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            selection_fg: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Welcome,
    Play,
    Leaderboard,
}

enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Clone)]
struct Toast {
    notification: Notification,
    shown_at: Instant,
}

impl Toast {
    fn new(notification: Notification) -> Self {
        Self {
            notification,
            shown_at: Instant::now(),
        }
    }

    fn expired(&self) -> bool {
        self.shown_at.elapsed() >= self.notification.duration
    }
}

/// Terminal frontend for the quiz. Renders session state and forwards key
/// presses to the session's transitions.
pub struct FlagQuizApp {
    session: GameSession,
    store: LeaderboardStore,
    leaderboard: Vec<LeaderboardEntry>,
    recorded: bool,
    screen: Screen,
    menu_cursor: usize,
    option_cursor: usize,
    toast: Option<Toast>,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl FlagQuizApp {
    pub fn new(session: GameSession, store: LeaderboardStore) -> Self {
        let leaderboard = store.load();
        Self {
            session,
            store,
            leaderboard,
            recorded: false,
            screen: Screen::Welcome,
            menu_cursor: 0,
            option_cursor: 0,
            toast: None,
            status: "Ready".to_string(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.status = format!(
            "Loaded {} flags • {} leaderboard entries",
            self.session.catalog().len(),
            self.leaderboard.len()
        );

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => {
                    if let Err(err) = self.handle_input(event) {
                        error!(?err, "Input handling failed");
                        self.status = format!("Error: {err}");
                    }
                }
                Some(AppEvent::Tick) => self.handle_tick(),
                None => break,
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn handle_tick(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::expired) {
            self.toast = None;
        }
    }

    /// Move session notifications into the toast slot; the newest wins.
    fn pump_events(&mut self) {
        for event in self.session.take_events() {
            let notification = event.notification();
            info!(title = %notification.title, "{}", notification.description);
            self.toast = Some(Toast::new(notification));
        }
        self.record_if_finished();
    }

    fn record_if_finished(&mut self) {
        if self.recorded {
            return;
        }
        let Some(summary) = self.session.summary() else {
            return;
        };
        self.recorded = true;
        match self.store.record(LeaderboardEntry::new(summary)) {
            Ok(standing) => {
                self.leaderboard = standing.entries;
                self.status = match standing.rank {
                    Some(index) => format!("Score saved at rank #{}", index + 1),
                    None => "Score did not reach the top 10".to_string(),
                };
            }
            Err(err) => {
                error!(?err, "Failed to save leaderboard");
                self.status = format!("Leaderboard save failed: {err}");
            }
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        match self.screen {
            Screen::Welcome => self.handle_welcome_key(key),
            Screen::Play => self.handle_play_key(key),
            Screen::Leaderboard => self.handle_leaderboard_key(key),
        }
        Ok(())
    }

    fn handle_welcome_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                self.menu_cursor = (self.menu_cursor + 1).min(MENU_ITEMS.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.menu_cursor = self.menu_cursor.saturating_sub(1);
            }
            KeyCode::Char('l') => self.show_leaderboard(),
            KeyCode::Enter | KeyCode::Char(' ') => match self.menu_cursor {
                0 => self.start_game(),
                1 => self.show_leaderboard(),
                _ => self.should_quit = true,
            },
            _ => {}
        }
    }

    fn handle_leaderboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace => {
                self.screen = if self.session.phase() == Phase::NotStarted {
                    Screen::Welcome
                } else {
                    Screen::Play
                };
            }
            _ => {}
        }
    }

    fn handle_play_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.reset_game();
                return;
            }
            KeyCode::Char('l') => {
                self.show_leaderboard();
                return;
            }
            _ => {}
        }

        match self.session.phase() {
            Phase::Playing => self.handle_question_key(key),
            Phase::Revealed => {
                if matches!(
                    key.code,
                    KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n')
                ) && self.session.advance()
                {
                    self.option_cursor = 0;
                    self.status = "Which country does this flag belong to?".to_string();
                }
            }
            Phase::GameOver => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.reset_game();
                }
            }
            Phase::NotStarted => self.screen = Screen::Welcome,
        }
    }

    fn handle_question_key(&mut self, key: KeyEvent) {
        let option_count = self.session.current_round().options.len();
        match key.code {
            KeyCode::Esc => self.reset_game(),
            KeyCode::Char('j') | KeyCode::Down => {
                self.option_cursor = (self.option_cursor + 1).min(option_count - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.option_cursor = self.option_cursor.saturating_sub(1);
            }
            KeyCode::Char(ch @ '1'..='9') => {
                let index = (ch as usize) - ('1' as usize);
                if index < option_count {
                    self.option_cursor = index;
                    self.answer_selected();
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.answer_selected(),
            _ => {}
        }
    }

    fn answer_selected(&mut self) {
        let Some(option) = self
            .session
            .current_round()
            .options
            .get(self.option_cursor)
            .cloned()
        else {
            return;
        };
        if self.session.submit_answer(&option) {
            self.status = if self.session.phase() == Phase::GameOver {
                "Press Enter to play again".to_string()
            } else {
                "Press Enter for the next flag".to_string()
            };
            self.pump_events();
        }
    }

    fn start_game(&mut self) {
        if self.session.start() {
            self.screen = Screen::Play;
            self.option_cursor = 0;
            self.status = "Which country does this flag belong to?".to_string();
            self.pump_events();
        }
    }

    fn reset_game(&mut self) {
        self.session.reset();
        self.recorded = false;
        self.screen = Screen::Welcome;
        self.menu_cursor = 0;
        self.option_cursor = 0;
        self.status = "Ready".to_string();
        self.pump_events();
    }

    fn show_leaderboard(&mut self) {
        self.leaderboard = self.store.load();
        self.screen = Screen::Leaderboard;
        self.status = "Esc to go back".to_string();
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(4)])
            .split(area);

        match self.screen {
            Screen::Welcome => self.draw_welcome(frame, chunks[0]),
            Screen::Play => match self.session.phase() {
                Phase::GameOver => self.draw_game_over(frame, chunks[0]),
                _ => self.draw_play(frame, chunks[0]),
            },
            Screen::Leaderboard => self.render_leaderboard(frame, chunks[0]),
        }
        self.render_status(frame, chunks[1]);
    }

    fn draw_welcome(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(3)])
            .split(area);

        let title = Paragraph::new(vec![
            Line::from(Span::styled(
                "🏁  FLAG MASTER  🏁",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Test your knowledge of world flags!"),
            Line::from(Span::styled(
                format!(
                    "{} lives • streaks multiply your points • top 10 saved",
                    STARTING_LIVES
                ),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, layout[0]);

        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();
        let menu_height = (MENU_ITEMS.len() as u16 + 2).min(layout[1].height);
        let menu_area = centered_rect(28, menu_height, layout[1]);
        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
    }

    fn draw_play(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(5),
                Constraint::Min(6),
            ])
            .split(area);

        self.render_header(frame, layout[0]);
        self.render_flag(frame, layout[1]);
        self.render_options(frame, layout[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let state = self.session.state();
        let mut hearts = Vec::new();
        for idx in 0..STARTING_LIVES {
            let style = if idx < state.lives {
                Style::default().fg(self.theme.danger)
            } else {
                Style::default().fg(self.theme.muted)
            };
            hearts.push(Span::styled("♥ ", style));
        }
        hearts.push(Span::raw("   "));
        hearts.push(Span::styled(
            format!("🏆 {}", state.score),
            Style::default()
                .fg(self.theme.warning)
                .add_modifier(Modifier::BOLD),
        ));

        let stats = Line::from(Span::styled(
            format!(
                "Flags Answered: {}   🔥 Streak: {}   Next: +{}",
                state.flags_answered,
                state.streak,
                state.next_award()
            ),
            Style::default().fg(self.theme.muted),
        ));

        let paragraph = Paragraph::new(vec![Line::from(hearts), stats])
            .block(Block::default().borders(Borders::ALL).title("Flag Master"));
        frame.render_widget(paragraph, area);
    }

    fn render_flag(&self, frame: &mut Frame, area: Rect) {
        let state = self.session.state();
        let round = self.session.current_round();
        let mut lines = vec![Line::from(Span::styled(
            round.flag.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if state.revealed {
            lines.push(Line::from(Span::styled(
                round.country.clone(),
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Flag to guess",
                Style::default().fg(self.theme.muted),
            )));
        }
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_options(&self, frame: &mut Frame, area: Rect) {
        let state = self.session.state();
        let round = self.session.current_round();

        let mut lines = vec![
            Line::from(Span::styled(
                "Which country does this flag belong to?",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (idx, option) in round.options.iter().enumerate() {
            let selected = state.selected_option.as_deref() == Some(option.as_str());
            let correct = round.is_correct(option);
            let (marker, style) = if !state.revealed {
                if idx == self.option_cursor {
                    (
                        "▶",
                        Style::default()
                            .fg(self.theme.selection_fg)
                            .bg(self.theme.selection_bg)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    (" ", Style::default().fg(self.theme.primary_fg))
                }
            } else if correct {
                (
                    "✔",
                    Style::default()
                        .fg(self.theme.success)
                        .add_modifier(Modifier::BOLD),
                )
            } else if selected {
                ("✘", Style::default().fg(self.theme.danger))
            } else {
                (" ", Style::default().fg(self.theme.muted))
            };
            lines.push(Line::from(Span::styled(
                format!("{marker} {}. {option}", idx + 1),
                style,
            )));
        }

        if state.revealed {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "⭐ Next Flag [Enter]",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Question"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_game_over(&self, frame: &mut Frame, area: Rect) {
        let state = self.session.state();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(4)])
            .split(area);

        let summary = Paragraph::new(vec![
            Line::from(Span::styled(
                "💔 Game Over!",
                Style::default()
                    .fg(self.theme.danger)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                format!("Final Score: {}", state.score),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Best Streak: {}   Flags Answered: {}",
                state.best_streak, state.flags_answered
            )),
            Line::from(Span::styled(
                "Play Again [Enter]",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(summary, layout[0]);

        self.render_leaderboard(frame, layout[1]);
    }

    fn render_leaderboard(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("🏆 Leaderboard");
        if self.leaderboard.is_empty() {
            let paragraph = Paragraph::new("No scores yet. Be the first to play!")
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.theme.muted))
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }

        let lines: Vec<Line> = self
            .leaderboard
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let style = if idx == 0 {
                    Style::default()
                        .fg(self.theme.warning)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                Line::from(Span::styled(
                    format!(
                        "{} {:>5} pts  {:<10}  🔥 {:<3} {} flags",
                        rank_label(idx),
                        entry.score,
                        entry.date,
                        entry.streak,
                        entry.flags_answered
                    ),
                    style,
                ))
            })
            .collect();
        let paragraph = Paragraph::new(lines).block(block);
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = match &self.toast {
            Some(toast) => Line::from(vec![
                Span::styled(
                    format!("{} ", toast.notification.title),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(toast.notification.description.clone()),
            ]),
            None => Line::from(self.status.clone()),
        };
        let secondary = Line::from(Span::styled(
            "1-4 answer • ↑↓ Enter choose • n next • r reset • l leaderboard • q quit",
            Style::default().fg(self.theme.muted),
        ));
        let paragraph = Paragraph::new(vec![primary, secondary])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn rank_label(index: usize) -> String {
    match index {
        0 => "🥇".to_string(),
        1 => "🥈".to_string(),
        2 => "🥉".to_string(),
        other => format!("#{}", other + 1),
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crossterm::event::KeyModifiers;
    use flagquiz_core::{leaderboard::LEADERBOARD_CAPACITY, RoundCatalog};
    use tempfile::tempdir;

    fn press(app: &mut FlagQuizApp, code: KeyCode) {
        app.handle_input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .expect("key handled");
    }

    fn app_in(dir: &std::path::Path) -> FlagQuizApp {
        let catalog = Arc::new(RoundCatalog::bundled().expect("bundled catalog"));
        let session = GameSession::with_seed(catalog, 11);
        FlagQuizApp::new(session, LeaderboardStore::new(dir.join("scores.json")))
    }

    fn press_wrong(app: &mut FlagQuizApp) {
        let round = app.session.current_round();
        let index = round
            .options
            .iter()
            .position(|option| !round.is_correct(option))
            .expect("wrong option exists");
        let key = char::from_digit(index as u32 + 1, 10).expect("single digit");
        press(app, KeyCode::Char(key));
    }

    #[test]
    fn game_over_records_one_entry() {
        let dir = tempdir().expect("tempdir");
        let mut app = app_in(dir.path());

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen, Screen::Play);
        assert_eq!(app.session.phase(), Phase::Playing);

        for _ in 0..STARTING_LIVES {
            press_wrong(&mut app);
            press(&mut app, KeyCode::Enter);
        }

        // The last Enter on the game over screen resets back to the menu.
        assert_eq!(app.screen, Screen::Welcome);
        assert_eq!(app.session.phase(), Phase::NotStarted);
        let stored = app.store.load();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].score, 0);
        assert_eq!(stored[0].flags_answered, STARTING_LIVES);
    }

    fn lose_all_lives(app: &mut FlagQuizApp) {
        press(app, KeyCode::Enter);
        for idx in 0..STARTING_LIVES {
            press_wrong(app);
            if idx + 1 < STARTING_LIVES {
                press(app, KeyCode::Enter);
            }
        }
        assert_eq!(app.session.phase(), Phase::GameOver);
    }

    fn stored_entry(score: u32, date: &str) -> LeaderboardEntry {
        LeaderboardEntry {
            score,
            date: date.to_string(),
            streak: 0,
            flags_answered: 1,
        }
    }

    #[test]
    fn full_board_tie_reports_not_ranked() {
        let dir = tempdir().expect("tempdir");
        let mut app = app_in(dir.path());
        app.store
            .save(&vec![stored_entry(0, "old"); LEADERBOARD_CAPACITY])
            .expect("seed leaderboard");

        lose_all_lives(&mut app);

        assert_eq!(app.status, "Score did not reach the top 10");
        assert!(app.leaderboard.iter().all(|entry| entry.date == "old"));
    }

    #[test]
    fn tied_score_reports_its_own_rank() {
        let dir = tempdir().expect("tempdir");
        let mut app = app_in(dir.path());
        app.store
            .save(&[stored_entry(50, "a"), stored_entry(0, "b")])
            .expect("seed leaderboard");

        lose_all_lives(&mut app);

        assert_eq!(app.status, "Score saved at rank #3");
        assert_eq!(app.leaderboard.len(), 3);
        assert_eq!(app.leaderboard[2].flags_answered, STARTING_LIVES);
    }

    #[test]
    fn answer_keys_are_ignored_after_reveal() {
        let dir = tempdir().expect("tempdir");
        let mut app = app_in(dir.path());
        press(&mut app, KeyCode::Enter);

        let country = app.session.current_round().country.clone();
        let index = app
            .session
            .current_round()
            .options
            .iter()
            .position(|option| *option == country)
            .expect("country listed");
        let key = char::from_digit(index as u32 + 1, 10).expect("single digit");
        press(&mut app, KeyCode::Char(key));
        assert_eq!(app.session.state().score, 10);
        assert!(app.toast.is_some());

        press(&mut app, KeyCode::Char(key));
        assert_eq!(app.session.state().score, 10);
        assert_eq!(app.session.phase(), Phase::Revealed);
    }
}
