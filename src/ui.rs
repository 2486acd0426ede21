use crate::app::{App, Session};
use crate::error::TodoError;
use crate::store::KeyValueStore;
use crate::task::TaskDraft;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io::{self, Write};

#[derive(Debug, Default)]
struct UiState {
    selected: usize,
    search: String,
    message: Option<String>,
}

impl UiState {
    fn report(&mut self, err: TodoError) {
        if !err.is_user_error() {
            tracing::error!(%err, "operation failed");
        }
        self.message = Some(err.to_string());
    }
}

pub fn run_app<B, S>(terminal: &mut Terminal<B>, app: &mut App<S>) -> io::Result<()>
where
    B: Backend,
    S: KeyValueStore + Clone,
{
    let mut state = UiState::default();
    loop {
        terminal.draw(|f| match app.session() {
            Some(session) => draw_tasks(f, session, &state),
            None => draw_auth(f, &state),
        })?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let prompted = matches!(key.code, KeyCode::Char('l' | 'r' | 'a' | '/'));
        let keep_running = if app.session().is_some() {
            handle_task_key(key.code, app, &mut state)
        } else {
            handle_auth_key(key.code, app, &mut state)
        };
        if !keep_running {
            return Ok(());
        }
        // prompts leave the alternate screen
        if prompted {
            terminal.clear()?;
        }
    }
}

fn handle_auth_key<S: KeyValueStore + Clone>(
    code: KeyCode,
    app: &mut App<S>,
    state: &mut UiState,
) -> bool {
    match code {
        KeyCode::Char('q') => return false,
        KeyCode::Char('l') => {
            let Some(username) = prompt("Username") else {
                return true;
            };
            let Some(password) = prompt_secret("Password") else {
                return true;
            };
            match app.login(&username, &password) {
                Ok(_) => *state = UiState::default(),
                Err(err) => state.report(err),
            }
        }
        KeyCode::Char('r') => {
            let Some(username) = prompt("Username") else {
                return true;
            };
            let Some(email) = prompt("Email") else {
                return true;
            };
            let Some(password) = prompt_secret("Password") else {
                return true;
            };
            match app.register(&username, &email, &password) {
                Ok(_) => *state = UiState::default(),
                Err(err) => state.report(err),
            }
        }
        _ => {}
    }
    true
}

fn handle_task_key<S: KeyValueStore + Clone>(
    code: KeyCode,
    app: &mut App<S>,
    state: &mut UiState,
) -> bool {
    if code == KeyCode::Char('o') {
        if let Err(err) = app.logout() {
            state.report(err);
        } else {
            *state = UiState::default();
        }
        return true;
    }

    let Some(session) = app.session_mut() else {
        return true;
    };
    let visible: Vec<i64> = session
        .tasks
        .search(&state.search)
        .iter()
        .map(|t| t.id)
        .collect();
    let selected_id = visible.get(state.selected).copied();

    match code {
        KeyCode::Char('q') => return false,
        KeyCode::Char('a') => {
            let Some(title) = prompt("Task title") else {
                return true;
            };
            let draft = TaskDraft {
                title,
                description: prompt("Description (optional)"),
                date: prompt("Date YYYY-MM-DD (optional)"),
                time: prompt("Time HH:MM (optional)"),
            };
            match session.tasks.add_task(draft) {
                Ok(_) => state.message = None,
                Err(err) => state.report(err),
            }
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            if let Some(id) = selected_id {
                if let Err(err) = session.tasks.toggle_complete(id) {
                    state.report(err);
                }
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = selected_id {
                match session.tasks.delete_task(id) {
                    Ok(()) => {
                        if state.selected + 1 >= visible.len() {
                            state.selected = state.selected.saturating_sub(1);
                        }
                    }
                    Err(err) => state.report(err),
                }
            }
        }
        KeyCode::Char('/') => {
            state.search = prompt("Search tasks").unwrap_or_default();
            state.selected = 0;
        }
        KeyCode::Esc => {
            state.search.clear();
            state.selected = 0;
            state.message = None;
        }
        KeyCode::Up => {
            if state.selected > 0 {
                state.selected -= 1;
            }
        }
        KeyCode::Down => {
            if state.selected + 1 < visible.len() {
                state.selected += 1;
            }
        }
        _ => {}
    }
    true
}

fn draw_auth(f: &mut Frame, state: &UiState) {
    let area = centered(f.area(), 60, 9);
    let mut lines = vec![
        Line::from(Span::styled(
            "My To-Do-List",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Log in or create an account to manage your tasks."),
        Line::from(""),
        Line::from("[l] Login   [r] Register   [q] Quit"),
    ];
    if let Some(message) = &state.message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Red),
        )));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("Welcome")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(paragraph, area);
}

fn draw_tasks<S: KeyValueStore>(f: &mut Frame, session: &Session<S>, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(f.area());

    let stats = session.tasks.stats();
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            "My To-Do-List",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "Welcome, {}!   {} tasks, {} done, {} pending",
            session.user.username, stats.total, stats.completed, stats.pending
        )),
    ])
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, chunks[0]);

    let search = Paragraph::new(if state.search.is_empty() {
        Span::styled("Search tasks...", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(state.search.as_str())
    })
    .block(Block::default().title("Search").borders(Borders::ALL));
    f.render_widget(search, chunks[1]);

    let tasks = session.tasks.search(&state.search);
    let items: Vec<ListItem> = tasks
        .iter()
        .map(|t| {
            let (mark, title_style) = if t.completed {
                (
                    "[x] ",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT),
                )
            } else {
                ("[ ] ", Style::default().fg(Color::White))
            };
            let mut spans = vec![Span::raw(mark), Span::styled(t.text.as_str(), title_style)];
            if let Some(description) = t.description.as_deref() {
                spans.push(Span::styled(
                    format!("  {description}"),
                    Style::default().fg(Color::Gray),
                ));
            }
            if let Some(schedule) = t.schedule() {
                spans.push(Span::styled(
                    format!("  ({schedule})"),
                    Style::default().fg(Color::Yellow),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let empty = items.is_empty();
    let list = List::new(items)
        .block(Block::default().title("Tasks").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
    let mut list_state = ListState::default();
    if !empty {
        list_state.select(Some(state.selected.min(tasks.len() - 1)));
    }
    f.render_stateful_widget(list, chunks[2], &mut list_state);

    let footer = match &state.message {
        Some(message) => Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(
            "[a] add  [space] toggle  [d] delete  [/] search  [esc] clear  [o] logout  [q] quit",
        ),
    };
    f.render_widget(
        Paragraph::new(footer).block(Block::default().borders(Borders::ALL)),
        chunks[3],
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn with_cooked_terminal<T>(read: impl FnOnce() -> io::Result<T>) -> Option<T> {
    let mut stdout = io::stdout();
    disable_raw_mode().ok();
    execute!(stdout, LeaveAlternateScreen).ok();
    let result = read();
    execute!(stdout, EnterAlternateScreen).ok();
    enable_raw_mode().ok();
    result.ok()
}

fn prompt(message: &str) -> Option<String> {
    with_cooked_terminal(|| {
        print!("{}: ", message);
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    })
}

fn prompt_secret(message: &str) -> Option<String> {
    with_cooked_terminal(|| rpassword::prompt_password(format!("{}: ", message)))
}
