//! Labelbase TUI Application
//!
//! A terminal user interface for browsing labelbases and their labels.
//!
//! The API root is taken from `LABELBASE_BASE_URL` (cloud origin by default).
//! When `LABELBASE_API_KEY` is set the key prompt is skipped. Set
//! `LABELBASE_LOG_FILE` to write client diagnostics to a file.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::fs::File;
use std::io::{self, Stdout};
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use labelbase_client::{ClientConfig, Label, LabelbaseClient, Labelbase, DEFAULT_BASE_URL};

const ENV_API_KEY: &str = "LABELBASE_API_KEY";
const ENV_BASE_URL: &str = "LABELBASE_BASE_URL";
const ENV_LOG_FILE: &str = "LABELBASE_LOG_FILE";

// ============================================================================
// Application State
// ============================================================================

/// Represents the current screen being displayed
#[derive(Debug, Clone, PartialEq)]
enum AppScreen {
    /// API key input screen
    KeyInput,
    /// Loading labelbases from API
    LoadingLabelbases,
    /// Labelbase selection screen
    LabelbaseSelection,
    /// Loading labels of the selected labelbase
    LoadingLabels,
    /// Label table screen
    LabelTable,
}

/// Main application state
struct AppState {
    /// Current screen being displayed
    screen: AppScreen,
    /// API root the client connects to
    api_url: String,
    /// API key entered by user
    api_key: String,
    /// Cursor position in key input
    cursor_position: usize,
    /// Initialized API client
    client: Option<LabelbaseClient>,
    /// Labelbases visible to the key
    labelbases: Vec<Labelbase>,
    /// Currently highlighted labelbase index
    selected_labelbase_index: usize,
    /// Labels of the current labelbase
    labels: Vec<Label>,
    /// Currently selected row in the label table
    selected_row: usize,
    /// Error message to display
    error_message: Option<String>,
    /// Should the application quit?
    should_quit: bool,
}

impl AppState {
    fn new(api_url: String, api_key: String) -> Self {
        Self {
            screen: AppScreen::KeyInput,
            api_url,
            cursor_position: api_key.len(),
            api_key,
            client: None,
            labelbases: Vec::new(),
            selected_labelbase_index: 0,
            labels: Vec::new(),
            selected_row: 0,
            error_message: None,
            should_quit: false,
        }
    }

    /// Initialize the API client with the entered key
    fn init_client(&mut self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("API key is required".to_string());
        }
        let config = ClientConfig::new(self.api_key.trim()).with_base_url(self.api_url.clone());
        match LabelbaseClient::from_config(&config) {
            Ok(client) => {
                self.client = Some(client);
                Ok(())
            }
            Err(e) => Err(format!("Failed to create client: {}", e)),
        }
    }

    /// Fetch all labelbases from the API
    fn fetch_labelbases(&mut self) -> Result<(), String> {
        let client = self.client.as_ref().ok_or("Client not initialized")?;
        let labelbases = client
            .list_labelbases()
            .ok_or("Failed to fetch labelbases")?;
        if labelbases.is_empty() {
            return Err("No labelbases found".to_string());
        }
        self.labelbases = labelbases;
        Ok(())
    }

    /// Select the highlighted labelbase and fetch its labels
    fn fetch_labels(&mut self) -> Result<(), String> {
        let labelbase_id = self
            .labelbases
            .get(self.selected_labelbase_index)
            .map(|lb| lb.id.clone())
            .ok_or("No labelbase selected")?;
        let client = self.client.as_mut().ok_or("Client not initialized")?;
        client.use_labelbase(labelbase_id);

        let labels = client
            .labels(None)
            .map_err(|e| e.to_string())?
            .list()
            .ok_or("Failed to fetch labels")?;
        self.labels = labels;
        self.selected_row = 0;
        Ok(())
    }

    fn current_labelbase(&self) -> Option<&Labelbase> {
        let client = self.client.as_ref()?;
        let id = client.current_labelbase_id()?;
        self.labelbases.iter().find(|lb| lb.id == id)
    }

    /// Clear any error message
    fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Set an error message
    fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }
}

// ============================================================================
// Terminal Setup
// ============================================================================

/// Setup the terminal for TUI mode
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

/// Restore the terminal to its original state
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

/// Send client diagnostics to `LABELBASE_LOG_FILE`, if set.
fn init_logging() -> io::Result<()> {
    let Ok(path) = std::env::var(ENV_LOG_FILE) else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("labelbase_client=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ============================================================================
// UI Rendering
// ============================================================================

fn title_block(text: String) -> Paragraph<'static> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn help_line(text: &'static str) -> Paragraph<'static> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
}

fn highlight(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

/// Render the API key input screen
fn render_key_input(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Input
            Constraint::Length(2), // Help
            Constraint::Min(1),    // Spacer
            Constraint::Length(2), // Status bar
        ])
        .split(f.area());

    f.render_widget(title_block("Labelbase Browser".to_string()), chunks[0]);

    // Input field, masked
    let input_block = Block::default()
        .title(" API Key ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let masked = "*".repeat(state.api_key.chars().count());
    let input_text = Paragraph::new(masked)
        .style(Style::default().fg(Color::White))
        .block(input_block);
    f.render_widget(input_text, chunks[1]);

    let cursor_x = chunks[1].x + state.api_key[..state.cursor_position].chars().count() as u16 + 1;
    let cursor_y = chunks[1].y + 1;
    f.set_cursor_position((cursor_x, cursor_y));

    f.render_widget(help_line("Press Enter to connect | Esc to quit"), chunks[2]);
    render_status_bar(f, chunks[4], state);
}

/// Render the loading screen
fn render_loading(f: &mut Frame, state: &AppState, message: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Loading message
            Constraint::Min(1),    // Spacer
            Constraint::Length(2), // Status bar
        ])
        .split(f.area());

    f.render_widget(title_block("Labelbase Browser".to_string()), chunks[0]);

    let loading = Paragraph::new(format!("{}...", message))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(loading, chunks[1]);

    render_status_bar(f, chunks[3], state);
}

/// Render the labelbase selection screen
fn render_labelbase_selection(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(5),    // Labelbase list
            Constraint::Length(2), // Help
            Constraint::Length(2), // Status bar
        ])
        .split(f.area());

    f.render_widget(title_block("Select Labelbase".to_string()), chunks[0]);

    let rows: Vec<Row> = state
        .labelbases
        .iter()
        .enumerate()
        .map(|(i, lb)| {
            Row::new(vec![
                Cell::from(lb.id.clone()),
                Cell::from(truncate(&lb.name, 24)),
                Cell::from(lb.fingerprint.clone()),
                Cell::from(truncate(&lb.about, 40)),
            ])
            .style(highlight(i == state.selected_labelbase_index))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(26),
            Constraint::Length(12),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["ID", "Name", "Fingerprint", "About"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1),
    )
    .block(Block::default().borders(Borders::ALL).title(" Labelbases "));
    f.render_widget(table, chunks[1]);

    f.render_widget(
        help_line("Enter: Open | r: Reload | Esc: Back | q: Quit"),
        chunks[2],
    );
    render_status_bar(f, chunks[3], state);
}

/// Render the label table screen
fn render_label_table(f: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(5),    // Label table
            Constraint::Length(2), // Help
            Constraint::Length(2), // Status bar
        ])
        .split(f.area());

    let name = state
        .current_labelbase()
        .map(|lb| lb.name.as_str())
        .unwrap_or("Unknown");
    f.render_widget(
        title_block(format!("Labels - {} | {} labels", name, state.labels.len())),
        chunks[0],
    );

    let rows: Vec<Row> = state
        .labels
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let details = match (&l.origin, l.spendable) {
                (Some(origin), _) => format!("origin: {}", origin),
                (None, Some(spendable)) => format!("spendable: {}", spendable),
                (None, None) => String::new(),
            };
            Row::new(vec![
                Cell::from(l.label_type.to_string()),
                Cell::from(truncate(&l.reference, 30)),
                Cell::from(truncate(&l.label, 30)),
                Cell::from(truncate(&details, 30)),
            ])
            .style(highlight(i == state.selected_row))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(32),
            Constraint::Length(32),
            Constraint::Min(20),
        ],
    )
    .header(
        Row::new(vec!["Type", "Ref", "Label", "Details"])
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(1),
    )
    .block(Block::default().borders(Borders::ALL).title(" Labels "));
    f.render_widget(table, chunks[1]);

    f.render_widget(help_line("r: Reload | b: Back | q: Quit"), chunks[2]);
    render_status_bar(f, chunks[3], state);
}

/// Render the status bar at the bottom
fn render_status_bar(f: &mut Frame, area: Rect, state: &AppState) {
    let status_text = if let Some(ref error) = state.error_message {
        format!(" Error: {}", error)
    } else {
        format!(" Connected to: {}", state.api_url)
    };

    let style = if state.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    let status = Paragraph::new(status_text)
        .style(style)
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::TOP));
    f.render_widget(status, area);
}

/// Main render function that dispatches to the appropriate screen renderer
fn render(f: &mut Frame, state: &AppState) {
    match state.screen {
        AppScreen::KeyInput => render_key_input(f, state),
        AppScreen::LoadingLabelbases => render_loading(f, state, "Loading labelbases"),
        AppScreen::LabelbaseSelection => render_labelbase_selection(f, state),
        AppScreen::LoadingLabels => render_loading(f, state, "Loading labels"),
        AppScreen::LabelTable => render_label_table(f, state),
    }
}

// ============================================================================
// Event Handling
// ============================================================================

/// Handle keyboard input for the API key screen
fn handle_key_input(event: KeyEvent, state: &mut AppState) {
    match event.code {
        KeyCode::Char(c) => {
            state.api_key.insert(state.cursor_position, c);
            state.cursor_position += c.len_utf8();
            state.clear_error();
        }
        KeyCode::Backspace => {
            if let Some(c) = state.api_key[..state.cursor_position].chars().next_back() {
                state.cursor_position -= c.len_utf8();
                state.api_key.remove(state.cursor_position);
                state.clear_error();
            }
        }
        KeyCode::Delete => {
            if state.cursor_position < state.api_key.len() {
                state.api_key.remove(state.cursor_position);
                state.clear_error();
            }
        }
        KeyCode::Left => {
            if let Some(c) = state.api_key[..state.cursor_position].chars().next_back() {
                state.cursor_position -= c.len_utf8();
            }
        }
        KeyCode::Right => {
            if let Some(c) = state.api_key[state.cursor_position..].chars().next() {
                state.cursor_position += c.len_utf8();
            }
        }
        KeyCode::Home => {
            state.cursor_position = 0;
        }
        KeyCode::End => {
            state.cursor_position = state.api_key.len();
        }
        KeyCode::Enter => {
            if let Err(e) = state.init_client() {
                state.set_error(e);
            } else {
                state.screen = AppScreen::LoadingLabelbases;
            }
        }
        KeyCode::Esc => {
            state.should_quit = true;
        }
        _ => {}
    }
}

/// Handle keyboard input for the labelbase selection screen
fn handle_labelbase_selection(event: KeyEvent, state: &mut AppState) {
    match event.code {
        KeyCode::Up => {
            state.selected_labelbase_index = state.selected_labelbase_index.saturating_sub(1);
        }
        KeyCode::Down => {
            if state.selected_labelbase_index < state.labelbases.len().saturating_sub(1) {
                state.selected_labelbase_index += 1;
            }
        }
        KeyCode::Enter => {
            state.screen = AppScreen::LoadingLabels;
        }
        KeyCode::Char('r') => {
            state.clear_error();
            state.screen = AppScreen::LoadingLabelbases;
        }
        KeyCode::Esc => {
            state.screen = AppScreen::KeyInput;
        }
        _ => {}
    }
}

/// Handle keyboard input for the label table screen
fn handle_label_table(event: KeyEvent, state: &mut AppState) {
    match event.code {
        KeyCode::Up => {
            state.selected_row = state.selected_row.saturating_sub(1);
        }
        KeyCode::Down => {
            if state.selected_row < state.labels.len().saturating_sub(1) {
                state.selected_row += 1;
            }
        }
        KeyCode::Char('r') => {
            state.clear_error();
            state.screen = AppScreen::LoadingLabels;
        }
        KeyCode::Char('b') | KeyCode::Esc => {
            state.screen = AppScreen::LabelbaseSelection;
            state.clear_error();
        }
        _ => {}
    }
}

/// Main event handler that dispatches to the appropriate screen handler
fn handle_event(event: Event, state: &mut AppState) {
    if let Event::Key(key_event) = event {
        // 'q' quits everywhere except the key input, where it is text
        if key_event.code == KeyCode::Char('q')
            && state.screen != AppScreen::KeyInput
            && key_event.modifiers == KeyModifiers::NONE
        {
            state.should_quit = true;
            return;
        }

        match state.screen {
            AppScreen::KeyInput => handle_key_input(key_event, state),
            AppScreen::LabelbaseSelection => handle_labelbase_selection(key_event, state),
            AppScreen::LabelTable => handle_label_table(key_event, state),
            _ => {} // Loading screens don't handle input
        }
    }
}

// ============================================================================
// Application Logic
// ============================================================================

/// Process the current state (e.g., fetch data during loading screens)
fn process_state(state: &mut AppState) {
    match state.screen {
        AppScreen::LoadingLabelbases => match state.fetch_labelbases() {
            Ok(()) => {
                state.screen = AppScreen::LabelbaseSelection;
                state.selected_labelbase_index = state
                    .selected_labelbase_index
                    .min(state.labelbases.len().saturating_sub(1));
            }
            Err(e) => {
                state.set_error(e);
                state.screen = AppScreen::KeyInput;
            }
        },
        AppScreen::LoadingLabels => match state.fetch_labels() {
            Ok(()) => {
                state.screen = AppScreen::LabelTable;
            }
            Err(e) => {
                state.set_error(e);
                state.screen = AppScreen::LabelbaseSelection;
            }
        },
        _ => {}
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Shorten `s` to at most `max` characters, marking the cut with "..."
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

// ============================================================================
// Main Application
// ============================================================================

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let api_url = std::env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let api_key = std::env::var(ENV_API_KEY).unwrap_or_default();
    let mut state = AppState::new(api_url, api_key);
    if !state.api_key.is_empty() {
        match state.init_client() {
            Ok(()) => state.screen = AppScreen::LoadingLabelbases,
            Err(e) => state.set_error(e),
        }
    }

    let mut terminal = setup_terminal()?;

    // Main loop
    loop {
        // Draw the UI
        terminal.draw(|f| render(f, &state))?;

        // Process any state transitions (e.g., loading -> loaded)
        process_state(&mut state);

        if state.should_quit {
            break;
        }

        // Handle events with a timeout
        if event::poll(Duration::from_millis(100))? {
            let event = event::read()?;
            handle_event(event, &mut state);
        }
    }

    restore_terminal(&mut terminal)?;

    Ok(())
}
