use std::io;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Context, Line as CanvasLine, Points, Rectangle};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

use opta_explorer::cli::CliArgs;
use opta_explorer::counts::CountRow;
use opta_explorer::events::EventRow;
use opta_explorer::export::{ExportReport, default_export_path, export_events_xlsx, export_sequences_xlsx};
use opta_explorer::filter::Zone;
use opta_explorer::sequences::Sequence;
use opta_explorer::settings::Settings;
use opta_explorer::state::{AppState, Screen, ZoneFocus};

struct App {
    state: AppState,
    should_quit: bool,
}

impl App {
    fn new(state: AppState) -> Self {
        Self {
            state,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.state.toggle_screen(),
            KeyCode::Char('t') => self.state.cycle_event_type(true),
            KeyCode::Char('T') => self.state.cycle_event_type(false),
            KeyCode::Char('p') => self.state.cycle_player(true),
            KeyCode::Char('P') => self.state.cycle_player(false),
            KeyCode::Char('e') => self.state.cycle_team(true),
            KeyCode::Char('E') => self.state.cycle_team(false),
            KeyCode::Char('m') => self.state.move_match_cursor(true),
            KeyCode::Char('M') => self.state.move_match_cursor(false),
            KeyCode::Char(' ') => self.state.toggle_match_at_cursor(),
            KeyCode::Char('a') => self.state.select_all_matches(),
            KeyCode::Char('z') => self.state.cycle_zone_focus(),
            KeyCode::Char('h') | KeyCode::Left => self.state.move_zone(-1, 0),
            KeyCode::Char('l') | KeyCode::Right => self.state.move_zone(1, 0),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_zone(0, 1),
            KeyCode::Char('j') | KeyCode::Down => self.state.move_zone(0, -1),
            KeyCode::Char('<') => self.state.resize_zone(-1, 0),
            KeyCode::Char('>') => self.state.resize_zone(1, 0),
            KeyCode::Char('-') => self.state.resize_zone(0, -1),
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.resize_zone(0, 1),
            KeyCode::Char('r') => {
                self.state.push_log("[INFO] Reloading feed files");
                self.state.reload();
            }
            KeyCode::Char('x') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn export(&mut self) {
        let result = self.write_export();
        match result {
            Ok(report) => self.state.push_log(format!(
                "[INFO] Exported {} rows ({} count rows) to {}",
                report.rows,
                report.counts,
                report.path.display()
            )),
            Err(err) => self.state.push_log(format!("[ERROR] Export failed: {err:#}")),
        }
    }

    fn write_export(&self) -> Result<ExportReport> {
        let session = self
            .state
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("nothing loaded"))?;
        let dir = &self.state.settings.export_dir;
        match self.state.screen {
            Screen::Events => {
                let filter = self
                    .state
                    .event_filter()
                    .ok_or_else(|| anyhow!("no event type selected"))?;
                let view = session.events(&filter);
                export_events_xlsx(&default_export_path(dir, "events"), &view.rows, &view.counts)
            }
            Screen::Sequences => {
                let report = session.sequences(&self.state.sequence_query());
                export_sequences_xlsx(
                    &default_export_path(dir, "sequences"),
                    &report.sequences,
                    &report.counts,
                )
            }
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let settings = Settings::from_env();
    let source = CliArgs::from_env().feed_source(&settings)?;
    let mut state = AppState::new(settings, source);
    state.reload();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(state);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// What the body panes draw for one frame.
enum Plot<'a> {
    Empty(&'static str),
    Events {
        rows: Vec<&'a EventRow>,
        counts: Vec<CountRow>,
    },
    Sequences {
        sequences: Vec<Sequence<'a>>,
        counts: Vec<CountRow>,
    },
}

fn current_plot(state: &AppState) -> Plot<'_> {
    let Some(session) = &state.session else {
        return Plot::Empty("No matches loaded (r to reload)");
    };
    match state.screen {
        Screen::Events => match state.event_filter() {
            Some(filter) => {
                let view = session.events(&filter);
                Plot::Events {
                    rows: view.rows,
                    counts: view.counts,
                }
            }
            None => Plot::Empty("No event types in the loaded matches"),
        },
        Screen::Sequences => {
            let report = session.sequences(&state.sequence_query());
            Plot::Sequences {
                sequences: report.sequences,
                counts: report.counts,
            }
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_body(frame, chunks[1], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let mode = match state.screen {
        Screen::Events => "EVENTS",
        Screen::Sequences => "RECEPTION -> NEXT PASS",
    };
    let loaded = match &state.session {
        Some(session) => format!(
            "{} matches | {} events | loaded {}",
            session.match_count(),
            session.table().len(),
            session.loaded_at().format("%H:%M:%S")
        ),
        None => "no data".to_string(),
    };
    format!("OPTA EXPLORER | {mode}\n{loaded}")
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Events => {
            "Tab Sequences | t Type | p Player | e Team | m/Space Matches | arrows Zone | </>/-/+ Size | x Export | ? Help | q Quit".to_string()
        }
        Screen::Sequences => {
            "Tab Events | z Zone focus | m/Space Matches | arrows Zone | </>/-/+ Size | x Export | ? Help | q Quit".to_string()
        }
    }
}

fn render_body(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Min(40),
            Constraint::Length(42),
        ])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(1)])
        .split(columns[0]);

    let filters = Paragraph::new(filters_text(state))
        .block(Block::default().title("Filters").borders(Borders::ALL));
    frame.render_widget(filters, left[0]);

    let matches = Paragraph::new(match_list_text(state))
        .block(Block::default().title("Matches").borders(Borders::ALL));
    frame.render_widget(matches, left[1]);

    let plot = current_plot(state);
    render_pitch(frame, columns[1], state, &plot);
    render_counts(frame, columns[2], &plot);
}

fn filters_text(state: &AppState) -> String {
    let focus = |focus: ZoneFocus| if state.zone_focus == focus { "*" } else { " " };
    match state.screen {
        Screen::Events => {
            let event_type = state
                .event_type
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string());
            [
                format!("Type:   {event_type}"),
                format!("Player: {}", state.player.as_deref().unwrap_or("All")),
                format!("Team:   {}", state.team.as_deref().unwrap_or("All")),
                format!("{}Zone:  {}", focus(ZoneFocus::Events), state.events_zone),
            ]
            .join("\n")
        }
        Screen::Sequences => [
            format!("{}Rec:   {}", focus(ZoneFocus::Reception), state.reception_zone),
            format!("{}Pass:  {}", focus(ZoneFocus::NextPass), state.next_pass_zone),
            "Window: 20s".to_string(),
        ]
        .join("\n"),
    }
}

fn match_list_text(state: &AppState) -> String {
    let Some(session) = &state.session else {
        return "No matches yet".to_string();
    };
    let mut lines = Vec::new();
    for (idx, id) in session.options().match_ids.iter().enumerate() {
        let prefix = if idx == state.match_cursor { "> " } else { "  " };
        let mark = if state.excluded_matches.contains(&**id) {
            "[ ]"
        } else {
            "[x]"
        };
        lines.push(format!("{prefix}{mark} {id}"));
    }
    lines.join("\n")
}

fn render_pitch(frame: &mut Frame, area: Rect, state: &AppState, plot: &Plot<'_>) {
    let title = match plot {
        Plot::Empty(_) => "Pitch".to_string(),
        Plot::Events { rows, .. } => format!("Pitch ({} events)", rows.len()),
        Plot::Sequences { sequences, .. } => format!("Pitch ({} sequences)", sequences.len()),
    };

    let canvas = Canvas::default()
        .block(Block::default().title(title).borders(Borders::ALL))
        .marker(Marker::Braille)
        .x_bounds([0.0, 100.0])
        .y_bounds([0.0, 100.0])
        .paint(|ctx| {
            draw_pitch_lines(ctx);
            ctx.layer();
            match state.screen {
                Screen::Events => {
                    draw_zone(ctx, &state.events_zone, Color::Yellow);
                }
                Screen::Sequences => {
                    draw_zone(ctx, &state.reception_zone, zone_color(state, ZoneFocus::Reception));
                    draw_zone(ctx, &state.next_pass_zone, zone_color(state, ZoneFocus::NextPass));
                }
            }
            ctx.layer();
            match plot {
                Plot::Empty(message) => {
                    ctx.print(30.0, 50.0, *message);
                }
                Plot::Events { rows, .. } => {
                    let coords: Vec<(f64, f64)> = rows.iter().filter_map(|row| row.point()).collect();
                    ctx.draw(&Points {
                        coords: &coords,
                        color: Color::Green,
                    });
                }
                Plot::Sequences { sequences, .. } => {
                    for sequence in sequences {
                        let (x1, y1) = sequence.reception_point();
                        let Some((x2, y2)) = sequence.next_pass.point() else {
                            continue;
                        };
                        ctx.draw(&CanvasLine {
                            x1,
                            y1,
                            x2,
                            y2,
                            color: Color::DarkGray,
                        });
                    }
                    let receptions: Vec<(f64, f64)> =
                        sequences.iter().map(|s| s.reception_point()).collect();
                    let next_passes: Vec<(f64, f64)> =
                        sequences.iter().filter_map(|s| s.next_pass.point()).collect();
                    ctx.draw(&Points {
                        coords: &receptions,
                        color: Color::Cyan,
                    });
                    ctx.draw(&Points {
                        coords: &next_passes,
                        color: Color::Magenta,
                    });
                    if sequences.is_empty() {
                        ctx.print(25.0, 50.0, "No sequences in these zones");
                    }
                }
            }
        });
    frame.render_widget(canvas, area);
}

fn draw_pitch_lines(ctx: &mut Context<'_>) {
    let line = Color::White;
    ctx.draw(&Rectangle {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
        color: line,
    });
    ctx.draw(&CanvasLine {
        x1: 50.0,
        y1: 0.0,
        x2: 50.0,
        y2: 100.0,
        color: line,
    });
    ctx.draw(&Circle {
        x: 50.0,
        y: 50.0,
        radius: 9.0,
        color: line,
    });
    // Penalty areas.
    for x in [0.0, 83.0] {
        ctx.draw(&Rectangle {
            x,
            y: 21.1,
            width: 17.0,
            height: 57.8,
            color: line,
        });
    }
}

fn draw_zone(ctx: &mut Context<'_>, zone: &Zone, color: Color) {
    ctx.draw(&Rectangle {
        x: zone.x_min(),
        y: zone.y_min(),
        width: zone.x_max() - zone.x_min(),
        height: zone.y_max() - zone.y_min(),
        color,
    });
}

fn zone_color(state: &AppState, zone: ZoneFocus) -> Color {
    if state.zone_focus == zone {
        Color::Yellow
    } else {
        Color::Blue
    }
}

fn render_counts(frame: &mut Frame, area: Rect, plot: &Plot<'_>) {
    let (title, counts) = match plot {
        Plot::Empty(_) => ("Counts", &[][..]),
        Plot::Events { counts, .. } => ("Events by player", counts.as_slice()),
        Plot::Sequences { counts, .. } => ("Sequences by receiver", counts.as_slice()),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    if counts.is_empty() {
        let empty = Paragraph::new("No rows for this selection").block(block);
        frame.render_widget(empty, area);
        return;
    }

    let rows = counts.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.player_label().to_string()),
            Cell::from(row.team_label().to_string()),
            Cell::from(format!("{:>5}", row.count)),
        ])
    });
    let header = Row::new(vec!["Player", "Team", "Count"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let start = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Opta Explorer - Help",
        "",
        "Global:",
        "  Tab          Events / Sequences",
        "  m / M        Move match cursor",
        "  Space        Include/exclude match",
        "  a            Include all matches",
        "  r            Reload feed files",
        "  x            Export current view (xlsx)",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Events:",
        "  t / T        Cycle event type",
        "  p / P        Cycle player",
        "  e / E        Cycle team",
        "",
        "Zones:",
        "  z            Switch reception / next-pass zone",
        "  arrows, hjkl Move zone",
        "  < >          Narrow / widen",
        "  - +          Shorten / heighten",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
