use brainboost::{
    app::{App, AppState},
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    games::{self, GameKind},
    history::{ScoreHistory, SessionRecord},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    session::SessionSummary,
};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::Duration,
};
use tracing::{info, warn};

const TICK_RATE_MS: u64 = 100;

/// brain-training minigames in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Nine short timed brain-training games sharing one session engine: adaptive difficulty, per-round deadlines, scoring and a local score history."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// play one session of a game
    Play(PlayArgs),
    /// list the available games
    List,
    /// show recently finished sessions
    History {
        /// only show sessions of this game
        #[clap(value_enum)]
        game: Option<GameKind>,

        /// number of sessions to show
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
struct PlayArgs {
    /// game to play, defaults to the configured one
    #[clap(value_enum)]
    game: Option<GameKind>,

    /// session length in seconds
    #[clap(short = 's', long)]
    seconds: Option<u64>,

    /// pause after each answer in milliseconds
    #[clap(long)]
    feedback_ms: Option<u64>,

    /// do not record this session in the score history
    #[clap(long)]
    no_history: bool,

    /// print the final summary as JSON on exit
    #[clap(long)]
    json: bool,
}

impl PlayArgs {
    /// Command line flags take precedence over the config file
    fn merge(&self, mut config: Config) -> Config {
        if let Some(game) = self.game {
            config.default_game = game;
        }
        if let Some(secs) = self.seconds {
            config.session_secs = secs;
        }
        if self.feedback_ms.is_some() {
            config.feedback_ms = self.feedback_ms;
        }
        if self.no_history {
            config.record_history = false;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let log_path = logging::init();

    match cli.command.clone().unwrap_or(Command::Play(PlayArgs::default())) {
        Command::List => {
            for kind in GameKind::ALL {
                println!("{:<18} {}", kind.to_string(), kind.blurb());
            }
            Ok(())
        }
        Command::History { game, limit } => print_history(game, limit),
        Command::Play(args) => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }
            if let Some(path) = log_path {
                info!(path = %path.display(), "logging initialised");
            }
            play(&args)
        }
    }
}

fn print_history(game: Option<GameKind>, limit: usize) -> Result<(), Box<dyn Error>> {
    let history = ScoreHistory::new()?;
    let records = history.recent(game, limit)?;
    if records.is_empty() {
        println!("no sessions recorded yet");
        return Ok(());
    }
    for r in records {
        println!(
            "{}  {:<18} {:>6} pts  level {:<3} {:>3}% acc ({}/{})",
            r.finished_at.format("%Y-%m-%d %H:%M"),
            r.game,
            r.score,
            r.level,
            r.accuracy,
            r.correct_count,
            r.total_count
        );
    }
    Ok(())
}

fn play(args: &PlayArgs) -> Result<(), Box<dyn Error>> {
    let config = args.merge(FileConfigStore::new().load());
    let kind = config.default_game;

    let history = if config.record_history {
        match ScoreHistory::new() {
            Ok(history) => Some(history),
            Err(err) => {
                warn!(%err, "score history unavailable, not recording");
                None
            }
        }
    } else {
        None
    };
    let best = history
        .as_ref()
        .and_then(|h| h.best_score(kind).ok().flatten());

    let game = games::build(kind, config.overrides(), SystemClock)?;
    let mut app = App::new(game, best);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, history.as_ref(), config.session_secs);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    let last = result?;
    if args.json {
        if let Some(summary) = last {
            println!("{}", serde_json::to_string(&summary)?);
        }
    }

    Ok(())
}

fn record(history: Option<&ScoreHistory>, kind: GameKind, summary: &SessionSummary, secs: u64) {
    if let Some(history) = history {
        if let Err(err) = history.record(&SessionRecord::new(kind, summary, secs)) {
            warn!(%err, "failed to record session");
        }
    }
}

/// Ends a running session on interrupt, recording it like any other finish
fn interrupt(app: &mut App, history: Option<&ScoreHistory>, session_secs: u64) -> Option<SessionSummary> {
    if app.state != AppState::Playing {
        return None;
    }
    let summary = app.quit_session()?;
    record(history, app.kind(), &summary, session_secs);
    Some(summary)
}

/// Runs the event loop; returns the summary of the last finished session
fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    history: Option<&ScoreHistory>,
    session_secs: u64,
) -> Result<Option<SessionSummary>, Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let clock = SystemClock;
    let mut last = None;

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let ended = match runner.step_until(clock.now(), app.game().next_wakeup()) {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Resize => None,
            GameEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    last = interrupt(app, history, session_secs).or(last);
                    break;
                }

                match (app.state, key.code) {
                    (AppState::Playing, KeyCode::Esc) => app.quit_session(),
                    (AppState::Playing, KeyCode::Enter) => app.on_enter(),
                    (AppState::Playing, KeyCode::Backspace) => {
                        app.on_backspace();
                        None
                    }
                    (AppState::Playing, KeyCode::Char(c)) => {
                        app.on_char(c);
                        None
                    }
                    (AppState::Ready, KeyCode::Enter)
                    | (AppState::Results, KeyCode::Char('r')) => {
                        app.start();
                        None
                    }
                    (AppState::Ready | AppState::Results, KeyCode::Esc)
                    | (AppState::Ready | AppState::Results, KeyCode::Char('q')) => break,
                    _ => None,
                }
            }
        };

        if let Some(summary) = ended {
            record(history, app.kind(), &summary, session_secs);
            last = Some(summary);
        }
    }

    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainboost::clock::ManualClock;
    use brainboost::games::SessionOverrides;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn chalkboard_app() -> App {
        let overrides = SessionOverrides {
            duration: Some(Duration::from_secs(30)),
            feedback_delay: None,
        };
        let game = games::build_with_rng(
            GameKind::Chalkboard,
            overrides,
            ManualClock::new(),
            StdRng::seed_from_u64(3),
        )
        .unwrap();
        App::new(game, None)
    }

    #[test]
    fn test_interrupt_records_running_session() {
        let history = ScoreHistory::in_memory().unwrap();
        let mut app = chalkboard_app();
        app.start();

        let summary = interrupt(&mut app, Some(&history), 30).expect("session ended");
        assert_eq!(app.state, AppState::Results);
        let recorded = history.recent(Some(GameKind::Chalkboard), 10).unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].score, summary.score);
    }

    #[test]
    fn test_interrupt_outside_a_session_records_nothing() {
        let history = ScoreHistory::in_memory().unwrap();
        let mut app = chalkboard_app();

        assert!(interrupt(&mut app, Some(&history), 30).is_none());
        assert!(history.recent(None, 10).unwrap().is_empty());
    }

    #[test]
    fn test_cli_defaults_to_play() {
        let cli = Cli::parse_from(["brainboost"]);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_cli_play_with_flags() {
        let cli = Cli::parse_from([
            "brainboost",
            "play",
            "color-match",
            "-s",
            "30",
            "--feedback-ms",
            "200",
            "--no-history",
            "--json",
        ]);
        assert_eq!(
            cli.command,
            Some(Command::Play(PlayArgs {
                game: Some(GameKind::ColorMatch),
                seconds: Some(30),
                feedback_ms: Some(200),
                no_history: true,
                json: true,
            }))
        );
    }

    #[test]
    fn test_cli_history_limit() {
        let cli = Cli::parse_from(["brainboost", "history", "chalkboard", "--limit", "3"]);
        assert_eq!(
            cli.command,
            Some(Command::History {
                game: Some(GameKind::Chalkboard),
                limit: 3
            })
        );

        let cli = Cli::parse_from(["brainboost", "history"]);
        assert_eq!(
            cli.command,
            Some(Command::History {
                game: None,
                limit: 10
            })
        );
    }

    #[test]
    fn test_cli_rejects_unknown_game() {
        assert!(Cli::try_parse_from(["brainboost", "play", "tetris"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = PlayArgs {
            game: Some(GameKind::BrainShift),
            seconds: Some(45),
            feedback_ms: None,
            no_history: true,
            json: false,
        };
        let config = Config {
            feedback_ms: Some(300),
            ..Config::default()
        };
        let merged = args.merge(config);
        assert_eq!(merged.default_game, GameKind::BrainShift);
        assert_eq!(merged.session_secs, 45);
        assert_eq!(merged.feedback_ms, Some(300));
        assert!(!merged.record_history);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }
}
