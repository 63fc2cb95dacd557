//! Terminal runner (default binary).
//!
//! Polls crossterm input until the next frame is due, feeds it to the
//! session, runs exactly one simulated frame and draws it. The simulation is
//! frame based; wall-clock time only paces the loop at `FPS`.

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shiro_tgm::core::{Game, SessionSnapshot};
use shiro_tgm::input::{should_quit, InputEvents, InputHandler, KeyBindings};
use shiro_tgm::term::{FrameBuffer, GameView, TerminalRenderer, Viewport};
use shiro_tgm::types::FPS;
use shiro_tgm::Settings;

/// Frames the loop may fall behind before it stops trying to catch up.
const MAX_FRAME_LAG: u32 = 5;

fn main() -> Result<()> {
    init_logging()?;

    let settings = Settings::load()?;
    let mode = settings.mode_config()?;
    let bindings = settings.key_bindings()?;
    let seed = settings.seed.unwrap_or_else(clock_seed);

    info!(
        player = %settings.player_name,
        mode = %mode.name,
        players = mode.num_players,
        seed,
        "starting session"
    );
    let game = Game::new(mode, seed)?;

    let mut term = TerminalRenderer::new();
    term.enter()?;
    info!(key_releases = term.reports_key_releases(), "terminal ready");

    let result = run(&mut term, game, &bindings, &settings);

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

/// Log to `TGM_LOG_PATH` when set. The terminal is in raw mode on the
/// alternate screen, so there is no console logging.
fn init_logging() -> Result<()> {
    let Some(path) = std::env::var("TGM_LOG_PATH")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return Ok(());
    };

    let file = File::create(&path).with_context(|| format!("failed to create log file {path}"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn clock_seed() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
        .unwrap_or(0)
}

fn run(term: &mut TerminalRenderer, mut game: Game, bindings: &KeyBindings, settings: &Settings) -> Result<()> {
    let view = GameView::default();
    let mut input_handler = InputHandler::new().with_key_release_timeout_ms(settings.key_release_timeout_ms);
    let mut events = InputEvents::new();
    let mut snapshot = SessionSnapshot::default();
    let mut fb = FrameBuffer::new(0, 0);

    let frame_duration = Duration::from_nanos(1_000_000_000 / FPS as u64);
    let mut next_frame = Instant::now();

    loop {
        // Input with timeout until the next frame.
        let timeout = next_frame.saturating_duration_since(Instant::now());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press && should_quit(key) {
                        info!(frame = game.frame_count(), "quit");
                        return Ok(());
                    }
                    input_handler.handle_key_event(bindings, key, &mut events);
                }
                Event::Resize(..) => term.invalidate(),
                Event::FocusLost => input_handler.reset(&mut events),
                _ => {}
            }
        }

        let now = Instant::now();
        if now < next_frame {
            continue;
        }
        next_frame += frame_duration;
        if now > next_frame + frame_duration * MAX_FRAME_LAG {
            next_frame = now + frame_duration;
        }

        // One simulated frame.
        input_handler.update(&mut events);
        game.input(&events);
        events.clear();
        game.frame();

        // Draw.
        game.snapshot_into(&mut snapshot);
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        view.render_into(&snapshot, Viewport::new(w, h), &mut fb);
        term.draw_swap(&mut fb)?;
    }
}
