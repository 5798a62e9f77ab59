/// Entry point and game loop.
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use adventure_sim::config::EngineConfig;
use adventure_sim::domain::route::Point;
use adventure_sim::error::Result;
use adventure_sim::sim::data::GameData;
use adventure_sim::sim::navigation::{self, WalkTarget};
use adventure_sim::sim::save;
use adventure_sim::sim::services::{Audio, Services};
use adventure_sim::sim::step;
use adventure_sim::sim::world::WorldState;
use adventure_sim::ui::input::{Command, InputState};
use adventure_sim::ui::renderer::{cell_to_pixel, TerminalRenderer};
use adventure_sim::ui::sound::{Silent, SoundEngine};
use adventure_sim::ui::text::{parse_command, TerminalText};

/// Ticks a message stays on the message line.
const MESSAGE_TICKS: u32 = 27;

fn main() -> ExitCode {
    let config = EngineConfig::load();
    init_logging(&config.save_file);

    let data = match GameData::load(&config.game_file) {
        Ok(d) => d,
        Err(e) => {
            error!(error = %e, "cannot load game data");
            eprintln!("Cannot load {}: {e}", config.game_file.display());
            return ExitCode::FAILURE;
        }
    };
    let mut world = WorldState::new(data, config);

    let mut renderer = TerminalRenderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return ExitCode::FAILURE;
    }

    let mut sound = SoundEngine::new();
    let mut silent = Silent;
    let audio: &mut dyn Audio = match sound.as_mut() {
        Some(s) => s as &mut dyn Audio,
        None => {
            warn!("no audio device; running silent");
            &mut silent
        }
    };
    let mut text = TerminalText::new();

    let result = game_loop(&mut world, &mut renderer, audio, &mut text);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    println!();
    println!("{}", world.data.title);
    println!("Final Score: {}", world.score);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "engine stopped");
            eprintln!("Game error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to a file next to the save file; the terminal belongs to the game.
fn init_logging(save_file: &Path) {
    let path = save_file.with_extension("log");
    let Ok(file) = File::create(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut TerminalRenderer,
    audio: &mut dyn Audio,
    text: &mut TerminalText,
) -> Result<()> {
    let mut kb = InputState::new();
    let tick_rate = Duration::from_millis(world.config.tick_interval_ms());
    let frame_sleep = Duration::from_millis(world.config.timing.frame_sleep_ms);
    let mut last_tick = Instant::now();
    let mut message_timer = 0u32;

    text.set_row(renderer.prompt_row());
    world.start(&mut Services { renderer: &mut *renderer, audio: &mut *audio, text: &mut *text })?;

    loop {
        let commands = kb.drain_events().to_vec();
        for cmd in commands {
            let typed = (cmd == Command::Type && !world.flags.game_over).then(|| text.read_command());
            let mut services =
                Services { renderer: &mut *renderer, audio: &mut *audio, text: &mut *text };
            if handle_command(world, &mut services, cmd, typed)? {
                return Ok(());
            }
        }
        if world.flags.quit {
            info!("quit requested by game");
            return Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            text.set_row(renderer.prompt_row());

            if !world.flags.game_over {
                let mut services =
                    Services { renderer: &mut *renderer, audio: &mut *audio, text: &mut *text };
                step::step(world, &mut services)?;
            }

            if let Some(msg) = text.take_message() {
                renderer.set_message(msg);
                message_timer = MESSAGE_TICKS;
            } else if message_timer > 0 {
                message_timer -= 1;
                if message_timer == 0 {
                    renderer.set_message(String::new());
                }
            }
            if world.flags.game_over {
                renderer.set_message("Game over. Press any key.".into());
            }
            if text.take_dirty() {
                renderer.invalidate();
            }
            renderer.set_status(format!("Score {}", world.score));
        }

        std::thread::sleep(frame_sleep);
    }
}

/// Apply one player command. Returns true when the game should end.
fn handle_command(
    world: &mut WorldState,
    services: &mut Services,
    cmd: Command,
    typed: Option<String>,
) -> Result<bool> {
    if world.flags.game_over {
        return Ok(matches!(cmd, Command::AnyKey | Command::Quit | Command::Type));
    }
    match cmd {
        Command::Quit => return Ok(true),
        Command::Walk(dir) => {
            navigation::set_walk(world, dir);
        }
        Command::Click(col, row) => {
            let (w, h) = (world.boundary.width(), world.boundary.height());
            if let Some((x, y)) = cell_to_pixel(col, row, w, h) {
                if !navigation::walk_to(world, services, WalkTarget::Point(Point::new(x, y)))? {
                    services.text.notify("You can't get there from here.");
                }
            }
        }
        Command::Type => {
            let line = typed.unwrap_or_default();
            match parse_command(&line, world) {
                Some(target) => {
                    navigation::walk_to(world, services, target)?;
                }
                None if !line.trim().is_empty() => services.text.notify("Nothing happens."),
                None => {}
            }
        }
        Command::Save => {
            let path = world.config.save_file.clone();
            match save::save_to_file(world, &path) {
                Ok(()) => services.text.notify("Game saved."),
                Err(e) => {
                    warn!(error = %e, "save failed");
                    services.text.notify("Save failed.");
                }
            }
        }
        Command::Load => {
            let path = world.config.save_file.clone();
            if save::try_load(world, services, &path)? {
                services.text.notify("Game restored.");
            } else {
                services.text.notify("No saved game.");
            }
        }
        Command::AnyKey => {}
    }
    Ok(false)
}
