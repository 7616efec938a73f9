/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing::{info, warn};

use config::GameConfig;
use domain::sky::StarId;
use sim::catalog::load_pool;
use sim::event::GameEvent;
use sim::schedule::{RoundTicket, Scheduler, Ticker};
use sim::session::{GameSession, Phase, SessionError};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::layout::{self, Nav};
use ui::renderer::{Renderer, UiState};
use ui::sound::{sfx_for, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(10);
const ANIM_INTERVAL: Duration = Duration::from_millis(100);
const MESSAGE_TIME: Duration = Duration::from_millis(2500);

fn main() {
    let config = GameConfig::load();

    if logging::init(&config) {
        for w in &config.warnings {
            warn!("{w}");
        }
    }

    let pool = load_pool(&config.catalog_path, config.category, &config.playlist);
    info!(
        source = %pool.source,
        category = config.category.plural(),
        entities = pool.entities.len(),
        "entity pool ready"
    );

    let mut ui = UiState {
        cursor: None,
        message: String::new(),
        catalog_source: pool.source,
        category: config.category,
        pool_size: pool.entities.len(),
        rules: config.rules.clone(),
        anim_tick: 0,
        gamepad: false,
    };
    let mut session = GameSession::seeded(
        config.rules.clone(),
        config.sky.clone(),
        pool.entities,
        config.seed,
    );

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let sound = SoundEngine::new();

    let result = game_loop(&mut session, &mut ui, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Constellation Challenge!");
    println!("Final Score: {}", session.score());
}

/// Loop-owned timers: countdown pulses, deferred round replacement,
/// animation frames and the message bar.
struct Clocks {
    countdown: Ticker,
    replace: Scheduler<RoundTicket>,
    anim: Ticker,
    message_until: Option<Instant>,
}

enum Flow {
    Continue,
    Quit,
}

fn game_loop(
    session: &mut GameSession,
    ui: &mut UiState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let now = Instant::now();
    let mut clocks = Clocks {
        countdown: Ticker::new(Duration::from_millis(config.rules.tick_ms), now),
        replace: Scheduler::new(),
        anim: Ticker::new(ANIM_INTERVAL, now),
        message_until: None,
    };

    loop {
        kb.drain_events();
        gp.update();
        ui.gamepad = gp.connected;
        if kb.resized {
            renderer.invalidate();
        }
        if kb.ctrl_c_pressed() {
            break;
        }

        let now = Instant::now();
        let mut events = Vec::new();

        if let Flow::Quit = handle_input(session, ui, renderer, &kb, &gp, config, &mut clocks, &mut events) {
            break;
        }

        for _ in 0..clocks.countdown.due(now) {
            events.extend(session.tick());
        }
        for ticket in clocks.replace.drain_due(now) {
            events.extend(session.advance_round(ticket));
        }

        process_events(session, ui, sound, config, &mut clocks, &events, now);

        ui.anim_tick += clocks.anim.due(now) as u64;
        if let Some(until) = clocks.message_until {
            if now >= until {
                ui.message.clear();
                clocks.message_until = None;
            }
        }

        renderer.render(&session.view(), ui)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_NAV: &[(KeyCode, Nav)] = &[
    (KeyCode::Up, Nav::Up),
    (KeyCode::Down, Nav::Down),
    (KeyCode::Left, Nav::Left),
    (KeyCode::Right, Nav::Right),
    (KeyCode::Tab, Nav::Next),
    (KeyCode::BackTab, Nav::Prev),
];

#[allow(clippy::too_many_arguments)]
fn handle_input(
    session: &mut GameSession,
    ui: &mut UiState,
    renderer: &Renderer,
    kb: &InputState,
    gp: &GamepadState,
    config: &GameConfig,
    clocks: &mut Clocks,
    events: &mut Vec<GameEvent>,
) -> Flow {
    let now = Instant::now();

    if kb.letter_pressed('q') {
        return Flow::Quit;
    }
    if kb.was_pressed(KeyCode::F(5)) {
        reload_catalog(session, ui, config, clocks, events, now);
        return Flow::Continue;
    }

    let confirm = kb.any_pressed(KEYS_CONFIRM);
    let esc = kb.was_pressed(KeyCode::Esc);

    match session.phase() {
        Phase::Idle => {
            if confirm || gp.start_pressed() || gp.select_pressed() {
                begin(session, ui, clocks, events, now);
            }
        }
        Phase::Complete => {
            if confirm || gp.start_pressed() {
                begin(session, ui, clocks, events, now);
            } else if esc || gp.menu_pressed() || gp.cancel_pressed() {
                back_to_menu(session, ui, clocks);
            }
        }
        Phase::Playing => {
            if gp.menu_pressed() {
                back_to_menu(session, ui, clocks);
                return Flow::Continue;
            }
            if esc || gp.cancel_pressed() {
                match session.selected() {
                    Some(sel) => events.extend(session.star_clicked(sel)),
                    None if esc => back_to_menu(session, ui, clocks),
                    None => {}
                }
                return Flow::Continue;
            }

            let field = renderer.field();
            for click in &kb.clicks {
                let hit = session
                    .round()
                    .and_then(|r| field.hit_test(&r.stars, click.col as usize, click.row as usize, ui.cursor));
                if let Some(id) = hit {
                    ui.cursor = Some(id);
                    events.extend(session.star_clicked(id));
                }
            }

            let steps = KEYS_NAV
                .iter()
                .filter(|(code, _)| kb.was_pressed(*code))
                .map(|&(_, nav)| nav)
                .chain(gp.nav().iter().copied());
            for nav in steps {
                if let Some(round) = session.round() {
                    ui.cursor = layout::step_cursor(&round.stars, ui.cursor, nav);
                }
            }

            if confirm || gp.select_pressed() {
                match cursor_star(session, ui) {
                    Some(id) => events.extend(session.star_clicked(id)),
                    None => {
                        ui.cursor = session.round().and_then(|r| r.stars.first()).map(|s| s.id);
                    }
                }
            }
        }
    }
    Flow::Continue
}

/// Cursor star, if it still belongs to the current round.
fn cursor_star(session: &GameSession, ui: &UiState) -> Option<StarId> {
    let id = ui.cursor?;
    session.round().filter(|r| r.has_star(id)).map(|_| id)
}

fn begin(session: &mut GameSession, ui: &mut UiState, clocks: &mut Clocks, events: &mut Vec<GameEvent>, now: Instant) {
    clocks.replace.cancel_all();
    match session.start() {
        Ok(ev) => {
            clocks.countdown.reset(now);
            ui.cursor = None;
            events.extend(ev);
        }
        Err(SessionError::NoContent) => {
            let text = format!("No {} to play. Press F5 after editing the catalog.", ui.category.plural());
            set_message(ui, clocks, text, now);
        }
    }
}

fn back_to_menu(session: &mut GameSession, ui: &mut UiState, clocks: &mut Clocks) {
    clocks.replace.cancel_all();
    session.reset();
    ui.cursor = None;
    ui.message.clear();
    clocks.message_until = None;
}

fn reload_catalog(
    session: &mut GameSession,
    ui: &mut UiState,
    config: &GameConfig,
    clocks: &mut Clocks,
    events: &mut Vec<GameEvent>,
    now: Instant,
) {
    let pool = load_pool(&config.catalog_path, config.category, &config.playlist);
    info!(source = %pool.source, entities = pool.entities.len(), "catalog reloaded");
    ui.catalog_source = pool.source;
    ui.pool_size = pool.entities.len();
    let text = format!("Catalog reloaded: {} {}", ui.pool_size, config.category.plural());
    events.extend(session.set_pool(pool.entities));
    set_message(ui, clocks, text, now);
}

fn set_message(ui: &mut UiState, clocks: &mut Clocks, text: String, now: Instant) {
    ui.message = text;
    clocks.message_until = Some(now + MESSAGE_TIME);
}

/// Route session events to sound, the replacement scheduler and the
/// message bar.
fn process_events(
    session: &GameSession,
    ui: &mut UiState,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    clocks: &mut Clocks,
    events: &[GameEvent],
    now: Instant,
) {
    for event in events {
        if let (Some(sfx), Some(cue)) = (sound, sfx_for(event)) {
            sfx.play(cue);
        }
        match event {
            GameEvent::RoundCleared { bonus, ticket, .. } => {
                clocks.replace.schedule(now, Duration::from_millis(config.rules.grace_ms), *ticket);
                let name = session.round().map(|r| r.entity.name.clone()).unwrap_or_default();
                set_message(ui, clocks, format!("{name} complete! +{bonus} time bonus"), now);
            }
            GameEvent::RoundStarted { .. } => ui.cursor = None,
            GameEvent::AwaitingContent => {
                set_message(ui, clocks, "Waiting for catalog entries (F5 to reload)".to_string(), now);
            }
            GameEvent::TimeUp { .. } => {
                clocks.replace.cancel_all();
                ui.message.clear();
                clocks.message_until = None;
            }
            _ => {}
        }
    }
}
