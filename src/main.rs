//! Flag Drop entry point
//!
//! Browser builds mount the game on the host page and wire up the frame loop,
//! collision timer and start button. Native builds run a headless autoplay.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Element, Event};

    use flag_drop::GameConfig;
    use flag_drop::platform::DomRenderer;
    use flag_drop::sim::{FrameRequest, GameEvent, Session};
    use flag_drop::ui::START_BUTTON_ID;

    type Game = Rc<RefCell<Session<DomRenderer>>>;

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Flag Drop starting...");

        let config = GameConfig::load();
        let interval_ms = config.collision_interval_ms;
        let session = match DomRenderer::new().and_then(|r| Session::new(config, r)) {
            Ok(session) => session,
            Err(e) => {
                log::error!("Failed to start: {}", e);
                return;
            }
        };
        let game: Game = Rc::new(RefCell::new(session));

        setup_start_button(game.clone());
        setup_collision_timer(game.clone(), interval_ms);
        request_animation_frame(game, FrameRequest::Stop);

        log::info!("Flag Drop running!");
    }

    /// Modal markup is re-rendered on every reset, so listen on the document
    fn setup_start_button(game: Game) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: Event| {
            let clicked = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(&format!("#{}", START_BUTTON_ID)).ok().flatten());
            if clicked.is_none() {
                return;
            }
            if let Err(e) = game.borrow_mut().start() {
                log::error!("Could not start session: {}", e);
            }
        });
        let _ = document.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_collision_timer(game: Game, interval_ms: f64) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut()>::new(move || {
            game.borrow_mut().collision_tick();
        });
        if let Err(e) = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            interval_ms as i32,
        ) {
            log::error!("Failed to start collision timer: {:?}", e);
        }
        closure.forget();
    }

    /// The loop keeps running between cards: input and timers are pumped here too
    fn request_animation_frame(game: Game, last: FrameRequest) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time, last);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Game, time: f64, last: FrameRequest) {
        let request = {
            let mut session = game.borrow_mut();
            let request = session.frame(time);
            if request != last {
                log::debug!("Card animation {:?} at {:.0}ms", request, time);
            }
            for event in session.take_events() {
                match event {
                    GameEvent::ResultsShown { score } => log::info!("Final score: {}", score),
                    other => log::debug!("{:?}", other),
                }
            }
            request
        };

        request_animation_frame(game, request);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flag Drop (native) starting...");
    log::info!("Running a headless autoplay - build for wasm32 to play in the browser");

    let config = match std::env::args().nth(1) {
        Some(path) => match flag_drop::GameConfig::load_file(std::path::Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => flag_drop::GameConfig::load(),
    };

    match autoplay::run(config) {
        Ok(score) => println!("Session finished with score {}", score),
        Err(e) => {
            log::error!("Autoplay failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod autoplay {
    use glam::Vec2;

    use flag_drop::platform::{HeadlessClock, HeadlessRenderer, run_for};
    use flag_drop::sim::{Corner, GameEvent, Session, SessionPhase};
    use flag_drop::{GameConfig, GameError, Result};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const VIEWPORT: Vec2 = Vec2::new(1024.0, 768.0);

    /// Play one session: odd sets are flicked to the right corner, even sets
    /// are left to fall to the floor.
    pub fn run(config: GameConfig) -> Result<i32> {
        let time_limit_ms = config.sets_per_session as f64 * 30_000.0;
        let mut clock = HeadlessClock::new(FRAME_MS, config.collision_interval_ms);
        let mut session = Session::new(config, HeadlessRenderer::new(VIEWPORT.x, VIEWPORT.y))?;
        session.start()?;

        let mut answered_set = 0;
        loop {
            if clock.now() > time_limit_ms {
                return Err(GameError::InvalidConfig(format!(
                    "session did not finish within {}s",
                    time_limit_ms / 1000.0
                )));
            }

            let set = session.sets_played();
            if session.phase() == SessionPhase::InSet && set != answered_set && set % 2 == 1 {
                answered_set = set;
                flick_to_answer(&mut session);
            }

            run_for(&mut session, &mut clock, FRAME_MS);
            for event in session.take_events() {
                log::info!("[{:>8.0}ms] {:?}", clock.now(), event);
                if let GameEvent::ResultsShown { score } = event {
                    return Ok(score);
                }
            }
        }
    }

    fn flick_to_answer(session: &mut Session<HeadlessRenderer>) {
        let Some(card) = session.card() else {
            return;
        };
        let corner = card
            .entity
            .nationality()
            .and_then(|n| session.config().targets.iter().find(|t| t.nationality == n))
            .map_or(Corner::TopLeft, |t| t.corner);
        let handle = card.handle;
        let edges = card.entity.geometry.edges;

        let sign = Vec2::new(
            if corner.is_left() { -1.0 } else { 1.0 },
            if corner.is_top() { -1.0 } else { 1.0 },
        );
        let threshold = session.config().drag_threshold;
        let offset = Vec2::new(10.0, 10.0);
        let step = sign * (threshold / 2.0 + 1.0);
        session.renderer_mut().push_drag(
            handle,
            Vec2::new(edges.left, edges.top) + offset,
            offset,
            &[step, step, step],
            true,
        );
    }
}
