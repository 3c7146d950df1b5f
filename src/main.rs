//! Stack Hack entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlElement, KeyboardEvent, MouseEvent};

    use stack_hack::level::{Level, campaign};
    use stack_hack::physics::RapierWorld;
    use stack_hack::platform::KeyState;
    use stack_hack::sim::{FrameReport, GamePhase, GameSession, Region, TutorialEvent};
    use stack_hack::tuning::Tuning;

    /// Game instance holding all state
    struct Game {
        levels: Vec<Level>,
        tuning: Tuning,
        current: usize,
        session: Option<GameSession<RapierWorld>>,
        keys: KeyState,
        /// An animation frame is scheduled
        looping: bool,
    }

    impl Game {
        fn new(levels: Vec<Level>) -> Self {
            Self {
                levels,
                tuning: Tuning::default(),
                current: 0,
                session: None,
                keys: KeyState::default(),
                looping: false,
            }
        }

        /// Build a fresh session for level `index`
        fn start_level(&mut self, index: usize) {
            let Some(level) = self.levels.get(index).cloned() else {
                log::warn!("No level {}", index);
                return;
            };
            let seed = js_sys::Date::now() as u64;
            let world = RapierWorld::new(&self.tuning);
            match GameSession::new(world, level, self.tuning.clone(), seed, now_seconds()) {
                Ok(session) => {
                    log::info!("Starting level {} ({})", index + 1, session.level().name);
                    self.current = index;
                    self.session = Some(session);
                    self.keys.clear();
                    set_hidden("messagescreen", true);
                    set_hidden("tutorial", true);
                    set_text("time", "");
                }
                Err(e) => log::error!("Level {} failed to load: {}", index + 1, e),
            }
        }

        /// Level to start from the end screen: next on a win, same on a loss
        fn next_index(&self) -> usize {
            match self.session.as_ref().map(|s| s.phase()) {
                Some(GamePhase::Won) => (self.current + 1).min(self.levels.len().saturating_sub(1)),
                _ => self.current,
            }
        }

        fn is_over(&self) -> bool {
            self.session.as_ref().is_none_or(|s| s.phase().is_over())
        }

        /// Mirror a frame's outcome into the DOM
        fn update_hud(&self, report: &FrameReport, now: f64) {
            let Some(session) = &self.session else {
                return;
            };
            if let Some(clock) = session.clock_text(now) {
                set_text("time", &clock);
            }
            match report.tutorial {
                Some(TutorialEvent::Show(index)) => {
                    if let Some(step) = session.tutorial().step(index) {
                        show_tutorial(&step.region, &step.text);
                    }
                }
                Some(TutorialEvent::Hide) => set_hidden("tutorial", true),
                None => {}
            }
            if let Some(message) = report.phase.message() {
                set_hidden("tutorial", true);
                set_text("message", message);
                set_hidden("messagescreen", false);
            }
        }
    }

    fn now_seconds() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now() / 1000.0)
            .unwrap_or(0.0)
    }

    fn element(id: &str) -> Option<HtmlElement> {
        web_sys::window()?
            .document()?
            .get_element_by_id(id)?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = element(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = element(id) {
            let classes = el.class_list();
            let _ = if hidden {
                classes.add_1("hidden")
            } else {
                classes.remove_1("hidden")
            };
        }
    }

    fn show_tutorial(region: &Region, text: &str) {
        let Some(panel) = element("tutorial") else {
            return;
        };
        let style = panel.style();
        let _ = style.set_property("left", &format!("{}px", region.x));
        let _ = style.set_property("top", &format!("{}px", region.y));
        let _ = style.set_property("width", &format!("{}px", region.width));
        let _ = style.set_property("height", &format!("{}px", region.height));
        panel.set_inner_html(text);
        set_hidden("tutorial", false);
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Stack Hack starting...");

        let levels = match campaign() {
            Ok(levels) => levels,
            Err(e) => {
                log::error!("Campaign failed to load: {}", e);
                return;
            }
        };
        let game = Rc::new(RefCell::new(Game::new(levels)));
        start(&game, 0);
        setup_input_handlers(game);
    }

    /// Start a level and make sure the frame loop is running
    fn start(game: &Rc<RefCell<Game>>, index: usize) {
        let schedule = {
            let mut g = game.borrow_mut();
            g.start_level(index);
            let schedule = !g.looping && g.session.is_some();
            if schedule {
                g.looping = true;
            }
            schedule
        };
        if schedule {
            request_animation_frame(game.clone());
        }
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Key down: movement keys, Enter on the end screen, 1-9 to pick a level
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                if game.borrow_mut().keys.key_changed(&key, true) {
                    event.prevent_default();
                    return;
                }
                let (over, next, count) = {
                    let g = game.borrow();
                    (g.is_over(), g.next_index(), g.levels.len())
                };
                match key.as_str() {
                    "Enter" if over => start(&game, next),
                    digit => {
                        if let Ok(n) = digit.parse::<usize>()
                            && (1..=count).contains(&n)
                        {
                            start(&game, n - 1);
                        }
                    }
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if game.borrow_mut().keys.key_changed(&event.key(), false) {
                    event.prevent_default();
                }
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Return button on the end screen
        if let Some(button) = document.get_element_by_id("return") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let next = game.borrow().next_index();
                start(&game, next);
            });
            let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur: keyup events are lost, so drop every held key
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().keys.clear();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let keep_going = {
            let mut guard = game.borrow_mut();
            let g = &mut *guard;
            let now = time / 1000.0;
            let input = g.keys.snapshot();
            let report = match g.session.as_mut() {
                Some(session) => session.frame(&input, now),
                None => {
                    g.looping = false;
                    return;
                }
            };
            g.update_hud(&report, now);
            let keep_going = !report.phase.is_over();
            g.looping = keep_going;
            keep_going
        };

        if keep_going {
            request_animation_frame(game);
        }
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
    log::info!("Stack Hack (native) starting...");
    log::info!("Native mode runs a headless demo - use the web build to play");

    let mut args = std::env::args().skip(1);
    let index = args
        .next()
        .and_then(|a| a.parse::<usize>().ok())
        .map(|n| n.saturating_sub(1))
        .unwrap_or(0);
    let tuning = match args.next() {
        Some(path) => load_tuning(&path),
        None => stack_hack::Tuning::default(),
    };

    if let Err(e) = run_demo(index, tuning) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: &str) -> stack_hack::Tuning {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| stack_hack::Tuning::from_json(&json).map_err(|e| e.to_string()));
    match parsed {
        Ok(tuning) => {
            log::info!("Loaded tuning from {}", path);
            tuning
        }
        Err(e) => {
            log::warn!("Ignoring tuning file {}: {}", path, e);
            stack_hack::Tuning::default()
        }
    }
}

/// Play a level headlessly for a minute with a scripted player
#[cfg(not(target_arch = "wasm32"))]
fn run_demo(index: usize, tuning: stack_hack::Tuning) -> Result<(), stack_hack::LevelError> {
    use stack_hack::level::campaign_level;
    use stack_hack::physics::RapierWorld;
    use stack_hack::sim::{FrameInput, GameSession};

    const FRAME: f64 = 1.0 / 60.0;
    const DURATION: f64 = 60.0;

    let level = campaign_level(index)?;
    let world = RapierWorld::new(&tuning);
    let mut session = GameSession::new(world, level, tuning, 7, 0.0)?;

    let mut now = 0.0;
    let mut filled = 0;
    let mut fired = 0;
    while now < DURATION {
        // Pace back and forth, hop every two seconds, toggle the grab key
        let second = now as u64;
        let input = FrameInput {
            right: (second / 3) % 2 == 0,
            left: (second / 3) % 2 == 1,
            up: second % 2 == 0 && now.fract() < FRAME,
            manipulate: (now * 2.0) as u64 % 3 == 0,
        };
        let report = session.frame(&input, now);
        if let Some(m) = report.manipulation {
            log::info!("{:6.2}s {:?}", now, m);
        }
        if let Some(uid) = report.fired {
            log::info!("{:6.2}s cannon fired {:?}", now, uid);
            fired += 1;
        }
        filled += report.filled;
        if report.phase.is_over() {
            break;
        }
        now += FRAME;
    }

    println!(
        "{}: {:?} after {:.1}s, {} guides filled, {} left, {} shots, {} bodies",
        session.level().name,
        session.phase(),
        now,
        filled,
        session.play().remaining_guides,
        fired,
        session.world().body_count(),
    );
    Ok(())
}
