//! Browser binding for the lane runner.
//!
//! Owns the canvas, the HUD overlay elements and the single `RunnerSession`
//! for the page. Input listeners only stage intents on the session; the
//! `requestAnimationFrame` callback steps it, redraws, and stops rescheduling
//! itself once the run leaves the playing state. A restart schedules it again.
use std::cell::{Cell, RefCell};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, Window, window};

pub mod collision;
pub mod effects;
pub mod entity;
pub mod input;
pub mod physics;
pub mod projection;
pub mod render;
pub mod session;
pub mod spawner;

use crate::config::RunnerConfig;
use crate::error::StartError;
use input::{Intent, PointerGate};
use projection::Viewport;
use session::{EndCause, GameEvent, GameState, RunnerSession};

pub const CANVAS_ID: &str = "br-canvas";
pub const READY_EVENT: &str = "base-runner:ready";
const SCORE_ID: &str = "br-score";
const GAMEOVER_ID: &str = "br-gameover";
const GAMEOVER_TITLE_ID: &str = "br-gameover-title";
const GAMEOVER_SCORE_ID: &str = "br-gameover-score";
const TIMER_ID: &str = "br-timer";

// --- HUD overlay -------------------------------------------------------------

/// DOM overlay elements plus what they currently show, so the frame loop only
/// touches the DOM when something changed.
struct Hud {
    score: Element,
    overlay: Element,
    title: Element,
    final_score: Element,
    /// Countdown readout, only for timed runs.
    timer: Option<Element>,
    shown_score: Option<u32>,
    shown_state: Option<GameState>,
    shown_time: Option<String>,
}

impl Hud {
    fn mount(doc: &Document, timed: bool) -> Result<Self, StartError> {
        let body = doc.body().ok_or(StartError::NoBody)?;

        let score = ensure_div(doc, &body, SCORE_ID, "position:fixed; top:30px; left:0; width:100%; text-align:center; z-index:10; pointer-events:none; font-family:sans-serif; font-size:3rem; font-weight:900; color:#fff; text-shadow:0 0 10px #00F0FF;")?;

        let overlay = ensure_div(doc, &body, GAMEOVER_ID, "position:fixed; inset:0; display:none; flex-direction:column; align-items:center; justify-content:center; background:rgba(0,0,0,0.9); z-index:20; font-family:sans-serif; cursor:pointer;")?;
        let title = ensure_div(doc, &overlay, GAMEOVER_TITLE_ID, "font-size:3rem; color:#FF0420; margin-bottom:10px;")?;
        let final_score = ensure_div(doc, &overlay, GAMEOVER_SCORE_ID, "font-size:1.5rem; color:#fff; margin-bottom:30px;")?;
        if overlay.child_element_count() < 3 {
            let button = doc.create_element("div")?;
            button.set_text_content(Some("RESTART RUN"));
            button.set_attribute("style", "padding:15px 40px; font-size:1.2rem; font-weight:bold; background:#0052FF; color:#fff; border-radius:50px; box-shadow:0 0 20px rgba(0,82,255,0.5);").ok();
            overlay.append_child(&button)?;
        }

        let timer = if timed {
            Some(ensure_div(doc, &body, TIMER_ID, "position:fixed; top:30px; right:30px; z-index:10; pointer-events:none; font-family:monospace; font-size:1.5rem; font-weight:bold; color:#FFD700;")?)
        } else {
            if let Some(stale) = doc.get_element_by_id(TIMER_ID) {
                stale.remove();
            }
            None
        };

        Ok(Self {
            score,
            overlay,
            title,
            final_score,
            timer,
            shown_score: None,
            shown_state: None,
            shown_time: None,
        })
    }

    fn update(&mut self, session: &RunnerSession) {
        let score = session.score();
        if self.shown_score != Some(score) {
            self.score.set_text_content(Some(&score.to_string()));
            self.shown_score = Some(score);
        }
        if let (Some(el), Some(left)) = (&self.timer, session.time_left_ms()) {
            let text = format_time_left(left);
            if self.shown_time.as_deref() != Some(text.as_str()) {
                el.set_text_content(Some(&text));
                self.shown_time = Some(text);
            }
        }
        let state = session.state();
        if self.shown_state == Some(state) {
            return;
        }
        self.shown_state = Some(state);
        match state {
            GameState::Playing => {
                set_display(&self.overlay, "none");
            }
            GameState::GameOver { cause } => {
                let title = match cause {
                    EndCause::Crashed(_) => "CRASHED!",
                    EndCause::TimeUp => "TIME UP!",
                };
                self.title.set_text_content(Some(title));
                self.final_score.set_text_content(Some(&format!("Score: {score}")));
                set_display(&self.overlay, "flex");
            }
        }
    }

    fn unmount(&self) {
        self.score.remove();
        self.overlay.remove();
        if let Some(el) = &self.timer {
            el.remove();
        }
    }
}

/// `M:SS`, rounded up so the readout hits 0:00 exactly when time runs out.
fn format_time_left(ms: f64) -> String {
    let secs = (ms.max(0.0) / 1000.0).ceil() as u64;
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn ensure_div(doc: &Document, parent: &Element, id: &str, style: &str) -> Result<Element, StartError> {
    if let Some(el) = doc.get_element_by_id(id) {
        return Ok(el);
    }
    let div = doc.create_element("div")?;
    div.set_id(id);
    div.set_attribute("style", style).ok();
    parent.append_child(&div)?;
    Ok(div)
}

fn set_display(el: &Element, display: &str) {
    if let Some(html) = el.dyn_ref::<web_sys::HtmlElement>() {
        html.style().set_property("display", display).ok();
    }
}

// --- Mounted app -------------------------------------------------------------

struct RunnerApp {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    session: RunnerSession,
    hud: Hud,
    last_ts: Option<f64>,
    /// The canvas was created by this binding and goes away on stop.
    owns_canvas: bool,
}

thread_local! {
    static RUNNER_STATE: RefCell<Option<RunnerApp>> = RefCell::new(None);
    static FRAME_CALLBACK: RefCell<Option<Closure<dyn FnMut(f64)>>> = RefCell::new(None);
    static FRAME_PENDING: Cell<bool> = Cell::new(false);
    static LISTENERS_INSTALLED: Cell<bool> = Cell::new(false);
    static READY_SENT: Cell<bool> = Cell::new(false);
    static POINTER_GATE: Cell<PointerGate> = Cell::new(PointerGate::default());
}

/// Mount (or remount) the runner on the page and start the frame loop.
/// Nothing runs unless every browser precondition holds.
pub fn start_runner(cfg: RunnerConfig) -> Result<(), StartError> {
    let win = window().ok_or(StartError::NoWindow)?;
    let doc = win.document().ok_or(StartError::NoDocument)?;

    let (canvas, created) = find_or_create_canvas(&win, &doc)?;
    // a remount finds the canvas an earlier mount created; keep owning it
    let owns_canvas = created
        || RUNNER_STATE.with(|cell| cell.borrow().as_ref().is_some_and(|app| app.owns_canvas));
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or(StartError::NoContext)?
        .dyn_into()
        .map_err(|_| StartError::NoContext)?;

    let mut session = RunnerSession::new(cfg, session_seed())?;
    session.set_viewport(Viewport::new(canvas.width() as f64, canvas.height() as f64));
    let hud = Hud::mount(&doc, session.config().time_limit_ms.is_some())?;

    if !LISTENERS_INSTALLED.with(|flag| flag.replace(true)) {
        install_listeners(&win)?;
    }

    RUNNER_STATE.with(|cell| {
        cell.replace(Some(RunnerApp { canvas, ctx, session, hud, last_ts: None, owns_canvas }))
    });
    tracing::info!("runner mounted");

    signal_ready(&win);
    start_frame_loop();
    Ok(())
}

/// Unmount: the next frame finds no app and the loop ends.
pub fn stop_runner() {
    if let Some(app) = RUNNER_STATE.with(|cell| cell.borrow_mut().take()) {
        app.hud.unmount();
        if app.owns_canvas {
            app.canvas.remove();
        } else {
            let w = app.canvas.width() as f64;
            let h = app.canvas.height() as f64;
            app.ctx.clear_rect(0.0, 0.0, w, h);
        }
        tracing::info!(score = app.session.score(), "runner unmounted");
    }
}

pub fn current_score() -> Option<u32> {
    RUNNER_STATE.with(|cell| cell.borrow().as_ref().map(|app| app.session.score()))
}

/// Stage an intent; a restart while the loop is parked also wakes it up.
pub fn dispatch(intent: Intent) {
    let wake = RUNNER_STATE.with(|cell| {
        let mut slot = cell.borrow_mut();
        let Some(app) = slot.as_mut() else {
            return false;
        };
        app.session.push_intent(intent);
        intent == Intent::Restart && !app.session.is_playing()
    });
    if wake {
        start_frame_loop();
    }
}

/// The page's `#br-canvas`, or a new full-window one. The flag says which.
fn find_or_create_canvas(win: &Window, doc: &Document) -> Result<(HtmlCanvasElement, bool), StartError> {
    if let Some(el) = doc.get_element_by_id(CANVAS_ID) {
        let c: HtmlCanvasElement = el.dyn_into().map_err(|_| StartError::Dom(format!("#{CANVAS_ID} is not a canvas")))?;
        return Ok((c, false));
    }
    let body = doc.body().ok_or(StartError::NoBody)?;
    let c: HtmlCanvasElement = doc
        .create_element("canvas")?
        .dyn_into()
        .map_err(|_| StartError::Dom("created element is not a canvas".into()))?;
    c.set_id(CANVAS_ID);
    c.set_attribute("style", "position:fixed; inset:0; width:100vw; height:100vh; display:block; background:#050510; touch-action:none; z-index:1;").ok();
    fit_canvas(win, &c);
    body.append_child(&c)?;
    Ok((c, true))
}

fn fit_canvas(win: &Window, canvas: &HtmlCanvasElement) {
    let w = win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
    let h = win.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
    canvas.set_width(w.max(1.0) as u32);
    canvas.set_height(h.max(1.0) as u32);
}

fn signal_ready(win: &Window) {
    if READY_SENT.with(|flag| flag.replace(true)) {
        return;
    }
    match web_sys::Event::new(READY_EVENT) {
        Ok(evt) => {
            win.dispatch_event(&evt).ok();
        }
        Err(_) => tracing::warn!("could not create ready event"),
    }
}

fn session_seed() -> u64 {
    #[cfg(feature = "rng")]
    {
        let mut buf = [0u8; 8];
        if getrandom::getrandom(&mut buf).is_ok() {
            return u64::from_le_bytes(buf);
        }
    }
    performance_now().to_bits()
}

fn performance_now() -> f64 {
    window().and_then(|w| w.performance()).map(|p| p.now()).unwrap_or(0.0)
}

// --- Input -------------------------------------------------------------------

fn install_listeners(win: &Window) -> Result<(), StartError> {
    // Keyboard: lane changes, jump, duck (held), restart
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            let key = evt.key();
            if let Some(intent) = Intent::from_key_down(&key) {
                if key == " " || key.starts_with("Arrow") {
                    evt.prevent_default(); // keep the page from scrolling
                }
                dispatch(intent);
            }
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            if let Some(intent) = Intent::from_key_up(&evt.key()) {
                dispatch(intent);
            }
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    // Mouse: screen halves steer; any press restarts after game over
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            if POINTER_GATE.with(|gate| gate.get().accept_mouse(evt.time_stamp())) {
                dispatch_pointer(evt.client_x() as f64);
            }
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::TouchEvent| {
            if let Some(touch) = evt.touches().get(0) {
                evt.prevent_default(); // suppress the emulated mousedown
                let now = evt.time_stamp();
                POINTER_GATE.with(|gate| {
                    let mut g = gate.get();
                    g.touch(now);
                    gate.set(g);
                });
                dispatch_pointer(touch.client_x() as f64);
            }
        }) as Box<dyn FnMut(_)>);
        // window-level touch listeners default to passive, which ignores preventDefault
        let opts = web_sys::AddEventListenerOptions::new();
        opts.set_passive(false);
        win.add_event_listener_with_callback_and_add_event_listener_options(
            "touchstart",
            closure.as_ref().unchecked_ref(),
            &opts,
        )?;
        closure.forget();
    }
    // Keep the canvas matched to the window
    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            RUNNER_STATE.with(|cell| {
                if let (Some(app), Some(w)) = (cell.borrow_mut().as_mut(), window()) {
                    fit_canvas(&w, &app.canvas);
                    // resizing clears the canvas; a parked loop would leave it blank
                    if !FRAME_PENDING.with(Cell::get) {
                        redraw(app, performance_now());
                    }
                }
            });
        }) as Box<dyn FnMut(_)>);
        win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn dispatch_pointer(client_x: f64) {
    let playing = RUNNER_STATE.with(|cell| cell.borrow().as_ref().map(|app| app.session.is_playing()));
    let intent = match playing {
        None => return,
        Some(false) => Intent::Restart,
        Some(true) => {
            let width = window()
                .and_then(|w| w.inner_width().ok())
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            Intent::from_pointer(client_x, width)
        }
    };
    dispatch(intent);
}

// --- Frame loop --------------------------------------------------------------

/// Schedule a frame unless one is already pending (a remount reuses it).
fn start_frame_loop() {
    if FRAME_PENDING.with(Cell::get) {
        return;
    }
    let mounted = RUNNER_STATE.with(|cell| match cell.borrow_mut().as_mut() {
        Some(app) => {
            app.last_ts = None; // first frame after a pause steps by zero
            true
        }
        None => false,
    });
    if mounted {
        request_frame();
    }
}

fn request_frame() {
    FRAME_CALLBACK.with(|cell| {
        let mut slot = cell.borrow_mut();
        let closure = slot.get_or_insert_with(|| Closure::wrap(Box::new(on_frame) as Box<dyn FnMut(f64)>));
        if let Some(w) = window() {
            match w.request_animation_frame(closure.as_ref().unchecked_ref()) {
                Ok(_) => FRAME_PENDING.with(|flag| flag.set(true)),
                Err(err) => tracing::error!(?err, "requestAnimationFrame failed"),
            }
        }
    });
}

fn on_frame(ts: f64) {
    FRAME_PENDING.with(|flag| flag.set(false));
    let keep_going = RUNNER_STATE.with(|cell| match cell.borrow_mut().as_mut() {
        Some(app) => runner_tick(app, ts),
        None => false,
    });
    if keep_going {
        request_frame();
    }
}

/// One frame. Returns whether the loop should continue.
fn runner_tick(app: &mut RunnerApp, ts: f64) -> bool {
    let vp = Viewport::new(app.canvas.width() as f64, app.canvas.height() as f64);
    app.session.set_viewport(vp);

    let dt = app.last_ts.map_or(0.0, |last| ts - last);
    app.last_ts = Some(ts);
    for ev in app.session.step(dt) {
        log_event(&ev);
    }

    redraw(app, ts);
    app.session.is_playing()
}

/// Draw the current state without stepping it.
fn redraw(app: &mut RunnerApp, now_ms: f64) {
    let vp = Viewport::new(app.canvas.width() as f64, app.canvas.height() as f64);
    app.session.set_viewport(vp);
    render::draw_scene(&mut app.ctx, &app.session, now_ms);
    app.hud.update(&app.session);
}

fn log_event(ev: &GameEvent) {
    match ev {
        GameEvent::Spawned { id, lane, kind } => tracing::trace!(id, lane, ?kind, "spawned"),
        GameEvent::Collected { value, score, .. } => tracing::debug!(value, score, "coin collected"),
        GameEvent::Crashed { placement, .. } => tracing::debug!(?placement, "loop parked after crash"),
        GameEvent::TimeUp => tracing::debug!("loop parked after time up"),
        GameEvent::Restarted => tracing::info!("run restarted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_rounds_up_to_whole_seconds() {
        assert_eq!(format_time_left(60_000.0), "1:00");
        assert_eq!(format_time_left(59_001.0), "1:00");
        assert_eq!(format_time_left(59_000.0), "0:59");
        assert_eq!(format_time_left(1.0), "0:01");
        assert_eq!(format_time_left(0.0), "0:00");
        assert_eq!(format_time_left(-5.0), "0:00");
    }
}
