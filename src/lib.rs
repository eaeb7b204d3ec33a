//! Base Runner core crate.
//!
//! A three-lane perspective runner: the player jumps over ground boxes, ducks
//! under lasers and collects coins while the track speeds up. All gameplay
//! lives in `runner::session` and is host independent; `runner` (the module
//! root) mounts it on a canvas and drives it from `requestAnimationFrame`.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod runner;

pub use config::RunnerConfig;
pub use error::{ConfigError, StartError};
pub use runner::input::Intent;
pub use runner::session::{EndCause, GameEvent, GameState, RunnerSession};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    #[cfg(feature = "tracing-wasm")]
    tracing_wasm::set_as_global_default();
}

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

/// Start (or remount) with the classic tuning.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    runner::start_runner(RunnerConfig::classic())?;
    Ok(())
}

/// Start with a JSON config; omitted fields keep their classic values.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_game_with_config(json: &str) -> Result<(), JsValue> {
    let cfg = RunnerConfig::from_json(json)?;
    runner::start_runner(cfg)?;
    Ok(())
}

/// Start a named preset (`classic`, `sprint`).
#[wasm_bindgen]
pub fn start_game_preset(name: &str) -> Result<(), JsValue> {
    let cfg = RunnerConfig::preset(name).ok_or_else(|| StartError::UnknownPreset(name.to_string()))?;
    runner::start_runner(cfg)?;
    Ok(())
}

#[wasm_bindgen]
pub fn stop_game() {
    runner::stop_runner();
}

/// Same as pressing Enter on the game-over screen. No-op while a run is live.
#[wasm_bindgen]
pub fn restart_game() {
    runner::dispatch(Intent::Restart);
}

/// Score of the mounted run, 0 when nothing is mounted.
#[wasm_bindgen]
pub fn current_score() -> u32 {
    runner::current_score().unwrap_or(0)
}
