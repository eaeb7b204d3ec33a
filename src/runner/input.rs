//! Input intents and the key / pointer mappings that produce them.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    Jump,
    DuckStart,
    DuckEnd,
    Restart,
}

impl Intent {
    /// Map a `KeyboardEvent.key` value from `keydown`.
    pub fn from_key_down(key: &str) -> Option<Intent> {
        match key.to_ascii_lowercase().as_str() {
            "arrowleft" | "a" => Some(Intent::MoveLeft),
            "arrowright" | "d" => Some(Intent::MoveRight),
            "arrowup" | "w" | " " => Some(Intent::Jump),
            "arrowdown" | "s" => Some(Intent::DuckStart),
            "enter" | "r" => Some(Intent::Restart),
            _ => None,
        }
    }

    /// Map a `KeyboardEvent.key` value from `keyup`. Only ducking is held.
    pub fn from_key_up(key: &str) -> Option<Intent> {
        match key.to_ascii_lowercase().as_str() {
            "arrowdown" | "s" => Some(Intent::DuckEnd),
            _ => None,
        }
    }

    /// Tap / click: left half steers left, right half steers right.
    pub fn from_pointer(x: f64, screen_width: f64) -> Intent {
        if x < screen_width / 2.0 { Intent::MoveLeft } else { Intent::MoveRight }
    }
}

/// Mouse presses this soon after a touch are the browser's emulated events.
pub const EMULATED_MOUSE_WINDOW_MS: f64 = 800.0;

/// Drops the compatibility `mousedown` a browser fires after a tap, so one tap
/// steers one lane even when `preventDefault` on the touch was not honored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerGate {
    last_touch_ms: Option<f64>,
}

impl PointerGate {
    pub fn touch(&mut self, now_ms: f64) {
        self.last_touch_ms = Some(now_ms);
    }

    pub fn accept_mouse(&self, now_ms: f64) -> bool {
        match self.last_touch_ms {
            Some(t) => now_ms < t || now_ms - t > EMULATED_MOUSE_WINDOW_MS,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mapping() {
        assert_eq!(Intent::from_key_down("ArrowLeft"), Some(Intent::MoveLeft));
        assert_eq!(Intent::from_key_down("D"), Some(Intent::MoveRight));
        assert_eq!(Intent::from_key_down(" "), Some(Intent::Jump));
        assert_eq!(Intent::from_key_down("s"), Some(Intent::DuckStart));
        assert_eq!(Intent::from_key_down("Enter"), Some(Intent::Restart));
        assert_eq!(Intent::from_key_down("q"), None);
        assert_eq!(Intent::from_key_up("ArrowDown"), Some(Intent::DuckEnd));
        assert_eq!(Intent::from_key_up("ArrowLeft"), None);
    }

    #[test]
    fn pointer_halves() {
        assert_eq!(Intent::from_pointer(10.0, 400.0), Intent::MoveLeft);
        assert_eq!(Intent::from_pointer(200.0, 400.0), Intent::MoveRight);
        assert_eq!(Intent::from_pointer(399.0, 400.0), Intent::MoveRight);
    }

    #[test]
    fn tap_then_emulated_mouse_steers_once() {
        let mut gate = PointerGate::default();
        assert!(gate.accept_mouse(0.0), "plain mouse input");
        gate.touch(1000.0);
        assert!(!gate.accept_mouse(1000.0));
        assert!(!gate.accept_mouse(1300.0));
        assert!(gate.accept_mouse(1000.0 + EMULATED_MOUSE_WINDOW_MS + 1.0));
    }
}
