//! Shell command lines for the primitives the engine issues.

use std::fmt::Write;

pub const DUMP_HIERARCHY: &str = "uiautomator dump /dev/tty";
pub const SCREEN_SIZE: &str = "wm size";
pub const OS_VERSION: &str = "getprop ro.build.version.release";
pub const SDK_LEVEL: &str = "getprop ro.build.version.sdk";
pub const NAVIGATION_MODE: &str = "settings get secure navigation_mode";

pub const KEYCODE_HOME: u32 = 3;
pub const KEYCODE_BACK: u32 = 4;
pub const KEYCODE_VOLUME_UP: u32 = 24;
pub const KEYCODE_VOLUME_DOWN: u32 = 25;
pub const KEYCODE_POWER: u32 = 26;
pub const KEYCODE_ENTER: u32 = 66;
pub const KEYCODE_MENU: u32 = 82;
pub const KEYCODE_APP_SWITCH: u32 = 187;

pub fn tap(x: i32, y: i32) -> String {
    format!("input tap {} {}", x, y)
}

pub fn swipe(x1: i32, y1: i32, x2: i32, y2: i32, duration_ms: u64) -> String {
    format!("input swipe {} {} {} {} {}", x1, y1, x2, y2, duration_ms)
}

pub fn keyevent(keycode: u32) -> String {
    format!("input keyevent {}", keycode)
}

/// Several swipes started together in one shell so their touch streams overlap.
pub fn concurrent_swipes(swipes: &[(i32, i32, i32, i32, u64)]) -> String {
    let mut line = String::new();
    for (x1, y1, x2, y2, duration_ms) in swipes {
        let _ = write!(line, "{} & ", swipe(*x1, *y1, *x2, *y2, *duration_ms));
    }
    line.push_str("wait");
    line
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAction {
    Down,
    PointerDown,
    Move,
    PointerUp,
    Up,
}

impl MotionAction {
    fn as_str(&self) -> &'static str {
        match self {
            MotionAction::Down => "DOWN",
            MotionAction::PointerDown => "POINTER_DOWN",
            MotionAction::Move => "MOVE",
            MotionAction::PointerUp => "POINTER_UP",
            MotionAction::Up => "UP",
        }
    }
}

fn delayed(event: String, delay_ms: u64) -> String {
    if delay_ms == 0 {
        event
    } else {
        format!("sleep {:.3}; {}", delay_ms as f64 / 1000.0, event)
    }
}

/// A scripted single-pointer path: each step waits `delay_ms` before being injected.
pub fn motion_script(steps: &[(MotionAction, i32, i32, u64)]) -> String {
    steps
        .iter()
        .map(|(action, x, y, delay_ms)| {
            delayed(format!("input motionevent {} {} {}", action.as_str(), x, y), *delay_ms)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Multi-pointer variant of [`motion_script`]: every step names the pointer it moves,
/// so all fingers belong to one touch stream.
pub fn pointer_script(steps: &[(MotionAction, u32, i32, i32, u64)]) -> String {
    steps
        .iter()
        .map(|(action, pointer, x, y, delay_ms)| {
            delayed(
                format!("input motionevent {} {} {} {}", action.as_str(), pointer, x, y),
                *delay_ms,
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// `input text` command line: spaces become `%s`, shell metacharacters are escaped.
///
/// `input` rewrites every `%s` to a space and has no escape for it, so a literal `%`
/// followed by `s` ends one `input text` call and the `s` starts the next.
pub fn input_text(text: &str) -> String {
    let mut segments = Vec::new();
    let mut escaped = String::with_capacity(text.len() + 8);
    let mut previous = None;
    for ch in text.chars() {
        if ch == 's' && previous == Some('%') {
            segments.push(std::mem::take(&mut escaped));
        }
        previous = Some(ch);
        match ch {
            ' ' => escaped.push_str("%s"),
            '\'' | '"' | '\\' | '&' | '|' | ';' | '<' | '>' | '(' | ')' | '$' | '`' | '*'
            | '?' | '~' | '#' | '!' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    segments.push(escaped);
    segments
        .iter()
        .map(|segment| format!("input text {}", segment))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_lines() {
        assert_eq!(tap(300, 250), "input tap 300 250");
        assert_eq!(swipe(540, 2300, 540, 960, 300), "input swipe 540 2300 540 960 300");
        assert_eq!(keyevent(KEYCODE_HOME), "input keyevent 3");
    }

    #[test]
    fn test_concurrent_swipes() {
        let line = concurrent_swipes(&[(10, 20, 10, 5, 400), (10, 30, 10, 45, 400)]);
        assert_eq!(
            line,
            "input swipe 10 20 10 5 400 & input swipe 10 30 10 45 400 & wait"
        );
    }

    #[test]
    fn test_motion_script() {
        let line = motion_script(&[
            (MotionAction::Down, 1, 2, 0),
            (MotionAction::Move, 3, 4, 50),
            (MotionAction::Up, 3, 4, 0),
        ]);
        assert_eq!(
            line,
            "input motionevent DOWN 1 2; sleep 0.050; input motionevent MOVE 3 4; input motionevent UP 3 4"
        );
    }

    #[test]
    fn test_input_text_escaping() {
        assert_eq!(input_text("hello world"), "input text hello%sworld");
        assert_eq!(input_text("a&b"), "input text a\\&b");
        assert_eq!(input_text("it's"), "input text it\\'s");
    }

    #[test]
    fn test_input_text_literal_percent() {
        // A lone `%` is typed as is; `%s` would turn into a space, so it is split.
        assert_eq!(input_text("5% off"), "input text 5%%soff");
        assert_eq!(input_text("100%sure"), "input text 100%; input text sure");
        assert_eq!(input_text("%s"), "input text %; input text s");
    }

    #[test]
    fn test_pointer_script() {
        let line = pointer_script(&[
            (MotionAction::Down, 0, 10, 20, 0),
            (MotionAction::PointerDown, 1, 10, 30, 0),
            (MotionAction::Move, 0, 10, 5, 400),
            (MotionAction::PointerUp, 0, 10, 5, 0),
            (MotionAction::Up, 1, 10, 30, 0),
        ]);
        assert_eq!(
            line,
            "input motionevent DOWN 0 10 20; input motionevent POINTER_DOWN 1 10 30; sleep 0.400; input motionevent MOVE 0 10 5; input motionevent POINTER_UP 0 10 5; input motionevent UP 1 10 30"
        );
    }
}
