//! Keystrokes as the literal byte sequences a terminal would send.

/// Line submit for programs that read in cooked mode.
pub const ENTER: &[u8] = b"\n";
/// Carriage return, the submit key for programs in raw mode.
pub const CARRIAGE_RETURN: &[u8] = b"\r";
pub const UP: &[u8] = b"\x1b[A";
pub const DOWN: &[u8] = b"\x1b[B";
pub const RIGHT: &[u8] = b"\x1b[C";
pub const LEFT: &[u8] = b"\x1b[D";
pub const CTRL_C: &[u8] = b"\x03";
/// End of input.
pub const CTRL_D: &[u8] = b"\x04";
/// Toggles the highlighted entry of a multi-select list.
pub const SPACE: &[u8] = b" ";
pub const BACKSPACE: &[u8] = b"\x7f";

/// Device Status Report query a program sends to learn the cursor position.
pub const CURSOR_POSITION_QUERY: &[u8] = b"\x1b[6n";
/// Reply to [`CURSOR_POSITION_QUERY`]: cursor at row 1, column 1.
pub const CURSOR_POSITION_REPORT: &[u8] = b"\x1b[1;1R";

/// Look up a keystroke by its name, ignoring case, `-` and `_`.
///
/// Accepts the constant names (`down`, `ctrl_c`, `ctrl-d`, ...) plus
/// `return`/`cr` for the carriage return.
pub fn by_name(name: &str) -> Option<&'static [u8]> {
    let normalized: String = name
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let key = match normalized.as_str() {
        "enter" => ENTER,
        "return" | "cr" => CARRIAGE_RETURN,
        "up" => UP,
        "down" => DOWN,
        "right" => RIGHT,
        "left" => LEFT,
        "ctrlc" => CTRL_C,
        "ctrld" => CTRL_D,
        "space" => SPACE,
        "backspace" => BACKSPACE,
        _ => return None,
    };
    Some(key)
}
