//! Input scripts for scripted play.
//!
//! One line per cycle. Each line lists the keys held that cycle:
//!
//! | Key | Control |
//! |-----|---------|
//! | `R` `L` `U` `D` | directions |
//! | `F` | fire |
//! | `P` | pause |
//! | `S` | save |
//! | `X` | restart |
//! | `.` | nothing |
//!
//! A line may start with a repeat count, `40*R`. Blank lines and text after
//! `#` are ignored.

use std::path::Path;

use warbase_core::interfaces::InputState;

use crate::error::{HeadlessError, Result};

/// Repeat counts above this are rejected as typos.
const MAX_REPEAT: usize = 1_000_000;

/// Parse a script into one input per cycle.
///
/// # Errors
///
/// [`HeadlessError::Script`] naming the first bad line.
pub fn parse_script(source: &str) -> Result<Vec<InputState>> {
    let mut frames = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }
        let (count, keys) = match text.split_once('*') {
            Some((count, keys)) => {
                let count: usize = count.trim().parse().map_err(|_| HeadlessError::Script {
                    line,
                    message: format!("bad repeat count {count:?}"),
                })?;
                if count == 0 || count > MAX_REPEAT {
                    return Err(HeadlessError::Script {
                        line,
                        message: format!("repeat count {count} out of range"),
                    });
                }
                (count, keys.trim())
            }
            None => (1, text),
        };
        let input = parse_keys(keys).map_err(|key| HeadlessError::Script {
            line,
            message: format!("unknown key {key:?}"),
        })?;
        frames.extend(std::iter::repeat(input).take(count));
    }
    Ok(frames)
}

/// Read and parse a script file.
///
/// # Errors
///
/// IO or parse failures.
pub fn load_script(path: &Path) -> Result<Vec<InputState>> {
    let source = std::fs::read_to_string(path).map_err(|e| HeadlessError::io(path, e))?;
    parse_script(&source)
}

fn parse_keys(keys: &str) -> std::result::Result<InputState, char> {
    let mut input = InputState::IDLE;
    for key in keys.chars().filter(|c| !c.is_whitespace()) {
        match key.to_ascii_uppercase() {
            'R' => input.right = true,
            'L' => input.left = true,
            'U' => input.up = true,
            'D' => input.down = true,
            'F' => input.fire = true,
            'P' => input.pause = true,
            'S' => input.save = true,
            'X' => input.restart = true,
            '.' => {}
            other => return Err(other),
        }
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys_and_repeats() {
        let frames = parse_script("# warm up\n3*.\nRF\n\n2 * u  # climb\n").unwrap();
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[0], InputState::IDLE);
        assert!(frames[3].right && frames[3].fire);
        assert!(frames[5].up && !frames[5].right);
    }

    #[test]
    fn test_errors_name_the_line() {
        let err = parse_script(".\nRQ\n").unwrap_err();
        assert!(matches!(err, HeadlessError::Script { line: 2, .. }));
        let err = parse_script("0*R").unwrap_err();
        assert!(matches!(err, HeadlessError::Script { line: 1, .. }));
        assert!(parse_script("x*R").is_err());
    }
}
