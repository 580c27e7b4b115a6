//! Bracket balance check over the raw program text.

use crate::error::{Error, Result};
use crate::lexer::Lexer;

/// Check that every `[` has a matching `]`.
///
/// The forward scan stops at the first `]` that closes nothing and reports the offset just
/// before it. If the text ends with open loops, a second scan from the end locates the
/// excess `[` and reports the offset just after it.
pub fn check_brackets(program: &[u8]) -> Result<()> {
    let mut depth = 0i64;
    for (position, command) in Lexer::new(program) {
        depth += command.depth_delta();
        if depth < 0 {
            return Err(Error::Syntax { position });
        }
    }

    if depth == 0 {
        return Ok(());
    }

    let mut depth = 0i64;
    let excess = Lexer::new(program).rev().find(|&(_, command)| {
        depth += command.depth_delta();
        depth > 0
    });

    match excess {
        Some((position, _)) => Err(Error::Syntax {
            position: position + 1,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(program: &str) -> Option<usize> {
        match check_brackets(program.as_bytes()) {
            Ok(()) => None,
            Err(Error::Syntax { position }) => Some(position),
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn balanced() {
        assert_eq!(position(""), None);
        assert_eq!(position("[]"), None);
        assert_eq!(position("+[->[+]<]."), None);
        assert_eq!(position("[ ] comments [ are ] fine"), None);
    }

    #[test]
    fn excess_close() {
        assert_eq!(position("]"), Some(0));
        assert_eq!(position("[]]"), Some(2));
        assert_eq!(position("ab ]["), Some(3));
    }

    #[test]
    fn excess_open() {
        assert_eq!(position("[["), Some(2));
        assert_eq!(position("[[]"), Some(1));
        assert_eq!(position("[]["), Some(3));
        assert_eq!(position("[ x [ ] y"), Some(1));
    }

    #[test]
    fn comments_never_count() {
        // Only the bracket bytes matter, not what surrounds them
        assert_eq!(position("{(]"), Some(2));
    }
}
