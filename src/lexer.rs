use super::token::Command;

/// Scans raw program text for commands, skipping comments.
///
/// Yields `(position, command)` pairs where `position` is the byte offset of the command
/// in the raw text. Can be scanned from both ends.
pub struct Lexer<'a> {
    program: &'a [u8],
    cursor: usize,
    back: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(program: &'a [u8]) -> Self {
        Lexer {
            program,
            cursor: 0,
            back: program.len(),
        }
    }

    /// Get the next command from the front. This consumes the command.
    pub fn next_command(&mut self) -> Option<(usize, Command)> {
        while let Some(ch) = self.next_char() {
            if let Some(command) = Command::from_byte(ch) {
                return Some((self.cursor - 1, command));
            }
        }
        None
    }

    /// Get the next command from the back. This consumes the command.
    pub fn next_command_back(&mut self) -> Option<(usize, Command)> {
        while let Some(ch) = self.prev_char() {
            if let Some(command) = Command::from_byte(ch) {
                return Some((self.back, command));
            }
        }
        None
    }

    fn next_char(&mut self) -> Option<u8> {
        if self.cursor >= self.back {
            return None;
        }
        let ch = self.program[self.cursor];
        self.cursor += 1;
        Some(ch)
    }

    fn prev_char(&mut self) -> Option<u8> {
        if self.back <= self.cursor {
            return None;
        }
        self.back -= 1;
        Some(self.program[self.back])
    }
}

impl Iterator for Lexer<'_> {
    type Item = (usize, Command);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_command()
    }
}

impl DoubleEndedIterator for Lexer<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.next_command_back()
    }
}

/// Drop every byte that is not a command, in place, keeping the command order.
pub fn strip_comments(code: &mut Vec<u8>) {
    code.retain(|&ch| Command::from_byte(ch).is_some());
}
