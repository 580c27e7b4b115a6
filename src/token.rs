/// The eight meaningful characters of a program.
/// ***Every other byte is a comment***
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Command {
    Incr,
    Decr,
    Left,
    Right,
    LoopStart,
    LoopEnd,
    Read,
    Write,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'+' => Some(Command::Incr),
            b'-' => Some(Command::Decr),
            b'<' => Some(Command::Left),
            b'>' => Some(Command::Right),
            b'[' => Some(Command::LoopStart),
            b']' => Some(Command::LoopEnd),
            b',' => Some(Command::Read),
            b'.' => Some(Command::Write),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            Command::Incr => b'+',
            Command::Decr => b'-',
            Command::Left => b'<',
            Command::Right => b'>',
            Command::LoopStart => b'[',
            Command::LoopEnd => b']',
            Command::Read => b',',
            Command::Write => b'.',
        }
    }

    /// Change of loop nesting depth caused by this command.
    pub fn depth_delta(self) -> i64 {
        match self {
            Command::LoopStart => 1,
            Command::LoopEnd => -1,
            _ => 0,
        }
    }

    /// Signed unit step of the foldable commands, `None` for the others.
    pub fn step(self) -> Option<i32> {
        match self {
            Command::Incr | Command::Right => Some(1),
            Command::Decr | Command::Left => Some(-1),
            _ => None,
        }
    }
}
