//! The [`Cell`] type: what occupies one position of a maze.

use std::fmt;

/// The kind of a single maze position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cell {
    Corridor,
    Entrance,
    Exit,
    Wall,
}

impl Cell {
    /// Every cell kind, in text-encoding order.
    pub const ALL: [Cell; 4] = [Cell::Corridor, Cell::Entrance, Cell::Exit, Cell::Wall];

    /// Decode a maze text character. Returns `None` for anything outside
    /// `.`, `e`, `x` and `#`.
    #[inline]
    pub const fn from_char(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Cell::Corridor),
            'e' => Some(Cell::Entrance),
            'x' => Some(Cell::Exit),
            '#' => Some(Cell::Wall),
            _ => None,
        }
    }

    /// The maze text character for this kind.
    #[inline]
    pub const fn to_char(self) -> char {
        match self {
            Cell::Corridor => '.',
            Cell::Entrance => 'e',
            Cell::Exit => 'x',
            Cell::Wall => '#',
        }
    }

    /// Whether a route may pass through this cell.
    #[inline]
    pub const fn is_navigable(self) -> bool {
        !matches!(self, Cell::Wall)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

impl TryFrom<char> for Cell {
    type Error = char;

    fn try_from(ch: char) -> Result<Self, char> {
        Cell::from_char(ch).ok_or(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_encoding_round_trips() {
        for c in Cell::ALL {
            assert_eq!(Cell::from_char(c.to_char()), Some(c));
        }
    }

    #[test]
    fn unknown_chars_are_rejected() {
        for ch in ['E', 'X', ' ', 'o', '\t', '0'] {
            assert_eq!(Cell::from_char(ch), None, "{ch:?}");
            assert_eq!(Cell::try_from(ch), Err(ch));
        }
    }

    #[test]
    fn only_walls_block() {
        assert!(Cell::Corridor.is_navigable());
        assert!(Cell::Entrance.is_navigable());
        assert!(Cell::Exit.is_navigable());
        assert!(!Cell::Wall.is_navigable());
    }

    #[test]
    fn display_uses_text_encoding() {
        assert_eq!(Cell::Exit.to_string(), "x");
        assert_eq!(Cell::Wall.to_string(), "#");
    }
}
