//! Maze text parsing and validation.
//!
//! A maze is written as lines of `.` (corridor), `#` (wall), `e` (entrance)
//! and `x` (exit), top row first. Validation runs as independent passes in a
//! fixed order so that the reported [`MazeError`] is predictable:
//!
//! 1. every character must be a known cell kind;
//! 2. exactly one entrance;
//! 3. exactly one exit;
//! 4. all rows the same width (checked once every row has been decoded).

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::cell::Cell;
use crate::grid::Grid;

/// Errors that can occur when building a [`Grid`].
#[derive(Debug)]
pub enum MazeError {
    /// A character other than `.`, `#`, `e` or `x` was found.
    /// `line` and `column` are 1-based text positions.
    InvalidCharacter {
        ch: char,
        line: usize,
        column: usize,
    },
    /// The text has no `e`.
    NoEntrance,
    /// The text has more than one `e`.
    MultipleEntrance(usize),
    /// The text has no `x`.
    NoExit,
    /// The text has more than one `x`.
    MultipleExit(usize),
    /// Line `line` (1-based) has `found` cells where the first line has
    /// `expected`.
    RaggedGrid {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// The maze file does not exist.
    NotFound(PathBuf),
    /// The maze file exists but could not be read as text.
    Unreadable { path: PathBuf, source: io::Error },
}

impl MazeError {
    /// Whether this error came from reading a file rather than from the
    /// maze structure itself.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Unreadable { .. })
    }
}

impl fmt::Display for MazeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCharacter { ch, line, column } => write!(
                f,
                "maze contains invalid character '{}' at line {line}, column {column}",
                ch.escape_debug()
            ),
            Self::NoEntrance => f.write_str("maze has no entrance ('e')"),
            Self::MultipleEntrance(n) => {
                write!(f, "maze has {n} entrances ('e'), expected exactly one")
            }
            Self::NoExit => f.write_str("maze has no exit ('x')"),
            Self::MultipleExit(n) => write!(f, "maze has {n} exits ('x'), expected exactly one"),
            Self::RaggedGrid {
                line,
                expected,
                found,
            } => write!(
                f,
                "maze is ragged: line {line} has {found} cells, expected {expected}"
            ),
            Self::NotFound(path) => write!(f, "maze file {} not found", path.display()),
            Self::Unreadable { path, source } => {
                write!(f, "cannot read maze file {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for MazeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Split maze text into rows. Accepts `\n` and `\r\n`; a trailing newline
/// does not start a new row.
pub(crate) fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

/// Validate and decode `lines` into a [`Grid`].
pub(crate) fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<Grid, MazeError> {
    check_characters(lines)?;
    check_unique(lines, 'e', MazeError::NoEntrance, MazeError::MultipleEntrance)?;
    check_unique(lines, 'x', MazeError::NoExit, MazeError::MultipleExit)?;

    let rows: Vec<Vec<Cell>> = lines
        .iter()
        .map(|l| l.as_ref().chars().filter_map(Cell::from_char).collect())
        .collect();

    let expected = rows.first().map_or(0, Vec::len);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
        return Err(MazeError::RaggedGrid {
            line: i + 1,
            expected,
            found: row.len(),
        });
    }

    let height = rows.len();
    let cells: Vec<Cell> = rows.into_iter().flatten().collect();
    let locate = |kind: Cell, missing: MazeError| {
        cells.iter().position(|&c| c == kind).ok_or(missing)
    };
    let entrance = locate(Cell::Entrance, MazeError::NoEntrance)?;
    let exit = locate(Cell::Exit, MazeError::NoExit)?;

    let grid = Grid::from_cells(expected, height, cells, entrance, exit);
    log::debug!(
        "parsed {}x{} maze: entrance {} exit {}",
        grid.width(),
        grid.height(),
        grid.entrance(),
        grid.exit()
    );
    Ok(grid)
}

/// Read and parse a maze file.
pub(crate) fn read_path(path: &Path) -> Result<Grid, MazeError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => MazeError::NotFound(path.to_path_buf()),
        _ => MazeError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    log::debug!("loading maze from {}", path.display());
    parse_lines(&split_lines(&text))
}

fn check_characters<S: AsRef<str>>(lines: &[S]) -> Result<(), MazeError> {
    for (i, line) in lines.iter().enumerate() {
        for (j, ch) in line.as_ref().chars().enumerate() {
            if Cell::from_char(ch).is_none() {
                return Err(MazeError::InvalidCharacter {
                    ch,
                    line: i + 1,
                    column: j + 1,
                });
            }
        }
    }
    Ok(())
}

fn check_unique<S: AsRef<str>>(
    lines: &[S],
    ch: char,
    none: MazeError,
    many: fn(usize) -> MazeError,
) -> Result<(), MazeError> {
    let n: usize = lines.iter().map(|l| l.as_ref().matches(ch).count()).sum();
    match n {
        0 => Err(none),
        1 => Ok(()),
        n => Err(many(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;

    fn parse(text: &str) -> Result<Grid, MazeError> {
        parse_lines(&split_lines(text))
    }

    #[test]
    fn parses_small_maze() {
        let g = parse("e.#\n..x").unwrap();
        assert_eq!(g.width(), 3);
        assert_eq!(g.height(), 2);
        assert_eq!(g.entrance(), Point::new(0, 1));
        assert_eq!(g.exit(), Point::new(2, 0));
    }

    #[test]
    fn crlf_and_trailing_newline_are_accepted() {
        let g = parse("e.#\r\n..x\r\n").unwrap();
        assert_eq!(g.height(), 2);
        assert_eq!(g.width(), 3);
    }

    #[test]
    fn invalid_character() {
        let err = parse("e.#\n.ox").unwrap_err();
        assert!(matches!(
            err,
            MazeError::InvalidCharacter {
                ch: 'o',
                line: 2,
                column: 2
            }
        ));
        assert!(!err.is_io());
        assert_eq!(
            err.to_string(),
            "maze contains invalid character 'o' at line 2, column 2"
        );
    }

    #[test]
    fn invalid_character_wins_over_other_errors() {
        // No entrance, no exit and ragged, but the bad character is reported.
        let err = parse("..\n.?.").unwrap_err();
        assert!(matches!(err, MazeError::InvalidCharacter { ch: '?', .. }));
    }

    #[test]
    fn trailing_space_is_invalid() {
        let err = parse("e.x \n...").unwrap_err();
        assert!(matches!(err, MazeError::InvalidCharacter { ch: ' ', .. }));
    }

    #[test]
    fn entrance_cardinality() {
        assert!(matches!(parse("..x\n...").unwrap_err(), MazeError::NoEntrance));
        assert!(matches!(
            parse("e.x\n..e").unwrap_err(),
            MazeError::MultipleEntrance(2)
        ));
    }

    #[test]
    fn exit_cardinality() {
        assert!(matches!(parse("e..\n...").unwrap_err(), MazeError::NoExit));
        assert!(matches!(
            parse("e.x\nx.x").unwrap_err(),
            MazeError::MultipleExit(3)
        ));
    }

    #[test]
    fn entrance_is_checked_before_exit() {
        assert!(matches!(parse("...").unwrap_err(), MazeError::NoEntrance));
        assert!(matches!(parse("").unwrap_err(), MazeError::NoEntrance));
    }

    #[test]
    fn ragged_rows() {
        let err = parse("e..\n.x\n...").unwrap_err();
        assert!(matches!(
            err,
            MazeError::RaggedGrid {
                line: 2,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn blank_line_makes_grid_ragged() {
        let err = parse("e.x\n\n...").unwrap_err();
        assert!(matches!(err, MazeError::RaggedGrid { line: 2, .. }));
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = std::env::temp_dir().join("maze-core-definitely-missing.txt");
        let err = read_path(&path).unwrap_err();
        assert!(matches!(err, MazeError::NotFound(ref p) if *p == path));
        assert!(err.is_io());
    }

    #[test]
    fn non_utf8_file_is_unreadable() {
        let path = std::env::temp_dir().join(format!(
            "maze-core-non-utf8-{}.txt",
            std::process::id()
        ));
        std::fs::write(&path, [0x65, 0xff, 0x78]).unwrap();
        let err = read_path(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, MazeError::Unreadable { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
