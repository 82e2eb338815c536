//! The [`Grid`] type: a validated, immutable rectangle of maze [`Cell`]s.
//!
//! Cells are stored row-major in text order (the first text line first), but
//! addressed with Cartesian [`Point`]s: `(0, 0)` is the leftmost cell of the
//! *last* text line and y grows towards the first line. A cell's identity is
//! its position; [`Grid::index`] and [`Grid::point`] convert between a point
//! and the flat storage index.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::cell::Cell;
use crate::geom::{Direction, Point, Range};
use crate::parse::{self, MazeError};

/// A rectangular maze. Immutable once built; share it behind an
/// [`Arc`](std::sync::Arc) when several readers need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    bounds: Range,
    entrance: Point,
    exit: Point,
}

impl Grid {
    /// Parse maze text (lines separated by `\n` or `\r\n`).
    pub fn parse(text: &str) -> Result<Self, MazeError> {
        parse::parse_lines(&parse::split_lines(text))
    }

    /// Build a grid from already split lines, top line first.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, MazeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<S> = lines.into_iter().collect();
        parse::parse_lines(&lines)
    }

    /// Read and parse a maze file.
    ///
    /// A missing file yields [`MazeError::NotFound`]; any other read failure
    /// yields [`MazeError::Unreadable`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MazeError> {
        parse::read_path(path.as_ref())
    }

    /// Assemble a grid from validated rows. `entrance` and `exit` are flat
    /// indices into the row-major cell storage.
    pub(crate) fn from_cells(
        width: usize,
        height: usize,
        cells: Vec<Cell>,
        entrance: usize,
        exit: usize,
    ) -> Self {
        let mut g = Self {
            cells,
            bounds: Range::new(0, 0, width as i32, height as i32),
            entrance: Point::ZERO,
            exit: Point::ZERO,
        };
        g.entrance = g.point_unchecked(entrance);
        g.exit = g.point_unchecked(exit);
        g
    }

    /// The rectangle of valid points.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.bounds
    }

    /// Size of the grid as a `Point` (width, height).
    #[inline]
    pub fn size(&self) -> Point {
        self.bounds.size()
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    /// Whether `p` addresses a cell of this grid.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds.contains(p)
    }

    /// Position of the single entrance.
    #[inline]
    pub fn entrance(&self) -> Point {
        self.entrance
    }

    /// Position of the single exit.
    #[inline]
    pub fn exit(&self) -> Point {
        self.exit
    }

    /// Flat storage index of `p`, or `None` if out of bounds.
    #[inline]
    pub fn index(&self, p: Point) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        let row = (self.height() - 1 - p.y) as usize;
        Some(row * self.width() as usize + p.x as usize)
    }

    /// The point stored at flat index `idx`, or `None` if out of range.
    #[inline]
    pub fn point(&self, idx: usize) -> Option<Point> {
        (idx < self.cells.len()).then(|| self.point_unchecked(idx))
    }

    #[inline]
    fn point_unchecked(&self, idx: usize) -> Point {
        let w = self.width().max(1) as usize;
        let x = (idx % w) as i32;
        let y = self.height() - 1 - (idx / w) as i32;
        Point::new(x, y)
    }

    /// The cell at `p`, or `None` if `p` is outside the grid.
    #[inline]
    pub fn at(&self, p: Point) -> Option<Cell> {
        self.index(p).map(|i| self.cells[i])
    }

    /// Whether `p` is inside the grid and not a wall.
    #[inline]
    pub fn navigable(&self, p: Point) -> bool {
        self.at(p).is_some_and(Cell::is_navigable)
    }

    /// The in-bounds neighbour of `p` in direction `dir`.
    #[inline]
    pub fn adjacent(&self, p: Point, dir: Direction) -> Option<Point> {
        let n = p.step(dir);
        self.contains(n).then_some(n)
    }

    /// All positions holding a cell of kind `kind`, in text order.
    pub fn find(&self, kind: Cell) -> impl Iterator<Item = Point> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |&(_, &c)| c == kind)
            .map(move |(i, _)| self.point_unchecked(i))
    }

    /// Number of non-wall cells.
    pub fn navigable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_navigable()).count()
    }

    /// Rows of cells in text order (the top, highest-y row first).
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.width().max(1) as usize)
    }

    /// Iterate over `(Point, Cell)` pairs in text order.
    pub fn iter(&self) -> GridIter<'_> {
        GridIter { grid: self, idx: 0 }
    }

    /// Re-encode the grid in the maze text format, one line per row.
    pub fn to_text(&self) -> String {
        let mut s = String::with_capacity(self.cells.len() + self.height() as usize);
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                s.push('\n');
            }
            s.extend(row.iter().map(|c| c.to_char()));
        }
        s
    }

    /// Write the labelled rendering used by [`Display`](fmt::Display):
    /// every row starts with its y label and a tab, followed by one glyph per
    /// cell; a final line holds the x labels. `glyph` chooses the character
    /// drawn for each cell.
    pub fn write_labelled<W: fmt::Write>(
        &self,
        w: &mut W,
        glyph: impl Fn(Point, Cell) -> char,
    ) -> fmt::Result {
        for (i, row) in self.rows().enumerate() {
            let y = self.height() - 1 - i as i32;
            write!(w, "{y}\t")?;
            for (x, &c) in row.iter().enumerate() {
                if x > 0 {
                    w.write_char(' ')?;
                }
                w.write_char(glyph(Point::new(x as i32, y), c))?;
            }
            w.write_char('\n')?;
        }
        w.write_str("\n\t")?;
        for x in 0..self.width() {
            if x > 0 {
                w.write_char(' ')?;
            }
            write!(w, "{x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_labelled(f, |_, c| c.to_char())
    }
}

impl FromStr for Grid {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self, MazeError> {
        Grid::parse(s)
    }
}

// ---------------------------------------------------------------------------
// GridIter
// ---------------------------------------------------------------------------

/// Iterator over `(Point, Cell)` pairs of a [`Grid`], in text order.
pub struct GridIter<'a> {
    grid: &'a Grid,
    idx: usize,
}

impl Iterator for GridIter<'_> {
    type Item = (Point, Cell);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let c = *self.grid.cells.get(self.idx)?;
        let p = self.grid.point_unchecked(self.idx);
        self.idx += 1;
        Some((p, c))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.grid.cells.len() - self.idx;
        (n, Some(n))
    }
}

impl ExactSizeIterator for GridIter<'_> {}

impl<'a> IntoIterator for &'a Grid {
    type Item = (Point, Cell);
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> GridIter<'a> {
        self.iter()
    }
}

// Grids serialize as their text lines so that deserializing re-runs
// validation.
#[cfg(feature = "serde")]
impl serde::Serialize for Grid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.height() as usize))?;
        for row in self.rows() {
            let line: String = row.iter().map(|c| c.to_char()).collect();
            seq.serialize_element(&line)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Grid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let lines = Vec::<String>::deserialize(deserializer)?;
        Grid::from_lines(lines).map_err(serde::de::Error::custom)
    }
}
