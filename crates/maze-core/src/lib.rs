//! **maze-core**: the maze grid model.
//!
//! This crate turns maze text (`.` corridor, `#` wall, `e` entrance, `x`
//! exit) into a validated, immutable [`Grid`] addressed with Cartesian
//! [`Point`]s, and provides the lookups a route finder needs: cell at a
//! point, flat index of a point, and neighbours by [`Direction`].
//!
//! ```
//! use maze_core::{Cell, Direction, Grid, Point};
//!
//! let grid = Grid::parse("e.#\n..x").unwrap();
//! assert_eq!(grid.entrance(), Point::new(0, 1));
//! assert_eq!(grid.at(Point::new(2, 0)), Some(Cell::Exit));
//! assert_eq!(grid.adjacent(grid.entrance(), Direction::North), None);
//! ```

pub mod cell;
pub mod geom;
pub mod grid;
pub mod parse;

pub use cell::Cell;
pub use geom::{Direction, Point, Range};
pub use grid::Grid;
pub use parse::MazeError;
