//! Step-wise route finding through [`maze_core::Grid`] mazes.
//!
//! [`RouteFinder`] runs a depth-first backtracking search from the maze
//! entrance to its exit one step at a time, so a caller can show the search
//! as it progresses. Its full state can be saved to disk and resumed later
//! (see [`snapshot`]).
//!
//! ```
//! use maze_core::{Grid, Point};
//! use maze_route::RouteFinder;
//!
//! let mut finder = RouteFinder::new(Grid::parse("e.#\n..x").unwrap());
//! while !finder.step().unwrap() {}
//! assert_eq!(
//!     finder.route(),
//!     [Point::new(0, 1), Point::new(1, 1), Point::new(1, 0), Point::new(2, 0)]
//! );
//! ```

mod finder;
pub mod snapshot;

pub use finder::{Phase, RouteError, RouteFinder};
pub use snapshot::{PersistError, Snapshot, SnapshotDecoder, SnapshotEncoder};
