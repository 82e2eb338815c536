//! Step-wise depth-first route finding.

use std::fmt;
use std::sync::Arc;

use maze_core::{Cell, Direction, Grid, Point};

/// Where a [`RouteFinder`] is in its search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    /// No step has been taken yet.
    #[default]
    NotStarted,
    /// The route is being extended or backtracked.
    Searching,
    /// The exit is at the head of the route. Terminal.
    Solved,
    /// Every cell reachable from the entrance is a dead end. Terminal.
    Exhausted,
}

impl Phase {
    /// Whether no further progress is possible.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Solved | Phase::Exhausted)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::NotStarted => "not started",
            Phase::Searching => "searching",
            Phase::Solved => "solved",
            Phase::Exhausted => "exhausted",
        };
        f.write_str(s)
    }
}

/// Search failure reported by [`RouteFinder::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    /// The search backtracked past the entrance: the exit is unreachable.
    NoRouteFound,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRouteFound => f.write_str("no route from the entrance to the exit"),
        }
    }
}

impl std::error::Error for RouteError {}

/// Incremental depth-first search from a grid's entrance to its exit.
///
/// Each call to [`step`](Self::step) does one unit of work: it either pushes
/// an unvisited neighbour of the route's head, or pops the head into the
/// dead-end set when no such neighbour exists. Neighbours are probed in
/// [`Direction::SEARCH_ORDER`] (east, west, north, south), so the route found
/// for a given maze is always the same.
///
/// The visited and dead-end sets only ever grow. Every navigable cell is
/// pushed and popped at most once, so a search over `n` reachable cells ends
/// after at most `2n + 1` steps.
#[derive(Debug, Clone)]
pub struct RouteFinder {
    pub(crate) grid: Arc<Grid>,
    pub(crate) route: Vec<Point>,
    pub(crate) dead_ends: Vec<Point>,
    // Flat masks indexed by `Grid::index`.
    pub(crate) visited: Vec<bool>,
    pub(crate) dead: Vec<bool>,
    pub(crate) on_route: Vec<bool>,
    pub(crate) phase: Phase,
}

impl RouteFinder {
    /// Create a finder that has not started searching `grid`.
    pub fn new(grid: impl Into<Arc<Grid>>) -> Self {
        let grid = grid.into();
        let len = grid.bounds().len();
        Self {
            grid,
            route: Vec::new(),
            dead_ends: Vec::new(),
            visited: vec![false; len],
            dead: vec![false; len],
            on_route: vec![false; len],
            phase: Phase::NotStarted,
        }
    }

    /// Advance the search by one step.
    ///
    /// Returns `Ok(true)` on the step that reaches the exit and `Ok(false)`
    /// otherwise, including every call made after the maze is solved (those
    /// change nothing). Returns [`RouteError::NoRouteFound`] once the route
    /// has emptied, and on every call after that.
    pub fn step(&mut self) -> Result<bool, RouteError> {
        match self.phase {
            Phase::Solved => return Ok(false),
            Phase::Exhausted => return Err(RouteError::NoRouteFound),
            Phase::NotStarted => {
                let entrance = self.grid.entrance();
                self.push(entrance);
                self.mark_visited(entrance);
                self.phase = Phase::Searching;
                log::debug!("search started at entrance {entrance}");
                return Ok(false);
            }
            Phase::Searching => {}
        }

        let Some(&current) = self.route.last() else {
            self.phase = Phase::Exhausted;
            log::debug!(
                "search exhausted after {} dead ends",
                self.dead_ends.len()
            );
            return Err(RouteError::NoRouteFound);
        };

        match self.next_move(current) {
            None => {
                self.pop();
                self.mark_dead_end(current);
                log::trace!("backtrack from {current}");
                Ok(false)
            }
            Some((dir, next)) if self.grid.at(next) == Some(Cell::Exit) => {
                self.push(next);
                self.phase = Phase::Solved;
                log::debug!(
                    "exit {next} reached going {dir}, route length {}",
                    self.route.len()
                );
                Ok(true)
            }
            Some((dir, next)) => {
                self.push(next);
                self.mark_visited(next);
                log::trace!("{current} -> {next} ({dir})");
                Ok(false)
            }
        }
    }

    /// Step until the exit is reached. Returns the number of steps taken by
    /// this call; zero if the maze was already solved.
    pub fn solve(&mut self) -> Result<usize, RouteError> {
        if self.phase == Phase::Solved {
            return Ok(0);
        }
        let mut steps = 0;
        loop {
            steps += 1;
            if self.step()? {
                return Ok(steps);
            }
        }
    }

    /// The first neighbour of `p`, in search order, that is inside the grid,
    /// not a wall and not yet visited.
    fn next_move(&self, p: Point) -> Option<(Direction, Point)> {
        Direction::SEARCH_ORDER.into_iter().find_map(|d| {
            let n = self.grid.adjacent(p, d)?;
            (self.grid.navigable(n) && !self.is_visited(n)).then_some((d, n))
        })
    }

    fn push(&mut self, p: Point) {
        if let Some(i) = self.grid.index(p) {
            self.on_route[i] = true;
        }
        self.route.push(p);
    }

    fn pop(&mut self) {
        if let Some(i) = self.route.pop().and_then(|p| self.grid.index(p)) {
            self.on_route[i] = false;
        }
    }

    fn mark_visited(&mut self, p: Point) {
        if let Some(i) = self.grid.index(p) {
            self.visited[i] = true;
        }
    }

    fn mark_dead_end(&mut self, p: Point) {
        if let Some(i) = self.grid.index(p) {
            if !self.dead[i] {
                self.dead[i] = true;
                self.dead_ends.push(p);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The maze being searched.
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// A shared handle to the maze being searched.
    #[inline]
    pub fn shared_grid(&self) -> Arc<Grid> {
        Arc::clone(&self.grid)
    }

    /// Current search phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the exit has been reached.
    #[inline]
    pub fn is_solved(&self) -> bool {
        self.phase == Phase::Solved
    }

    /// A copy of the current route, entrance first, head last.
    pub fn route(&self) -> Vec<Point> {
        self.route.clone()
    }

    /// The head of the route, if any.
    #[inline]
    pub fn head(&self) -> Option<Point> {
        self.route.last().copied()
    }

    /// Cells proven not to lead to the exit, in the order they were found.
    #[inline]
    pub fn dead_ends(&self) -> &[Point] {
        &self.dead_ends
    }

    /// Every cell ever pushed onto the route (except the exit), in grid
    /// text order.
    pub fn visited(&self) -> impl Iterator<Item = Point> + '_ {
        self.visited
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v)
            .filter_map(move |(i, _)| self.grid.point(i))
    }

    /// Number of visited cells.
    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|&&v| v).count()
    }

    /// Whether `p` has been pushed onto the route at some point.
    #[inline]
    pub fn is_visited(&self, p: Point) -> bool {
        self.grid.index(p).is_some_and(|i| self.visited[i])
    }

    /// Whether `p` is a known dead end.
    #[inline]
    pub fn is_dead_end(&self, p: Point) -> bool {
        self.grid.index(p).is_some_and(|i| self.dead[i])
    }

    /// Whether `p` is on the current route.
    #[inline]
    pub fn is_on_route(&self, p: Point) -> bool {
        self.grid.index(p).is_some_and(|i| self.on_route[i])
    }
}

/// Renders the maze with route cells as `*` and dead ends as `-`.
impl fmt::Display for RouteFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.grid.write_labelled(f, |p, c| {
            if self.is_on_route(p) {
                '*'
            } else if self.is_dead_end(p) {
                '-'
            } else {
                c.to_char()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finder(text: &str) -> RouteFinder {
        RouteFinder::new(Grid::parse(text).unwrap())
    }

    fn pts(v: &[(i32, i32)]) -> Vec<Point> {
        v.iter().map(|&p| Point::from(p)).collect()
    }

    #[test]
    fn first_step_pushes_entrance() {
        let mut f = finder("e.#\n..x");
        assert_eq!(f.phase(), Phase::NotStarted);
        assert!(f.route().is_empty());
        assert_eq!(f.step(), Ok(false));
        assert_eq!(f.phase(), Phase::Searching);
        assert_eq!(f.route(), pts(&[(0, 1)]));
        assert!(f.is_visited(Point::new(0, 1)));
    }

    #[test]
    fn small_maze_step_by_step() {
        let mut f = finder("e.#\n..x");
        assert_eq!(f.step(), Ok(false));
        assert_eq!(f.step(), Ok(false));
        assert_eq!(f.route(), pts(&[(0, 1), (1, 1)]));
        assert_eq!(f.step(), Ok(false));
        assert_eq!(f.route(), pts(&[(0, 1), (1, 1), (1, 0)]));
        assert_eq!(f.step(), Ok(true));
        assert!(f.is_solved());
        assert_eq!(f.route(), pts(&[(0, 1), (1, 1), (1, 0), (2, 0)]));
        assert!(f.dead_ends().is_empty());
    }

    #[test]
    fn east_is_preferred_over_south() {
        // From the entrance both east and south are open.
        let mut f = finder("e.\n.x");
        f.step().unwrap();
        f.step().unwrap();
        assert_eq!(f.head(), Some(Point::new(1, 1)));
    }

    #[test]
    fn west_is_preferred_over_north() {
        let mut f = finder("...\n.e#\n#x#");
        f.step().unwrap();
        f.step().unwrap();
        assert_eq!(f.head(), Some(Point::new(0, 1)));
    }

    #[test]
    fn backtracks_out_of_dead_end() {
        // East of the entrance is a dead-end pocket; the exit is south.
        let text = "\
e.#
.##
x##";
        let mut f = finder(text);
        f.step().unwrap(); // entrance
        f.step().unwrap(); // east into the pocket
        assert_eq!(f.head(), Some(Point::new(1, 2)));
        f.step().unwrap(); // pocket has no way on
        assert_eq!(f.dead_ends(), &[Point::new(1, 2)]);
        assert_eq!(f.head(), Some(Point::new(0, 2)));
        assert!(f.is_visited(Point::new(1, 2)));
        f.step().unwrap(); // south
        assert_eq!(f.step(), Ok(true));
        assert_eq!(f.route(), pts(&[(0, 2), (0, 1), (0, 0)]));
        assert!(f.is_dead_end(Point::new(1, 2)));
        assert!(!f.is_on_route(Point::new(1, 2)));
    }

    #[test]
    fn route_mask_follows_pushes_and_pops() {
        let mut f = finder("e.#\n.##\nx##");
        f.step().unwrap();
        f.step().unwrap();
        assert!(f.is_on_route(Point::new(1, 2)));
        f.step().unwrap();
        assert!(!f.is_on_route(Point::new(1, 2)));
        f.solve().unwrap();
        for p in f.grid().bounds().iter() {
            assert_eq!(f.is_on_route(p), f.route().contains(&p), "{p}");
        }
        assert!(f.is_on_route(f.grid().exit()));
        assert!(!f.is_on_route(Point::new(9, 9)));
    }

    #[test]
    fn solved_is_idempotent() {
        let mut f = finder("e.#\n..x");
        f.solve().unwrap();
        let route = f.route();
        let dead = f.dead_ends().to_vec();
        let visited: Vec<_> = f.visited().collect();
        for _ in 0..5 {
            assert_eq!(f.step(), Ok(false));
            assert!(f.is_solved());
            assert_eq!(f.route(), route);
            assert_eq!(f.dead_ends(), dead.as_slice());
            assert_eq!(f.visited().collect::<Vec<_>>(), visited);
        }
        assert_eq!(f.solve(), Ok(0));
    }

    #[test]
    fn walled_off_exit_exhausts() {
        let text = "\
e.#.
..#x";
        let mut f = finder(text);
        let mut steps = 0;
        let err = loop {
            steps += 1;
            match f.step() {
                Ok(solved) => assert!(!solved),
                Err(e) => break e,
            }
        };
        assert_eq!(err, RouteError::NoRouteFound);
        assert_eq!(f.phase(), Phase::Exhausted);
        assert!(f.route().is_empty());
        // Reachable component: (0,1) (1,1) (0,0) (1,0).
        let mut dead = f.dead_ends().to_vec();
        dead.sort_by_key(|p| (p.x, p.y));
        assert_eq!(dead, pts(&[(0, 0), (0, 1), (1, 0), (1, 1)]));
        assert_eq!(steps, 2 * 4 + 1);
        // Stays exhausted.
        assert_eq!(f.step(), Err(RouteError::NoRouteFound));
        assert_eq!(f.dead_ends().len(), 4);
    }

    #[test]
    fn solve_reports_exhaustion() {
        let mut f = finder("e#x");
        assert_eq!(f.solve(), Err(RouteError::NoRouteFound));
        assert_eq!(f.dead_ends(), &[Point::new(0, 0)]);
    }

    #[test]
    fn exit_next_to_entrance() {
        let mut f = finder("ex");
        assert_eq!(f.solve(), Ok(2));
        assert_eq!(f.route(), pts(&[(0, 0), (1, 0)]));
    }

    #[test]
    fn route_is_a_snapshot() {
        let mut f = finder("e.#\n..x");
        f.step().unwrap();
        let mut r = f.route();
        r.clear();
        assert_eq!(f.route().len(), 1);
    }

    #[test]
    fn grid_is_shared() {
        let grid = Arc::new(Grid::parse("e.#\n..x").unwrap());
        let mut a = RouteFinder::new(Arc::clone(&grid));
        let b = RouteFinder::new(Arc::clone(&grid));
        a.solve().unwrap();
        assert!(Arc::ptr_eq(&a.shared_grid(), &grid));
        assert_eq!(b.phase(), Phase::NotStarted);
    }

    #[test]
    fn display_marks_route_and_dead_ends() {
        let text = "\
e.#
.##
x##";
        let mut f = finder(text);
        f.solve().unwrap();
        assert_eq!(f.to_string(), "2\t* - #\n1\t* # #\n0\t* # #\n\n\t0 1 2");
    }
}
