//! Saving and restoring a [`RouteFinder`].
//!
//! A finder is captured as a [`Snapshot`] (maze cells plus search state) and
//! written with [`SnapshotEncoder`] using a small versioned binary format.
//!
//! ## Wire format
//!
//! All integers are little-endian.
//! ```text
//! [magic: "MZRF"]
//! [version: u16]
//! [width: u32] [height: u32]
//! [phase: u8]            0 not started, 1 searching, 2 solved, 3 exhausted
//! [cells: width*height]  maze text bytes, top row first ('.', 'e', 'x', '#')
//! [route_len: u32]   route_len   x [x: i32] [y: i32]
//! [dead_len: u32]    dead_len    x [x: i32] [y: i32]
//! [visited_len: u32] visited_len x [x: i32] [y: i32]
//! ```

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use maze_core::{Direction, Grid, Point};

use crate::finder::{Phase, RouteFinder};

/// File signature.
pub const MAGIC: [u8; 4] = *b"MZRF";
/// Current format version.
pub const VERSION: u16 = 1;
/// Bytes per serialized point.
const POINT_SIZE: usize = 8;

// ---------------------------------------------------------------------------
// PersistError
// ---------------------------------------------------------------------------

/// Errors from saving or restoring a finder.
#[derive(Debug)]
pub enum PersistError {
    /// The snapshot file does not exist.
    NotFound(PathBuf),
    /// The snapshot file exists but could not be read.
    Unreadable { path: PathBuf, source: io::Error },
    /// The snapshot could not be written.
    Unwritable { path: PathBuf, source: io::Error },
    /// The data is not a valid snapshot.
    Corrupt(String),
}

impl PersistError {
    fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "snapshot {} not found", path.display()),
            Self::Unreadable { path, source } => {
                write!(f, "cannot read snapshot {}: {source}", path.display())
            }
            Self::Unwritable { path, source } => {
                write!(f, "cannot write snapshot {}: {source}", path.display())
            }
            Self::Corrupt(msg) => write!(f, "corrupt snapshot: {msg}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unreadable { source, .. } | Self::Unwritable { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The complete, plain-data state of a [`RouteFinder`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    pub grid: Grid,
    pub phase: Phase,
    /// Entrance first, head last.
    pub route: Vec<Point>,
    /// In discovery order.
    pub dead_ends: Vec<Point>,
    /// In grid text order.
    pub visited: Vec<Point>,
}

impl RouteFinder {
    /// Capture the finder's full state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid().clone(),
            phase: self.phase,
            route: self.route.clone(),
            dead_ends: self.dead_ends.clone(),
            visited: self.visited().collect(),
        }
    }

    /// Rebuild a finder from a snapshot.
    ///
    /// Fails with [`PersistError::Corrupt`] unless the snapshot describes a
    /// state a real search could have reached: every point is a navigable
    /// cell listed at most once, the route starts at the entrance and moves
    /// one cell at a time, route cells and dead ends are disjoint and were
    /// all visited, and the exit appears only as the head of a solved route.
    pub fn from_snapshot(s: Snapshot) -> Result<Self, PersistError> {
        let Snapshot {
            grid,
            phase,
            route,
            dead_ends,
            visited,
        } = s;

        match phase {
            Phase::NotStarted if !(route.is_empty() && dead_ends.is_empty() && visited.is_empty()) => {
                return Err(PersistError::corrupt("search state present before start"));
            }
            Phase::Solved if route.last() != Some(&grid.exit()) => {
                return Err(PersistError::corrupt("solved route does not end at the exit"));
            }
            Phase::Exhausted if !route.is_empty() => {
                return Err(PersistError::corrupt("exhausted search with a non-empty route"));
            }
            _ => {}
        }
        if route.first().is_some_and(|&p| p != grid.entrance()) {
            return Err(PersistError::corrupt("route does not start at the entrance"));
        }
        if let Some(w) = route
            .windows(2)
            .find(|w| Direction::between(w[0], w[1]).is_none())
        {
            return Err(PersistError::corrupt(format!(
                "route jumps from {} to {}",
                w[0], w[1]
            )));
        }
        let exit = grid.exit();
        let solved_head = (phase == Phase::Solved).then(|| route.len() - 1);
        if let Some(i) = route.iter().position(|&p| p == exit) {
            if Some(i) != solved_head {
                return Err(PersistError::corrupt("exit is on the route but not its solved head"));
            }
        }

        let mut f = RouteFinder::new(grid);
        f.visited = mask(&f.grid, &visited, "visited")?;
        f.dead = mask(&f.grid, &dead_ends, "dead end")?;
        f.on_route = mask(&f.grid, &route, "route")?;
        if f.grid.index(exit).is_some_and(|i| f.visited[i]) {
            return Err(PersistError::corrupt("exit is marked visited"));
        }
        for i in 0..f.visited.len() {
            let on_route = f.on_route[i] && f.grid.point(i) != Some(exit);
            if on_route && !f.visited[i] {
                return Err(PersistError::corrupt("route cell was never visited"));
            }
            if f.dead[i] && !f.visited[i] {
                return Err(PersistError::corrupt("dead end was never visited"));
            }
            if f.dead[i] && f.on_route[i] {
                return Err(PersistError::corrupt("dead end is on the route"));
            }
            if f.visited[i] && !f.dead[i] && !f.on_route[i] {
                return Err(PersistError::corrupt(
                    "visited cell is neither on the route nor a dead end",
                ));
            }
        }

        f.phase = phase;
        f.route = route;
        f.dead_ends = dead_ends;
        Ok(f)
    }

    /// Write the finder's state to `path`.
    ///
    /// The data goes to a sibling temporary file that is renamed over `path`
    /// once complete, so `path` never holds a partial snapshot.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let tmp = temp_path(path);
        let unwritable = |source| PersistError::Unwritable {
            path: path.to_path_buf(),
            source,
        };

        let result = write_file(&tmp, &self.snapshot()).and_then(|()| fs::rename(&tmp, path));
        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(unwritable(e));
        }
        log::info!(
            "saved {} search ({} route cells) to {}",
            self.phase,
            self.route.len(),
            path.display()
        );
        Ok(())
    }

    /// Restore a finder previously written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PersistError::NotFound(path.to_path_buf()),
            _ => PersistError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let snapshot = SnapshotDecoder::new(file).decode().map_err(|e| match e {
            PersistError::Unreadable { source, .. } => PersistError::Unreadable {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        let f = RouteFinder::from_snapshot(snapshot)?;
        log::info!("loaded {} search from {}", f.phase, path.display());
        Ok(f)
    }
}

/// Flag each point of `points` in a mask over `grid`, rejecting points that
/// are walls, outside the grid or listed twice.
fn mask(grid: &Grid, points: &[Point], what: &str) -> Result<Vec<bool>, PersistError> {
    let mut m = vec![false; grid.bounds().len()];
    for &p in points {
        let i = grid
            .index(p)
            .filter(|_| grid.navigable(p))
            .ok_or_else(|| {
                PersistError::corrupt(format!("{what} point {p} is not a navigable cell"))
            })?;
        if m[i] {
            return Err(PersistError::corrupt(format!("{what} point {p} is listed twice")));
        }
        m[i] = true;
    }
    Ok(m)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

fn write_file(path: &Path, snapshot: &Snapshot) -> io::Result<()> {
    let mut enc = SnapshotEncoder::new(BufWriter::new(File::create(path)?));
    enc.encode(snapshot)?;
    let file = enc.into_inner().into_inner().map_err(|e| e.into_error())?;
    file.sync_all()
}

// ---------------------------------------------------------------------------
// SnapshotEncoder
// ---------------------------------------------------------------------------

/// Encodes [`Snapshot`]s to a byte-oriented writer.
pub struct SnapshotEncoder<W: Write> {
    writer: W,
}

impl<W: Write> SnapshotEncoder<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single snapshot.
    pub fn encode(&mut self, s: &Snapshot) -> io::Result<()> {
        let w = &mut self.writer;
        w.write_all(&MAGIC)?;
        w.write_all(&VERSION.to_le_bytes())?;
        w.write_all(&(s.grid.width() as u32).to_le_bytes())?;
        w.write_all(&(s.grid.height() as u32).to_le_bytes())?;
        w.write_all(&[phase_tag(s.phase)])?;
        for row in s.grid.rows() {
            let bytes: Vec<u8> = row.iter().map(|c| c.to_char() as u8).collect();
            w.write_all(&bytes)?;
        }
        for list in [&s.route, &s.dead_ends, &s.visited] {
            write_points(w, list)?;
        }
        w.flush()
    }

    /// Consume the encoder, returning the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn write_points<W: Write>(w: &mut W, points: &[Point]) -> io::Result<()> {
    w.write_all(&(points.len() as u32).to_le_bytes())?;
    for p in points {
        w.write_all(&p.x.to_le_bytes())?;
        w.write_all(&p.y.to_le_bytes())?;
    }
    Ok(())
}

fn phase_tag(phase: Phase) -> u8 {
    match phase {
        Phase::NotStarted => 0,
        Phase::Searching => 1,
        Phase::Solved => 2,
        Phase::Exhausted => 3,
    }
}

fn phase_from_tag(tag: u8) -> Option<Phase> {
    match tag {
        0 => Some(Phase::NotStarted),
        1 => Some(Phase::Searching),
        2 => Some(Phase::Solved),
        3 => Some(Phase::Exhausted),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// SnapshotDecoder
// ---------------------------------------------------------------------------

/// Decodes a [`Snapshot`] from a byte-oriented reader.
pub struct SnapshotDecoder<R: Read> {
    reader: R,
}

impl<R: Read> SnapshotDecoder<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read the whole stream as one snapshot.
    ///
    /// Read failures are reported as [`PersistError::Unreadable`] with an
    /// empty path; malformed content as [`PersistError::Corrupt`].
    pub fn decode(&mut self) -> Result<Snapshot, PersistError> {
        let mut data = Vec::new();
        self.reader
            .read_to_end(&mut data)
            .map_err(|source| PersistError::Unreadable {
                path: PathBuf::new(),
                source,
            })?;
        decode_bytes(&data)
    }
}

/// Bounds-checked little-endian reader over a byte slice.
struct Bytes<'a> {
    data: &'a [u8],
}

impl<'a> Bytes<'a> {
    fn array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], PersistError> {
        let (head, rest) = self
            .data
            .split_first_chunk::<N>()
            .ok_or_else(|| PersistError::corrupt(format!("truncated while reading {what}")))?;
        self.data = rest;
        Ok(*head)
    }

    fn slice(&mut self, n: usize, what: &str) -> Result<&'a [u8], PersistError> {
        if self.data.len() < n {
            return Err(PersistError::corrupt(format!("truncated while reading {what}")));
        }
        let (head, rest) = self.data.split_at(n);
        self.data = rest;
        Ok(head)
    }

    fn u32(&mut self, what: &str) -> Result<u32, PersistError> {
        self.array(what).map(u32::from_le_bytes)
    }

    fn points(&mut self, what: &str) -> Result<Vec<Point>, PersistError> {
        let n = self.u32(what)? as usize;
        let raw = self.slice(n.saturating_mul(POINT_SIZE), what)?;
        Ok(raw
            .chunks_exact(POINT_SIZE)
            .map(|c| {
                let (x, y) = c.split_at(4);
                Point::new(le_i32(x), le_i32(y))
            })
            .collect())
    }
}

fn le_i32(b: &[u8]) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(b);
    i32::from_le_bytes(buf)
}

fn decode_bytes(data: &[u8]) -> Result<Snapshot, PersistError> {
    let mut r = Bytes { data };

    if r.array::<4>("magic")? != MAGIC {
        return Err(PersistError::corrupt("not a route finder snapshot"));
    }
    let version = u16::from_le_bytes(r.array("version")?);
    if version != VERSION {
        return Err(PersistError::corrupt(format!(
            "unsupported snapshot version {version}"
        )));
    }
    let width = r.u32("width")? as usize;
    let height = r.u32("height")? as usize;
    let [tag] = r.array::<1>("phase")?;
    let phase =
        phase_from_tag(tag).ok_or_else(|| PersistError::corrupt(format!("unknown phase {tag}")))?;

    let cells = r.slice(width.saturating_mul(height), "cells")?;
    let lines: Vec<String> = cells
        .chunks(width.max(1))
        .map(|row| row.iter().map(|&b| char::from(b)).collect())
        .collect();
    let grid = Grid::from_lines(lines)
        .map_err(|e| PersistError::corrupt(format!("invalid maze: {e}")))?;
    if grid.width() as usize != width || grid.height() as usize != height {
        return Err(PersistError::corrupt("maze dimensions do not match header"));
    }

    let route = r.points("route")?;
    let dead_ends = r.points("dead ends")?;
    let visited = r.points("visited")?;
    if !r.data.is_empty() {
        return Err(PersistError::corrupt(format!(
            "{} trailing bytes",
            r.data.len()
        )));
    }

    Ok(Snapshot {
        grid,
        phase,
        route,
        dead_ends,
        visited,
    })
}
