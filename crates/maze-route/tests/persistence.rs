//! Saving and resuming searches through the filesystem.

use std::fs;
use std::path::PathBuf;

use maze_core::{Grid, Point};
use maze_route::{PersistError, Phase, RouteError, RouteFinder};

const MAZE: &str = "\
#########
#e..#...#
#.#.#.#.#
#.#...#x#
#.#####.#
#.......#
#########";

/// A per-test scratch path under the system temp directory.
fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("maze-route-{}-{name}", std::process::id()))
}

fn finder_after(steps: usize) -> RouteFinder {
    let mut f = RouteFinder::new(Grid::parse(MAZE).unwrap());
    for _ in 0..steps {
        f.step().unwrap();
    }
    f
}

#[test]
fn save_then_load_preserves_state() {
    let path = scratch("preserve.mzr");
    for steps in [0, 1, 5, 12] {
        let f = finder_after(steps);
        f.save(&path).unwrap();
        let g = RouteFinder::load(&path).unwrap();
        assert_eq!(g.route(), f.route(), "after {steps} steps");
        assert_eq!(g.dead_ends(), f.dead_ends());
        assert_eq!(g.is_solved(), f.is_solved());
        assert_eq!(g.phase(), f.phase());
        assert_eq!(g.visited().collect::<Vec<_>>(), f.visited().collect::<Vec<_>>());
        assert_eq!(g.grid(), f.grid());
    }
    fs::remove_file(&path).ok();
}

#[test]
fn resumed_search_reaches_same_outcome() {
    let path = scratch("resume.mzr");
    let mut original = finder_after(7);
    original.save(&path).unwrap();
    let mut resumed = RouteFinder::load(&path).unwrap();
    fs::remove_file(&path).ok();

    loop {
        let a = original.step();
        let b = resumed.step();
        assert_eq!(a, b);
        assert_eq!(original.route(), resumed.route());
        assert_eq!(original.dead_ends(), resumed.dead_ends());
        if a != Ok(false) {
            break;
        }
    }
    assert!(resumed.is_solved());
    assert_eq!(resumed.route().last(), Some(&Point::new(7, 3)));
}

#[test]
fn solved_state_round_trips() {
    let path = scratch("solved.mzr");
    let mut f = RouteFinder::new(Grid::parse(MAZE).unwrap());
    f.solve().unwrap();
    f.save(&path).unwrap();
    let mut g = RouteFinder::load(&path).unwrap();
    fs::remove_file(&path).ok();
    assert!(g.is_solved());
    assert_eq!(g.step(), Ok(false));
    assert_eq!(g.route(), f.route());
}

#[test]
fn exhausted_state_round_trips() {
    let path = scratch("exhausted.mzr");
    let mut f = RouteFinder::new(Grid::parse("e.#x").unwrap());
    assert_eq!(f.solve(), Err(RouteError::NoRouteFound));
    f.save(&path).unwrap();
    let mut g = RouteFinder::load(&path).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(g.phase(), Phase::Exhausted);
    assert_eq!(g.step(), Err(RouteError::NoRouteFound));
    assert_eq!(g.dead_ends(), f.dead_ends());
}

#[test]
fn save_leaves_no_temporary_file() {
    let path = scratch("tmpfile.mzr");
    finder_after(3).save(&path).unwrap();
    let mut tmp = path.clone().into_os_string();
    tmp.push(".tmp");
    assert!(path.exists());
    assert!(!PathBuf::from(tmp).exists());
    fs::remove_file(&path).ok();
}

#[test]
fn missing_file_is_not_found() {
    let path = scratch("missing.mzr");
    match RouteFinder::load(&path) {
        Err(PersistError::NotFound(p)) => assert_eq!(p, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn garbage_file_is_corrupt() {
    let path = scratch("garbage.mzr");
    fs::write(&path, b"#e..x\nnot a snapshot").unwrap();
    let r = RouteFinder::load(&path);
    fs::remove_file(&path).ok();
    assert!(matches!(r, Err(PersistError::Corrupt(_))));
}

#[test]
fn directory_is_unreadable() {
    let dir = scratch("a-directory");
    fs::create_dir_all(&dir).unwrap();
    let r = RouteFinder::load(&dir);
    fs::remove_dir(&dir).ok();
    assert!(matches!(
        r,
        Err(PersistError::Unreadable { .. }) | Err(PersistError::Corrupt(_))
    ));
}

#[test]
fn unwritable_destination() {
    let path = scratch("no-such-dir").join("state.mzr");
    let err = finder_after(2).save(&path).unwrap_err();
    assert!(matches!(err, PersistError::Unwritable { .. }), "{err}");
    assert!(std::error::Error::source(&err).is_some());
}
