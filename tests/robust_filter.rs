mod common;

use common::synthetic::{line_set, vertical_towards};
use keystone::lines::Orientation;
use keystone::outliers::{remove_outliers, OutlierParams};

#[test]
fn lines_through_one_vanishing_point_are_all_inliers() {
    let _ = env_logger::builder().is_test(true).try_init();
    let vp = [200.0, -3000.0];
    let lines = [40.0, 140.0, 260.0, 360.0]
        .iter()
        .map(|&x| vertical_towards(vp, [x, 380.0], 200.0))
        .collect();
    let mut set = line_set(lines, 400, 400);

    let diag = remove_outliers(&mut set, &OutlierParams::default());

    assert!(diag.vertical.filtered);
    assert_eq!(diag.vertical.input, 4);
    assert_eq!(diag.vertical.kept, 4);
    assert_eq!(set.vertical_count, 4);
    assert!(set.lines.iter().all(|l| l.selected));
}

#[test]
fn line_through_a_different_point_is_rejected() {
    let _ = env_logger::builder().is_test(true).try_init();
    let vp = [200.0, -3000.0];
    let mut lines: Vec<_> = [40.0, 140.0, 260.0, 360.0]
        .iter()
        .map(|&x| vertical_towards(vp, [x, 380.0], 200.0))
        .collect();
    lines.push(vertical_towards([-2500.0, -2000.0], [300.0, 380.0], 200.0));
    let mut set = line_set(lines, 400, 400);

    let diag = remove_outliers(&mut set, &OutlierParams::default());

    assert_eq!(diag.vertical.kept, 4);
    assert_eq!(set.vertical_count, 4);
    let selected: Vec<bool> = set.lines.iter().map(|l| l.selected).collect();
    assert_eq!(selected, vec![true, true, true, true, false]);
    assert_eq!(set.active_indices(Orientation::Vertical), vec![0, 1, 2, 3]);
}

#[test]
fn larger_sets_use_random_runs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let vp = [200.0, -4000.0];
    let mut lines: Vec<_> = (0..9)
        .map(|k| vertical_towards(vp, [20.0 + 45.0 * k as f64, 380.0], 200.0))
        .collect();
    lines.push(vertical_towards([-2500.0, -2000.0], [210.0, 390.0], 200.0));
    let mut set = line_set(lines, 400, 400);

    let params = OutlierParams::default();
    let diag = remove_outliers(&mut set, &params);

    assert_eq!(diag.vertical.runs, params.runs);
    assert!(!set.lines[9].selected);
    assert_eq!(set.vertical_count, 9);
}
