use chrono::NaiveDate;
use ganttline::core::{ConflictStatus, ConnectorCurve};
use ganttline::{Editor, EditorConfig, GanttError, ItemId, PlanState, Point};
use tempfile::TempDir;

fn editor() -> Editor {
    let mut config = EditorConfig::default();
    config.grid.origin_date = NaiveDate::from_ymd_opt(2024, 5, 1);
    Editor::new(&config)
}

fn link(editor: &mut Editor, origin: ItemId, end: ItemId) {
    editor.begin_link(origin).unwrap();
    editor.complete_link(end).unwrap();
}

#[test]
fn test_schedule_scenarios() {
    let mut ed = editor();
    let day = |n| ed.grid().date_of(n);
    let (d0, d3, d4, d6) = (day(0), day(3), day(4), day(6));

    let b = ed.create_item(0, d0, 5).unwrap();
    let a = ed.create_item(1, d3, 2).unwrap();
    let a2 = ed.create_item(2, d6, 2).unwrap();
    let a3 = ed.create_item(3, d4, 3).unwrap();
    let c = ed.create_item(4, d6, 2).unwrap();
    link(&mut ed, b, a);
    link(&mut ed, b, a2);
    link(&mut ed, b, a3);
    link(&mut ed, a, c);

    let report = ed.conflicts();
    assert_eq!(report.status(b), Some(ConflictStatus::Clear));
    assert_eq!(report.status(a), Some(ConflictStatus::Blocked));
    assert_eq!(report.status(a2), Some(ConflictStatus::Clear));
    assert_eq!(report.status(a3), Some(ConflictStatus::PartiallyBlocked));
    // c alone clears a, but inherits a's severity
    assert_eq!(report.status(c), Some(ConflictStatus::Blocked));
}

#[test]
fn test_fixing_upstream_clears_chain() {
    let mut ed = editor();
    let b = ed.create_item(0, ed.grid().date_of(0), 5).unwrap();
    let a = ed.create_item(1, ed.grid().date_of(3), 2).unwrap();
    let c = ed.create_item(2, ed.grid().date_of(6), 2).unwrap();
    link(&mut ed, b, a);
    link(&mut ed, a, c);
    assert_eq!(ed.conflicts().status(c), Some(ConflictStatus::Blocked));

    ed.resize_item(b, 3).unwrap();
    let report = ed.conflicts();
    assert_eq!(report.status(a), Some(ConflictStatus::Clear));
    assert_eq!(report.status(c), Some(ConflictStatus::Clear));
}

#[test]
fn test_pointer_below_canvas_is_rejected() {
    let mut ed = editor();
    let height = ed.grid().canvas_height();
    assert!(ed.grid().to_grid(Point::new(20.0, height + 1.0)).is_none());

    let err = ed.create_item_at(Point::new(20.0, height + 1.0)).unwrap_err();
    assert!(matches!(err, GanttError::OutOfBounds { .. }));
    assert_eq!(ed.item_count(), 0);
    assert!((0..ed.grid().lane_count).all(|lane| ed.occupant(lane).is_none()));
}

#[test]
fn test_plan_round_trip_through_file() {
    let mut ed = editor();
    let b = ed.create_item(0, ed.grid().date_of(0), 5).unwrap();
    let a = ed.create_item(3, ed.grid().date_of(4), 3).unwrap();
    link(&mut ed, b, a);
    ed.begin_link(a).unwrap(); // left pending
    ed.set_day_unit(ganttline::DayUnit::Week);

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plans").join("plan.json");
    let plan = PlanState::capture(&ed);
    plan.save(&path).unwrap();

    let loaded = PlanState::load(&path).unwrap();
    assert_eq!(loaded, plan);

    let restored = loaded.restore(&EditorConfig::default()).unwrap();
    assert_eq!(restored.item_views(), ed.item_views());
    assert_eq!(restored.link_views(), ed.link_views());
    assert_eq!(restored.id_counter(), ed.id_counter());
    assert_eq!(
        restored.conflicts().status(a),
        Some(ConflictStatus::PartiallyBlocked)
    );

    // ids keep counting from the persisted counter
    let mut restored = restored;
    let next = restored.create_item(1, restored.grid().date_of(0), 1).unwrap();
    assert_eq!(next.0, plan.id_counter);
}

#[test]
fn test_link_descriptor_parses_back() {
    let mut ed = editor();
    let a = ed.create_item(0, ed.grid().date_of(1), 2).unwrap();
    let b = ed.create_item(5, ed.grid().date_of(9), 4).unwrap();
    link(&mut ed, a, b);

    for view in ed.link_views() {
        let curve = ConnectorCurve::parse(&view.descriptor).unwrap();
        let origin = ed.item_view(view.origin_id.unwrap()).unwrap().rect;
        let end = ed.item_view(view.end_id.unwrap()).unwrap().rect;
        assert_eq!(curve.head.x, origin.x + origin.width);
        assert_eq!(curve.tail.x, end.x);
        assert_eq!(curve.to_descriptor(), view.descriptor);
    }
}
