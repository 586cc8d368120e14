use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::render::surface::Raster;

fn quad(w: f64, h: f64) -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ]
}

fn solid_spec(w: u32, h: u32, rgba: [u8; 4]) -> ImageSpec {
    ImageSpec::new(RasterSource::Raster(Raster::solid(w, h, rgba)))
        .with_points(quad(f64::from(w), f64::from(h)))
}

fn comp(w: u32, h: u32) -> Composition {
    Composition::new(Canvas::new(w, h).unwrap(), EngineSettings::default()).unwrap()
}

fn record(comp: &mut Composition) -> Rc<RefCell<Vec<&'static str>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    comp.on(move |e| sink.borrow_mut().push(e.name()));
    log
}

/// Two 4x4 quads with the shared triangulation.
fn two_quads() -> Composition {
    let mut c = comp(8, 8);
    c.add_image(solid_spec(4, 4, [255, 0, 0, 255])).unwrap();
    c.add_image(solid_spec(4, 4, [0, 0, 255, 255])).unwrap();
    c.add_triangle(0, 1, 2).unwrap();
    c.add_triangle(0, 2, 3).unwrap();
    c
}

#[test]
fn add_image_emits_add_then_load() {
    let mut c = comp(8, 8);
    let log = record(&mut c);
    let id = c.add_image(solid_spec(4, 4, [1, 2, 3, 255])).unwrap();
    assert_eq!(*log.borrow(), vec!["image:add", "load"]);
    assert!(c.image(id).unwrap().is_loaded());
    assert_eq!(c.weights(), &[0.0]);
}

#[test]
fn second_image_without_points_copies_the_first_mesh() {
    let mut c = two_quads();
    let id = c
        .add_image(ImageSpec::new(RasterSource::Raster(Raster::solid(
            4,
            4,
            [0, 0, 0, 255],
        ))))
        .unwrap();
    let img = c.image(id).unwrap();
    assert_eq!(img.mesh().point_count(), 4);
    assert_eq!(img.mesh().triangle_count(), 2);
    assert_eq!(c.weights().len(), 3);
}

#[test]
fn mismatched_point_count_registers_nothing() {
    let mut c = two_quads();
    let log = record(&mut c);
    let err = c
        .add_image(ImageSpec::new(RasterSource::Raster(Raster::solid(2, 2, [0; 4]))).with_points(
            vec![Point::new(0.0, 0.0)],
        ))
        .unwrap_err();
    assert!(err.is_topology());
    assert_eq!(c.images().len(), 2);
    assert!(log.borrow().is_empty());
}

#[test]
fn load_failure_is_an_event_and_the_image_is_skipped() {
    let mut c = comp(8, 8);
    let log = record(&mut c);
    let good = c.add_image(solid_spec(4, 4, [0, 255, 0, 255])).unwrap();
    let bad = c
        .add_image(
            ImageSpec::new(RasterSource::path("target/no/such/image.png"))
                .with_points(quad(4.0, 4.0)),
        )
        .unwrap();
    c.add_triangle(0, 1, 2).unwrap();
    c.add_triangle(0, 2, 3).unwrap();

    assert!(log.borrow().contains(&"load:error"));
    assert!(c.image(good).unwrap().is_loaded());
    assert!(!c.image(bad).unwrap().is_loaded());

    c.set(&[1.0, 1.0]).unwrap();
    let frame = c.last_frame().unwrap();
    assert_eq!(frame.pixel(4, 4), Some([0, 255, 0, 255]));
    assert_eq!(c.last_stats().images_skipped, 1);
}

#[test]
fn add_point_needs_an_image() {
    let mut c = comp(4, 4);
    let err = c.add_point(Point::new(1.0, 1.0)).unwrap_err();
    assert!(matches!(err, MorphError::Validation(_)));
}

#[test]
fn point_edits_apply_to_every_mesh() {
    let mut c = two_quads();
    let log = record(&mut c);
    let idx = c.add_point(Point::new(2.0, 2.0)).unwrap();
    assert_eq!(idx, 4);
    assert!(c.images().iter().all(|img| img.mesh().point_count() == 5));

    let second = c.images()[1].id();
    c.move_point(second, idx, Point::new(3.0, 1.0)).unwrap();
    assert_eq!(c.images()[0].mesh().points()[4].pos, Point::new(2.0, 2.0));
    assert_eq!(c.images()[1].mesh().points()[4].pos, Point::new(3.0, 1.0));

    assert_eq!(c.remove_point(0), Some(2));
    assert_eq!(c.point_count(), 4);
    assert_eq!(c.triangle_count(), 0);
    assert_eq!(c.remove_point(99), None);
    assert_eq!(*log.borrow(), vec!["point:add", "point:move", "point:remove"]);
}

#[test]
fn add_point_per_image_checks_length() {
    let mut c = two_quads();
    assert!(c.add_point_per_image(&[Point::new(1.0, 1.0)]).is_err());
    let idx = c
        .add_point_per_image(&[Point::new(1.0, 1.0), Point::new(3.0, 3.0)])
        .unwrap();
    assert_eq!(c.images()[1].mesh().points()[idx].pos, Point::new(3.0, 3.0));
}

#[test]
fn bad_triangle_leaves_meshes_untouched() {
    let mut c = two_quads();
    let err = c.add_triangle(0, 1, 9).unwrap_err();
    assert!(err.is_topology());
    assert!(c.images().iter().all(|img| img.mesh().triangle_count() == 2));
    assert!(c.remove_triangle(1));
    assert!(!c.remove_triangle(5));
    assert_eq!(c.triangle_count(), 1);
}

#[test]
fn split_edge_is_lockstep() {
    let mut c = two_quads();
    let log = record(&mut c);
    let areas: Vec<f64> = c.images().iter().map(|i| i.mesh().total_area()).collect();
    let mid = c.split_edge(0, 2).unwrap();
    assert_eq!(mid, 4);
    for (img, area) in c.images().iter().zip(areas) {
        assert_eq!(img.mesh().point_count(), 5);
        assert_eq!(img.mesh().triangle_count(), 4);
        assert!((img.mesh().total_area() - area).abs() < 1e-9);
    }
    assert_eq!(c.split_edge(0, 0), None);
    assert_eq!(*log.borrow(), vec!["edge:split"]);
}

#[test]
fn set_renders_and_presents() {
    struct Count(Rc<RefCell<usize>>);
    impl OutputSurface for Count {
        fn present(&mut self, _frame: &Frame) -> MorphResult<()> {
            *self.0.borrow_mut() += 1;
            Ok(())
        }
    }

    let mut c = two_quads();
    let presented = Rc::new(RefCell::new(0));
    c.attach(Count(Rc::clone(&presented)));
    let log = record(&mut c);

    c.set(&[0.0, 1.0]).unwrap();
    assert_eq!(*presented.borrow(), 1);
    assert_eq!(*log.borrow(), vec!["change", "draw"]);
    assert_eq!(c.images()[1].weight(), 1.0);
    // Canvas center (4, 4) minus half size (2, 2).
    assert_eq!(c.last_frame().unwrap().pixel(2, 2), Some([0, 0, 255, 255]));

    assert!(c.set(&[1.0]).is_err());
    assert_eq!(*presented.borrow(), 1);
}

#[test]
fn animation_reports_progress_then_exactly_one_complete() {
    let mut c = two_quads();
    c.set(&[1.0, 0.0]).unwrap();
    let log = record(&mut c);

    let t0 = Instant::now();
    c.animate_at(&[0.0, 1.0], Duration::from_millis(100), None, t0)
        .unwrap();
    assert_eq!(c.state(), AnimState::Running);

    let tick = c.tick_at(t0 + Duration::from_millis(50)).unwrap();
    assert!(matches!(tick, Tick::Progress { t } if (t - 0.5).abs() < 1e-9));
    assert!((c.weights()[0] - 0.5).abs() < 1e-9);

    assert_eq!(c.tick_at(t0 + Duration::from_millis(150)).unwrap(), Tick::Complete);
    assert_eq!(c.weights(), &[0.0, 1.0]);
    assert_eq!(c.tick_at(t0 + Duration::from_millis(200)).unwrap(), Tick::Idle);

    let names = log.borrow();
    assert_eq!(names.iter().filter(|n| **n == "complete").count(), 1);
    assert_eq!(names.first(), Some(&"start"));
    assert_eq!(names.last(), Some(&"complete"));
}

#[test]
fn retarget_and_set_cancel_the_running_tween() {
    let mut c = two_quads();
    let log = record(&mut c);
    let t0 = Instant::now();
    c.animate_at(&[1.0, 0.0], Duration::from_secs(1), None, t0)
        .unwrap();
    c.animate_at(&[0.0, 1.0], Duration::from_secs(1), None, t0)
        .unwrap();
    c.set(&[0.5, 0.5]).unwrap();
    assert_eq!(c.state(), AnimState::Idle);
    assert!(!c.cancel());
    assert_eq!(
        *log.borrow(),
        vec!["start", "cancel", "start", "cancel", "change", "draw"]
    );
}

#[test]
fn remove_image_drops_its_weight() {
    let mut c = two_quads();
    c.set(&[0.25, 0.75]).unwrap();
    let first = c.images()[0].id();
    assert!(c.remove_image(first));
    assert!(!c.remove_image(first));
    assert_eq!(c.weights(), &[0.75]);
}

#[test]
fn project_round_trip_through_composition() {
    let project = Project::from_json_str(
        r#"{
            "images": [
                {"src": "a.png", "x": 1, "y": 2,
                 "points": [{"x":0,"y":0},{"x":4,"y":0},{"x":0,"y":4}]},
                {"src": "b.png",
                 "points": [{"x":1,"y":1},{"x":3,"y":0},{"x":0,"y":3}]}
            ],
            "triangles": [[0, 1, 2]]
        }"#,
    )
    .unwrap();

    let mut c = comp(8, 8);
    let log = record(&mut c);
    c.load_project(&project).unwrap();
    assert_eq!(c.images().len(), 2);
    assert_eq!(c.weights(), &[1.0, 0.0]);
    assert_eq!(c.images()[0].offset(), Vec2::new(1.0, 2.0));
    // Neither file exists relative to the working directory.
    assert_eq!(
        log.borrow()
            .iter()
            .filter(|n| **n == "load:error")
            .count(),
        2
    );

    let back = c.to_project().unwrap();
    assert_eq!(back, project);
}

#[test]
fn invalid_project_changes_nothing() {
    let mut c = two_quads();
    let log = record(&mut c);
    let project = Project::from_json_str(
        r#"{
            "images": [
                {"src": "a.png", "points": [{"x":0,"y":0},{"x":1,"y":0}]},
                {"src": "b.png", "points": [{"x":0,"y":0}]}
            ],
            "triangles": []
        }"#,
    )
    .unwrap();
    let err = c.load_project(&project).unwrap_err();
    assert!(err.is_topology());
    assert_eq!(c.images().len(), 2);
    assert_eq!(c.point_count(), 4);
    assert!(log.borrow().is_empty());
}

#[test]
fn dispose_notifies_listeners_last() {
    let mut c = two_quads();
    let log = record(&mut c);
    c.animate_at(&[0.0, 1.0], Duration::from_secs(1), None, Instant::now())
        .unwrap();
    c.dispose();
    assert_eq!(*log.borrow(), vec!["start", "cancel", "dispose"]);
}

#[test]
fn offset_changes_are_observable() {
    let mut c = two_quads();
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    c.on(move |e| sink.borrow_mut().push(e.clone()));

    let second = c.images()[1].id();
    c.set_image_offset(second, Vec2::new(2.0, 0.0)).unwrap();
    assert!(c.move_point(second, 9, Point::new(0.0, 0.0)).is_err());
    assert_eq!(*log.borrow(), vec![MorphEvent::ImageMove { image: second }]);
}

#[test]
fn export_refuses_sources_without_a_path() {
    let c = two_quads();
    let err = c.to_project().unwrap_err();
    assert!(matches!(err, MorphError::Validation(_)));
    assert!(err.to_string().contains("raster 4x4"), "{err}");
}

struct Refuse;

impl OutputSurface for Refuse {
    fn present(&mut self, _frame: &Frame) -> MorphResult<()> {
        Err(MorphError::render("surface unavailable"))
    }
}

#[test]
fn failed_present_leaves_weights_and_frame_untouched() {
    let mut c = two_quads();
    c.set(&[1.0, 0.0]).unwrap();
    let before = c.last_frame().cloned();
    c.attach(Refuse);
    let log = record(&mut c);

    assert!(c.set(&[0.0, 1.0]).is_err());
    assert_eq!(c.weights(), &[1.0, 0.0]);
    assert_eq!(c.images()[1].weight(), 0.0);
    assert_eq!(c.last_frame().cloned(), before);
    assert!(log.borrow().is_empty());
}

#[test]
fn failed_final_tick_keeps_the_tween_for_a_retry() {
    let mut c = two_quads();
    c.set(&[1.0, 0.0]).unwrap();
    c.attach(Refuse);
    let t0 = Instant::now();
    c.animate_at(&[0.0, 1.0], Duration::from_millis(100), None, t0)
        .unwrap();
    let log = record(&mut c);

    let end = t0 + Duration::from_millis(100);
    assert!(c.tick_at(end).is_err());
    assert_eq!(c.state(), AnimState::Running);
    assert_eq!(c.weights(), &[1.0, 0.0]);
    assert!(log.borrow().is_empty());

    c.detach();
    assert_eq!(c.tick_at(end).unwrap(), Tick::Complete);
    assert_eq!(c.weights(), &[0.0, 1.0]);
    assert_eq!(*log.borrow(), vec!["change", "draw", "complete"]);
}
