use foundation::math::{LngLat, MercatorViewport, Projection, Vec2};
use gpu::recording::{Command, RecordingDevice};
use layers::symbology::PointStyle;
use layers::{CustomLayer, Layer, LayerId, LayerState, PointLayer, RenderOutcome};
use pretty_assertions::assert_eq;
use scene::picking::pick_bounds;
use scene::spatial::Bvh;

fn viewport() -> MercatorViewport {
    MercatorViewport::new(LngLat::new(20.0, 20.0), 2.0, 1280.0, 800.0)
}

fn new_layer() -> PointLayer<RecordingDevice> {
    PointLayer::new(42, PointStyle::default())
}

#[test]
fn counts_track_every_replacement() {
    let mut layer = new_layer();
    for n in [0_usize, 1, 7, 8, 9, 250] {
        let coords: Vec<f32> = (0..n)
            .flat_map(|i| [i as f32 * 0.5 - 60.0, (i % 80) as f32 - 40.0])
            .collect();
        layer.set_data(coords).expect("even length");
        assert_eq!(layer.point_count(), n);
        assert_eq!(layer.indexed_count(), n);
    }
}

#[test]
fn dirty_until_next_upload_or_frame() {
    let mut dev = RecordingDevice::new();
    let mut layer = new_layer();
    layer.bind(&mut dev).expect("bind");

    layer.set_data(vec![1.0, 1.0]).expect("data");
    assert!(layer.is_dirty());
    assert!(layer.upload(&mut dev));
    assert!(!layer.is_dirty());
    assert!(!layer.upload(&mut dev));

    layer.set_data(vec![2.0, 2.0, 3.0, 3.0]).expect("data");
    assert!(layer.is_dirty());
    layer.render(&mut dev, &viewport().matrix());
    assert!(!layer.is_dirty());

    layer.unbind(&mut dev);
}

#[test]
fn last_write_wins_before_the_next_frame() {
    let mut dev = RecordingDevice::new();
    let mut layer = new_layer();
    layer.bind(&mut dev).expect("bind");
    dev.clear_commands();

    layer.set_data(vec![0.0; 20]).expect("data");
    layer.set_data(vec![0.0; 6]).expect("data");
    assert_eq!(
        layer.render(&mut dev, &viewport().matrix()),
        RenderOutcome::Drawn { count: 3 }
    );

    let uploads: Vec<usize> = dev
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::ArrayBufferData { len, .. } => Some(*len),
            _ => None,
        })
        .collect();
    assert_eq!(uploads, vec![6 * 4]);
    layer.unbind(&mut dev);
}

#[test]
fn empty_layer_never_finds_anything() {
    let mut layer = new_layer();
    let vp = viewport();
    for click in [LngLat::new(0.0, 0.0), LngLat::new(-170.0, 85.0)] {
        for r in [0.0, 12.0, 5000.0] {
            assert_eq!(layer.find_nearest(&vp, click, r), None);
        }
    }

    layer.set_data(Vec::new()).expect("empty");
    assert_eq!(layer.find_nearest(&vp, LngLat::new(0.0, 0.0), 5000.0), None);
}

#[test]
fn single_point_hit_and_miss() {
    let mut layer = new_layer();
    layer.set_data(vec![-74.0, 40.75]).expect("data");
    let vp = viewport();
    let at = LngLat::new(-74.0, 40.75);

    for r in [0.0, 1.0, 12.0] {
        assert_eq!(layer.find_nearest(&vp, at, r), Some(0));
    }

    let screen = vp.project(at);
    let away = vp.unproject(screen + Vec2::new(0.0, 20.0));
    assert_eq!(layer.find_nearest(&vp, away, 12.0), None);
    assert_eq!(layer.find_nearest(&vp, away, 25.0), Some(0));
}

#[test]
fn point_near_the_box_corner_is_outside_the_radius() {
    let mut layer = new_layer();
    let vp = viewport();
    let click = LngLat::new(20.0, 20.0);
    let corner = vp.unproject(vp.project(click) + Vec2::new(10.0, 10.0));
    let coords = vec![corner.lng as f32, corner.lat as f32];
    layer.set_data(coords.clone()).expect("data");

    let candidates = Bvh::from_points(&coords).query_aabb(&pick_bounds(&vp, click, 12.0));
    assert_eq!(candidates, vec![0]);
    assert_eq!(layer.find_nearest(&vp, click, 12.0), None);
    assert_eq!(layer.find_nearest(&vp, click, 15.0), Some(0));
}

#[test]
fn equidistant_pick_is_deterministic() {
    let mut layer = new_layer();
    layer.set_data(vec![1.0, 0.0, -1.0, 0.0]).expect("data");
    let vp = MercatorViewport::new(LngLat::new(0.0, 0.0), 6.0, 800.0, 800.0);
    let click = LngLat::new(0.0, 0.0);

    let first = layer.find_nearest(&vp, click, 200.0);
    assert!(first.is_some());
    for _ in 0..10 {
        assert_eq!(layer.find_nearest(&vp, click, 200.0), first);
    }
}

#[test]
fn repeated_frames_issue_identical_commands() {
    let mut dev = RecordingDevice::new();
    let mut layer = new_layer();
    layer.set_data(vec![0.0, 0.0, 10.0, 10.0]).expect("data");
    layer.bind(&mut dev).expect("bind");
    let matrix = viewport().matrix();

    dev.clear_commands();
    layer.render(&mut dev, &matrix);
    let first = dev.take_commands();
    layer.render(&mut dev, &matrix);
    let second = dev.take_commands();

    assert_eq!(first, second);
    assert_eq!(
        first
            .iter()
            .filter(|c| matches!(c, Command::DrawPoints { .. }))
            .count(),
        1
    );
    layer.unbind(&mut dev);
}

#[test]
fn replaced_data_never_answers_with_stale_points() {
    let mut dev = RecordingDevice::new();
    let mut layer = new_layer();
    let vp = viewport();
    layer.bind(&mut dev).expect("bind");

    layer
        .set_data(vec![0.0, 0.0, 10.0, 10.0, -170.0, 85.0])
        .expect("data");
    layer.render(&mut dev, &vp.matrix());
    let origin = LngLat::new(0.0, 0.0);
    assert_eq!(layer.find_nearest(&vp, origin, 12.0), Some(0));

    layer.set_data(vec![5.0, 5.0]).expect("data");
    layer.render(&mut dev, &vp.matrix());
    // (5, 5) is ~28 px from the origin at zoom 2.
    assert_eq!(layer.find_nearest(&vp, origin, 12.0), None);
    assert_eq!(layer.find_nearest(&vp, LngLat::new(5.0, 5.0), 12.0), Some(0));

    layer.unbind(&mut dev);
}

#[test]
fn host_drives_layer_through_trait_object() {
    let mut dev = RecordingDevice::new();
    let mut layer = new_layer();
    layer.set_data(vec![12.5, 41.9, 2.35, 48.85]).expect("data");

    let host_layer: &mut dyn CustomLayer<RecordingDevice> = &mut layer;
    assert_eq!(host_layer.id(), LayerId(42));
    host_layer.on_add(&mut dev).expect("add");
    assert_eq!(
        host_layer.render(&mut dev, &viewport().matrix()),
        RenderOutcome::Drawn { count: 2 }
    );
    host_layer.on_remove(&mut dev);

    assert_eq!(layer.state(), LayerState::Released);
    assert_eq!(dev.live_programs(), 0);
    assert_eq!(dev.live_buffers(), 0);
    assert_eq!(dev.live_shaders(), 0);
}
