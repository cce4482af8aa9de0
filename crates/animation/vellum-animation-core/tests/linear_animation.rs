use std::sync::Arc;

use vellum_animation_core::{
    KeyFrame, KeyFrameValue, KeyedObject, KeyedProperty, LinearAnimation, LinearAnimationInstance,
    LoopMode,
};
use vellum_scene_core::{
    ArtboardData, Artboard, Component, ComponentDirt, ComponentId, ComponentKind, PropertyKey,
    TransformData,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn one_second(loop_mode: LoopMode) -> LinearAnimation {
    LinearAnimation {
        name: "move".into(),
        fps: 60,
        duration: 60,
        loop_mode,
        keyed_objects: vec![KeyedObject::new(
            ComponentId(1),
            vec![KeyedProperty::new(
                PropertyKey::X,
                vec![KeyFrame::number(0.0, 0.0), KeyFrame::number(1.0, 10.0)],
            )],
        )],
        ..Default::default()
    }
}

fn scene() -> Artboard {
    Artboard::from_objects(vec![
        Some(Component::new(
            "root",
            None,
            ComponentKind::Artboard(ArtboardData {
                width: 100.0,
                height: 100.0,
            }),
        )),
        Some(Component::new(
            "box",
            Some(ComponentId::ARTBOARD),
            ComponentKind::Node(TransformData::default()),
        )),
    ])
    .unwrap()
}

/// it should key a node halfway and settle its world transform in one sweep
#[test]
fn keyed_node_settles_in_one_advance() {
    let mut ab = scene();
    let target = ab.find("box").unwrap();
    ab.advance(0.0);
    let animation = LinearAnimation {
        keyed_objects: vec![KeyedObject::new(
            target,
            vec![KeyedProperty::new(
                PropertyKey::X,
                vec![KeyFrame::number(0.0, 0.0), KeyFrame::number(1.0, 100.0)],
            )],
        )],
        ..Default::default()
    };
    let mut i = LinearAnimationInstance::new(Arc::new(animation));
    i.set_time(0.5);
    i.apply(&mut ab, 1.0);
    assert!(ab.resolve(target).unwrap().has_dirt(ComponentDirt::WorldTransform));

    assert!(ab.advance(0.0));
    assert!(!ab.resolve(target).unwrap().has_dirt(ComponentDirt::WorldTransform));
    approx(ab.get_double(target, PropertyKey::X).unwrap(), 50.0, 1e-4);
    approx(ab.world_transform(target).unwrap().as_coeffs()[4] as f32, 50.0, 1e-4);
    assert_eq!(ab.last_sweep().updates, 1);
}

/// it should keep a finished one-shot clamped at its end
#[test]
fn finished_one_shot_stays_clamped() {
    let mut i = LinearAnimationInstance::new(Arc::new(one_second(LoopMode::OneShot)));
    assert!(!i.advance(1.5));
    assert!(!i.advance(0.5));
    approx(i.time(), 1.0, 1e-5);
}

/// it should wrap a looping animation past its end and report the loop
#[test]
fn loop_wraps_and_flags_did_loop() {
    let mut i = LinearAnimationInstance::new(Arc::new(one_second(LoopMode::Loop)));
    assert!(i.advance(1.25));
    assert!(i.did_loop());
    approx(i.time(), 0.25, 1e-5);
    approx(i.total_time(), 1.25, 1e-5);
    approx(i.spilled_time(), 0.25, 1e-5);

    assert!(i.advance(0.25));
    assert!(!i.did_loop());
    approx(i.time(), 0.5, 1e-5);
}

/// it should reflect a ping-pong animation at each boundary
#[test]
fn ping_pong_reflects() {
    let mut i = LinearAnimationInstance::new(Arc::new(one_second(LoopMode::PingPong)));
    i.advance(1.25);
    approx(i.time(), 0.75, 1e-5);
    assert_eq!(i.direction(), -1.0);

    i.advance(0.5);
    approx(i.time(), 0.25, 1e-5);
    assert!(!i.did_loop());

    i.advance(0.5);
    approx(i.time(), 0.25, 1e-5);
    assert!(i.did_loop());
    assert_eq!(i.direction(), 1.0);
}

/// it should fold a ping-pong advance spanning several sweeps in one step
#[test]
fn ping_pong_folds_multiple_sweeps() {
    let mut i = LinearAnimationInstance::new(Arc::new(one_second(LoopMode::PingPong)));
    // 0 -> 1 -> 0 -> 0.5: two reflections, heading forward again.
    i.advance(2.5);
    approx(i.time(), 0.5, 1e-4);
    assert_eq!(i.direction(), 1.0);
    assert!(i.did_loop());

    // 0.5 -> 1 -> 0 -> 1 -> 0.75: three reflections, heading backward.
    i.advance(2.75);
    approx(i.time(), 0.75, 1e-4);
    assert_eq!(i.direction(), -1.0);
}

/// it should return from huge and infinite ping-pong advances
#[test]
fn ping_pong_handles_huge_and_infinite_advances() {
    let mut i = LinearAnimationInstance::new(Arc::new(one_second(LoopMode::PingPong)));
    assert!(i.advance(f32::INFINITY));
    approx(i.time(), 0.0, 1e-6);
    assert!(!i.did_loop());
    assert!(i.advance(f32::NAN));
    approx(i.time(), 0.0, 1e-6);

    let short = LinearAnimation {
        fps: 60,
        duration: 1,
        loop_mode: LoopMode::PingPong,
        ..Default::default()
    };
    let mut i = LinearAnimationInstance::new(Arc::new(short));
    assert!(i.advance(600_000.0));
    assert!(i.time().is_finite());
    assert!((0.0..=1.0 / 60.0 + 1e-6).contains(&i.time()), "time {}", i.time());
    assert!(i.did_loop());
}

/// it should clamp a one-shot at its end and stop
#[test]
fn one_shot_stops_at_end() {
    let mut i = LinearAnimationInstance::new(Arc::new(one_second(LoopMode::OneShot)));
    assert!(i.advance(0.5));
    assert!(!i.advance(1.5));
    approx(i.time(), 1.0, 1e-5);
    approx(i.spilled_time(), 1.0, 1e-5);
}

/// it should confine playback to the work area
#[test]
fn work_area_bounds_playback() {
    let animation = LinearAnimation {
        fps: 10,
        duration: 100,
        work_start: 20,
        work_end: 40,
        enable_work_area: true,
        loop_mode: LoopMode::Loop,
        ..Default::default()
    };
    let mut i = LinearAnimationInstance::new(Arc::new(animation));
    approx(i.time(), 2.0, 1e-5);
    i.advance(2.5);
    approx(i.time(), 2.5, 1e-5);
    assert!(i.did_loop());
}

/// it should play backwards from the end when the loop override and direction say so
#[test]
fn direction_and_loop_override() {
    let mut i = LinearAnimationInstance::new(Arc::new(one_second(LoopMode::OneShot)));
    i.set_loop_mode(Some(LoopMode::Loop));
    assert_eq!(i.loop_mode(), LoopMode::Loop);
    i.set_direction(-3.0);
    assert!(i.advance(0.25));
    approx(i.time(), 0.75, 1e-5);
    assert!(i.did_loop());
    i.set_loop_mode(None);
    assert_eq!(i.loop_mode(), LoopMode::OneShot);
}

/// it should write sampled values into the artboard, leaving them alone at mix 0
#[test]
fn apply_respects_mix() {
    let mut ab = scene();
    let target = ab.find("box").unwrap();
    let mut i = LinearAnimationInstance::new(Arc::new(one_second(LoopMode::OneShot)));
    i.advance(0.5);

    i.apply(&mut ab, 0.0);
    assert_eq!(ab.get_double(target, PropertyKey::X), Some(0.0));

    i.apply(&mut ab, 1.0);
    approx(ab.get_double(target, PropertyKey::X).unwrap(), 5.0, 1e-5);

    ab.set_double(target, PropertyKey::X, 1.0);
    i.apply(&mut ab, 0.5);
    approx(ab.get_double(target, PropertyKey::X).unwrap(), 3.0, 1e-5);

    assert!(ab.advance(0.0));
    let world = ab.world_transform(target).unwrap();
    approx(world.as_coeffs()[4] as f32, 3.0, 1e-5);
}

/// it should blend colors per channel and hold bools
#[test]
fn colors_lerp_and_bools_hold() {
    let mut ab = Artboard::from_json(
        r#"{ "objects": [
            { "type": "artboard" },
            { "type": "shape", "parent": 0 },
            { "type": "fill", "parent": 1 },
            { "type": "solid_color", "parent": 2, "color": 4278190080 }
        ] }"#,
    )
    .unwrap();
    let animation = LinearAnimation {
        keyed_objects: vec![
            KeyedObject::new(
                ComponentId(3),
                vec![KeyedProperty::new(
                    PropertyKey::Color,
                    vec![
                        KeyFrame::new(0.0, KeyFrameValue::Color(0xFF00_0000)),
                        KeyFrame::new(1.0, KeyFrameValue::Color(0xFFFF_FFFF)),
                    ],
                )],
            ),
            KeyedObject::new(
                ComponentId(2),
                vec![KeyedProperty::new(
                    PropertyKey::IsVisible,
                    vec![
                        KeyFrame::new(0.0, KeyFrameValue::Bool(true)),
                        KeyFrame::new(0.5, KeyFrameValue::Bool(false)),
                    ],
                )],
            ),
        ],
        ..Default::default()
    };
    animation.apply(&mut ab, 0.25, 1.0);
    let color = ab.get_color(ComponentId(3), PropertyKey::Color).unwrap();
    assert_eq!(color >> 24, 0xFF);
    assert!((0x3F..=0x40).contains(&((color >> 16) & 0xFF)), "{color:#x}");
    assert_eq!(ab.get_bool(ComponentId(2), PropertyKey::IsVisible), Some(true));

    animation.apply(&mut ab, 0.75, 1.0);
    assert_eq!(ab.get_bool(ComponentId(2), PropertyKey::IsVisible), Some(false));
}
