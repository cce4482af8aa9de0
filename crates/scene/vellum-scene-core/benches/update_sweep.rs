use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vellum_scene_core::{
    Artboard, ArtboardData, Component, ComponentId, ComponentKind, PropertyKey, TransformData,
};

fn fan_out(width: usize, depth: usize) -> Artboard {
    let mut objects = vec![Some(Component::new(
        "bench",
        None,
        ComponentKind::Artboard(ArtboardData::default()),
    ))];
    let mut parents = vec![0u32];
    for _ in 0..depth {
        let mut next = Vec::new();
        for &parent in &parents {
            for i in 0..width {
                next.push(objects.len() as u32);
                objects.push(Some(Component::new(
                    "",
                    Some(ComponentId(parent)),
                    ComponentKind::Node(TransformData::at(i as f32, 1.0)),
                )));
            }
        }
        parents = next;
    }
    let mut artboard = Artboard::from_objects(objects).expect("bench graph links");
    artboard.update_components();
    artboard
}

fn bench_sweep(c: &mut Criterion) {
    let mut artboard = fan_out(10, 3);
    let mut x = 0.0f32;
    c.bench_function("sweep_fan_out_1110", |b| {
        b.iter(|| {
            x += 1.0;
            artboard.set_double(ComponentId(1), PropertyKey::X, x);
            black_box(artboard.update_components());
        })
    });

    c.bench_function("initialize_fan_out_1110", |b| b.iter(|| black_box(fan_out(10, 3))));
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
