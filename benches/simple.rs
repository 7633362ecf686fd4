use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

fn smallflatmap<const N: usize>(n: u8) {
    let mut map = small_flat_map::SmallFlatMap::<N, _, _>::default();
    for i in 0..n {
        map.insert(i, i);
    }
    for i in 0..n {
        black_box(map.get(&i));
    }
}

fn std_hashmap(n: u8) {
    let mut map =
        std::collections::HashMap::<_, _, std::collections::hash_map::RandomState>::with_capacity(
            n as usize,
        );
    for i in 0..n {
        map.insert(i, i);
    }
    for i in 0..n {
        black_box(map.get(&i));
    }
}

fn std_btreemap(n: u8) {
    let mut map = std::collections::BTreeMap::new();
    for i in 0..n {
        map.insert(i, i);
    }
    for i in 0..n {
        black_box(map.get(&i));
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("smallflatmap-simple-4", |b| b.iter(|| smallflatmap::<16>(4)));
    c.bench_function("stdhashmap-simple-4", |b| b.iter(|| std_hashmap(4)));
    c.bench_function("stdbtreemap-simple-4", |b| b.iter(|| std_btreemap(4)));

    c.bench_function("smallflatmap-simple-8", |b| b.iter(|| smallflatmap::<16>(8)));
    c.bench_function("stdhashmap-simple-8", |b| b.iter(|| std_hashmap(8)));
    c.bench_function("stdbtreemap-simple-8", |b| b.iter(|| std_btreemap(8)));

    c.bench_function("smallflatmap-simple-12", |b| {
        b.iter(|| smallflatmap::<16>(12))
    });
    c.bench_function("stdhashmap-simple-12", |b| b.iter(|| std_hashmap(12)));
    c.bench_function("stdbtreemap-simple-12", |b| b.iter(|| std_btreemap(12)));

    c.bench_function("smallflatmap-simple-16", |b| {
        b.iter(|| smallflatmap::<16>(16))
    });
    c.bench_function("stdhashmap-simple-16", |b| b.iter(|| std_hashmap(16)));
    c.bench_function("stdbtreemap-simple-16", |b| b.iter(|| std_btreemap(16)));

    // The spilled path: the same workload once the map has outgrown its
    // inline slots.
    c.bench_function("smallflatmap-spilled-32", |b| {
        b.iter(|| smallflatmap::<16>(32))
    });
    c.bench_function("stdhashmap-spilled-32", |b| b.iter(|| std_hashmap(32)));
    c.bench_function("stdbtreemap-spilled-32", |b| b.iter(|| std_btreemap(32)));
}

#[cfg(unix)]
mod profile {
    use std::{fs::File, path::Path};

    use criterion::profiler::Profiler;
    use pprof::ProfilerGuard;

    pub struct FlamegraphProfiler<'a> {
        frequency: core::ffi::c_int,
        active_profiler: Option<ProfilerGuard<'a>>,
    }

    impl<'a> FlamegraphProfiler<'a> {
        #[allow(dead_code)]
        pub fn new(frequency: core::ffi::c_int) -> Self {
            FlamegraphProfiler {
                frequency,
                active_profiler: None,
            }
        }
    }

    impl<'a> Profiler for FlamegraphProfiler<'a> {
        fn start_profiling(&mut self, _benchmark_id: &str, _benchmark_dir: &Path) {
            self.active_profiler = Some(ProfilerGuard::new(self.frequency).unwrap());
        }

        fn stop_profiling(&mut self, _benchmark_id: &str, benchmark_dir: &Path) {
            std::fs::create_dir_all(benchmark_dir).unwrap();
            let flamegraph_path = benchmark_dir.join("flamegraph.svg");
            let flamegraph_file = File::create(flamegraph_path)
                .expect("File system error while creating flamegraph.svg");
            if let Some(profiler) = self.active_profiler.take() {
                profiler
                    .report()
                    .build()
                    .unwrap()
                    .flamegraph(flamegraph_file)
                    .expect("Error writing flamegraph");
            }
        }
    }
}

criterion_main!(benches);
criterion_group!(benches, criterion_benchmark);
//#[cfg(unix)]
// criterion_group! {
//     name = benches;
//     // This can be any expression that returns a `Criterion` object.
//     config = Criterion::default().with_profiler(profile::FlamegraphProfiler::new(100));
//     targets = criterion_benchmark
// }
