use core::hash::BuildHasherDefault;
use core::hash::Hash;
use core::hint::black_box;

use criterion::AxisScale;
use criterion::BatchSize;
use criterion::Criterion;
use criterion::PlotConfiguration;
use criterion::Throughput;
use criterion::criterion_group;
use criterion::criterion_main;
use cuckoo_table::MatrixFamilyBuilder;
use cuckoo_table::Table;
use hashbrown::HashMap as HashbrownMap;
use rand::Rng;
use rand::SeedableRng;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand_distr::Zipf;
use siphasher::sip::SipHasher;

type SipBuilder = BuildHasherDefault<SipHasher>;
type CuckooTable<K> = Table<K, u64, SipBuilder, MatrixFamilyBuilder>;
type HashbrownTable<K> = HashbrownMap<K, u64, SipBuilder>;

trait TestKey: Hash + Eq + Clone {
    fn new(key: u64) -> Self;
}

impl TestKey for u64 {
    fn new(key: u64) -> Self {
        black_box(key)
    }
}

impl TestKey for String {
    fn new(key: u64) -> Self {
        black_box(format!("key_{:016X}", key))
    }
}

const SIZES: &[usize] = &[
    (1 << 10),
    (1 << 12),
    (1 << 14),
    (1 << 16),
    (1 << 18),
];

fn new_cuckoo<K: TestKey>(size: usize) -> CuckooTable<K> {
    Table::with_hashers(
        size,
        2,
        SipBuilder::default(),
        MatrixFamilyBuilder::with_seed(OsRng.try_next_u64().unwrap()),
    )
}

fn random_keys<K: TestKey>(count: usize) -> Vec<K> {
    let mut rng = OsRng;
    (0..count)
        .map(|_| K::new(rng.try_next_u64().unwrap()))
        .collect()
}

fn filled<K: TestKey>(keys: &[K]) -> (CuckooTable<K>, HashbrownTable<K>) {
    let mut cuckoo = new_cuckoo(0);
    let mut hashbrown = HashbrownTable::default();
    for (value, key) in keys.iter().enumerate() {
        cuckoo.insert(key.clone(), value as u64);
        hashbrown.insert(key.clone(), value as u64);
    }
    (cuckoo, hashbrown)
}

fn bench_insert_random<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("insert_random_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cuckoo_table/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut keys = keys.clone();
                    keys.shuffle(&mut SmallRng::from_os_rng());
                    keys
                },
                |keys| {
                    let mut table = new_cuckoo::<K>(0);
                    for (value, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, value as u64));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || {
                    let mut keys = keys.clone();
                    keys.shuffle(&mut SmallRng::from_os_rng());
                    keys
                },
                |keys| {
                    let mut table = HashbrownTable::<K>::default();
                    for (value, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, value as u64));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_insert_reserved<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!(
        "insert_reserved_{}",
        core::any::type_name::<K>()
    ));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cuckoo_table/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut table = new_cuckoo::<K>(size * 2);
                    for (value, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, value as u64));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || keys.clone(),
                |keys| {
                    let mut table =
                        HashbrownTable::<K>::with_capacity_and_hasher(size, SipBuilder::default());
                    for (value, key) in keys.into_iter().enumerate() {
                        black_box(table.insert(key, value as u64));
                    }
                    black_box(table)
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_find_hit<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_hit_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(size);
        let (cuckoo, hashbrown) = filled(&keys);
        let mut probes = keys.clone();
        probes.shuffle(&mut SmallRng::from_os_rng());
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cuckoo_table/{size}"), |b| {
            b.iter(|| {
                for key in &probes {
                    black_box(cuckoo.get(key));
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for key in &probes {
                    black_box(hashbrown.get(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_find_miss<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("find_miss_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(size);
        let (cuckoo, hashbrown) = filled(&keys);
        let probes = random_keys::<K>(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cuckoo_table/{size}"), |b| {
            b.iter(|| {
                for key in &probes {
                    black_box(cuckoo.get(key));
                }
            })
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| {
                for key in &probes {
                    black_box(hashbrown.get(key));
                }
            })
        });
    }

    group.finish();
}

fn bench_find_zipf<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    for exponent in [1.0, 1.3] {
        let mut group = c.benchmark_group(format!(
            "find_zipf_{:.01}_{}",
            exponent,
            core::any::type_name::<K>()
        ));
        group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

        for &size in SIZES[..=MAX_SIZE].iter() {
            let keys = random_keys::<K>(size);
            let (cuckoo, hashbrown) = filled(&keys);

            // Rank 1 is the hottest key.
            let mut rng = SmallRng::from_os_rng();
            let distr = Zipf::new(size as f64, exponent).unwrap();
            let probes = (0..size)
                .map(|_| keys[rng.sample(distr) as usize - 1].clone())
                .collect::<Vec<K>>();
            group.throughput(Throughput::Elements(size as u64));

            group.bench_function(format!("cuckoo_table/{size}"), |b| {
                b.iter(|| {
                    for key in &probes {
                        black_box(cuckoo.get(key));
                    }
                })
            });

            group.bench_function(format!("hashbrown/{size}"), |b| {
                b.iter(|| {
                    for key in &probes {
                        black_box(hashbrown.get(key));
                    }
                })
            });
        }

        group.finish();
    }
}

fn bench_remove<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("remove_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(size);
        let (cuckoo, hashbrown) = filled(&keys);
        let mut order = keys.clone();
        order.shuffle(&mut SmallRng::from_os_rng());
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cuckoo_table/{size}"), |b| {
            b.iter_batched(
                || cuckoo.clone(),
                |mut table| {
                    for key in &order {
                        black_box(table.remove(key));
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter_batched(
                || hashbrown.clone(),
                |mut table| {
                    for key in &order {
                        black_box(table.remove(key));
                    }
                    black_box(table)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_iteration<K: TestKey, const MAX_SIZE: usize>(c: &mut Criterion) {
    let mut group = c.benchmark_group(format!("iteration_{}", core::any::type_name::<K>()));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &size in SIZES[..=MAX_SIZE].iter() {
        let keys = random_keys::<K>(size);
        let (cuckoo, hashbrown) = filled(&keys);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("cuckoo_table/{size}"), |b| {
            b.iter(|| black_box(cuckoo.values().sum::<u64>()))
        });

        group.bench_function(format!("hashbrown/{size}"), |b| {
            b.iter(|| black_box(hashbrown.values().sum::<u64>()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_random::<u64, 4>,
    bench_insert_random::<String, 3>,
    bench_insert_reserved::<u64, 4>,
    bench_insert_reserved::<String, 3>,
    bench_find_hit::<u64, 4>,
    bench_find_hit::<String, 3>,
    bench_find_miss::<u64, 4>,
    bench_find_miss::<String, 3>,
    bench_find_zipf::<u64, 4>,
    bench_find_zipf::<String, 3>,
    bench_remove::<u64, 4>,
    bench_remove::<String, 3>,
    bench_iteration::<u64, 4>,
    bench_iteration::<String, 3>,
);

criterion_main!(benches);
