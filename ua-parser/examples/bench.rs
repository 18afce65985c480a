//! Throughput/hit-rate benchmark for the caching resolver. Useful for
//! sanity-checking the cache policies against a real traffic sample.

use clap::{Parser as ClapParser, ValueEnum};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use ua_parser::{
    Cache, CachingResolver, Domain, LruCache, PartialResult, PrefilteredResolver, Regexes,
    Resolver, S3FifoCache, SieveCache,
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Policy {
    Lru,
    S3Fifo,
    Sieve,
}

#[derive(ClapParser, Debug)]
struct Args {
    /// regexes.yaml file to parse the data file with
    regexes: PathBuf,
    /// user agents file, one per line
    user_agents: PathBuf,
    /// number of repetitions through the user agent file
    #[arg(short, long, default_value_t = 1)]
    repetitions: usize,
    /// cache replacement policy to measure
    #[arg(short, long, value_enum, default_value_t = Policy::Lru)]
    policy: Policy,
    /// cache capacity
    #[arg(short, long, default_value_t = 10_000)]
    capacity: usize,
}

/// Wraps any [`Cache`] with hit/miss counters, so this binary can report a
/// hit rate without the cache contract itself needing to expose one.
struct CountingCache<C> {
    inner: C,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<C> CountingCache<C> {
    fn new(inner: C) -> Self {
        Self {
            inner,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            0.0
        } else {
            hits / (hits + misses)
        }
    }
}

impl<C: Cache> Cache for CountingCache<C> {
    fn get(&self, key: &str) -> Option<PartialResult> {
        let result = self.inner.get(key);
        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn put(&self, key: &str, value: PartialResult) {
        self.inner.put(key, value)
    }
}

fn run(
    resolver: &CachingResolver<PrefilteredResolver<'_>, CountingCache<impl Cache>>,
    uas: &[String],
    repetitions: usize,
) {
    for _ in 0..repetitions {
        for ua in uas {
            resolver.resolve(ua, Domain::ALL).expect("resolve");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Args {
        regexes,
        user_agents,
        repetitions,
        policy,
        capacity,
    } = Args::parse();

    let rules: Regexes<'_> = serde_yaml::from_reader(std::fs::File::open(regexes)?)?;
    let inner = PrefilteredResolver::try_from(rules)?;

    let uas = BufReader::new(std::fs::File::open(user_agents)?)
        .lines()
        .collect::<Result<Vec<String>, _>>()?;
    let total_lines = repetitions * uas.len();

    let started = std::time::Instant::now();
    let hit_rate = match policy {
        Policy::Lru => {
            let resolver = CachingResolver::new(inner, CountingCache::new(LruCache::new(capacity)));
            run(&resolver, &uas, repetitions);
            resolver.cache().hit_rate()
        }
        Policy::S3Fifo => {
            let resolver =
                CachingResolver::new(inner, CountingCache::new(S3FifoCache::new(capacity)));
            run(&resolver, &uas, repetitions);
            resolver.cache().hit_rate()
        }
        Policy::Sieve => {
            let resolver =
                CachingResolver::new(inner, CountingCache::new(SieveCache::new(capacity)));
            run(&resolver, &uas, repetitions);
            resolver.cache().hit_rate()
        }
    };
    let elapsed = started.elapsed();

    println!("Lines: {total_lines}");
    println!("Total time: {elapsed:?}");
    println!("{}µs / line", elapsed.as_micros() / total_lines as u128);
    println!(
        "Cache hit rate ({policy:?}, capacity {capacity}): {:.2}%",
        hit_rate * 100.0
    );

    Ok(())
}
