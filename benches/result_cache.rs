use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::Duration;
use tenantgate::{
    AdmissionConfig, AdmissionController, CacheConfig, Fingerprint, FixedWindowLimiter,
    InMemoryBackend, QueryDispatcher, ResultCache, SearchMode, TenantId,
};

fn fingerprints(n: usize) -> Vec<Fingerprint> {
    let tenant = TenantId::parse("acme").unwrap();
    (0..n)
        .map(|i| {
            Fingerprint::new(tenant.clone(), &format!("query {}", i), SearchMode::Lexical).unwrap()
        })
        .collect()
}

fn cache_hit(c: &mut Criterion) {
    let cache = ResultCache::new(CacheConfig::default());
    let keys = fingerprints(200);
    for key in &keys {
        cache.put(key.clone(), serde_json::json!({"hits": 1}), 0);
    }

    let mut i = 0;
    c.bench_function("result_cache_hit", |b| {
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(cache.get(&keys[i], 1_000))
        })
    });
}

fn cache_put_with_eviction(c: &mut Criterion) {
    let cache = ResultCache::new(CacheConfig::new(200, Duration::from_secs(30)).unwrap());
    let keys = fingerprints(1_000);

    let mut i = 0;
    c.bench_function("result_cache_put_evicting", |b| {
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(cache.put(keys[i].clone(), serde_json::Value::Null, 0))
        })
    });
}

fn admission_check(c: &mut Criterion) {
    let config = AdmissionConfig::new(u32::MAX, Duration::from_secs(60)).unwrap();
    let limiter = FixedWindowLimiter::new(config);
    let tenant = TenantId::parse("acme").unwrap();

    c.bench_function("fixed_window_admit", |b| {
        b.iter(|| black_box(limiter.admit(&tenant, 0)))
    });
}

fn dispatcher_cached_search(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dispatcher = QueryDispatcher::new(Arc::new(InMemoryBackend::new()), CacheConfig::default());
    let tenant = TenantId::parse("acme").unwrap();
    rt.block_on(dispatcher.search(&tenant, "shoes", SearchMode::Lexical)).unwrap();

    c.bench_function("dispatcher_cached_search", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(dispatcher.search(&tenant, "shoes", SearchMode::Lexical).await.unwrap())
        })
    });
}

criterion_group!(
    benches,
    cache_hit,
    cache_put_with_eviction,
    admission_check,
    dispatcher_cached_search
);
criterion_main!(benches);
