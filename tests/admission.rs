use std::sync::Arc;
use std::time::Duration;
use tenantgate::admission::Decision;
use tenantgate::{AdmissionConfig, AdmissionController, FixedWindowLimiter, ManualClock, TenantId};

fn acme() -> TenantId {
    TenantId::parse("acme").unwrap()
}

#[test]
fn limit_three_window_sixty_scenario() {
    let clock = ManualClock::new();
    let config = AdmissionConfig::new(3, Duration::from_secs(60)).unwrap();
    let limiter = FixedWindowLimiter::new(config).with_clock(clock.clone());
    let tenant = acme();

    for expected_remaining in [2, 1, 0] {
        assert_eq!(limiter.admit_now(&tenant), Decision::Allowed { remaining: expected_remaining });
    }

    clock.set(10_000);
    let err = limiter.admit_now(&tenant).into_result(&tenant).unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.rate_limit_details(), Some((3, Duration::from_secs(60))));
    assert_eq!(err.retry_after(), Some(Duration::from_secs(50)));

    clock.set(61_000);
    assert!(limiter.admit_now(&tenant).is_allowed());
    assert_eq!(limiter.store().snapshot(&tenant).unwrap().count(), 1);
}

#[test]
fn burst_across_boundary_is_twice_the_limit() {
    let limiter = FixedWindowLimiter::new(AdmissionConfig::new(5, Duration::from_secs(1)).unwrap());
    let tenant = acme();

    let early = (0..5).filter(|_| limiter.admit(&tenant, 999).is_allowed()).count();
    let late = (0..5).filter(|_| limiter.admit(&tenant, 1_000 + 999 + 1).is_allowed()).count();
    assert_eq!(early + late, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_requests_admit_exactly_limit() {
    let config = AdmissionConfig::new(50, Duration::from_secs(60)).unwrap();
    let limiter = Arc::new(FixedWindowLimiter::new(config));
    let tenant = acme();

    let mut handles = Vec::new();
    for _ in 0..400 {
        let limiter = limiter.clone();
        let tenant = tenant.clone();
        handles.push(tokio::spawn(async move { limiter.admit(&tenant, 1_000).is_allowed() }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 50);
}

#[test]
fn trait_object_is_usable() {
    let limiter: Box<dyn AdmissionController> =
        Box::new(FixedWindowLimiter::new(AdmissionConfig::default()));
    assert_eq!(limiter.limit(), 100);
    assert!(limiter.admit(&acme(), 0).is_allowed());
}
