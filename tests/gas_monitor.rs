//! Gas price monitoring driven by the connection lifecycle.

use std::sync::atomic::Ordering;

use wallet_coordinator::gas::parse_gwei;
use wallet_coordinator::{GasPriceInfo, ProviderKind};

mod common;

use common::{injected_coordinator, settle, MockInjected};

#[tokio::test(start_paused = true)]
async fn test_quote_is_formatted_and_stamped() {
    let mock = MockInjected::new();
    let coordinator = injected_coordinator(&mock);
    assert_eq!(coordinator.gas_info(), GasPriceInfo::default());

    coordinator.connect(ProviderKind::Injected).await.unwrap();
    settle(50).await;

    let quote = coordinator.gas_info();
    assert_eq!(quote.fee_wei, "30000000000");
    assert_eq!(quote.fee_gwei, "30.00");
    assert_eq!(format!("{:.2}", parse_gwei(&quote.fee_gwei).unwrap()), "30.00");
    assert!(!quote.is_loading);
    assert_eq!(quote.error, None);

    // YYYY/MM/DD HH:MM:SS
    let stamp = quote.last_updated.as_bytes();
    assert_eq!(stamp.len(), 19);
    assert_eq!((stamp[4], stamp[7], stamp[10], stamp[13], stamp[16]), (b'/', b'/', b' ', b':', b':'));
}

#[tokio::test(start_paused = true)]
async fn test_polls_every_interval_while_connected() {
    let mock = MockInjected::new();
    let coordinator = injected_coordinator(&mock);
    coordinator.connect(ProviderKind::Injected).await.unwrap();

    settle(50).await;
    assert_eq!(mock.gas_requests.load(Ordering::SeqCst), 1);
    settle(15_000).await;
    assert_eq!(mock.gas_requests.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_refreshes_collapse_to_one_fetch() {
    let mock = MockInjected::new();
    let coordinator = injected_coordinator(&mock);
    coordinator.connect(ProviderKind::Injected).await.unwrap();
    settle(50).await;
    let before = mock.gas_requests.load(Ordering::SeqCst);

    for _ in 0..4 {
        assert!(coordinator.refresh_gas_price());
        settle(100).await;
    }
    settle(1_000).await;

    assert_eq!(mock.gas_requests.load(Ordering::SeqCst), before + 1);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_without_session_is_a_no_op() {
    let mock = MockInjected::new();
    let coordinator = injected_coordinator(&mock);

    assert!(!coordinator.refresh_gas_price());
    settle(1_000).await;
    assert_eq!(mock.gas_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_stays_local() {
    let mock = MockInjected::new();
    mock.gas_fail.store(true, Ordering::SeqCst);
    let coordinator = injected_coordinator(&mock);
    coordinator.connect(ProviderKind::Injected).await.unwrap();
    settle(50).await;

    let quote = coordinator.gas_info();
    assert!(!quote.is_loading);
    assert_eq!(quote.error.as_deref(), Some("Failed to fetch gas price: node unreachable"));
    assert_eq!(coordinator.state().error, None);
    assert!(coordinator.state().is_connected());

    // The loop keeps going and recovers on the next tick.
    mock.gas_fail.store(false, Ordering::SeqCst);
    settle(5_000).await;
    let quote = coordinator.gas_info();
    assert_eq!(quote.error, None);
    assert_eq!(quote.fee_gwei, "30.00");
}
