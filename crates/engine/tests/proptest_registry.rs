use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use common::{StrategyConfig, StrategyType};
use engine::StrategyRegistry;

fn config(symbol: String, volume: f64) -> StrategyConfig {
    StrategyConfig {
        name: None,
        symbol: Some(symbol),
        strategy_type: Some(StrategyType::Momentum),
        volume: Some(volume),
        leverage: 10,
        risk_per_trade: 0.02,
        parameters: HashMap::new(),
    }
}

proptest! {
    /// Any config with a non-empty symbol and positive volume must be
    /// accepted, and every accepted config gets a fresh 8-char id.
    #[test]
    fn valid_configs_start_with_unique_ids(
        symbols in proptest::collection::vec("[A-Z]{3,8}USDT", 1..20),
        volume in 0.0001f64..1_000.0f64,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let registry = StrategyRegistry::new();
            let mut ids = HashSet::new();

            for symbol in &symbols {
                let id = registry.start(config(symbol.clone(), volume)).await.unwrap();
                assert_eq!(id.len(), 8);
                assert!(ids.insert(id), "registry handed out a duplicate id");
            }

            assert_eq!(registry.list_running().await.len(), symbols.len());
            assert_eq!(registry.list_all().await.len(), symbols.len());
        });
    }

    /// Non-positive volumes are always rejected and leave no trace in the
    /// registry.
    #[test]
    fn non_positive_volume_never_mutates(
        symbol in "[A-Z]{3,8}USDT",
        volume in -1_000.0f64..=0.0f64,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let registry = StrategyRegistry::new();

            let err = registry.start(config(symbol, volume)).await.unwrap_err();
            assert!(err.to_string().contains("volume must be positive"));
            assert!(registry.list_all().await.is_empty());
        });
    }

    /// Stopping arbitrary ids that were never issued must return false and
    /// never panic, whatever the id looks like.
    #[test]
    fn stop_of_unissued_id_is_soft(
        bogus_ids in proptest::collection::vec(".{0,16}", 1..10),
        volume in 0.0001f64..10.0f64,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let registry = StrategyRegistry::new();
            let real_id = registry
                .start(config("BTCUSDT".to_string(), volume))
                .await
                .unwrap();

            for bogus in &bogus_ids {
                if bogus != &real_id {
                    assert!(!registry.stop(bogus).await);
                }
            }

            assert_eq!(registry.list_running().await.len(), 1);
        });
    }
}
