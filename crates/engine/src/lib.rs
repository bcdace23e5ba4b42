pub mod bybit;
pub mod registry;

pub use bybit::BybitClient;
pub use registry::StrategyRegistry;
