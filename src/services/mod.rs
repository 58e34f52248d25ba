// Service exports
pub mod analytics;
pub mod postgres;

pub use analytics::{BusinessAnalytics, TrendPeriod};
pub use postgres::{DbError, MarketDb};
