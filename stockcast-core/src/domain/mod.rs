//! Domain types for Stockcast

pub mod forecast;
pub mod observation;
pub mod ticker;
pub mod training;

pub use forecast::{Components, Forecast, ForecastRow, SeasonalProfiles};
pub use observation::PriceObservation;
pub use ticker::{
    Horizon, HorizonBounds, Ticker, TickerError, TickerSet, DAYS_PER_YEAR, DEFAULT_TICKERS,
};
pub use training::TrainingRow;
