//! Domain types for backtrail

pub mod bar;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod trade;
pub mod trailing_stop;

pub use bar::PriceBar;
pub use portfolio::PortfolioState;
pub use position::Position;
pub use signal::{InvalidSignal, Signal};
pub use trade::{pair_round_trips, ExitReason, RoundTrip, Trade, TradeAction};
pub use trailing_stop::TrailingStop;
