//! Trading module: signal-to-order translation
//!
//! # Components
//!
//! - [`calculator`]: minimum order size lookup, precision, TP/SL and quantity sizing
//! - [`PositionInspector`]: current open position and flip quantity
//! - [`BalanceGateway`]: account equity for sizing
//! - [`OrderGateway`]: submit/cancel with normalized outcomes
//! - [`SignalPipeline`]: sequences the above for one webhook signal

pub mod balance;
pub mod calculator;
pub mod orders;
pub mod pipeline;
pub mod position;

pub use balance::BalanceGateway;
pub use calculator::{compute_tpsl, decimal_places, format_quantity, size_order, symbol_info, TpSl};
pub use orders::OrderGateway;
pub use pipeline::{PipelineReport, SignalPipeline};
pub use position::{flip_quantity, PositionInspector};
