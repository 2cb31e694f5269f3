pub mod signals;
pub mod synthetic;

pub use signals::SignalService;
pub use synthetic::generate_bars;
