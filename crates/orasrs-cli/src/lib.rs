pub mod harness;
pub mod settings;

pub use harness::{load_ledger, save_ledger, ResponseView, TracingSink};
pub use settings::Settings;
