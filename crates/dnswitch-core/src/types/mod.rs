mod probe;
mod query_log;
mod rule;
mod server;
mod settings;

pub use probe::*;
pub use query_log::*;
pub use rule::*;
pub use server::*;
pub use settings::*;
