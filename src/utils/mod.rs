pub use cancel_token::*;
pub use signal::*;

mod cancel_token;
pub mod logger;
mod signal;
