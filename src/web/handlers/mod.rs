pub mod referral_handlers;
pub mod system_handlers;

pub use referral_handlers::*;
pub use system_handlers::*;
