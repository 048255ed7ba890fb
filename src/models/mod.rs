pub mod diagnostics;
pub mod health;
pub mod invite;
pub mod messages;

pub use diagnostics::*;
pub use health::*;
pub use invite::*;
pub use messages::*;
