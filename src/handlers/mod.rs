pub mod diagnostics;
pub mod health;
pub mod invite;

pub use diagnostics::*;
pub use health::*;
pub use invite::*;
