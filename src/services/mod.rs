pub mod identity;
pub mod invitation;

pub use identity::{Identity, IdentityVerifier, JwtIdentityVerifier};
pub use invitation::{InvitationGateway, InviteError};
