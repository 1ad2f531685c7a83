pub mod broadcasters;
pub mod token;

pub use broadcasters::{BroadcasterIdentity, BroadcasterLookup};
pub use token::{IdentityClient, IssuedToken, TokenProvider};
