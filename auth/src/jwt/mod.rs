pub mod claims;
pub mod errors;
pub mod handler;
pub mod revocation;

pub use claims::Claims;
pub use errors::TokenError;
pub use handler::JwtHandler;
pub use revocation::RevocationList;
