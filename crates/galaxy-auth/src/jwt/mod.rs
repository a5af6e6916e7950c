//! JWT signing secrets, token encoding, decoding, and claims.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod secrets;

pub use claims::{AccessClaims, RefreshClaims, TokenType};
pub use decoder::JwtDecoder;
pub use encoder::{IssuedToken, TokenIssuer};
pub use secrets::SigningSecrets;
