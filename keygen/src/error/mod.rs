mod keygen_error;

pub use keygen_error::{ErrorKind, KeygenError};
pub type Result<T> = std::result::Result<T, KeygenError>;
