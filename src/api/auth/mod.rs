pub mod types;
pub mod login;

pub use login::*;
