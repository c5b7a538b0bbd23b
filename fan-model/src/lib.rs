pub mod error;
pub mod forecast;
pub mod recipient;
pub mod severity;
