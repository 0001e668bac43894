pub mod error;
pub mod feature_flags;

// Accounts and auth DTOs
pub mod models;
pub mod requests;

// CourtWise domain modules
pub mod case;
pub mod case_request;
pub mod chat;
pub mod common;
pub mod dashboard;
pub mod evidence;
pub mod hearing;

pub use error::*;
pub use feature_flags::*;
pub use models::*;
pub use requests::*;

pub use case::*;
pub use case_request::*;
pub use chat::*;
pub use common::*;
pub use dashboard::*;
pub use evidence::*;
pub use hearing::*;
