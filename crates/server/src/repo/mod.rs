pub mod case;
pub mod case_request;
pub mod chat;
pub mod dashboard;
pub mod evidence;
pub mod hearing;
pub mod refresh_token;
pub mod user;
