pub mod response;
pub mod timeout;
