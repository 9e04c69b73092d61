//! Request, response and URL types.

mod base_url;
mod request;
mod response;

pub use base_url::BaseUrl;
pub use request::{ApiRequest, Method};
pub use response::ApiResponse;
