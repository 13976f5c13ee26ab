// Platform REST API access
pub mod client;
pub mod dto;
pub mod pager;

pub use client::{api_base_url, TurboClient};
pub use pager::{PagedRequest, Pager};
