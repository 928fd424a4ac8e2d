//! Network collaborators: HTTP fetching and proxy selection.

pub mod fetch;
pub mod proxy;

pub use fetch::{FetchResponse, HttpFetch, MAX_BODY_BYTES, ReqwestFetcher};
pub use proxy::{FileProxySupplier, NoProxy, ProxyCredentials, ProxySupplier};
