//! Response hardening and request origin checks

mod headers;
mod origin;

pub use headers::security_headers_middleware;
pub use origin::is_trusted_origin;
