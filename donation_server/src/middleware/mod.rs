mod acl;
mod api_key;
mod hmac;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use api_key::{ApiKeyMiddlewareFactory, ApiKeyMiddlewareService};
pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService};
