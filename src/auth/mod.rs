//! Authentication
//!
//! [`SimpleBinder`] is the default [`Binder`](crate::client::Binder): optional
//! StartTLS, then an LDAPv3 simple bind.

mod simple;

pub use simple::{LdapSession, SimpleBinder};
