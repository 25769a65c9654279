//! Endpoint resolution and session construction
//!
//! This module handles:
//! * Parsing `;`-separated `ldap://` / `ldaps://` descriptors
//! * Merging endpoints into one [`ResolvedConfig`] and [`BindCredential`]
//! * The pool-facing [`SessionFactory`] and its [`Binder`] collaborator

mod descriptor;
mod session;

pub use descriptor::{
    BindCredential, Descriptor, Endpoint, ResolvedConfig, ResolvedConfigBuilder, Scheme, BASE_DN,
};
pub use session::{Binder, SessionBuilder, SessionFactory};
