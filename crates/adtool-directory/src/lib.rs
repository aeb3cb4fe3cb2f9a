//! Active Directory client utilities for adtool.
//!
//! This crate provides strongly-typed primitives (distinguished names, account names,
//! `userAccountControl` flags, search filters) and the [`Directory`] abstraction the command
//! handlers run against.

#![deny(missing_docs)]

mod account_control;
mod client;
mod config;
mod dn;
pub mod filter;
mod group;
mod user;

pub use account_control::{AccountControl, ACCOUNT_CONTROL_ATTRIBUTE};
pub use client::{
    Directory, DirectoryClient, DirectoryModification, LdapEntry, RealLdapConnector, SearchScope,
};
pub use config::{
    BindCredentials, DirectoryConfig, DirectoryLayout, DEFAULT_CONNECTION_TIMEOUT_SECS,
    DEFAULT_OPERATION_TIMEOUT_SECS,
};
pub use dn::{escape_value, DistinguishedName, DistinguishedNameError, RelativeDistinguishedName};
pub use group::{GroupEntry, MembershipChange, NewGroup, GROUP_OBJECT_CLASSES, MEMBER_ATTRIBUTE};
pub use user::{AccountName, NewUser, UserEntry, USER_OBJECT_CLASSES};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = adtool_core::Result<T>;
