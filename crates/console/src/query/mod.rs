//! Query and mutation layer.
//!
//! Reads go through [`QueryClient::fetch`], which serves cached data inside
//! the staleness window and otherwise calls the fetcher. Writes go through a
//! [`Mutation`], which invalidates its declared key prefixes only after the
//! write succeeds. Every invalidation is published as a [`QueryEvent`] so
//! views can refetch on change instead of polling.

mod client;
mod key;
mod mutation;

pub use client::{QueryClient, QueryEvent, QueryStatus};
pub use key::{QueryKey, keys};
pub use mutation::{Mutation, MutationStatus};
