//! Process-wide resource cache for zmd widgets.
//!
//! Many independent widget instances share external resources (stylesheets,
//! renderer and highlighter scripts). This crate makes sure each resource is
//! loaded at most once per process, no matter how many instances ask for it
//! concurrently. Two types form the core API:
//!
//! - [`ResourceCache`]: Key to [`CacheEntry`] store with exclusive-start claims
//! - [`SignalBus`]: Named broadcast channel namespace; completing key `k`
//!   publishes a [`Signal`] named exactly `k`
//!
//! # Claim protocol
//!
//! The first requester of a key wins a [`LoadGuard`] and performs the load.
//! Everyone else receives a [`Waiter`] that resolves when the winner completes
//! (or gives up), after which the payload is read with [`ResourceCache::get`].
//!
//! # Example
//!
//! ```
//! use zmd_cache::{Claim, ResourceCache};
//!
//! let cache = ResourceCache::new();
//! let Claim::Begun(guard) = cache.claim("theme.css") else {
//!     unreachable!("first claim always wins");
//! };
//! assert!(matches!(cache.claim("theme.css"), Claim::Pending(_)));
//!
//! guard.complete(Some("body{}".to_owned()));
//! assert_eq!(&*cache.get("theme.css").unwrap().data, "body{}");
//! ```

mod signal;
mod store;

pub use signal::{Signal, SignalBus};
pub use store::{CacheEntry, Claim, LoadGuard, ResourceCache, WaitError, Waiter};
