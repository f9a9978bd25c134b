//! Typed notification registry for storage-engine events.
//!
//! Subscribers register by name; re-registering a name replaces the
//! previous handler. Dispatch runs under a read lock, registration under
//! a write lock.

pub mod handler;
pub mod registry;
pub mod types;

pub use handler::{FileOpenedHandler, LockEventHandler, LogHandler};
pub use registry::NotificationRegistry;
pub use types::{FileOpenedEvent, PagerLock, ShmLock};
