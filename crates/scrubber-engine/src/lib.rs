//! Background and UI-side behavior of scrubber.
//!
//! - [`PurgeEngine`] deletes history for tracked domains and records it
//! - [`Scheduler`] keeps one recurring alarm per scheduled site
//! - [`LockManager`] gates the UI behind an optional password
//! - [`SiteManager`] is the UI-side editing surface
//! - [`Background`] dispatches inter-context messages

mod app;
mod background;
mod lock;
mod messages;
mod purge;
mod scheduler;
mod sites;

pub use app::{App, Collaborators};
pub use background::Background;
pub use lock::{LockManager, LockState};
pub use messages::{Request, Response};
pub use purge::{PurgeEngine, PurgeMode};
pub use scheduler::{FIRE_DEBOUNCE_MS, ReconcileReport, Scheduler};
pub use scrubber_core::{Error, Result};
pub use sites::{SITE_NAME_SCAN_LIMIT, SiteManager, SiteRef, normalize_url};
