//! How a node's returned state is merged into the running state: full
//! replacement by default, or a custom per-field merge via `StateUpdater`.

mod error;
mod updater;

pub use error::ChannelError;
pub use updater::{boxed_updater, BoxedStateUpdater, FieldBasedUpdater, ReplaceUpdater, StateUpdater};
