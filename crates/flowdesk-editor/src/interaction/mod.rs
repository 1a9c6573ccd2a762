//! Local interaction helpers: selection, key bindings and deep links.

mod deep_link;
mod keyboard;
mod selection;

pub use deep_link::{DEEP_LINK_NODE_PARAM, DeepLink};
pub use keyboard::{Focus, is_delete_key, should_delete_selection};
pub use selection::Selection;
