//! Native callbacks flowing back into declarative state

pub mod events;
pub mod selection;

pub use events::{MapEvent, ViewportOrigin};
pub use selection::SelectedItem;
