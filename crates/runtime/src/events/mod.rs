//! Topic-based event bus for runtime events.
//!
//! The session's presentation sink turns every battle notification, log line
//! and animation request into an [`Event`] on its topic, so front-ends
//! subscribe only to what they render.

mod bus;
mod sink;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use sink::ChannelSink;
pub use types::{LogLine, SessionEvent};
