//! Notification delivery.
//!
//! The worker hands a rendered message to a [`Dispatcher`] and only cares
//! whether it went through. [`LinePushDispatcher`] delivers it as a LINE
//! Messaging API push message.

pub mod dispatcher;
pub mod line;
pub mod message;

pub use dispatcher::{DispatchError, Dispatcher};
pub use line::LinePushDispatcher;
pub use message::render_message;
