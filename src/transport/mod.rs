//! Hand-off of captured images to the server-side component model.
//!
//! The widget builds one [`AjaxRequest`] per capture and passes it to a
//! [`Dispatcher`]. The `http` feature adds [`HttpDispatcher`], which posts
//! the request as a form to a faces endpoint.

mod dispatcher;
#[cfg(feature = "http")]
mod http;
mod request;

pub use dispatcher::{Dispatcher, LogDispatcher, RecordingDispatcher, TransportError};
#[cfg(feature = "http")]
pub use http::HttpDispatcher;
pub use request::{AjaxRequest, RequestParam};
