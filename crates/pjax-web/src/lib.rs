//! Server-side PJAX container widget.
//!
//! A [`Pjax`] widget wraps part of a page. Normal requests get the full page
//! with the container markup and the client script that turns link clicks and
//! form submissions inside the container into PJAX requests. When a request
//! carries `X-PJAX` and names this container in `X-PJAX-Container`, the
//! widget answers with the enclosed fragment alone by returning
//! [`PjaxError::Halt`], which the caller turns into the response.

#[cfg(feature = "axum")]
pub mod adapters;
pub mod assets;
mod config;
mod context;
mod error;
pub mod headers;
pub mod html;
pub mod js;
pub mod output;
mod widget;

#[cfg(feature = "axum")]
pub use adapters::axum::{AxumPjaxAdapter, headers_from_axum};
pub use assets::{AssetManager, AssetRegistry, ClientScript, PjaxClientScript, Position};
pub use config::{PjaxConfig, ScrollTo, Selector, SiteConfig};
pub use context::RenderContext;
pub use error::{FragmentResponse, PjaxError};
pub use headers::{RequestHeaders, X_PJAX, X_PJAX_CONTAINER, requires_pjax};
pub use widget::Pjax;
