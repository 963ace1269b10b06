use crate::{FragmentResponse, PjaxError, RenderContext, RequestHeaders, SiteConfig};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;

/// Renders pages for axum handlers, answering PJAX fragment requests with the
/// fragment alone.
#[derive(Clone)]
pub struct AxumPjaxAdapter {
    site: Arc<SiteConfig>,
}

impl AxumPjaxAdapter {
    pub fn new(site: Arc<SiteConfig>) -> Self {
        Self { site }
    }

    pub fn render<F>(&self, headers: &HeaderMap, title: Option<&str>, page: F) -> Response
    where
        F: FnOnce(&mut RenderContext, &RequestHeaders) -> Result<(), PjaxError>,
    {
        let request = headers_from_axum(headers);
        let mut ctx = RenderContext::new(&self.site);
        ctx.title = title.map(str::to_string);

        match page(&mut ctx, &request) {
            Ok(()) => Html(ctx.finish()).into_response(),
            Err(PjaxError::Halt(fragment)) => fragment.into_response(),
            Err(e) => {
                tracing::error!(error = %e, "page render failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("page render failed: {e}"),
                )
                    .into_response()
            }
        }
    }
}

impl IntoResponse for FragmentResponse {
    fn into_response(self) -> Response {
        let mut response = Html(self.body).into_response();
        *response.status_mut() = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        response
    }
}

pub fn headers_from_axum(headers: &HeaderMap) -> RequestHeaders {
    let mut out = RequestHeaders::new();
    for (name, value) in headers {
        if let Ok(v) = value.to_str() {
            out.insert(name.as_str(), v);
        }
    }
    out
}
