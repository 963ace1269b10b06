//! The PJAX container widget.
//!
//! Everything rendered between [`Pjax::begin`] and [`Pjax::end`] is the body
//! content of the widget. On a normal request it is wrapped in a container
//! element and the client library is wired up to intercept link clicks and
//! form submissions inside it. When the client asks for this container's
//! fragment, only the body content is sent back and the rest of the page is
//! thrown away.

use crate::assets::{PjaxClientScript, Position};
use crate::headers::{RequestHeaders, requires_pjax};
use crate::html::{self, Attributes};
use crate::{FragmentResponse, PjaxConfig, PjaxError, RenderContext, js};
use serde_json::Value;
use std::hash::{DefaultHasher, Hash, Hasher};

const DEFAULT_TAG: &str = "div";
const PJAX_SCRIPT: &str = "jquery.pjax.js";
const JQUERY: &str = "jquery";

#[derive(Debug)]
enum Mode {
    FullRender { tag: String },
    Capturing { level: usize },
}

#[derive(Debug)]
pub struct Pjax {
    config: PjaxConfig,
    id: String,
    mode: Mode,
}

impl Pjax {
    /// Starts the widget. The fragment decision is made here, once.
    pub fn begin(
        mut config: PjaxConfig,
        headers: &RequestHeaders,
        ctx: &mut RenderContext,
    ) -> Self {
        let id = match config.id().map(str::to_string) {
            Some(id) => id,
            None => {
                let id = ctx.next_widget_id();
                config
                    .options
                    .insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        let mode = if requires_pjax(headers, &id) {
            tracing::debug!(widget = %id, "pjax request; capturing fragment");
            start_capture(ctx)
        } else {
            open_container(&config, ctx)
        };

        Self { config, id, mode }
    }

    /// Runs `body` inside the widget.
    pub fn widget<F>(
        config: PjaxConfig,
        headers: &RequestHeaders,
        ctx: &mut RenderContext,
        body: F,
    ) -> Result<(), PjaxError>
    where
        F: FnOnce(&mut RenderContext) -> Result<(), PjaxError>,
    {
        let widget = Self::begin(config, headers, ctx);
        body(ctx)?;
        widget.end(ctx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn requires_pjax(&self) -> bool {
        matches!(self.mode, Mode::Capturing { .. })
    }

    /// Ends the widget.
    ///
    /// On a full render this closes the container and registers the client
    /// script. In fragment mode it always returns `Err(PjaxError::Halt)`
    /// carrying the complete response; callers must stop rendering and send it.
    pub fn end(self, ctx: &mut RenderContext) -> Result<(), PjaxError> {
        match &self.mode {
            Mode::FullRender { tag } => {
                ctx.write(&html::close_tag(tag));
                self.register_client_script(ctx)
            }
            Mode::Capturing { level } => {
                let fragment = finish_fragment(*level, ctx)?;
                Err(PjaxError::Halt(fragment))
            }
        }
    }

    fn register_client_script(&self, ctx: &mut RenderContext) -> Result<(), PjaxError> {
        let id = &self.id;
        let config = &self.config;

        let mut options = config.client_options.clone();
        options.insert("push".to_string(), Value::Bool(config.enable_push_state));
        options.insert(
            "replace".to_string(),
            Value::Bool(config.enable_replace_state),
        );
        options.insert("timeout".to_string(), Value::from(config.timeout));
        options.insert("scrollTo".to_string(), config.scroll_to.into());
        if !options.contains_key("container") {
            options.insert("container".to_string(), Value::String(format!("#{id}")));
        }
        let options = js::encode(&Value::Object(options));

        let mut script = String::new();
        if let Some(selector) = config.link_selector.resolve(|| format!("#{id} a")) {
            script.push_str(&format!(
                "jQuery(document).pjax({}, {});",
                js::encode(&Value::String(selector)),
                options
            ));
        }
        if let Some(selector) = config
            .form_selector
            .resolve(|| format!("#{id} form[data-pjax]"))
        {
            script.push_str(&format!(
                "\njQuery(document).on({}, {}, function (event) {{jQuery.pjax.submit(event, {});}});",
                js::encode(&Value::String(config.submit_event.clone())),
                js::encode(&Value::String(selector)),
                options
            ));
        }

        let base_url = ctx.asset_manager.publish(&ctx.pjax_source_dir)?;
        ctx.assets.register_core_script(JQUERY);
        ctx.assets
            .register_script_file(&format!("{base_url}/{PJAX_SCRIPT}"), Position::Head);

        if !script.is_empty() {
            ctx.assets
                .register_script(&script_key(&script), &script, Position::Ready);
        }
        Ok(())
    }
}

fn start_capture(ctx: &mut RenderContext) -> Mode {
    ctx.output.start();
    ctx.replace_assets(|current| Box::new(PjaxClientScript::new(current)));
    ctx.assets.reset();

    if let Some(title) = &ctx.title {
        let title_tag = html::tag("title", &Attributes::new(), &html::encode(title));
        ctx.output.write(&title_tag);
    }

    Mode::Capturing {
        level: ctx.output.level(),
    }
}

fn open_container(config: &PjaxConfig, ctx: &mut RenderContext) -> Mode {
    let mut options = config.options.clone();
    let tag = options
        .shift_remove("tag")
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_TAG.to_string());

    let mut attrs = Attributes::new();
    attrs.insert("data-pjax-container".to_string(), Value::String(String::new()));
    attrs.insert(
        "data-pjax-push-state".to_string(),
        Value::Bool(config.enable_push_state),
    );
    attrs.insert(
        "data-pjax-replace-state".to_string(),
        Value::Bool(config.enable_replace_state),
    );
    attrs.insert("data-pjax-timeout".to_string(), Value::from(config.timeout));
    attrs.insert("data-pjax-scrollto".to_string(), config.scroll_to.into());
    attrs.extend(options);

    ctx.write(&html::open_tag(&tag, &attrs));
    Mode::FullRender { tag }
}

fn finish_fragment(level: usize, ctx: &mut RenderContext) -> Result<FragmentResponse, PjaxError> {
    let underflow = |actual: usize| PjaxError::BufferUnderflow {
        expected: level,
        actual,
    };
    if ctx.output.level() < level {
        return Err(underflow(ctx.output.level()));
    }

    // Stylesheets already on the page must keep their order; do not resend them.
    match ctx.assets.stylesheet_reset() {
        Some(registry) => registry.reset_css_files(),
        None => tracing::warn!("asset registry cannot reset stylesheets"),
    }

    let mut content = ctx
        .output
        .get_clean()
        .ok_or_else(|| underflow(ctx.output.level()))?;
    ctx.assets.render_head(&mut content);
    ctx.assets.render_body_begin(&mut content);
    ctx.assets.render_body_end(&mut content);

    let depth = ctx.output.level();
    for remaining in (1..=depth).rev() {
        if !ctx.output.end_clean() {
            tracing::warn!(level = remaining, "output level refused to close; clearing it");
            ctx.output.clean();
        }
    }

    Ok(FragmentResponse {
        status: 200,
        body: content,
    })
}

fn script_key(script: &str) -> String {
    let mut hasher = DefaultHasher::new();
    script.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
