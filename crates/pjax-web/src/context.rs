use crate::assets::{AssetManager, AssetRegistry, ClientScript};
use crate::output::OutputStack;
use crate::SiteConfig;
use std::path::PathBuf;

/// Per-request rendering state: the response body being built, the asset
/// registry, and the services widgets need while rendering.
pub struct RenderContext {
    pub output: OutputStack,
    pub assets: Box<dyn AssetRegistry>,
    pub asset_manager: AssetManager,
    pub title: Option<String>,
    pub pjax_source_dir: PathBuf,
    widget_counter: usize,
}

impl RenderContext {
    pub fn new(site: &SiteConfig) -> Self {
        let client_script = ClientScript::new().with_core_scripts(
            site.core_scripts
                .iter()
                .map(|(name, url)| (name.clone(), url.clone())),
        );
        let asset_manager =
            AssetManager::new(site.asset_base_path.clone(), site.asset_base_url.clone())
                .with_force_copy(site.force_copy);

        Self {
            output: OutputStack::new(),
            assets: Box::new(client_script),
            asset_manager,
            title: None,
            pjax_source_dir: site.pjax_source_dir.clone(),
            widget_counter: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn write(&mut self, s: &str) {
        self.output.write(s);
    }

    /// Auto-generated widget id: `w0`, `w1`, ...
    pub fn next_widget_id(&mut self) -> String {
        let id = format!("w{}", self.widget_counter);
        self.widget_counter += 1;
        id
    }

    /// Swaps the asset registry for one built around the current registry.
    pub fn replace_assets<F>(&mut self, wrap: F)
    where
        F: FnOnce(Box<dyn AssetRegistry>) -> Box<dyn AssetRegistry>,
    {
        let current = std::mem::replace(&mut self.assets, Box::new(ClientScript::new()));
        self.assets = wrap(current);
    }

    /// Finishes a full page: closes every buffer level and lets the registry
    /// inject its head and body markup.
    pub fn finish(self) -> String {
        let mut html = self.output.into_body();
        self.assets.render_head(&mut html);
        self.assets.render_body_begin(&mut html);
        self.assets.render_body_end(&mut html);
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{PjaxClientScript, Position};
    use std::path::Path;

    #[test]
    fn finish_injects_registered_assets_into_page() {
        let mut site = SiteConfig::minimal(Path::new("/tmp/pjax-context"));
        site.core_scripts
            .insert("jquery".to_string(), "/js/jquery.js".to_string());
        let mut ctx = RenderContext::new(&site);
        ctx.write("<html><head><title>T</title></head><body>");
        ctx.output.start();
        ctx.write("<p>content</p>");
        ctx.write("</body></html>");
        ctx.assets.register_script("x", "x();", Position::Ready);

        let html = ctx.finish();
        assert!(html.starts_with("<html><head><script"));
        assert!(html.contains("/js/jquery.js"));
        assert!(html.contains("<p>content</p>"));
        assert!(html.contains("x();\n});"));
    }

    #[test]
    fn widget_ids_increment() {
        let mut ctx = RenderContext::new(&SiteConfig::minimal(Path::new(".")));
        assert_eq!(ctx.next_widget_id(), "w0");
        assert_eq!(ctx.next_widget_id(), "w1");
    }

    #[test]
    fn replace_assets_keeps_existing_registrations() {
        let mut ctx = RenderContext::new(&SiteConfig::minimal(Path::new(".")));
        ctx.assets.register_script_file("/app.js", Position::End);
        ctx.assets.register_css_file("/site.css", "");
        ctx.replace_assets(|inner| Box::new(PjaxClientScript::new(inner)));
        assert!(ctx.assets.stylesheet_reset().is_some());
        assert!(ctx.assets.is_script_file_registered("/app.js", Position::End));
        assert!(ctx.assets.is_css_file_registered("/site.css"));

        ctx.replace_assets(|inner| Box::new(PjaxClientScript::new(inner)));
        assert!(ctx.assets.stylesheet_reset().is_some());
    }
}
