use super::{AssetRegistry, PendingAssets, Position, StylesheetReset, css_file_tag, insert_head};
use indexmap::IndexMap;

/// Wraps any registry and takes over stylesheet-file bookkeeping so those
/// files can be dropped on their own. Everything else is delegated.
///
/// Stylesheets already queued on the wrapped registry move into the wrapper.
pub struct PjaxClientScript {
    inner: Box<dyn AssetRegistry>,
    css_files: IndexMap<String, String>,
}

impl PjaxClientScript {
    pub fn new(mut inner: Box<dyn AssetRegistry>) -> Self {
        let css_files = inner.take_css_files();
        Self { inner, css_files }
    }
}

impl StylesheetReset for PjaxClientScript {
    fn reset_css_files(&mut self) {
        self.css_files.clear();
    }
}

impl AssetRegistry for PjaxClientScript {
    fn register_core_script(&mut self, name: &str) {
        self.inner.register_core_script(name);
    }

    fn register_script_file(&mut self, url: &str, position: Position) {
        self.inner.register_script_file(url, position);
    }

    fn register_script(&mut self, id: &str, script: &str, position: Position) {
        self.inner.register_script(id, script, position);
    }

    fn register_css_file(&mut self, url: &str, media: &str) {
        self.css_files
            .entry(url.to_string())
            .or_insert_with(|| media.to_string());
    }

    fn register_css(&mut self, id: &str, css: &str, media: &str) {
        self.inner.register_css(id, css, media);
    }

    fn is_script_file_registered(&self, url: &str, position: Position) -> bool {
        self.inner.is_script_file_registered(url, position)
    }

    fn is_script_registered(&self, id: &str, position: Position) -> bool {
        self.inner.is_script_registered(id, position)
    }

    fn is_css_file_registered(&self, url: &str) -> bool {
        self.css_files.contains_key(url) || self.inner.is_css_file_registered(url)
    }

    fn take_css_files(&mut self) -> IndexMap<String, String> {
        let mut files = std::mem::take(&mut self.css_files);
        for (url, media) in self.inner.take_css_files() {
            files.entry(url).or_insert(media);
        }
        files
    }

    fn reset(&mut self) {
        self.css_files.clear();
        self.inner.reset();
    }

    fn pending(&self) -> PendingAssets {
        let mut pending = self.inner.pending();
        pending.css_files.extend(self.css_files.keys().cloned());
        pending
    }

    fn render_head(&self, output: &mut String) {
        let links: String = self
            .css_files
            .iter()
            .map(|(url, media)| css_file_tag(url, media))
            .collect();
        insert_head(output, &links);
        self.inner.render_head(output);
    }

    fn render_body_begin(&self, output: &mut String) {
        self.inner.render_body_begin(output);
    }

    fn render_body_end(&self, output: &mut String) {
        self.inner.render_body_end(output);
    }

    fn stylesheet_reset(&mut self) -> Option<&mut dyn StylesheetReset> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ClientScript;

    #[test]
    fn reset_css_files_keeps_scripts_and_inline_styles() {
        let mut cs = PjaxClientScript::new(Box::new(ClientScript::new()));
        cs.register_css_file("/grid.css", "");
        cs.register_css("grid-inline", ".grid { }", "");
        cs.register_script_file("/grid.js", Position::End);
        cs.register_script("grid", "grid();", Position::Ready);

        cs.stylesheet_reset()
            .expect("decorator exposes stylesheet reset")
            .reset_css_files();

        let pending = cs.pending();
        assert!(pending.css_files.is_empty());
        assert_eq!(pending.css, vec!["grid-inline".to_string()]);
        assert_eq!(
            pending.script_files,
            vec![(Position::End, "/grid.js".to_string())]
        );
        assert_eq!(pending.scripts, vec![(Position::Ready, "grid".to_string())]);
    }

    #[test]
    fn stylesheet_links_render_ahead_of_inner_head_content() {
        let mut cs = PjaxClientScript::new(Box::new(ClientScript::new()));
        cs.register_script_file("/head.js", Position::Head);
        cs.register_css_file("/site.css", "");

        let mut out = "<head><title>T</title></head>".to_string();
        cs.render_head(&mut out);
        let css_at = out.find("/site.css").expect("link rendered");
        let js_at = out.find("/head.js").expect("script rendered");
        assert!(css_at < js_at);
        assert!(js_at < out.find("<title>").expect("title kept"));
    }

    #[test]
    fn reset_css_files_drops_stylesheets_queued_before_wrapping() {
        let mut inner = ClientScript::new();
        inner.register_css_file("/layout.css", "");
        inner.register_script_file("/layout.js", Position::End);

        let mut cs = PjaxClientScript::new(Box::new(inner));
        assert!(cs.is_css_file_registered("/layout.css"));
        cs.register_css_file("/layout.css", "");
        cs.register_css_file("/grid.css", "");
        assert_eq!(
            cs.pending().css_files,
            vec!["/layout.css".to_string(), "/grid.css".to_string()]
        );

        cs.stylesheet_reset()
            .expect("decorator exposes stylesheet reset")
            .reset_css_files();

        assert!(cs.pending().css_files.is_empty());
        assert!(cs.is_script_file_registered("/layout.js", Position::End));

        let mut out = "<p>fragment</p>".to_string();
        cs.render_head(&mut out);
        assert_eq!(out, "<p>fragment</p>");
    }

    #[test]
    fn wrapping_twice_keeps_stylesheets_in_the_outer_layer() {
        let mut inner = ClientScript::new();
        inner.register_css_file("/a.css", "print");
        let mut once = PjaxClientScript::new(Box::new(inner));
        once.register_css_file("/b.css", "");

        let mut twice = PjaxClientScript::new(Box::new(once));
        assert_eq!(
            twice.pending().css_files,
            vec!["/a.css".to_string(), "/b.css".to_string()]
        );

        let mut out = "<head></head>".to_string();
        twice.render_head(&mut out);
        assert_eq!(out.matches("/a.css").count(), 1);
        assert!(out.contains("media=\"print\""));

        twice
            .stylesheet_reset()
            .expect("decorator exposes stylesheet reset")
            .reset_css_files();
        assert!(twice.pending().css_files.is_empty());
    }

    #[test]
    fn plain_registry_has_no_reset_capability() {
        let mut cs = ClientScript::new();
        assert!(cs.stylesheet_reset().is_none());
    }
}
