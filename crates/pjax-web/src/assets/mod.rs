//! Bookkeeping for the scripts and stylesheets a page wants included.

mod client_script;
mod pjax_client_script;
pub mod publish;

use indexmap::IndexMap;

pub use client_script::ClientScript;
pub use pjax_client_script::PjaxClientScript;
pub use publish::AssetManager;

/// Where a script is placed in the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// Inside `<head>`.
    Head,
    /// Right after the opening `<body>` tag.
    Begin,
    /// Right before the closing `</body>` tag.
    End,
    /// Wrapped in a window `load` handler at the end of the body.
    Load,
    /// Wrapped in a document-ready handler at the end of the body.
    Ready,
}

/// Snapshot of everything queued on a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingAssets {
    pub core_scripts: Vec<String>,
    pub script_files: Vec<(Position, String)>,
    pub scripts: Vec<(Position, String)>,
    pub css_files: Vec<String>,
    pub css: Vec<String>,
}

pub trait AssetRegistry {
    fn register_core_script(&mut self, name: &str);
    fn register_script_file(&mut self, url: &str, position: Position);
    fn register_script(&mut self, id: &str, script: &str, position: Position);
    fn register_css_file(&mut self, url: &str, media: &str);
    fn register_css(&mut self, id: &str, css: &str, media: &str);

    fn is_script_file_registered(&self, url: &str, position: Position) -> bool;
    fn is_script_registered(&self, id: &str, position: Position) -> bool;
    fn is_css_file_registered(&self, url: &str) -> bool;

    /// Drops every pending registration.
    fn reset(&mut self);
    fn pending(&self) -> PendingAssets;

    fn render_head(&self, output: &mut String);
    fn render_body_begin(&self, output: &mut String);
    fn render_body_end(&self, output: &mut String);

    /// Removes and returns the queued stylesheet files, keyed by URL with
    /// their media value.
    fn take_css_files(&mut self) -> IndexMap<String, String> {
        IndexMap::new()
    }

    /// Returns the stylesheet reset capability when this registry has one.
    fn stylesheet_reset(&mut self) -> Option<&mut dyn StylesheetReset> {
        None
    }
}

/// Clears pending stylesheet files while leaving scripts and inline styles alone.
pub trait StylesheetReset {
    fn reset_css_files(&mut self);
}

pub(crate) fn css_file_tag(url: &str, media: &str) -> String {
    let media_attr = if media.is_empty() {
        String::new()
    } else {
        format!(" media=\"{}\"", crate::html::encode(media))
    };
    format!(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\"{} />\n",
        crate::html::encode(url),
        media_attr
    )
}

pub(crate) fn script_file_tag(url: &str) -> String {
    format!(
        "<script type=\"text/javascript\" src=\"{}\"></script>\n",
        crate::html::encode(url)
    )
}

pub(crate) fn inline_script_tag(script: &str) -> String {
    format!("<script type=\"text/javascript\">\n{}\n</script>\n", script)
}

/// Inserts before the first `<title>` or `</head>`, else prepends.
pub(crate) fn insert_head(output: &mut String, html: &str) {
    if html.is_empty() {
        return;
    }
    let lower = output.to_ascii_lowercase();
    let title = find_tag_start(&lower, "<title");
    let head_end = lower.find("</head");
    let idx = match (title, head_end) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    match idx {
        Some(idx) => output.insert_str(idx, html),
        None => output.insert_str(0, html),
    }
}

/// Inserts right after the opening `<body ...>` tag, else prepends.
pub(crate) fn insert_body_begin(output: &mut String, html: &str) {
    if html.is_empty() {
        return;
    }
    let lower = output.to_ascii_lowercase();
    let after_body = find_tag_start(&lower, "<body")
        .and_then(|start| lower[start..].find('>').map(|end| start + end + 1));
    match after_body {
        Some(idx) => output.insert_str(idx, html),
        None => output.insert_str(0, html),
    }
}

/// Inserts before the last `</body>`, else appends.
pub(crate) fn insert_body_end(output: &mut String, html: &str) {
    if html.is_empty() {
        return;
    }
    match output.to_ascii_lowercase().rfind("</body") {
        Some(idx) => output.insert_str(idx, html),
        None => output.push_str(html),
    }
}

fn find_tag_start(lower: &str, open: &str) -> Option<usize> {
    let mut from = 0usize;
    while let Some(rel) = lower[from..].find(open) {
        let start = from + rel;
        let next = lower[start + open.len()..].chars().next();
        if matches!(next, Some(c) if c == '>' || c == '/' || c.is_ascii_whitespace()) {
            return Some(start);
        }
        from = start + open.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_insertion_prefers_title_over_head_close() {
        let mut html = "<html><head><meta charset=\"utf-8\"><TITLE>x</TITLE></head>".to_string();
        insert_head(&mut html, "<!--h-->");
        assert_eq!(
            html,
            "<html><head><meta charset=\"utf-8\"><!--h--><TITLE>x</TITLE></head>"
        );
    }

    #[test]
    fn head_insertion_prepends_without_head() {
        let mut html = "<p>fragment</p>".to_string();
        insert_head(&mut html, "<!--h-->");
        assert_eq!(html, "<!--h--><p>fragment</p>");
    }

    #[test]
    fn body_begin_skips_lookalike_tags() {
        let mut html = "<bodyguard></bodyguard><body class=\"a\">x</body>".to_string();
        insert_body_begin(&mut html, "<!--b-->");
        assert_eq!(html, "<bodyguard></bodyguard><body class=\"a\"><!--b-->x</body>");
    }

    #[test]
    fn body_end_appends_without_body() {
        let mut html = "<p>fragment</p>".to_string();
        insert_body_end(&mut html, "<!--e-->");
        assert_eq!(html, "<p>fragment</p><!--e-->");

        let mut page = "<body>x</body></html>".to_string();
        insert_body_end(&mut page, "<!--e-->");
        assert_eq!(page, "<body>x<!--e--></body></html>");
    }
}
