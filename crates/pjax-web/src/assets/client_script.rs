use super::{
    AssetRegistry, PendingAssets, Position, css_file_tag, inline_script_tag, insert_body_begin,
    insert_body_end, insert_head, script_file_tag,
};
use indexmap::{IndexMap, IndexSet};

const JQUERY: &str = "jquery";

/// Default asset registry.
///
/// Core scripts are registered by name and resolved through a URL table at
/// render time; names without a URL are skipped.
#[derive(Debug, Clone, Default)]
pub struct ClientScript {
    core_urls: IndexMap<String, String>,
    core_scripts: IndexSet<String>,
    script_files: IndexMap<Position, IndexSet<String>>,
    scripts: IndexMap<Position, IndexMap<String, String>>,
    css_files: IndexMap<String, String>,
    css: IndexMap<String, (String, String)>,
}

impl ClientScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_core_script(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.core_urls.insert(name.into(), url.into());
        self
    }

    pub fn with_core_scripts<I, K, V>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, url) in entries {
            self.core_urls.insert(name.into(), url.into());
        }
        self
    }

    fn render_core_scripts(&self) -> String {
        let mut html = String::new();
        for name in &self.core_scripts {
            match self.core_urls.get(name) {
                Some(url) => html.push_str(&script_file_tag(url)),
                None => tracing::warn!(script = %name, "core script has no url; skipped"),
            }
        }
        html
    }

    fn render_files(&self, position: Position) -> String {
        self.script_files
            .get(&position)
            .map(|files| files.iter().map(|url| script_file_tag(url)).collect())
            .unwrap_or_default()
    }

    fn scripts_at(&self, position: Position) -> Vec<&str> {
        self.scripts
            .get(&position)
            .map(|scripts| scripts.values().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl AssetRegistry for ClientScript {
    fn register_core_script(&mut self, name: &str) {
        self.core_scripts.insert(name.to_string());
    }

    fn register_script_file(&mut self, url: &str, position: Position) {
        self.script_files
            .entry(position)
            .or_default()
            .insert(url.to_string());
    }

    fn register_script(&mut self, id: &str, script: &str, position: Position) {
        if matches!(position, Position::Ready | Position::Load) {
            self.register_core_script(JQUERY);
        }
        self.scripts
            .entry(position)
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| script.to_string());
    }

    fn register_css_file(&mut self, url: &str, media: &str) {
        self.css_files
            .entry(url.to_string())
            .or_insert_with(|| media.to_string());
    }

    fn register_css(&mut self, id: &str, css: &str, media: &str) {
        self.css
            .entry(id.to_string())
            .or_insert_with(|| (css.to_string(), media.to_string()));
    }

    fn is_script_file_registered(&self, url: &str, position: Position) -> bool {
        self.script_files
            .get(&position)
            .is_some_and(|files| files.contains(url))
    }

    fn is_script_registered(&self, id: &str, position: Position) -> bool {
        self.scripts
            .get(&position)
            .is_some_and(|scripts| scripts.contains_key(id))
    }

    fn is_css_file_registered(&self, url: &str) -> bool {
        self.css_files.contains_key(url)
    }

    fn take_css_files(&mut self) -> IndexMap<String, String> {
        std::mem::take(&mut self.css_files)
    }

    fn reset(&mut self) {
        self.core_scripts.clear();
        self.script_files.clear();
        self.scripts.clear();
        self.css_files.clear();
        self.css.clear();
    }

    fn pending(&self) -> PendingAssets {
        PendingAssets {
            core_scripts: self.core_scripts.iter().cloned().collect(),
            script_files: self
                .script_files
                .iter()
                .flat_map(|(pos, files)| files.iter().map(move |url| (*pos, url.clone())))
                .collect(),
            scripts: self
                .scripts
                .iter()
                .flat_map(|(pos, scripts)| scripts.keys().map(move |id| (*pos, id.clone())))
                .collect(),
            css_files: self.css_files.keys().cloned().collect(),
            css: self.css.keys().cloned().collect(),
        }
    }

    fn render_head(&self, output: &mut String) {
        let mut html = self.render_core_scripts();
        for (url, media) in &self.css_files {
            html.push_str(&css_file_tag(url, media));
        }
        for (css, media) in self.css.values() {
            if media.is_empty() {
                html.push_str(&format!("<style type=\"text/css\">\n{}\n</style>\n", css));
            } else {
                html.push_str(&format!(
                    "<style type=\"text/css\" media=\"{}\">\n{}\n</style>\n",
                    crate::html::encode(media),
                    css
                ));
            }
        }
        html.push_str(&self.render_files(Position::Head));
        let head_scripts = self.scripts_at(Position::Head);
        if !head_scripts.is_empty() {
            html.push_str(&inline_script_tag(&head_scripts.join("\n")));
        }
        insert_head(output, &html);
    }

    fn render_body_begin(&self, output: &mut String) {
        let mut html = self.render_files(Position::Begin);
        let scripts = self.scripts_at(Position::Begin);
        if !scripts.is_empty() {
            html.push_str(&inline_script_tag(&scripts.join("\n")));
        }
        insert_body_begin(output, &html);
    }

    fn render_body_end(&self, output: &mut String) {
        let mut html = self.render_files(Position::End);

        let mut blocks = self
            .scripts_at(Position::End)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let ready = self.scripts_at(Position::Ready);
        if !ready.is_empty() {
            blocks.push(format!("jQuery(function($) {{\n{}\n}});", ready.join("\n")));
        }
        let load = self.scripts_at(Position::Load);
        if !load.is_empty() {
            blocks.push(format!(
                "jQuery(window).on('load',function() {{\n{}\n}});",
                load.join("\n")
            ));
        }
        if !blocks.is_empty() {
            html.push_str(&inline_script_tag(&blocks.join("\n")));
        }
        insert_body_end(output, &html);
    }
}
