use crate::PjaxError;
use crate::html::Attributes;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Which elements trigger PJAX navigation.
///
/// Deserializes from `false` (disabled), a selector string, or `null`/absent
/// (the widget default).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selector {
    #[default]
    Default,
    Disabled,
    Custom(String),
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Css(String),
        }

        Ok(match Option::<Repr>::deserialize(deserializer)? {
            None | Some(Repr::Flag(true)) => Self::Default,
            Some(Repr::Flag(false)) => Self::Disabled,
            Some(Repr::Css(css)) => Self::Custom(css),
        })
    }
}

impl Selector {
    /// Resolves to the selector string, or `None` when disabled.
    pub fn resolve(&self, default: impl FnOnce() -> String) -> Option<String> {
        match self {
            Self::Default => Some(default()),
            Self::Disabled => None,
            Self::Custom(css) => Some(css.clone()),
        }
    }
}

/// Scroll behavior after a fragment is swapped in: `false` for none, or a
/// vertical offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScrollTo {
    Flag(bool),
    Offset(i64),
}

impl Default for ScrollTo {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl From<ScrollTo> for Value {
    fn from(scroll: ScrollTo) -> Self {
        match scroll {
            ScrollTo::Flag(b) => Value::Bool(b),
            ScrollTo::Offset(n) => Value::from(n),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PjaxConfig {
    /// Container attributes. `tag` picks the element name and `id` the widget id.
    #[serde(default)]
    pub options: Attributes,
    #[serde(default)]
    pub link_selector: Selector,
    #[serde(default)]
    pub form_selector: Selector,
    #[serde(default = "default_submit_event")]
    pub submit_event: String,
    #[serde(default = "default_true")]
    pub enable_push_state: bool,
    #[serde(default)]
    pub enable_replace_state: bool,
    /// Milliseconds before the client falls back to a full page load.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub scroll_to: ScrollTo,
    /// Passed verbatim to the client library.
    #[serde(default)]
    pub client_options: Map<String, Value>,
}

fn default_submit_event() -> String {
    "submit".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    1000
}

impl Default for PjaxConfig {
    fn default() -> Self {
        Self {
            options: Attributes::new(),
            link_selector: Selector::Default,
            form_selector: Selector::Default,
            submit_event: default_submit_event(),
            enable_push_state: true,
            enable_replace_state: false,
            timeout: default_timeout(),
            scroll_to: ScrollTo::default(),
            client_options: Map::new(),
        }
    }
}

impl PjaxConfig {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.options.insert("id".to_string(), Value::String(id.into()));
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.options.get("id").and_then(Value::as_str)
    }
}

/// Site-wide settings shared by every page render.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default)]
    pub asset_base_path: PathBuf,
    #[serde(default = "default_asset_base_url")]
    pub asset_base_url: String,
    /// Directory holding the bundled client library (`jquery.pjax.js`).
    #[serde(default)]
    pub pjax_source_dir: PathBuf,
    #[serde(default)]
    pub core_scripts: IndexMap<String, String>,
    #[serde(default)]
    pub force_copy: bool,
}

fn default_asset_base_url() -> String {
    "/assets".to_string()
}

impl SiteConfig {
    pub fn minimal(root: &Path) -> Self {
        Self {
            asset_base_path: root.join("assets"),
            asset_base_url: default_asset_base_url(),
            pjax_source_dir: root.join("vendor").join("yii2-pjax"),
            core_scripts: IndexMap::new(),
            force_copy: false,
        }
    }

    /// Loads `path`, resolving relative directories against its parent. A
    /// missing file yields `minimal` for that parent.
    pub fn load(path: &Path) -> Result<Self, PjaxError> {
        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no site config; using defaults");
            return Ok(Self::minimal(&root));
        }

        let config_err = |message: String| PjaxError::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let mut cfg =
            serde_json::from_str::<SiteConfig>(&content).map_err(|e| config_err(e.to_string()))?;

        let defaults = Self::minimal(&root);
        if cfg.asset_base_path.as_os_str().is_empty() {
            cfg.asset_base_path = defaults.asset_base_path;
        } else if !cfg.asset_base_path.is_absolute() {
            cfg.asset_base_path = root.join(&cfg.asset_base_path);
        }
        if cfg.pjax_source_dir.as_os_str().is_empty() {
            cfg.pjax_source_dir = defaults.pjax_source_dir;
        } else if !cfg.pjax_source_dir.is_absolute() {
            cfg.pjax_source_dir = root.join(&cfg.pjax_source_dir);
        }
        Ok(cfg)
    }
}
