use crate::PjaxError;
use std::collections::HashMap;
use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Copies bundled files into a web-accessible directory and hands back their
/// public URLs.
///
/// Each source lands in `base_path/<hash>/`, where the hash covers the source
/// path and its modification time, so a changed bundle gets a fresh URL.
#[derive(Debug, Clone)]
pub struct AssetManager {
    base_path: PathBuf,
    base_url: String,
    force_copy: bool,
    published: HashMap<PathBuf, String>,
}

impl AssetManager {
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            force_copy: false,
            published: HashMap::new(),
        }
    }

    pub fn with_force_copy(mut self, force_copy: bool) -> Self {
        self.force_copy = force_copy;
        self
    }

    pub fn published_url(&self, src: &Path) -> Option<&str> {
        self.published.get(src).map(String::as_str)
    }

    /// Publishes a file or a directory and returns its URL. A directory URL
    /// points at the copied directory; a file URL points at the file itself.
    pub fn publish(&mut self, src: &Path) -> Result<String, PjaxError> {
        if let Some(url) = self.published.get(src) {
            return Ok(url.clone());
        }

        let publish_err = |source: io::Error| PjaxError::Publish {
            path: src.to_path_buf(),
            source,
        };
        let meta = fs::metadata(src).map_err(publish_err)?;
        let dir_name = publish_hash(src, &meta);
        let dst_dir = self.base_path.join(&dir_name);

        let url = if meta.is_dir() {
            if self.force_copy || !dst_dir.is_dir() {
                copy_dir(src, &dst_dir).map_err(publish_err)?;
                tracing::debug!(src = %src.display(), dst = %dst_dir.display(), "published asset directory");
            }
            format!("{}/{}", self.base_url, dir_name)
        } else {
            let file_name = src
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    publish_err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "source has no file name",
                    ))
                })?;
            let dst_file = dst_dir.join(&file_name);
            if self.force_copy || !dst_file.is_file() {
                fs::create_dir_all(&dst_dir).map_err(publish_err)?;
                fs::copy(src, &dst_file).map_err(publish_err)?;
                tracing::debug!(src = %src.display(), dst = %dst_file.display(), "published asset file");
            }
            format!("{}/{}/{}", self.base_url, dir_name, file_name)
        };

        self.published.insert(src.to_path_buf(), url.clone());
        Ok(url)
    }
}

fn publish_hash(src: &Path, meta: &fs::Metadata) -> String {
    let mut hasher = DefaultHasher::new();
    src.hash(&mut hasher);
    if let Ok(modified) = meta.modified() {
        if let Ok(duration) = modified.duration_since(UNIX_EPOCH) {
            duration.as_secs().hash(&mut hasher);
        }
    }
    format!("{:08x}", hasher.finish() as u32)
}

fn copy_dir(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copy_dir(&path, &target)?;
        } else {
            fs::copy(&path, &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn unique_temp_dir(prefix: &str) -> PathBuf {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{}-{}-{}", prefix, std::process::id(), ts));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn publish_directory_copies_tree_and_caches_url() {
        let root = unique_temp_dir("pjax-publish-dir");
        let src = root.join("vendor").join("pjax");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("jquery.pjax.js"), "/* pjax */").unwrap();
        fs::write(src.join("nested").join("extra.js"), "/* extra */").unwrap();

        let mut manager = AssetManager::new(root.join("public"), "/assets/");
        let url = manager.publish(&src).expect("publish should succeed");
        assert!(url.starts_with("/assets/"));
        assert_eq!(manager.published_url(&src), Some(url.as_str()));

        let hash = url.trim_start_matches("/assets/");
        let published = root.join("public").join(hash);
        assert_eq!(
            fs::read_to_string(published.join("jquery.pjax.js")).unwrap(),
            "/* pjax */"
        );
        assert!(published.join("nested").join("extra.js").is_file());

        let again = manager.publish(&src).unwrap();
        assert_eq!(url, again);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn publish_file_returns_url_to_the_file() {
        let root = unique_temp_dir("pjax-publish-file");
        let src = root.join("site.css");
        fs::write(&src, "body {}").unwrap();

        let mut manager = AssetManager::new(root.join("public"), "/assets");
        let url = manager.publish(&src).unwrap();
        assert!(url.ends_with("/site.css"));

        let rel = url.trim_start_matches("/assets/");
        assert!(root.join("public").join(rel).is_file());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn publish_missing_source_is_an_error() {
        let root = unique_temp_dir("pjax-publish-missing");
        let mut manager = AssetManager::new(root.join("public"), "/assets");
        let err = manager
            .publish(&root.join("does-not-exist"))
            .expect_err("missing source must fail");
        assert!(matches!(err, PjaxError::Publish { .. }));

        let _ = fs::remove_dir_all(&root);
    }
}
