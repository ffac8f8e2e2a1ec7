//! View loader implementations.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::views::{LoadError, LoadedView, ViewLoader, ViewRef};

/// Reads view bundles from a directory.
#[derive(Debug, Clone)]
pub struct FsViewLoader {
    root: PathBuf,
}

impl FsViewLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn module_path(&self, module: &str) -> Option<PathBuf> {
        let relative = Path::new(module);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        safe.then(|| self.root.join(relative))
    }
}

impl ViewLoader for FsViewLoader {
    fn load<'a>(&'a self, view: &'a ViewRef) -> BoxFuture<'a, Result<LoadedView, LoadError>> {
        async move {
            let path = self.module_path(&view.module).ok_or_else(|| LoadError::Rejected {
                module: view.module.clone(),
                reason: "path escapes the views directory".to_string(),
            })?;

            match tokio::fs::read(&path).await {
                Ok(contents) => Ok(LoadedView::new(view.module.clone(), contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(LoadError::NotFound(view.module.clone()))
                }
                Err(e) => Err(LoadError::Io {
                    module: view.module.clone(),
                    message: e.to_string(),
                }),
            }
        }
        .boxed()
    }
}

/// Loader for deployments without a bundle directory.
///
/// Every module loads as an empty view; only the routing decision is served.
#[derive(Debug, Clone, Default)]
pub struct ManifestViewLoader;

impl ViewLoader for ManifestViewLoader {
    fn load<'a>(&'a self, view: &'a ViewRef) -> BoxFuture<'a, Result<LoadedView, LoadError>> {
        async move { Ok(LoadedView::new(view.module.clone(), Vec::new())) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(module: &str) -> ViewRef {
        ViewRef {
            module: module.to_string(),
            eager: false,
        }
    }

    #[tokio::test]
    async fn test_fs_loader_reads_bundle() {
        let root =
            std::env::temp_dir().join(format!("study-router-views-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(root.join("views")).await.unwrap();
        tokio::fs::write(root.join("views/Quiz.vue"), b"<quiz/>").await.unwrap();

        let loader = FsViewLoader::new(&root);
        let loaded = loader.load(&view("views/Quiz.vue")).await.unwrap();
        assert_eq!(loaded.size_bytes, 7);
        assert_eq!(&*loaded.contents, b"<quiz/>");

        let missing = loader.load(&view("views/Missing.vue")).await;
        assert_eq!(missing.unwrap_err(), LoadError::NotFound("views/Missing.vue".into()));

        let escaped = loader.load(&view("../etc/passwd")).await;
        assert!(matches!(escaped, Err(LoadError::Rejected { .. })));

        tokio::fs::remove_dir_all(&root).await.unwrap_or_default();
    }

    #[tokio::test]
    async fn test_manifest_loader() {
        let loaded = ManifestViewLoader.load(&view("views/Home.vue")).await.unwrap();
        assert_eq!(loaded.module, "views/Home.vue");
        assert_eq!(loaded.size_bytes, 0);
    }
}
