//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::MergeService;
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Parse, merge and write documents
    pub merge_service: MergeService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let merge_service = MergeService::new(Arc::clone(&fs));

        Self {
            settings,
            fs,
            merge_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::domain::MergeOptions;

    #[derive(Default)]
    struct MemoryFileSystem {
        files: Mutex<HashMap<PathBuf, String>>,
    }

    impl MemoryFileSystem {
        fn with_file(self, path: &str, content: &str) -> Self {
            self.files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), content.to_string());
            self
        }
    }

    impl FileSystem for MemoryFileSystem {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn write(&self, path: &Path, content: &str) -> io::Result<()> {
            let mut files = self.files.lock().unwrap();
            if files.contains_key(path) {
                return Err(io::Error::from(io::ErrorKind::AlreadyExists));
            }
            files.insert(path.to_path_buf(), content.to_string());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn is_file(&self, path: &Path) -> bool {
            self.exists(path)
        }
    }

    #[test]
    fn given_injected_filesystem_when_merging_then_services_use_it() {
        let fs = Arc::new(
            MemoryFileSystem::default()
                .with_file("base.yaml", "a: 1\nb: 2\n")
                .with_file("over.yaml", "b: nil\nc: 3\n"),
        );
        let container = ServiceContainer::with_deps(Settings::default(), fs.clone());
        let inputs = [PathBuf::from("base.yaml"), PathBuf::from("over.yaml")];

        let merged = container
            .merge_service
            .merge_files(&inputs, &MergeOptions::default())
            .unwrap();
        container
            .merge_service
            .write_output(&merged, Path::new("out.yaml"), container.settings.output_indent)
            .unwrap();

        assert_eq!(
            fs.read_to_string(Path::new("out.yaml")).unwrap(),
            "a: 1\nc: 3\n"
        );
        assert!(container.fs.exists(Path::new("out.yaml")));
    }
}
