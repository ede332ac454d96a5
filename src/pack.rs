//! Template pack discovery.
//!
//! A pack is a directory tree of templates identified by a kind and a name
//! (`go/service`). Packs live either under a filesystem root or in a set of
//! files bundled into the binary.

use crate::error::{Result, ScaffoldError};
use crate::template::Template;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// A file compiled into the binary, addressed by a `/`-separated path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundledFile {
    pub path: &'static str,
    pub contents: &'static [u8],
}

/// A resolved template pack
#[derive(Debug, Clone)]
pub enum Pack {
    Filesystem {
        name: String,
        root: PathBuf,
    },
    Bundled {
        name: String,
        prefix: String,
        files: &'static [BundledFile],
    },
}

impl Pack {
    pub fn name(&self) -> &str {
        match self {
            Pack::Filesystem { name, .. } | Pack::Bundled { name, .. } => name,
        }
    }

    /// Lists the pack's files as `/`-separated paths relative to the pack root,
    /// in lexical walk order. Directories are never listed.
    ///
    /// # Errors
    ///
    /// - `ScaffoldError::WalkDir` if the pack directory cannot be traversed.
    pub fn entries(&self) -> Result<Vec<String>> {
        match self {
            Pack::Filesystem { root, .. } => {
                let mut entries = Vec::new();
                for entry in WalkDir::new(root)
                    .follow_links(true)
                    .sort_by_file_name()
                    .min_depth(1)
                {
                    let entry = entry?;
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if let Ok(rel) = entry.path().strip_prefix(root) {
                        entries.push(to_slash_path(rel));
                    }
                }
                Ok(entries)
            }
            Pack::Bundled { prefix, files, .. } => {
                let mut entries: Vec<String> = files
                    .iter()
                    .filter_map(|f| f.path.strip_prefix(prefix.as_str()))
                    .filter_map(|rest| rest.strip_prefix('/'))
                    .filter(|rel| !rel.is_empty())
                    .map(str::to_string)
                    .collect();
                entries.sort_by(|a, b| a.split('/').cmp(b.split('/')));
                Ok(entries)
            }
        }
    }

    /// Opens a file of the pack by its relative path.
    ///
    /// # Errors
    ///
    /// - `ScaffoldError::Io` if the file does not exist or cannot be opened.
    pub fn open(&self, rel: &str) -> Result<Box<dyn Read + '_>> {
        match self {
            Pack::Filesystem { root, .. } => Ok(Box::new(File::open(root.join(rel))?)),
            Pack::Bundled { prefix, files, .. } => {
                let path = format!("{prefix}/{rel}");
                let file = files.iter().find(|f| f.path == path).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, format!("{path} is not bundled"))
                })?;
                Ok(Box::new(file.contents))
            }
        }
    }

    /// Loads every file of the pack as a template, in [`Pack::entries`] order.
    ///
    /// # Errors
    ///
    /// - `ScaffoldError::Load` naming the first file that failed to load.
    /// - `ScaffoldError::WalkDir` if the pack directory cannot be traversed.
    pub fn load_templates(&self) -> Result<Vec<Template>> {
        let mut templates = Vec::new();
        for rel in self.entries()? {
            let reader = self
                .open(&rel)
                .map_err(|e| ScaffoldError::loading(rel.as_str(), e))?;
            templates.push(Template::load(&rel, reader)?);
        }
        debug!(pack = self.name(), count = templates.len(), "loaded templates");
        Ok(templates)
    }
}

/// A source of packs
#[derive(Debug, Clone)]
pub enum PackProvider {
    /// Packs are `<root>/<kind>/<name>` directories
    Filesystem(PathBuf),
    /// Packs are `<kind>/<name>/` path prefixes of bundled files
    Bundled(&'static [BundledFile]),
}

impl PackProvider {
    /// Resolves the pack `kind/name`. An empty `kind` is ignored.
    ///
    /// # Errors
    ///
    /// - `ScaffoldError::PackNotFound` if this provider has no such pack.
    pub fn provide(&self, kind: &str, name: &str) -> Result<Pack> {
        let pack_name = join_pack_name(kind, name);

        match self {
            PackProvider::Filesystem(root) => {
                let dir = root.join(&pack_name);
                if !dir.is_dir() {
                    return Err(self.not_found(pack_name));
                }
                Ok(Pack::Filesystem {
                    name: pack_name,
                    root: dir,
                })
            }
            PackProvider::Bundled(files) => {
                let prefix = format!("{pack_name}/");
                if !files.iter().any(|f| f.path.starts_with(&prefix)) {
                    return Err(self.not_found(pack_name));
                }
                Ok(Pack::Bundled {
                    prefix: pack_name.clone(),
                    name: pack_name,
                    files: *files,
                })
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            PackProvider::Filesystem(root) => root.display().to_string(),
            PackProvider::Bundled(_) => "<bundled>".to_string(),
        }
    }

    fn not_found(&self, name: String) -> ScaffoldError {
        ScaffoldError::PackNotFound {
            name,
            searched: self.describe(),
        }
    }
}

/// Tries a list of providers in registration order
#[derive(Debug, Clone, Default)]
pub struct PackLoader {
    providers: Vec<PackProvider>,
}

impl PackLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: PackProvider) -> &mut Self {
        self.providers.push(provider);
        self
    }

    /// Returns the pack from the first provider that has it.
    ///
    /// # Errors
    ///
    /// - `ScaffoldError::PackNotFound` listing every provider searched.
    pub fn provide(&self, kind: &str, name: &str) -> Result<Pack> {
        for provider in &self.providers {
            match provider.provide(kind, name) {
                Ok(pack) => return Ok(pack),
                Err(e) => debug!(provider = %provider.describe(), "{e}"),
            }
        }

        Err(ScaffoldError::PackNotFound {
            name: join_pack_name(kind, name),
            searched: self
                .providers
                .iter()
                .map(PackProvider::describe)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Loads the pack `kind/name` from the first of `roots` that contains it.
///
/// # Errors
///
/// - `ScaffoldError::PackNotFound` if no root has the pack.
pub fn load_pack<P: AsRef<Path>>(roots: &[P], kind: &str, name: &str) -> Result<Pack> {
    let mut loader = PackLoader::new();
    for root in roots {
        loader.register(PackProvider::Filesystem(root.as_ref().to_path_buf()));
    }
    loader.provide(kind, name)
}

fn join_pack_name(kind: &str, name: &str) -> String {
    [kind, name]
        .iter()
        .map(|part| part.trim_matches('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateName;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    static BUNDLED: &[BundledFile] = &[
        BundledFile {
            path: "go/cli/z.txt",
            contents: b"z\n",
        },
        BundledFile {
            path: "go/cli/main.go.template",
            contents: b"!!filename {{ name }}.go\npackage main\n",
        },
        BundledFile {
            path: "go/cli/cmd/root.go",
            contents: b"package cmd\n",
        },
        BundledFile {
            path: "go/client/x.txt",
            contents: b"x\n",
        },
    ];

    fn write_pack(root: &Path, pack: &str, files: &[(&str, &str)]) {
        for (rel, content) in files {
            let path = root.join(pack).join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn test_filesystem_entries_in_walk_order() {
        let temp_dir = TempDir::new().unwrap();
        write_pack(
            temp_dir.path(),
            "go/service",
            &[
                ("z.txt", "z"),
                ("sub/b.txt.template", "b"),
                ("a.txt", "a"),
                ("sub/deeper/c.txt", "c"),
            ],
        );

        let pack = PackProvider::Filesystem(temp_dir.path().to_path_buf())
            .provide("go", "service")
            .unwrap();
        assert_eq!(pack.name(), "go/service");
        assert_eq!(
            pack.entries().unwrap(),
            vec!["a.txt", "sub/b.txt.template", "sub/deeper/c.txt", "z.txt"]
        );
    }

    #[test]
    fn test_filesystem_load_templates() {
        let temp_dir = TempDir::new().unwrap();
        write_pack(
            temp_dir.path(),
            "foo",
            &[("a.txt", "raw"), ("b.txt.template", "!!if-not-exists\nB\n")],
        );

        let pack = PackProvider::Filesystem(temp_dir.path().to_path_buf())
            .provide("", "foo")
            .unwrap();
        let templates = pack.load_templates().unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].path(), "a.txt");
        assert_eq!(templates[1].path(), "b.txt.template");
        assert!(templates[1].header().if_not_exists);
    }

    #[test]
    fn test_load_templates_error_names_file() {
        let temp_dir = TempDir::new().unwrap();
        write_pack(temp_dir.path(), "foo", &[("bad.txt.template", "!!bogus\nx\n")]);

        let pack = load_pack(&[temp_dir.path()], "", "foo").unwrap();
        let err = pack.load_templates().unwrap_err();
        assert!(matches!(err, ScaffoldError::Load { ref path, .. } if path == "bad.txt.template"));
    }

    #[test]
    fn test_filesystem_pack_not_found() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("file"), "not a dir").unwrap();

        let provider = PackProvider::Filesystem(temp_dir.path().to_path_buf());
        assert!(matches!(
            provider.provide("", "missing"),
            Err(ScaffoldError::PackNotFound { .. })
        ));
        assert!(matches!(
            provider.provide("", "file"),
            Err(ScaffoldError::PackNotFound { .. })
        ));
    }

    #[test]
    fn test_bundled_pack() {
        let pack = PackProvider::Bundled(BUNDLED).provide("go", "cli").unwrap();
        assert_eq!(pack.name(), "go/cli");
        assert_eq!(
            pack.entries().unwrap(),
            vec!["cmd/root.go", "main.go.template", "z.txt"]
        );

        let templates = pack.load_templates().unwrap();
        assert_eq!(templates.len(), 3);
        assert!(matches!(
            templates[1].name(),
            TemplateName::Evaluated { filename: Some(f), .. } if f == "{{ name }}.go"
        ));

        let mut content = String::new();
        pack.open("z.txt").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "z\n");
        assert!(pack.open("nope.txt").is_err());
    }

    #[test]
    fn test_bundled_pack_not_found() {
        let provider = PackProvider::Bundled(BUNDLED);
        // A shared name prefix is not a pack
        assert!(provider.provide("go", "cl").is_err());
        assert!(provider.provide("rust", "cli").is_err());
    }

    #[test]
    fn test_loader_first_provider_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_pack(second.path(), "go/cli", &[("from-second.txt", "")]);

        let mut loader = PackLoader::new();
        loader
            .register(PackProvider::Filesystem(first.path().to_path_buf()))
            .register(PackProvider::Filesystem(second.path().to_path_buf()))
            .register(PackProvider::Bundled(BUNDLED));

        let pack = loader.provide("go", "cli").unwrap();
        assert_eq!(pack.entries().unwrap(), vec!["from-second.txt"]);

        write_pack(first.path(), "go/cli", &[("from-first.txt", "")]);
        let pack = loader.provide("go", "cli").unwrap();
        assert_eq!(pack.entries().unwrap(), vec!["from-first.txt"]);

        let pack = loader.provide("go", "client").unwrap();
        assert!(matches!(pack, Pack::Bundled { .. }));
    }

    #[test]
    fn test_loader_not_found_lists_searched() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let err = load_pack(&[first.path(), second.path()], "go", "nope").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"go/nope\""));
        assert!(message.contains(&first.path().display().to_string()));
        assert!(message.contains(&second.path().display().to_string()));
    }

    #[test]
    fn test_join_pack_name() {
        assert_eq!(join_pack_name("go", "cli"), "go/cli");
        assert_eq!(join_pack_name("", "foo"), "foo");
        assert_eq!(join_pack_name("go/", "/cli"), "go/cli");
    }
}
