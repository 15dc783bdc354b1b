use crate::config::Config;
use ghostline_core::keymap::PopupKind;
use std::{
    fs,
    path::{Path, PathBuf},
};

const MAX_FILES: usize = 50;

/// Supplies the items each popup lists.
pub struct PopupSources {
    commands: Vec<String>,
    agents: Vec<String>,
    root: PathBuf,
}

impl PopupSources {
    pub fn new(config: &Config, root: impl Into<PathBuf>) -> Self {
        Self {
            commands: config.commands.clone(),
            agents: config.agents.clone(),
            root: root.into(),
        }
    }

    /// Items for `kind` given the text typed after its trigger character.
    pub fn items(&self, kind: PopupKind, query: &str) -> Vec<String> {
        match kind {
            PopupKind::Command => self.commands.clone(),
            PopupKind::Agent => self.agents.clone(),
            PopupKind::FileReference => self.files(query),
        }
    }

    /// List the directory named by the part of `query` up to its last slash.
    /// Directories get a trailing slash.
    fn files(&self, query: &str) -> Vec<String> {
        let prefix = match query.rfind('/') {
            Some(i) => &query[..=i],
            None => "",
        };

        let entries = match fs::read_dir(self.root.join(Path::new(prefix))) {
            Ok(entries) => entries,
            Err(e) => {
                log::trace!("cannot list {:?}: {}", prefix, e);
                return Vec::new();
            }
        };

        let mut files = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;

                if name.starts_with('.') {
                    return None;
                }

                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

                Some(if is_dir {
                    format!("{}{}/", prefix, name)
                } else {
                    format!("{}{}", prefix, name)
                })
            })
            .collect::<Vec<_>>();

        files.sort();
        files.truncate(MAX_FILES);
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "").unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();

        let sources = PopupSources::new(&Config::default(), dir.path());

        assert_eq!(
            sources.items(PopupKind::FileReference, "RE"),
            vec!["README.md".to_owned(), "src/".to_owned()]
        );
        assert_eq!(sources.items(PopupKind::FileReference, "src/ma"), vec!["src/main.rs".to_owned()]);
        assert!(sources.items(PopupKind::FileReference, "missing/").is_empty());
    }

    #[test]
    fn commands_and_agents_come_from_config() {
        let config = Config {
            agents: vec!["reviewer".into()],
            ..Config::default()
        };
        let sources = PopupSources::new(&config, ".");

        assert_eq!(sources.items(PopupKind::Agent, ""), vec!["reviewer".to_owned()]);
        assert!(sources.items(PopupKind::Command, "").contains(&"history".to_owned()));
    }
}
