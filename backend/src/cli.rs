//! Minimal CLI parsing for library selection and notification lines.

use std::env;

use anyhow::{Context, Result};
use uuid::Uuid;

/// Which library the notifications apply to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibrarySelector {
    Id(Uuid),
    /// Reuse the library at `path`, or create it under `name`
    Path { name: String, path: String },
}

#[derive(Debug, Default)]
pub struct CliOptions {
    pub library_id: Option<Uuid>,
    pub library_name: Option<String>,
    pub library_path: Option<String>,
}

impl CliOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse(env::args().skip(1))
    }

    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };

            let mut value = || {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .with_context(|| format!("{} needs a value", flag))
            };

            match flag.as_str() {
                "--library-id" => {
                    let raw = value()?;
                    options.library_id =
                        Some(Uuid::parse_str(&raw).with_context(|| format!("Invalid library id '{}'", raw))?);
                }
                "--library-name" => options.library_name = Some(value()?),
                "--library-path" => options.library_path = Some(value()?),
                other => anyhow::bail!("Unknown argument '{}'", other),
            }
        }

        Ok(options)
    }

    pub fn selector(&self) -> Result<LibrarySelector> {
        if let Some(id) = self.library_id {
            return Ok(LibrarySelector::Id(id));
        }

        let path = self
            .library_path
            .clone()
            .context("Pass --library-id, or --library-path (with optional --library-name)")?;
        let name = self.library_name.clone().unwrap_or_else(|| {
            std::path::Path::new(&path)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("TV Shows")
                .to_string()
        });

        Ok(LibrarySelector::Path { name, path })
    }
}

/// One line of watcher input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Add(String),
    Remove(String),
}

impl Notification {
    /// Parse `add <path>` or `remove <path>`. Blank lines and `#` comments give `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (verb, path) = line
            .split_once(char::is_whitespace)
            .map(|(verb, path)| (verb, path.trim()))
            .with_context(|| format!("Expected '<add|remove> <path>', got '{}'", line))?;

        match verb.to_lowercase().as_str() {
            "add" => Ok(Some(Notification::Add(path.to_string()))),
            "remove" | "rm" => Ok(Some(Notification::Remove(path.to_string()))),
            other => anyhow::bail!("Unknown notification '{}'", other),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Notification::Add(path) | Notification::Remove(path) => path,
        }
    }
}
