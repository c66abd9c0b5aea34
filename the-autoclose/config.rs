//! Options controlling when and how tags are closed.
//!
//! ```toml
//! self-close-tags = ["br", "hr", "img", "input"]
//! add-slash-to-self-close-tag = true
//! insert-whitespace-on-close = true
//! slash-trigger-auto-close = false
//! enabled-file-types = ["html", "vue"]
//! enabled-scopes = []
//! ```
//!
//! A [`Config`] is an immutable snapshot. Hosts keep the current snapshot in
//! a [`ConfigStore`], which swaps it atomically and tells subscribers about
//! the change.

use std::{
  fs,
  io,
  path::Path,
  sync::Arc,
};

use arc_swap::ArcSwap;
use indexmap::IndexSet;
use serde::{
  Deserialize,
  Serialize,
};
use the_event::{
  EventBus,
  Subscription,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("failed to read config: {0}")]
  Io(#[from] io::Error),
  #[error("invalid config: {0}")]
  Toml(#[from] toml::de::Error),
}

/// HTML void elements.
pub const DEFAULT_SELF_CLOSE_TAGS: &[&str] = &[
  "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link", "meta",
  "param", "source", "track", "wbr",
];

pub const DEFAULT_FILE_TYPES: &[&str] = &[
  "htm", "html", "xhtml", "xml", "svg", "jsx", "tsx", "vue", "svelte", "php", "erb", "hbs",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
  /// Tags finished as `<tag />` instead of getting a closing tag.
  pub self_close_tags:             IndexSet<String>,
  /// Leave a typed `/` alone instead of self-closing the tag with it.
  pub slash_trigger_auto_close:    bool,
  /// Finish self-closing tags with `/>` rather than `>`.
  pub add_slash_to_self_close_tag: bool,
  /// Put a space before the self-closing marker when none is there.
  pub insert_whitespace_on_close:  bool,
  /// File extensions the feature is active for.
  pub enabled_file_types:          IndexSet<String>,
  /// Scopes the feature is active in. Empty enables every scope.
  pub enabled_scopes:              IndexSet<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      self_close_tags:             to_set(DEFAULT_SELF_CLOSE_TAGS),
      slash_trigger_auto_close:    false,
      add_slash_to_self_close_tag: true,
      insert_whitespace_on_close:  true,
      enabled_file_types:          to_set(DEFAULT_FILE_TYPES),
      enabled_scopes:              IndexSet::new(),
    }
  }
}

/// A config file where every field is optional, so a workspace file can
/// override just what it names.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigRaw {
  self_close_tags:             Option<IndexSet<String>>,
  slash_trigger_auto_close:    Option<bool>,
  add_slash_to_self_close_tag: Option<bool>,
  insert_whitespace_on_close:  Option<bool>,
  enabled_file_types:          Option<IndexSet<String>>,
  enabled_scopes:              Option<IndexSet<String>>,
}

impl ConfigRaw {
  fn overlay(self, base: Config) -> Config {
    Config {
      self_close_tags:             self.self_close_tags.unwrap_or(base.self_close_tags),
      slash_trigger_auto_close:    self
        .slash_trigger_auto_close
        .unwrap_or(base.slash_trigger_auto_close),
      add_slash_to_self_close_tag: self
        .add_slash_to_self_close_tag
        .unwrap_or(base.add_slash_to_self_close_tag),
      insert_whitespace_on_close:  self
        .insert_whitespace_on_close
        .unwrap_or(base.insert_whitespace_on_close),
      enabled_file_types:          self.enabled_file_types.unwrap_or(base.enabled_file_types),
      enabled_scopes:              self.enabled_scopes.unwrap_or(base.enabled_scopes),
    }
  }
}

impl Config {
  pub fn from_toml(source: &str) -> Result<Self> {
    let raw: ConfigRaw = toml::from_str(source)?;
    Ok(raw.overlay(Config::default()))
  }

  /// Combine a global and a workspace config, the workspace winning field by
  /// field.
  ///
  /// A file that cannot be read counts as absent as long as the other one
  /// loads; a file that does not parse is always an error.
  pub fn load(global: Result<String>, local: Result<String>) -> Result<Self> {
    let global: Result<ConfigRaw> = global.and_then(|file| Ok(toml::from_str(&file)?));
    let local: Result<ConfigRaw> = local.and_then(|file| Ok(toml::from_str(&file)?));

    match (global, local) {
      (Ok(global), Ok(local)) => Ok(local.overlay(global.overlay(Config::default()))),
      (_, Err(err @ ConfigError::Toml(_))) | (Err(err @ ConfigError::Toml(_)), _) => Err(err),
      (Ok(config), Err(_)) | (Err(_), Ok(config)) => Ok(config.overlay(Config::default())),
      (Err(err), Err(_)) => Err(err),
    }
  }

  pub fn load_files(global: &Path, local: &Path) -> Result<Self> {
    Self::load(read_file(global), read_file(local))
  }

  /// Case-insensitive membership in [`Config::self_close_tags`].
  pub fn is_self_close_tag(&self, name: &str) -> bool {
    let name = name.to_lowercase();
    self
      .self_close_tags
      .iter()
      .any(|tag| tag.to_lowercase() == name)
  }

  /// Whether documents with `extension` get auto-closing. Documents without
  /// an extension never do.
  pub fn is_file_type_enabled(&self, extension: Option<&str>) -> bool {
    let Some(extension) = extension else {
      return false;
    };
    let extension = extension.trim_start_matches('.');
    self
      .enabled_file_types
      .iter()
      .any(|enabled| enabled.trim_start_matches('.').eq_ignore_ascii_case(extension))
  }

  /// Whether any of `scopes` is enabled. An empty scope list in the config
  /// enables everything.
  pub fn is_scope_enabled<S: AsRef<str>>(&self, scopes: &[S]) -> bool {
    self.enabled_scopes.is_empty()
      || scopes
        .iter()
        .any(|scope| self.enabled_scopes.contains(scope.as_ref()))
  }
}

fn read_file(path: &Path) -> Result<String> {
  Ok(fs::read_to_string(path)?)
}

fn to_set(items: &[&str]) -> IndexSet<String> {
  items.iter().map(|item| (*item).to_owned()).collect()
}

/// Sent after [`ConfigStore::update`] swapped the snapshot.
#[derive(Debug, Clone)]
pub struct ConfigDidChange {
  pub old: Arc<Config>,
  pub new: Arc<Config>,
}

/// Holder of the live config snapshot.
pub struct ConfigStore {
  current: Arc<ArcSwap<Config>>,
  changed: EventBus<ConfigDidChange>,
}

impl ConfigStore {
  pub fn new(config: Config) -> Self {
    Self {
      current: Arc::new(ArcSwap::from_pointee(config)),
      changed: EventBus::new(),
    }
  }

  /// Shared pointer readers load snapshots from.
  pub fn pointer(&self) -> Arc<ArcSwap<Config>> {
    self.current.clone()
  }

  pub fn snapshot(&self) -> Arc<Config> {
    self.current.load_full()
  }

  /// Replace the snapshot, notifying subscribers when it actually changed.
  pub fn update(&self, config: Config) {
    let new = Arc::new(config);
    let old = self.current.swap(new.clone());
    if old == new {
      return;
    }

    tracing::debug!(?new, "auto-close config changed");
    self.changed.emit(&mut (), &ConfigDidChange { old, new });
  }

  #[must_use = "dropping a subscription disposes it"]
  pub fn on_change<F>(&self, mut listener: F) -> Subscription
  where
    F: FnMut(&ConfigDidChange) + 'static,
  {
    self
      .changed
      .subscribe(move |_: &mut (), change: &ConfigDidChange| listener(change))
  }
}

impl Default for ConfigStore {
  fn default() -> Self {
    Self::new(Config::default())
  }
}
