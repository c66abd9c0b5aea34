//! Wiring the engine to a host editor.

use std::{
  cell::{
    Cell,
    RefCell,
  },
  rc::Rc,
  sync::Arc,
};

use arc_swap::ArcSwap;
use the_event::{
  EventBus,
  Subscription,
};

use crate::{
  config::{
    Config,
    ConfigStore,
  },
  engine::{
    Action,
    Keystroke,
    Trigger,
    decide,
  },
  host::{
    ActiveDocument,
    EditEvent,
    HostEditor,
  },
};

/// Events a host raises for the handler.
#[derive(Debug, Default)]
pub struct HostHooks {
  /// Text was inserted; listeners may edit the passed host.
  pub text_inserted:    EventBus<EditEvent, dyn HostEditor>,
  pub document_changed: EventBus<ActiveDocument>,
}

impl HostHooks {
  pub fn new() -> Self {
    Self::default()
  }
}

/// Reacts to host text insertions by closing tags.
#[derive(Debug)]
pub struct AutoClose {
  config:   Arc<ArcSwap<Config>>,
  document: RefCell<ActiveDocument>,
  applying: Cell<bool>,
}

impl AutoClose {
  pub fn new(config: Config) -> Self {
    Self::with_pointer(Arc::new(ArcSwap::from_pointee(config)))
  }

  /// A handler that follows every update made through `store`.
  pub fn from_store(store: &ConfigStore) -> Self {
    Self::with_pointer(store.pointer())
  }

  fn with_pointer(config: Arc<ArcSwap<Config>>) -> Self {
    Self {
      config,
      document: RefCell::new(ActiveDocument::default()),
      applying: Cell::new(false),
    }
  }

  pub fn config(&self) -> Arc<Config> {
    self.config.load_full()
  }

  pub fn document(&self) -> ActiveDocument {
    self.document.borrow().clone()
  }

  pub fn on_active_document_changed(&self, document: &ActiveDocument) {
    tracing::debug!(extension = ?document.extension, "active document changed");
    *self.document.borrow_mut() = document.clone();
  }

  /// Whether the active document's file type is enabled.
  pub fn is_enabled(&self) -> bool {
    let document = self.document.borrow();
    self
      .config
      .load()
      .is_file_type_enabled(document.extension.as_deref())
  }

  /// Handle one insertion reported by `host`, editing it when the keystroke
  /// calls for it.
  ///
  /// Insertions made while a plan is being applied are ignored.
  pub fn on_text_inserted<H>(&self, host: &mut H, event: &EditEvent) -> Option<Action>
  where
    H: HostEditor + ?Sized,
  {
    if self.applying.get() {
      tracing::trace!("ignoring insertion made by auto-close");
      return None;
    }
    Trigger::from_inserted(&event.inserted_text)?;
    if !self.is_enabled() {
      return None;
    }

    let config = self.config.load();
    let scopes = host.scopes_at(host.cursor());
    if !config.is_scope_enabled(&scopes) {
      tracing::trace!(?scopes, "scope not enabled");
      return None;
    }

    let decision = {
      let keystroke = Keystroke::from_event(&*host, event)?;
      decide(&*host, &keystroke, &config)?
    };

    let _guard = ApplyGuard::enter(&self.applying);
    decision.plan.apply(host);
    Some(decision.action)
  }

  /// Subscribe to `hooks`. The handler stays attached until the returned
  /// subscriptions are disposed or dropped.
  pub fn register(self: &Rc<Self>, hooks: &HostHooks) -> Vec<Subscription> {
    let on_text = {
      let handler = Rc::clone(self);
      hooks.text_inserted.subscribe(move |host, event| {
        handler.on_text_inserted(host, event);
      })
    };
    let on_document = {
      let handler = Rc::clone(self);
      hooks
        .document_changed
        .subscribe(move |_, document| handler.on_active_document_changed(document))
    };
    vec![on_text, on_document]
  }
}

impl Default for AutoClose {
  fn default() -> Self {
    Self::new(Config::default())
  }
}

struct ApplyGuard<'a> {
  flag: &'a Cell<bool>,
}

impl<'a> ApplyGuard<'a> {
  fn enter(flag: &'a Cell<bool>) -> Self {
    flag.set(true);
    Self { flag }
  }
}

impl Drop for ApplyGuard<'_> {
  fn drop(&mut self) {
    self.flag.set(false);
  }
}
