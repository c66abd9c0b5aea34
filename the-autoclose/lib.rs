//! Automatic closing of HTML/XML tags while typing.
//!
//! The crate turns single keystrokes into small, replayable edit plans:
//!
//! - typing `>` after `<div class="x"` inserts `</div>` behind the cursor
//! - typing `>` or `/` on a void element (`<img`, `<br`) finishes it as
//!   `<img />`
//! - typing `!` right after `<` expands to `<!--  -->`
//! - pressing enter between `<ul>` and `</ul>` opens an indented blank line
//!
//! The host editor stays outside: it is reached through the
//! [`host::TextSource`] and [`host::HostEditor`] traits, and wired up with
//! [`handler::AutoClose`]. [`buffer::RopeBuffer`] is an in-memory host used by
//! the tests and by embedders without a buffer of their own.

use smartstring::{
  LazyCompact,
  SmartString,
};

pub mod buffer;
pub mod config;
pub mod context;
pub mod engine;
pub mod handler;
pub mod host;
pub mod lexical;
pub mod plan;

pub type Tendril = SmartString<LazyCompact>;

pub use config::Config;
pub use engine::{
  Action,
  Decision,
  Keystroke,
  Trigger,
};
pub use handler::AutoClose;
pub use host::{
  EditEvent,
  HostEditor,
  Position,
  TextSource,
};
pub use plan::{
  EditOp,
  EditPlan,
};
