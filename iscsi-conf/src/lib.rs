//! iSCSI Gateway Configuration Library
//!
//! Converts between the persisted gateway configuration (targets, auth,
//! portals and pools) and a single normalized [`Model`], in both directions:
//! - `document`: strict parsing of the persisted form
//! - `ui`: building the model from the editor's per-target selections
//! - `validate`: cross-reference checks run after parsing
//! - `model` / `auth`: the normalized types and their persisted serialization

pub mod auth;
pub mod document;
pub mod error;
pub mod model;
pub mod types;
pub mod ui;
pub mod validate;

pub use auth::{AuthEntry, ChapCredentials, ChapSecret, DiscoveryAuth, MutualSecret};
pub use document::{Parser, parse, read_document};
pub use error::{LoadError, Result, SectionError, ValidationError};
pub use model::{GatewayEntry, Model, Pool, PoolGateway, Portal, Target, TargetHost};
pub use types::{AuthKind, Section, Toggle};
pub use ui::{UiTarget, synthesize, synthesize_value};
