#![doc = r"Change interception and lifecycle core for Tether components."]

extern crate self as tether_core;

pub mod collections;
pub mod component;
pub mod error;
pub mod intercept;
pub mod lifecycle;
pub mod nested;
pub mod platform;
pub mod rebind;
pub mod record;
pub mod view;

pub use component::{render_once, Component, ComponentHandle, Instance};
pub use error::{Error, HookError, HookResult, Result};
pub use intercept::{
    ChangeHook, ChangeRecord, FieldConfig, GetTransform, InterceptMode, InterceptionConfig,
    Tracked,
};
pub use lifecycle::{Lifecycle, LifecycleState, Variant, VariantPredicate};
pub use nested::NestedView;
pub use platform::{RenderSignal, RenderTrigger};
pub use rebind::{as_receiver_parameter, method, rebind, rebind_with, Method, Rebindable, Rebound};
pub use record::{FieldDescriptor, FieldError, FieldPath, FieldTable, Fields, Record};
pub use view::ViewUpdater;

/// Paths used by `#[derive(Record)]` expansions.
#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
