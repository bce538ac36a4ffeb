pub mod config;
pub mod controller;
pub mod fetch;
pub mod lifecycle;
pub mod navigation;
pub mod poll;
pub mod router;
pub mod title;

pub use controller::{ControllerHandle, ControllerOptions, ShellCommand, spawn};
pub use fetch::{FetchError, InvocationId, InvocationSource};
pub use lifecycle::{LifecycleState, Transition, ViewState};
pub use navigation::{Anchor, NavigationSelector};
pub use router::{RenderPlan, ViewRequest, select_views};
