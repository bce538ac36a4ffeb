//! Pure selection of what the invocation page shows.
//!
//! [`select_views`] maps a committed [`ViewState`] and the current
//! [`NavigationSelector`] to a [`RenderPlan`]: an ordered list of view requests
//! with their parameters. Drawing them is the shell's job.

use buildview_core::{InvocationModel, OutcomeCategory, TargetOutcome};
use serde::Serialize;
use std::fmt;

use crate::lifecycle::{LifecycleState, ViewState};
use crate::navigation::{Anchor, NavigationSelector};

pub const SMALL_PAGE_SIZE: usize = 10;
pub const LARGE_PAGE_SIZE: usize = 100;

const FAILURE_ICON: &str = "/image/x-circle.svg";
const SUCCESS_ICON: &str = "/image/check-circle.svg";

struct TargetCardStyle {
    category: OutcomeCategory,
    icon_path: &'static str,
    present_verb: &'static str,
    past_verb: &'static str,
}

/// Target cards, in the order they appear on the page.
const TARGET_CARDS: [TargetCardStyle; 4] = [
    TargetCardStyle {
        category: OutcomeCategory::Failed,
        icon_path: FAILURE_ICON,
        present_verb: "failing",
        past_verb: "failed",
    },
    TargetCardStyle {
        category: OutcomeCategory::Broken,
        icon_path: FAILURE_ICON,
        present_verb: "broken",
        past_verb: "broken",
    },
    TargetCardStyle {
        category: OutcomeCategory::Flaky,
        icon_path: FAILURE_ICON,
        present_verb: "flaky",
        past_verb: "flaky",
    },
    TargetCardStyle {
        category: OutcomeCategory::Succeeded,
        icon_path: SUCCESS_ICON,
        present_verb: "passing",
        past_verb: "passed",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetsCard<'a> {
    pub category: OutcomeCategory,
    pub icon_path: &'static str,
    pub present_verb: &'static str,
    pub past_verb: &'static str,
    pub page_size: usize,
    pub targets: &'a [TargetOutcome],
}

/// One sub-view to draw, with everything it needs besides the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewRequest<'a> {
    LoadingPlaceholder { invocation_id: &'a str },
    NotFoundPlaceholder { invocation_id: &'a str },
    InProgressPlaceholder { invocation_id: &'a str },
    Overview { dense: bool },
    Tabs { dense: bool, anchor: Option<&'a Anchor> },
    BuildLogs { expanded: bool },
    Error { description: &'a str },
    Targets(TargetsCard<'a>),
    Details { limit_results: bool },
    Artifacts { page_size: usize },
    RawLogs { page_size: usize },
}

impl ViewRequest<'_> {
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            ViewRequest::LoadingPlaceholder { .. }
                | ViewRequest::NotFoundPlaceholder { .. }
                | ViewRequest::InProgressPlaceholder { .. }
        )
    }

    /// Content cards: everything below the overview header and tab strip.
    pub fn is_card(&self) -> bool {
        !self.is_placeholder()
            && !matches!(self, ViewRequest::Overview { .. } | ViewRequest::Tabs { .. })
    }
}

impl fmt::Display for ViewRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = |dense: bool| if dense { " (dense)" } else { "" };
        match self {
            ViewRequest::LoadingPlaceholder { invocation_id } => {
                write!(f, "Loading invocation {invocation_id}...")
            }
            ViewRequest::NotFoundPlaceholder { invocation_id } => {
                write!(f, "Invocation {invocation_id} not found")
            }
            ViewRequest::InProgressPlaceholder { invocation_id } => {
                write!(f, "Invocation {invocation_id} is in progress")
            }
            ViewRequest::Overview { dense } => write!(f, "overview{}", variant(*dense)),
            ViewRequest::Tabs { dense, anchor } => match anchor {
                Some(anchor) => write!(f, "tabs{} at {anchor}", variant(*dense)),
                None => write!(f, "tabs{}", variant(*dense)),
            },
            ViewRequest::BuildLogs { expanded } => write!(f, "build logs expanded={expanded}"),
            ViewRequest::Error { description } => write!(f, "error: {description}"),
            ViewRequest::Targets(card) => write!(
                f,
                "{} targets: {} {} (page size {})",
                card.targets.len(),
                card.past_verb,
                card.icon_path,
                card.page_size
            ),
            ViewRequest::Details { limit_results } => {
                write!(f, "details limit_results={limit_results}")
            }
            ViewRequest::Artifacts { page_size } => write!(f, "artifacts (page size {page_size})"),
            ViewRequest::RawLogs { page_size } => write!(f, "raw logs (page size {page_size})"),
        }
    }
}

/// Everything one render needs, computed from a single committed state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan<'a> {
    pub invocation_id: &'a str,
    pub lifecycle: LifecycleState,
    pub dense: bool,
    #[serde(skip)]
    pub model: &'a InvocationModel,
    pub views: Vec<ViewRequest<'a>>,
}

impl<'a> RenderPlan<'a> {
    pub fn cards(&self) -> impl Iterator<Item = &ViewRequest<'a>> {
        self.views.iter().filter(|v| v.is_card())
    }
}

/// Compute the render plan. Pure: equal inputs give equal plans.
pub fn select_views<'a>(state: &'a ViewState, nav: &'a NavigationSelector) -> RenderPlan<'a> {
    let invocation_id = state.invocation_id().as_str();
    let model = state.model();
    let plan = |views| RenderPlan {
        invocation_id,
        lifecycle: state.lifecycle(),
        dense: nav.dense_mode,
        model,
        views,
    };

    match state.lifecycle() {
        LifecycleState::Loading => {
            return plan(vec![ViewRequest::LoadingPlaceholder { invocation_id }]);
        }
        LifecycleState::NotFound => {
            return plan(vec![ViewRequest::NotFoundPlaceholder { invocation_id }]);
        }
        LifecycleState::InProgress => {
            return plan(vec![ViewRequest::InProgressPlaceholder { invocation_id }]);
        }
        LifecycleState::Ready => {}
    }

    let show_all = nav.show_all();
    let dense = nav.dense_mode;
    let mut views = vec![
        ViewRequest::Overview { dense },
        ViewRequest::Tabs {
            dense,
            anchor: nav.anchor.as_ref(),
        },
    ];

    if show_all || nav.is(&Anchor::Log) {
        views.push(ViewRequest::BuildLogs {
            expanded: nav.is(&Anchor::Log),
        });
        if let Some(description) = model.abort_description() {
            views.push(ViewRequest::Error { description });
        }
    }

    if !nav.has_anchor() || nav.is(&Anchor::Targets) {
        let page_size = if show_all {
            SMALL_PAGE_SIZE
        } else {
            LARGE_PAGE_SIZE
        };
        for style in &TARGET_CARDS {
            let targets = model.outcomes(style.category);
            if targets.is_empty() {
                continue;
            }
            views.push(ViewRequest::Targets(TargetsCard {
                category: style.category,
                icon_path: style.icon_path,
                present_verb: style.present_verb,
                past_verb: style.past_verb,
                page_size,
                targets,
            }));
        }
    }

    if show_all || nav.is(&Anchor::Details) {
        views.push(ViewRequest::Details {
            limit_results: !nav.has_anchor(),
        });
    }

    if show_all || nav.is(&Anchor::Artifacts) {
        let page_size = if nav.has_anchor() {
            LARGE_PAGE_SIZE
        } else {
            SMALL_PAGE_SIZE
        };
        views.push(ViewRequest::Artifacts { page_size });
    }

    if nav.is(&Anchor::Raw) {
        views.push(ViewRequest::RawLogs {
            page_size: LARGE_PAGE_SIZE,
        });
    }

    plan(views)
}
