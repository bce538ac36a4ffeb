use buildview_core::InvocationModel;

use crate::fetch::InvocationId;
use crate::lifecycle::{LifecycleState, ViewState};

pub const DEFAULT_PRODUCT_NAME: &str = "BuildBuddy";

/// Title shown before there is data worth describing.
pub fn placeholder_title(invocation_id: &InvocationId, product_name: &str) -> String {
    format!("Invocation {invocation_id} | {product_name}")
}

/// `"{user}'s {command} {pattern} | {product}"`
pub fn summary_title(model: &InvocationModel, product_name: &str) -> String {
    format!(
        "{}'s {} {} | {product_name}",
        model.user(),
        model.command(),
        model.pattern()
    )
}

pub fn title_for(state: &ViewState, product_name: &str) -> String {
    match state.lifecycle() {
        LifecycleState::Ready => summary_title(state.model(), product_name),
        LifecycleState::Loading | LifecycleState::NotFound | LifecycleState::InProgress => {
            placeholder_title(state.invocation_id(), product_name)
        }
    }
}
