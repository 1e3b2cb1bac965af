use crate::{controller::ViewState, notification::Notification};

/// Snapshots pushed to subscribers whenever the rendered state changes.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    View(ViewState),
    Notification(Option<Notification>),
}
