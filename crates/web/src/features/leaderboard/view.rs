//! Page navigation as a small state machine, kept free of any transport.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Active { page: usize },
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NavigationAction {
    Next,
    Previous,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    Navigate(NavigationAction),
    Timeout,
}

impl From<NavigationAction> for ViewEvent {
    fn from(action: NavigationAction) -> Self {
        Self::Navigate(action)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::Active { page: 1 }
    }
}

impl ViewState {
    pub fn page(&self) -> Option<usize> {
        match self {
            Self::Active { page } => Some(*page),
            Self::Expired => None,
        }
    }

    /// Apply `event` on a result with `total_pages` pages. `Expired` is final.
    pub fn transition(self, event: ViewEvent, total_pages: usize) -> Self {
        let total = total_pages.max(1);
        match (self, event) {
            (Self::Expired, _) => Self::Expired,
            (Self::Active { .. }, ViewEvent::Timeout) => Self::Expired,
            (Self::Active { page }, ViewEvent::Navigate(action)) => {
                let page = match action {
                    NavigationAction::Next => (page + 1).min(total),
                    NavigationAction::Previous => page.saturating_sub(1).max(1),
                    NavigationAction::Jump => jump_target(page, total),
                };
                Self::Active { page }
            }
        }
    }
}

/// First half jumps to the end, second half back to the start.
pub fn jump_target(page: usize, total_pages: usize) -> usize {
    match jump_direction(page, total_pages) {
        JumpDirection::ToEnd => total_pages,
        JumpDirection::ToStart => 1,
    }
}

fn jump_direction(page: usize, total_pages: usize) -> JumpDirection {
    if page <= total_pages / 2 {
        JumpDirection::ToEnd
    } else {
        JumpDirection::ToStart
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JumpDirection {
    ToEnd,
    ToStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Controls {
    pub previous_disabled: bool,
    pub next_disabled: bool,
    pub jump: JumpDirection,
}

/// Navigation controls for `page`, or none when everything fits on one page.
pub fn controls(page: usize, total_pages: usize) -> Option<Controls> {
    if total_pages <= 1 {
        return None;
    }
    Some(Controls {
        previous_disabled: page == 1,
        next_disabled: page == total_pages,
        jump: jump_direction(page, total_pages),
    })
}
