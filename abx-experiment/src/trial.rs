use abx_core::{AbxTrial, TrialState};

/// A generated trial as scheduled inside a session
#[derive(Debug, Clone)]
pub struct PlannedTrial<T> {
    pub id: usize,
    pub is_practice: bool,
    pub trial: AbxTrial,
    pub timestamps: TrialTimestamps<T>,
    pub state: TrialState,
}

impl<T> PlannedTrial<T> {
    pub fn new(id: usize, is_practice: bool, trial: AbxTrial) -> Self {
        Self {
            id,
            is_practice,
            trial,
            timestamps: TrialTimestamps::default(),
            state: TrialState::Pending,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrialTimestamps<T> {
    pub presented: Option<T>,
    pub response: Option<T>,
}

impl<T> Default for TrialTimestamps<T> {
    fn default() -> Self {
        Self {
            presented: None,
            response: None,
        }
    }
}
