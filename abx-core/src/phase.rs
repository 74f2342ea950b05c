/// Defines session phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_practice(&self) -> bool {
        false
    }
    fn is_experiment(&self) -> bool {
        false
    }

    fn is_welcome(&self) -> bool {
        false
    }

    fn is_debrief(&self) -> bool {
        false
    }

    /// Phases in which trials are presented and answered
    fn runs_trials(&self) -> bool {
        self.is_practice() || self.is_experiment()
    }
}

#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum StandardPhase {
    #[default]
    Welcome,
    Practice,
    Experiment,
    Debrief,
}

impl Phase for StandardPhase {
    fn allows_input(&self) -> bool {
        !matches!(self, Self::Debrief)
    }
    fn next(&self) -> Option<Self> {
        use StandardPhase::*;
        Some(match self {
            Welcome => Practice,
            Practice => Experiment,
            Experiment => Debrief,
            Debrief => return None,
        })
    }

    fn is_practice(&self) -> bool {
        matches!(self, StandardPhase::Practice)
    }

    fn is_experiment(&self) -> bool {
        matches!(self, StandardPhase::Experiment)
    }

    fn is_welcome(&self) -> bool {
        matches!(self, StandardPhase::Welcome)
    }

    fn is_debrief(&self) -> bool {
        matches!(self, StandardPhase::Debrief)
    }
}
