//! Linear multi-step wizard

use serde::Serialize;

use crate::error::Error;

/// Display state of one step in the progress indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Completed,
    Current,
    Upcoming,
}

/// Step counter with forward/back transitions, 1-indexed
///
/// The position is not persisted; a new wizard always starts at step 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    total: usize,
    current: usize,
}

impl Wizard {
    pub fn new(total: usize) -> Result<Self, Error> {
        if total == 0 {
            return Err(Error::EmptyWizard);
        }
        Ok(Self { total, current: 1 })
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Advance one step; no-op on the final step
    pub fn next(&mut self) -> bool {
        if self.current < self.total {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Go back one step; no-op on the first step
    pub fn previous(&mut self) -> bool {
        if self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    pub fn is_first(&self) -> bool {
        self.current == 1
    }

    /// The final step shows submit instead of next
    pub fn is_final(&self) -> bool {
        self.current == self.total
    }

    pub fn progress(&self) -> Vec<StepState> {
        (1..=self.total)
            .map(|step| match step.cmp(&self.current) {
                std::cmp::Ordering::Less => StepState::Completed,
                std::cmp::Ordering::Equal => StepState::Current,
                std::cmp::Ordering::Greater => StepState::Upcoming,
            })
            .collect()
    }

    /// Width of the progress bar, 0 to 100
    pub fn percent(&self) -> f64 {
        if self.total == 1 {
            return 100.0;
        }
        (self.current - 1) as f64 / (self.total - 1) as f64 * 100.0
    }
}

/// Steps of the form builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderStep {
    Basic,
    Fields,
    Settings,
    Preview,
}

impl BuilderStep {
    pub const ALL: [BuilderStep; 4] = [
        BuilderStep::Basic,
        BuilderStep::Fields,
        BuilderStep::Settings,
        BuilderStep::Preview,
    ];

    pub fn wizard() -> Wizard {
        Wizard {
            total: Self::ALL.len(),
            current: 1,
        }
    }

    pub fn at(wizard: &Wizard) -> Option<BuilderStep> {
        Self::ALL.get(wizard.current().checked_sub(1)?).copied()
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuilderStep::Basic => "Basic information about your form",
            BuilderStep::Fields => "Add fields to your form",
            BuilderStep::Settings => "Configure form settings",
            BuilderStep::Preview => "Preview and publish your form",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_steps_rejected() {
        assert!(matches!(Wizard::new(0), Err(Error::EmptyWizard)));
    }

    #[test]
    fn test_bounds_are_no_ops() {
        let mut wizard = Wizard::new(3).unwrap();
        assert!(!wizard.previous());
        assert_eq!(wizard.current(), 1);

        assert!(wizard.next());
        assert!(wizard.next());
        assert!(wizard.is_final());
        assert!(!wizard.next());
        assert_eq!(wizard.current(), 3);
    }

    #[test]
    fn test_n_minus_one_nexts_reach_last() {
        for total in 1..=12 {
            let mut wizard = Wizard::new(total).unwrap();
            for _ in 0..total - 1 {
                assert!(wizard.next());
            }
            assert_eq!(wizard.current(), total);
            assert!(wizard.is_final());
        }
    }

    #[test]
    fn test_progress_states() {
        let mut wizard = Wizard::new(4).unwrap();
        wizard.next();
        assert_eq!(
            wizard.progress(),
            vec![
                StepState::Completed,
                StepState::Current,
                StepState::Upcoming,
                StepState::Upcoming
            ]
        );
        assert!((wizard.percent() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_step_is_complete_bar() {
        let wizard = Wizard::new(1).unwrap();
        assert!(wizard.is_final());
        assert_eq!(wizard.percent(), 100.0);
    }

    #[test]
    fn test_builder_steps() {
        let mut wizard = BuilderStep::wizard();
        assert_eq!(BuilderStep::at(&wizard), Some(BuilderStep::Basic));
        wizard.next();
        wizard.next();
        wizard.next();
        assert_eq!(BuilderStep::at(&wizard), Some(BuilderStep::Preview));
        assert_eq!(
            BuilderStep::Preview.description(),
            "Preview and publish your form"
        );
    }
}
