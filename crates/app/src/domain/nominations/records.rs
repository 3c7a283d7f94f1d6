//! Nomination Records

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use thiserror::Error;

use crate::{
    domain::identity::{AwardSlug, Email},
    uuids::TypedUuid,
};

pub type NominationUuid = TypedUuid<Nomination>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NominationStatus {
    InProgress,
    Completed,
}

impl NominationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for NominationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NominationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown nomination status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("unknown step: {0}")]
    Unknown(String),

    #[error("{0} is not a completable step")]
    NotCompletable(Step),
}

/// Workflow position. The four work steps are completed in order; `Success` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Nominator,
    Nominee,
    Questionnaire,
    Documents,
    Success,
}

impl Step {
    pub const WORK_STEPS: [Step; 4] = [
        Step::Nominator,
        Step::Nominee,
        Step::Questionnaire,
        Step::Documents,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nominator => "nominator",
            Self::Nominee => "nominee",
            Self::Questionnaire => "questionnaire",
            Self::Documents => "documents",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Step {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nominator" => Ok(Self::Nominator),
            "nominee" => Ok(Self::Nominee),
            "questionnaire" => Ok(Self::Questionnaire),
            "documents" => Ok(Self::Documents),
            "success" => Ok(Self::Success),
            _ => Err(StepError::Unknown(s.to_string())),
        }
    }
}

/// Completion flags. Flags only ever go from `false` to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepProgress {
    pub nominator_done: bool,
    pub nominee_done: bool,
    pub questionnaire_done: bool,
    pub documents_done: bool,

    /// Fixed when the nomination is created.
    pub needs_documents: bool,
}

impl StepProgress {
    /// Fresh progress for a new nomination. Awards without documents start with that step done.
    #[must_use]
    pub fn new(needs_documents: bool) -> Self {
        Self {
            documents_done: !needs_documents,
            needs_documents,
            ..Self::default()
        }
    }

    /// Set the flag for `step`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::NotCompletable`] for [`Step::Success`].
    pub fn complete(&mut self, step: Step) -> Result<(), StepError> {
        match step {
            Step::Nominator => self.nominator_done = true,
            Step::Nominee => self.nominee_done = true,
            Step::Questionnaire => self.questionnaire_done = true,
            Step::Documents => self.documents_done = true,
            Step::Success => return Err(StepError::NotCompletable(step)),
        }

        Ok(())
    }

    #[must_use]
    pub fn is_done(&self, step: Step) -> bool {
        match step {
            Step::Nominator => self.nominator_done,
            Step::Nominee => self.nominee_done,
            Step::Questionnaire => self.questionnaire_done,
            Step::Documents => self.documents_done,
            Step::Success => self.next_step() == Step::Success,
        }
    }

    #[must_use]
    pub fn next_step(&self) -> Step {
        compute_next_step(self)
    }
}

/// First incomplete step in workflow order, or `Success` when nothing remains.
#[must_use]
pub fn compute_next_step(progress: &StepProgress) -> Step {
    if !progress.nominator_done {
        Step::Nominator
    } else if !progress.nominee_done {
        Step::Nominee
    } else if !progress.questionnaire_done {
        Step::Questionnaire
    } else if progress.needs_documents && !progress.documents_done {
        Step::Documents
    } else {
        Step::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nomination {
    pub uuid: NominationUuid,
    pub slug: String,
    pub award: AwardSlug,
    pub email: Email,
    pub status: NominationStatus,

    /// Cached result of [`compute_next_step`] as of the last write.
    pub current_step: Step,

    pub progress: StepProgress,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl Nomination {
    #[must_use]
    pub fn next_step(&self) -> Step {
        self.progress.next_step()
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == NominationStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(flags: [bool; 4], needs_documents: bool) -> StepProgress {
        StepProgress {
            nominator_done: flags[0],
            nominee_done: flags[1],
            questionnaire_done: flags[2],
            documents_done: flags[3],
            needs_documents,
        }
    }

    #[test]
    fn fresh_progress_starts_at_nominator() {
        assert_eq!(StepProgress::new(true).next_step(), Step::Nominator);
        assert_eq!(StepProgress::new(false).next_step(), Step::Nominator);
        assert!(StepProgress::new(false).documents_done);
        assert!(!StepProgress::new(true).documents_done);
    }

    #[test]
    fn next_step_follows_workflow_order() {
        let cases = [
            ([false, false, false, false], true, Step::Nominator),
            ([false, true, true, true], true, Step::Nominator),
            ([true, false, false, false], true, Step::Nominee),
            ([true, false, true, true], true, Step::Nominee),
            ([true, true, false, false], true, Step::Questionnaire),
            ([true, true, true, false], true, Step::Documents),
            ([true, true, true, true], true, Step::Success),
            ([true, true, true, false], false, Step::Success),
        ];

        for (flags, needs_documents, expected) in cases {
            assert_eq!(
                compute_next_step(&progress(flags, needs_documents)),
                expected,
                "flags {flags:?} needs_documents {needs_documents}"
            );
        }
    }

    #[test]
    fn completing_success_is_rejected() {
        let mut progress = StepProgress::new(true);

        assert_eq!(
            progress.complete(Step::Success),
            Err(StepError::NotCompletable(Step::Success))
        );
        assert_eq!(progress, StepProgress::new(true));
    }

    #[test]
    fn completing_is_idempotent() -> Result<(), StepError> {
        let mut progress = StepProgress::new(false);

        progress.complete(Step::Nominee)?;
        progress.complete(Step::Nominee)?;

        assert!(progress.nominee_done);
        assert_eq!(progress.next_step(), Step::Nominator);

        Ok(())
    }

    #[test]
    fn step_names_parse_loosely() {
        assert_eq!(" Questionnaire ".parse::<Step>(), Ok(Step::Questionnaire));
        assert_eq!("success".parse::<Step>(), Ok(Step::Success));
        assert_eq!(
            "payment".parse::<Step>(),
            Err(StepError::Unknown("payment".to_string()))
        );

        for step in Step::WORK_STEPS {
            assert_eq!(step.as_str().parse::<Step>(), Ok(step));
        }
    }

    #[test]
    fn status_round_trips_through_storage_names() {
        assert_eq!("completed".parse(), Ok(NominationStatus::Completed));
        assert!("done".parse::<NominationStatus>().is_err());
    }
}
