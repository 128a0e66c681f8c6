// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job profiles: the ordered, prerequisite-gated set of steps a job type
//! runs.
//!
//! A profile is static configuration, not run state — it is attached to a
//! [`crate::run::Run`] at start time and carried along so the run can be
//! interpreted (which steps remain, which are prerequisites of which)
//! without a side-channel lookup back to whatever produced the profile.

use crate::run::{RunStatus, StepInfo, StepName, StepStatus};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// One step definition within a [`JobProfile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDef {
    pub name: StepName,
    /// Steps that must have succeeded before this one may.
    #[serde(default)]
    pub prerequisites: Vec<StepName>,
    /// If true, this step still runs (and is still eligible to report
    /// progress) after an abort, instead of being force-failed.
    #[serde(default)]
    pub run_always: bool,
    /// Terminal run status this step's failure maps to. `None` surfaces as
    /// [`RunStatus::Error`] rather than a guessed status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_status: Option<RunStatus>,
}

impl StepDef {
    pub fn new(name: impl Into<StepName>) -> Self {
        Self {
            name: name.into(),
            prerequisites: Vec::new(),
            run_always: false,
            failure_status: None,
        }
    }

    pub fn requires(mut self, prerequisite: impl Into<StepName>) -> Self {
        self.prerequisites.push(prerequisite.into());
        self
    }

    pub fn run_always(mut self) -> Self {
        self.run_always = true;
        self
    }

    pub fn fails_as(mut self, status: RunStatus) -> Self {
        self.failure_status = Some(status);
        self
    }
}

/// Errors constructing a [`JobProfile`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("step '{0}' lists itself or duplicates an existing step")]
    DuplicateStep(String),
    #[error("step '{0}' requires unknown step '{1}'")]
    UnknownPrerequisite(String, String),
    #[error("profile has a prerequisite cycle involving step '{0}'")]
    Cycle(String),
}

/// The ordered DAG of steps a job type runs.
///
/// Iteration order of `steps` is the declared order, used as the tiebreak
/// when deriving a terminal status from the first failing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProfile {
    pub steps: IndexMap<StepName, StepDef>,
}

impl JobProfile {
    /// Build a profile from an ordered list of step definitions, validating
    /// that prerequisites reference only earlier-or-equal known steps and
    /// that there is no cycle.
    pub fn new(defs: Vec<StepDef>) -> Result<Self, ProfileError> {
        let mut steps = IndexMap::new();
        for def in defs {
            if steps.contains_key(&def.name) {
                return Err(ProfileError::DuplicateStep(def.name.to_string()));
            }
            steps.insert(def.name.clone(), def);
        }
        for def in steps.values() {
            for prereq in &def.prerequisites {
                if !steps.contains_key(prereq) {
                    return Err(ProfileError::UnknownPrerequisite(
                        def.name.to_string(),
                        prereq.to_string(),
                    ));
                }
            }
        }
        let profile = Self { steps };
        profile.check_acyclic()?;
        Ok(profile)
    }

    fn check_acyclic(&self) -> Result<(), ProfileError> {
        #[derive(PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: std::collections::HashMap<&StepName, Mark> = std::collections::HashMap::new();

        fn visit<'a>(
            name: &'a StepName,
            steps: &'a IndexMap<StepName, StepDef>,
            marks: &mut std::collections::HashMap<&'a StepName, Mark>,
        ) -> Result<(), ProfileError> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(ProfileError::Cycle(name.to_string())),
                None => {}
            }
            marks.insert(name, Mark::Visiting);
            if let Some(def) = steps.get(name) {
                for prereq in &def.prerequisites {
                    visit(prereq, steps, marks)?;
                }
            }
            marks.insert(name, Mark::Done);
            Ok(())
        }

        for name in self.steps.keys() {
            visit(name, &self.steps, &mut marks)?;
        }
        Ok(())
    }

    /// Every step starts unfinished, in declared order.
    pub fn initial_step_statuses(&self) -> IndexMap<StepName, StepInfo> {
        self.steps
            .keys()
            .map(|name| (name.clone(), StepInfo::unfinished()))
            .collect()
    }

    /// Direct prerequisites of a step (empty if the step is unknown).
    pub fn prerequisites_of(&self, step: &StepName) -> &[StepName] {
        self.steps
            .get(step)
            .map(|def| def.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    /// The transitive closure of a step's prerequisites.
    pub fn all_prerequisites(&self, step: &StepName) -> HashSet<StepName> {
        let mut seen = HashSet::new();
        let mut stack: Vec<StepName> = self.prerequisites_of(step).to_vec();
        while let Some(next) = stack.pop() {
            if seen.insert(next.clone()) {
                stack.extend(self.prerequisites_of(&next).iter().cloned());
            }
        }
        seen
    }

    /// Whether every prerequisite of `step` has succeeded in `steps`.
    pub fn prerequisites_satisfied(
        &self,
        step: &StepName,
        steps: &IndexMap<StepName, StepInfo>,
    ) -> bool {
        self.prerequisites_of(step).iter().all(|prereq| {
            steps
                .get(prereq)
                .map(|info| info.status == StepStatus::Succeeded)
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
