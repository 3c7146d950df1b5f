//! Tutorial progression
//!
//! A level may carry an ordered list of tutorial steps. The current step is
//! shown until its trigger holds, then the next one replaces it; after the
//! last step the panel is hidden.

use serde::{Deserialize, Serialize};

/// Screen rectangle for the tutorial panel (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Condition that completes a tutorial step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    RemainingGuidesBelow(usize),
    HoldingBlock,
    ElapsedSecondsAbove(u64),
    All(Vec<Trigger>),
}

/// What a trigger gets to look at
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerContext {
    pub remaining_guides: usize,
    pub holding: bool,
    /// Whole seconds since the level started
    pub elapsed_seconds: u64,
}

impl Trigger {
    pub fn holds(&self, ctx: &TriggerContext) -> bool {
        match self {
            Trigger::RemainingGuidesBelow(n) => ctx.remaining_guides < *n,
            Trigger::HoldingBlock => ctx.holding,
            Trigger::ElapsedSecondsAbove(n) => ctx.elapsed_seconds > *n,
            Trigger::All(all) => all.iter().all(|t| t.holds(ctx)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorialStep {
    pub region: Region,
    /// May contain `<br />` line breaks
    pub text: String,
    pub trigger: Trigger,
}

/// Panel change for the host to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TutorialEvent {
    /// Show step `n`
    Show(usize),
    Hide,
}

#[derive(Debug, Clone, Default)]
pub struct Tutorial {
    steps: Vec<TutorialStep>,
    index: usize,
    showing: bool,
}

impl Tutorial {
    pub fn new(steps: Vec<TutorialStep>) -> Self {
        Self {
            steps,
            index: 0,
            showing: false,
        }
    }

    pub fn step(&self, index: usize) -> Option<&TutorialStep> {
        self.steps.get(index)
    }

    /// Index of the step on screen, if any
    pub fn current(&self) -> Option<usize> {
        (self.showing && self.index < self.steps.len()).then_some(self.index)
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.steps.len()
    }

    /// Evaluate the current step. Returns the latest panel change this frame.
    pub fn advance(&mut self, ctx: &TriggerContext) -> Option<TutorialEvent> {
        let Some(step) = self.steps.get(self.index) else {
            if self.showing {
                self.showing = false;
                return Some(TutorialEvent::Hide);
            }
            return None;
        };

        let mut event = None;
        if !self.showing {
            self.showing = true;
            event = Some(TutorialEvent::Show(self.index));
        }
        if step.trigger.holds(ctx) {
            self.index += 1;
            if self.index < self.steps.len() {
                event = Some(TutorialEvent::Show(self.index));
            }
        }
        event
    }
}
