use crate::error::ExitReason;

/// Wizard stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CategorySelect,
    TemplateSelect,
    VariableInput,
    Install,
}

impl Stage {
    pub fn index(self) -> i32 {
        match self {
            Stage::CategorySelect => 0,
            Stage::TemplateSelect => 1,
            Stage::VariableInput => 2,
            Stage::Install => 3,
        }
    }

    /// `None` for any index outside 0..=3, including the -1 reached by backing out
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Stage::CategorySelect),
            1 => Some(Stage::TemplateSelect),
            2 => Some(Stage::VariableInput),
            3 => Some(Stage::Install),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::CategorySelect => "category selection",
            Stage::TemplateSelect => "template selection",
            Stage::VariableInput => "variable input",
            Stage::Install => "installation",
        }
    }
}

/// What a stage handler asks the loop to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Move to the next stage
    Proceed,

    /// Move to the previous stage; backing out of the first stage ends the session
    Back,

    /// Show the same stage again (after help or a rejected selection)
    Stay,

    /// Jump back to an earlier stage after a failed download the user wants to retry
    Restart(Stage),

    /// Installation finished
    Finish,

    /// Stop now
    Abort(ExitReason),
}

/// Result of applying a transition to the current stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(Stage),
    Exit(ExitReason),
}

/// Apply `transition` to `stage`. Proceed and Back move exactly one stage.
pub fn apply(stage: Stage, transition: Transition) -> Step {
    match transition {
        Transition::Proceed => match Stage::from_index(stage.index() + 1) {
            Some(next) => Step::Continue(next),
            None => Step::Exit(ExitReason::Completed),
        },
        Transition::Back => match Stage::from_index(stage.index() - 1) {
            Some(previous) => Step::Continue(previous),
            None => Step::Exit(ExitReason::Cancelled),
        },
        Transition::Stay => Step::Continue(stage),
        Transition::Restart(target) => Step::Continue(target),
        Transition::Finish => Step::Exit(ExitReason::Completed),
        Transition::Abort(reason) => Step::Exit(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Stage; 4] = [
        Stage::CategorySelect,
        Stage::TemplateSelect,
        Stage::VariableInput,
        Stage::Install,
    ];

    #[test]
    fn test_index_round_trip() {
        for stage in ALL {
            assert_eq!(Stage::from_index(stage.index()), Some(stage));
        }
        assert_eq!(Stage::from_index(-1), None);
        assert_eq!(Stage::from_index(4), None);
    }

    #[test]
    fn test_back_from_variable_input_lands_on_template_select() {
        assert_eq!(
            apply(Stage::VariableInput, Transition::Back),
            Step::Continue(Stage::TemplateSelect)
        );
    }

    #[test]
    fn test_proceed_and_back_move_one_stage() {
        for stage in ALL {
            if let Step::Continue(next) = apply(stage, Transition::Proceed) {
                assert_eq!(next.index(), stage.index() + 1);
            }
            if let Step::Continue(previous) = apply(stage, Transition::Back) {
                assert_eq!(previous.index(), stage.index() - 1);
            }
        }
    }

    #[test]
    fn test_back_from_first_stage_terminates() {
        assert_eq!(
            apply(Stage::CategorySelect, Transition::Back),
            Step::Exit(ExitReason::Cancelled)
        );
    }

    #[test]
    fn test_stay_repeats_stage() {
        for stage in ALL {
            assert_eq!(apply(stage, Transition::Stay), Step::Continue(stage));
        }
    }

    #[test]
    fn test_restart_and_terminal_transitions() {
        assert_eq!(
            apply(Stage::Install, Transition::Restart(Stage::CategorySelect)),
            Step::Continue(Stage::CategorySelect)
        );
        assert_eq!(
            apply(Stage::Install, Transition::Finish),
            Step::Exit(ExitReason::Completed)
        );
        assert_eq!(
            apply(Stage::TemplateSelect, Transition::Abort(ExitReason::Cancelled)),
            Step::Exit(ExitReason::Cancelled)
        );
    }
}
