use wallet_flow_core::{PanelContent, WorkflowOutcome};

/// Inline message under a screen's form. Error and info replace each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenNotice {
    pub last_error: Option<String>,
    pub last_info: Option<String>,
}

impl ScreenNotice {
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_info = None;
        self.last_error = Some(message.into());
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.last_error = None;
        self.last_info = Some(message.into());
    }

    pub fn clear_notice(&mut self) {
        self.last_error = None;
        self.last_info = None;
    }
}

/// Where a screen goes once its workflow run has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenExit {
    /// Pop back to the previous screen.
    GoBack,
    /// Stay; the error panel (or nothing, after a cancel) is on screen.
    Stay,
    /// Stay on a follow-up panel such as the sell order share sheet.
    FollowUp(PanelContent),
}

impl ScreenExit {
    pub fn from_outcome(outcome: &WorkflowOutcome) -> Self {
        match outcome {
            WorkflowOutcome::Succeeded { receipt, .. } => match &receipt.follow_up {
                Some(panel) => ScreenExit::FollowUp(panel.clone()),
                None => ScreenExit::GoBack,
            },
            WorkflowOutcome::Failed { .. } | WorkflowOutcome::Aborted { .. } => ScreenExit::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_flow_core::{BroadcastReceipt, InvocationId};

    #[test]
    fn notices_replace_each_other() {
        let mut notice = ScreenNotice::default();
        notice.set_error("Invalid port");
        notice.set_info("Server added");
        assert_eq!(notice.last_error, None);
        assert_eq!(notice.last_info.as_deref(), Some("Server added"));
        notice.clear_notice();
        assert_eq!(notice, ScreenNotice::default());
    }

    #[test]
    fn success_without_follow_up_goes_back() {
        let outcome = WorkflowOutcome::Succeeded {
            invocation: InvocationId(1),
            receipt: BroadcastReceipt::with_txid("ab"),
        };
        assert_eq!(ScreenExit::from_outcome(&outcome), ScreenExit::GoBack);
        let aborted = WorkflowOutcome::Aborted {
            invocation: InvocationId(2),
        };
        assert_eq!(ScreenExit::from_outcome(&aborted), ScreenExit::Stay);
    }
}
