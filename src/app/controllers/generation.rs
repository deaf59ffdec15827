use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::api::ArtifactId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Editing,
    /// A generate request is in flight. `ticket` identifies it so that late
    /// results and timeouts for older requests can be recognised.
    Generating { ticket: u64 },
    Ready { artifact: ArtifactId },
}

/// Editing -> Generating -> Ready -> Editing, plus failure and timeout edges
/// back to Editing. Every other transition is rejected.
#[derive(Debug)]
pub struct GenerationMachine {
    state: SessionState,
    last_ticket: u64,
}

impl Default for GenerationMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Editing,
            last_ticket: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn artifact(&self) -> Option<&ArtifactId> {
        match &self.state {
            SessionState::Ready { artifact } => Some(artifact),
            _ => None,
        }
    }

    pub fn is_generating(&self) -> bool {
        matches!(self.state, SessionState::Generating { .. })
    }

    pub fn can_generate(&self) -> bool {
        self.state == SessionState::Editing
    }

    /// True if `ticket` names the request currently in flight.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.state == SessionState::Generating { ticket }
    }

    /// Editing -> Generating. Returns the ticket for the new request.
    pub fn begin(&mut self) -> Result<u64> {
        match self.state {
            SessionState::Editing => {
                self.last_ticket += 1;
                let ticket = self.last_ticket;
                self.state = SessionState::Generating { ticket };
                log::info!("generation {} started", ticket);
                Ok(ticket)
            }
            SessionState::Generating { .. } => Err(AppError::Busy(
                "A document is already being generated.".to_string(),
            )),
            SessionState::Ready { .. } => Err(AppError::InvalidTransition(
                "Edit the text or start a new document before generating again.".to_string(),
            )),
        }
    }

    /// Generating -> Ready, only for the ticket in flight.
    pub fn succeed(&mut self, ticket: u64, artifact: ArtifactId) -> Result<()> {
        if !self.is_current(ticket) {
            return Err(AppError::InvalidTransition(format!(
                "stale result for generation {}",
                ticket
            )));
        }
        log::info!("generation {} ready: {}", ticket, artifact.as_str());
        self.state = SessionState::Ready { artifact };
        Ok(())
    }

    /// Generating -> Editing on failure or timeout, only for the ticket in flight.
    pub fn fail(&mut self, ticket: u64) -> Result<()> {
        if !self.is_current(ticket) {
            return Err(AppError::InvalidTransition(format!(
                "stale failure for generation {}",
                ticket
            )));
        }
        log::info!("generation {} failed", ticket);
        self.state = SessionState::Editing;
        Ok(())
    }

    /// The document is about to change. Ready drops its artifact and returns
    /// to Editing; Generating refuses the edit.
    pub fn document_changing(&mut self) -> Result<()> {
        match self.state {
            SessionState::Editing => Ok(()),
            SessionState::Ready { .. } => {
                self.state = SessionState::Editing;
                Ok(())
            }
            SessionState::Generating { .. } => Err(AppError::Busy(
                "Please wait until the PDF has been generated.".to_string(),
            )),
        }
    }

    /// Explicit "start new": Ready -> Editing. A no-op while already editing.
    pub fn start_new(&mut self) -> Result<()> {
        match self.state {
            SessionState::Generating { .. } => Err(AppError::Busy(
                "Please wait until the PDF has been generated.".to_string(),
            )),
            _ => {
                self.state = SessionState::Editing;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str) -> ArtifactId {
        ArtifactId::parse(name).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let mut machine = GenerationMachine::new();
        assert!(machine.can_generate());
        let ticket = machine.begin().unwrap();
        assert!(machine.is_generating());
        machine.succeed(ticket, artifact("a1.pdf")).unwrap();
        assert_eq!(machine.artifact(), Some(&artifact("a1.pdf")));

        machine.document_changing().unwrap();
        assert_eq!(machine.state(), &SessionState::Editing);
        assert_eq!(machine.artifact(), None);
    }

    #[test]
    fn test_second_generate_rejected() {
        let mut machine = GenerationMachine::new();
        machine.begin().unwrap();
        assert!(matches!(machine.begin(), Err(AppError::Busy(_))));
    }

    #[test]
    fn test_cannot_skip_to_ready() {
        let mut machine = GenerationMachine::new();
        assert!(machine.succeed(1, artifact("x.pdf")).is_err());
        assert_eq!(machine.state(), &SessionState::Editing);
    }

    #[test]
    fn test_generate_from_ready_rejected() {
        let mut machine = GenerationMachine::new();
        let ticket = machine.begin().unwrap();
        machine.succeed(ticket, artifact("x.pdf")).unwrap();
        assert!(matches!(machine.begin(), Err(AppError::InvalidTransition(_))));
    }

    #[test]
    fn test_failure_returns_to_editing() {
        let mut machine = GenerationMachine::new();
        let ticket = machine.begin().unwrap();
        machine.fail(ticket).unwrap();
        assert!(machine.can_generate());
    }

    #[test]
    fn test_late_success_after_timeout_is_ignored() {
        let mut machine = GenerationMachine::new();
        let ticket = machine.begin().unwrap();
        machine.fail(ticket).unwrap();

        assert!(machine.succeed(ticket, artifact("late.pdf")).is_err());
        assert_eq!(machine.state(), &SessionState::Editing);
    }

    #[test]
    fn test_late_success_for_older_ticket_ignored_while_regenerating() {
        let mut machine = GenerationMachine::new();
        let first = machine.begin().unwrap();
        machine.fail(first).unwrap();
        let second = machine.begin().unwrap();
        assert_ne!(first, second);

        assert!(machine.succeed(first, artifact("old.pdf")).is_err());
        assert!(machine.is_current(second));
        machine.succeed(second, artifact("new.pdf")).unwrap();
        assert_eq!(machine.artifact(), Some(&artifact("new.pdf")));
    }

    #[test]
    fn test_edits_blocked_while_generating() {
        let mut machine = GenerationMachine::new();
        machine.begin().unwrap();
        assert!(machine.document_changing().is_err());
        assert!(machine.start_new().is_err());
        assert!(machine.is_generating());
    }

    #[test]
    fn test_start_new() {
        let mut machine = GenerationMachine::new();
        machine.start_new().unwrap();
        let ticket = machine.begin().unwrap();
        machine.succeed(ticket, artifact("x.pdf")).unwrap();
        machine.start_new().unwrap();
        assert_eq!(machine.state(), &SessionState::Editing);
    }
}
