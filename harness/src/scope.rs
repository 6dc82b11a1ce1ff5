//! Transaction scope
//!
//! Delimits simulated transactions on one mocked chaincode.
//!
//! # State Machine
//!
//! ```text
//! Idle --begin(tx)--> Active --end(tx)--> Idle
//! ```
//!
//! Routed invocations may re-enter an instance that is already Active (a call
//! cycle A -> B -> A). Those open a nested frame with
//! [`TransactionScope::begin_nested`]; the instance returns to Idle only when
//! the outermost frame ends.
//!
//! # Critical Invariants
//!
//! 1. `begin` from the outside while Active is a [`MisuseError`]
//! 2. `end` while Idle, or for a tx id other than the innermost frame's, is a
//!    [`MisuseError`]
//! 3. A rejected call leaves the frame stack untouched

use crate::errors::MisuseError;

/// Observable state of a transaction scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Idle,
    Active,
}

/// Stack of open transaction frames on one instance
#[derive(Debug, Clone, Default)]
pub struct TransactionScope {
    frames: Vec<String>,
}

impl TransactionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScopeState {
        if self.frames.is_empty() {
            ScopeState::Idle
        } else {
            ScopeState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == ScopeState::Active
    }

    /// Transaction id of the innermost open frame
    pub fn current_tx_id(&self) -> Option<&str> {
        self.frames.last().map(String::as_str)
    }

    /// Number of open frames
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Open a top-level transaction (Idle -> Active)
    pub fn begin(&mut self, tx_id: &str) -> Result<(), MisuseError> {
        if let Some(active) = self.current_tx_id() {
            return Err(MisuseError::TransactionAlreadyActive {
                active: active.to_string(),
                requested: tx_id.to_string(),
            });
        }
        self.frames.push(tx_id.to_string());
        Ok(())
    }

    /// Open a frame for a routed invocation, regardless of state
    pub fn begin_nested(&mut self, tx_id: &str) {
        self.frames.push(tx_id.to_string());
    }

    /// Close the innermost frame
    ///
    /// Returns the resulting state so callers can apply end-of-call policies
    /// once the scope is Idle again.
    pub fn end(&mut self, tx_id: &str) -> Result<ScopeState, MisuseError> {
        match self.frames.last() {
            None => Err(MisuseError::TransactionNotActive {
                requested: tx_id.to_string(),
            }),
            Some(active) if active != tx_id => Err(MisuseError::TxIdMismatch {
                active: active.clone(),
                requested: tx_id.to_string(),
            }),
            Some(_) => {
                self.frames.pop();
                Ok(self.state())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_active_idle() {
        let mut scope = TransactionScope::new();
        assert_eq!(scope.state(), ScopeState::Idle);

        scope.begin("tx1").unwrap();
        assert_eq!(scope.state(), ScopeState::Active);
        assert_eq!(scope.current_tx_id(), Some("tx1"));

        assert_eq!(scope.end("tx1").unwrap(), ScopeState::Idle);
        assert_eq!(scope.current_tx_id(), None);
    }

    #[test]
    fn test_begin_while_active_rejected() {
        let mut scope = TransactionScope::new();
        scope.begin("tx1").unwrap();

        let err = scope.begin("tx2").unwrap_err();
        assert_eq!(
            err,
            MisuseError::TransactionAlreadyActive {
                active: "tx1".to_string(),
                requested: "tx2".to_string(),
            }
        );
        assert_eq!(scope.depth(), 1);
        assert_eq!(scope.current_tx_id(), Some("tx1"));
    }

    #[test]
    fn test_end_while_idle_rejected() {
        let mut scope = TransactionScope::new();
        assert!(matches!(
            scope.end("tx1"),
            Err(MisuseError::TransactionNotActive { .. })
        ));
    }

    #[test]
    fn test_end_with_wrong_tx_rejected() {
        let mut scope = TransactionScope::new();
        scope.begin("tx1").unwrap();

        assert!(matches!(
            scope.end("tx2"),
            Err(MisuseError::TxIdMismatch { .. })
        ));
        assert!(scope.is_active());
    }

    #[test]
    fn test_nested_frames_unwind_in_order() {
        let mut scope = TransactionScope::new();
        scope.begin("outer").unwrap();
        scope.begin_nested("outer");
        assert_eq!(scope.depth(), 2);

        assert_eq!(scope.end("outer").unwrap(), ScopeState::Active);
        assert_eq!(scope.end("outer").unwrap(), ScopeState::Idle);
    }
}
