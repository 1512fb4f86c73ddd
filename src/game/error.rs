//! Errors for rejected game actions.
//!
//! Every rejection leaves the game state unchanged. The `Display` text is
//! meant to be shown to the player.

use thiserror::Error;

use super::mulligan::MulliganPhase;
use crate::cards::InstanceId;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("you cannot take more than {max} mulligans")]
    MulliganLimit { max: u32 },

    #[error("cannot {action} while the mulligan is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: MulliganPhase,
    },

    #[error("card {0} is not in the opening hand")]
    CardNotInOpeningHand(InstanceId),
}
