/// Events emitted by session transitions.
/// The presentation layer consumes these for sound and scheduling.

use crate::domain::sky::{Edge, StarId};
use crate::sim::schedule::RoundTicket;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    GameStarted,
    RoundStarted { level: u32, entity: String, stars: usize, targets: usize },
    StarSelected { star: StarId },
    StarDeselected { star: StarId },
    EdgeAccepted { edge: Edge, correct: bool },
    EdgeRejected,
    /// Every target edge matched. The main loop must schedule `ticket`
    /// to fire after the grace period.
    RoundCleared { level: u32, bonus: u32, ticket: RoundTicket },
    LevelUp { level: u32, score: u32 },
    LowTime { remaining: u32 },
    TimeUp { score: u32, level: u32 },
    AwaitingContent,
}
