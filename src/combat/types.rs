use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which part of the combat loop is active. Exactly one phase is active at
/// a time and it alone decides which inputs are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatPhase {
    #[default]
    Idle,
    Strategy,
    Reaction,
    /// Reserved for presentation-driven interludes; no trigger enters it.
    Transition,
    Shop,
    GameOver,
    Victory,
}

impl CombatPhase {
    pub const ALL: [CombatPhase; 7] = [
        CombatPhase::Idle,
        CombatPhase::Strategy,
        CombatPhase::Reaction,
        CombatPhase::Transition,
        CombatPhase::Shop,
        CombatPhase::GameOver,
        CombatPhase::Victory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CombatPhase::Idle => "Idle",
            CombatPhase::Strategy => "Strategy",
            CombatPhase::Reaction => "Reaction",
            CombatPhase::Transition => "Transition",
            CombatPhase::Shop => "Shop",
            CombatPhase::GameOver => "Game Over",
            CombatPhase::Victory => "Victory",
        }
    }

    /// GameOver can only be left by discarding the whole session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CombatPhase::GameOver)
    }
}

impl fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The five requests that can move the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    StartCombat,
    SelectAction,
    ResolveReaction,
    AdvanceAfterVictory,
    CloseShop,
}

impl Trigger {
    pub const ALL: [Trigger; 5] = [
        Trigger::StartCombat,
        Trigger::SelectAction,
        Trigger::ResolveReaction,
        Trigger::AdvanceAfterVictory,
        Trigger::CloseShop,
    ];

    /// The only phase in which this trigger is accepted.
    pub fn source(&self) -> CombatPhase {
        match self {
            Trigger::StartCombat => CombatPhase::Idle,
            Trigger::SelectAction => CombatPhase::Strategy,
            Trigger::ResolveReaction => CombatPhase::Reaction,
            Trigger::AdvanceAfterVictory => CombatPhase::Victory,
            Trigger::CloseShop => CombatPhase::Shop,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trigger::StartCombat => "start_combat",
            Trigger::SelectAction => "select_action",
            Trigger::ResolveReaction => "resolve_reaction_phase",
            Trigger::AdvanceAfterVictory => "advance_after_victory",
            Trigger::CloseShop => "close_shop",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Phase plus the two progression counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSession {
    pub phase: CombatPhase,
    /// Dungeon level, starts at 1
    pub floor: u32,
    /// Player actions taken since combat started
    pub turn: u32,
}

impl Default for CombatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatSession {
    pub fn new() -> Self {
        Self {
            phase: CombatPhase::Idle,
            floor: 1,
            turn: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatEvent {
    PhaseChanged {
        from: CombatPhase,
        to: CombatPhase,
    },
    ActionSelected {
        action_id: String,
    },
}

/// A trigger was issued from a phase that does not accept it. The session
/// is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal transition: {trigger} is not accepted during {phase}")]
pub struct IllegalTransition {
    pub trigger: Trigger,
    pub phase: CombatPhase,
}
