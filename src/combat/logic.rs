//! The authoritative phase/turn controller.

use super::types::*;
use crate::events::{EventBus, EventQueue, ListenerId};
use tracing::debug;

#[derive(Debug, Default)]
pub struct CombatStateMachine {
    session: CombatSession,
    events: EventBus<CombatEvent>,
}

impl CombatStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start on a later floor, e.g. when resuming a run.
    pub fn with_floor(floor: u32) -> Self {
        let mut machine = Self::new();
        machine.session.floor = floor.max(1);
        machine
    }

    pub fn session(&self) -> CombatSession {
        self.session
    }

    pub fn phase(&self) -> CombatPhase {
        self.session.phase
    }

    pub fn floor(&self) -> u32 {
        self.session.floor
    }

    pub fn turn(&self) -> u32 {
        self.session.turn
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CombatEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Subscribe a queue that collects every event for later draining.
    pub fn queue(&mut self) -> EventQueue<CombatEvent> {
        self.events.queue()
    }

    /// Idle -> Strategy. Resets the turn counter.
    pub fn start_combat(&mut self) -> Result<(), IllegalTransition> {
        self.accept(Trigger::StartCombat)?;
        self.session.turn = 0;
        self.transition_to(CombatPhase::Strategy);
        Ok(())
    }

    /// Strategy -> Reaction. Counts the turn and announces the action before
    /// the phase changes.
    pub fn select_action(&mut self, action_id: &str) -> Result<(), IllegalTransition> {
        self.accept(Trigger::SelectAction)?;
        self.session.turn += 1;
        self.events.emit(&CombatEvent::ActionSelected {
            action_id: action_id.to_string(),
        });
        self.transition_to(CombatPhase::Reaction);
        Ok(())
    }

    /// Reaction -> GameOver | Victory | Strategy. A dead player takes
    /// priority over a dead enemy.
    pub fn resolve_reaction_phase(
        &mut self,
        player_alive: bool,
        enemy_alive: bool,
    ) -> Result<CombatPhase, IllegalTransition> {
        self.accept(Trigger::ResolveReaction)?;
        let next = if !player_alive {
            CombatPhase::GameOver
        } else if !enemy_alive {
            CombatPhase::Victory
        } else {
            CombatPhase::Strategy
        };
        self.transition_to(next);
        Ok(next)
    }

    /// Victory -> Shop, one floor deeper.
    pub fn advance_after_victory(&mut self) -> Result<(), IllegalTransition> {
        self.accept(Trigger::AdvanceAfterVictory)?;
        self.session.floor += 1;
        self.transition_to(CombatPhase::Shop);
        Ok(())
    }

    /// Shop -> Strategy; combat resumes on the new floor.
    pub fn close_shop(&mut self) -> Result<(), IllegalTransition> {
        self.accept(Trigger::CloseShop)?;
        self.transition_to(CombatPhase::Strategy);
        Ok(())
    }

    fn accept(&self, trigger: Trigger) -> Result<(), IllegalTransition> {
        let phase = self.session.phase;
        if phase == trigger.source() {
            return Ok(());
        }
        debug!(%trigger, %phase, "ignoring out-of-phase transition");
        Err(IllegalTransition { trigger, phase })
    }

    fn transition_to(&mut self, to: CombatPhase) {
        let from = self.session.phase;
        self.session.phase = to;
        debug!(
            %from,
            %to,
            floor = self.session.floor,
            turn = self.session.turn,
            "phase changed"
        );
        self.events.emit(&CombatEvent::PhaseChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_changes(events: &[CombatEvent]) -> Vec<(CombatPhase, CombatPhase)> {
        events
            .iter()
            .filter_map(|e| match e {
                CombatEvent::PhaseChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_combat_from_idle() {
        let mut fsm = CombatStateMachine::new();
        let events = fsm.queue();
        assert!(fsm.start_combat().is_ok());
        assert_eq!(fsm.phase(), CombatPhase::Strategy);
        assert_eq!(fsm.turn(), 0);
        assert_eq!(
            phase_changes(&events.drain()),
            vec![(CombatPhase::Idle, CombatPhase::Strategy)]
        );
    }

    #[test]
    fn test_start_combat_twice_is_rejected() {
        let mut fsm = CombatStateMachine::new();
        fsm.start_combat().unwrap();
        let events = fsm.queue();
        let err = fsm.start_combat().unwrap_err();
        assert_eq!(err.trigger, Trigger::StartCombat);
        assert_eq!(err.phase, CombatPhase::Strategy);
        assert!(events.is_empty());
    }

    #[test]
    fn test_action_selected_precedes_phase_change() {
        let mut fsm = CombatStateMachine::new();
        fsm.start_combat().unwrap();
        let events = fsm.queue();
        fsm.select_action("slash").unwrap();

        assert_eq!(
            events.drain(),
            vec![
                CombatEvent::ActionSelected {
                    action_id: "slash".to_string()
                },
                CombatEvent::PhaseChanged {
                    from: CombatPhase::Strategy,
                    to: CombatPhase::Reaction
                },
            ]
        );
        assert_eq!(fsm.turn(), 1);
    }

    #[test]
    fn test_resolve_priority_player_death_wins() {
        let mut fsm = CombatStateMachine::new();
        fsm.start_combat().unwrap();
        fsm.select_action("slash").unwrap();
        assert_eq!(
            fsm.resolve_reaction_phase(false, false),
            Ok(CombatPhase::GameOver)
        );
        assert!(fsm.phase().is_terminal());
    }

    #[test]
    fn test_resolve_both_alive_returns_to_strategy() {
        let mut fsm = CombatStateMachine::new();
        fsm.start_combat().unwrap();
        fsm.select_action("guard").unwrap();
        assert_eq!(
            fsm.resolve_reaction_phase(true, true),
            Ok(CombatPhase::Strategy)
        );
    }

    #[test]
    fn test_with_floor_clamps_to_one() {
        assert_eq!(CombatStateMachine::with_floor(0).floor(), 1);
        assert_eq!(CombatStateMachine::with_floor(5).floor(), 5);
    }

    #[test]
    fn test_listener_sees_new_phase_synchronously() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let mut fsm = CombatStateMachine::new();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        fsm.subscribe(move |e| {
            if let CombatEvent::PhaseChanged { to, .. } = e {
                *s.borrow_mut() = Some(*to);
            }
        });
        fsm.start_combat().unwrap();
        assert_eq!(*seen.borrow(), Some(CombatPhase::Strategy));
    }
}
