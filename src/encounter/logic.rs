//! Encounter orchestration.
//!
//! [`Encounter`] is the glue between the combat core and the rest of the
//! game: it listens to the state machine and the parry window, applies
//! damage, grants rewards, runs bullet time and paces everything with
//! scheduled steps on a single millisecond clock.

use super::types::*;
use crate::combat::{CombatEvent, CombatPhase, CombatSession, CombatStateMachine};
use crate::core::constants::*;
use crate::events::{EventBus, EventQueue, ListenerId};
use crate::parry::{ParryEvent, ParryWindow, ParryWindowState};
use crate::timer::{TimerId, Timers};
use crate::upgrades::{
    floor_reward, PurchaseReceipt, UpgradeKind, UpgradeRecord, UpgradeStorage, UpgradeStore,
};
use tracing::{debug, info, warn};

/// Delayed follow-ups scheduled by the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    StartCombat,
    EnemyAttack { parryable: bool },
    EnemyStrike { parryable: bool },
    EndReaction,
    EnemyDefeated,
    AdvanceFloor,
    BulletTimeEnd,
}

#[derive(Debug)]
pub struct Encounter<S: UpgradeStorage> {
    config: EncounterConfig,
    store: UpgradeStore<S>,
    record: UpgradeRecord,
    machine: CombatStateMachine,
    machine_events: EventQueue<CombatEvent>,
    parry: ParryWindow,
    parry_events: EventQueue<ParryEvent>,
    steps: Timers<Step>,
    bullet_time: Option<TimerId>,
    player: Combatant,
    enemy: Combatant,
    cues: EventBus<EncounterCue>,
}

impl<S: UpgradeStorage> Encounter<S> {
    pub fn new(config: EncounterConfig, store: UpgradeStore<S>) -> Self {
        Self::with_floor(config, store, 1)
    }

    /// Load the upgrade record and schedule the start of combat on `floor`.
    pub fn with_floor(config: EncounterConfig, store: UpgradeStore<S>, floor: u32) -> Self {
        let record = store.load();
        let mut machine = CombatStateMachine::with_floor(floor);
        let machine_events = machine.queue();
        let mut parry = ParryWindow::new();
        let parry_events = parry.queue();
        let mut steps = Timers::new();
        steps.schedule(config.start_delay_ms, Step::StartCombat);

        let player = Combatant::new(record.max_hit_points());
        let enemy = Combatant::new(enemy_max_hp(machine.floor()));
        info!(
            floor = machine.floor(),
            player_hp = player.max_hp,
            enemy_hp = enemy.max_hp,
            "encounter created"
        );

        Self {
            config,
            store,
            record,
            machine,
            machine_events,
            parry,
            parry_events,
            steps,
            bullet_time: None,
            player,
            enemy,
            cues: EventBus::new(),
        }
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn session(&self) -> CombatSession {
        self.machine.session()
    }

    pub fn phase(&self) -> CombatPhase {
        self.machine.phase()
    }

    pub fn player(&self) -> &Combatant {
        &self.player
    }

    pub fn enemy(&self) -> &Combatant {
        &self.enemy
    }

    pub fn record(&self) -> &UpgradeRecord {
        &self.record
    }

    pub fn store(&self) -> &UpgradeStore<S> {
        &self.store
    }

    pub fn parry_state(&self) -> ParryWindowState {
        self.parry.state()
    }

    pub fn now_ms(&self) -> u64 {
        self.steps.now_ms()
    }

    pub fn is_bullet_time(&self) -> bool {
        self.bullet_time.is_some()
    }

    /// Game speed the presentation layer should run at.
    pub fn time_scale(&self) -> f64 {
        if self.is_bullet_time() {
            BULLET_TIME_SCALE
        } else {
            1.0
        }
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&EncounterCue) + 'static,
    {
        self.cues.subscribe(listener)
    }

    pub fn cue_queue(&mut self) -> EventQueue<EncounterCue> {
        self.cues.queue()
    }

    /// Player picks a stroke during Strategy.
    pub fn select_skill(&mut self, skill: Skill) -> Result<(), EncounterError> {
        self.machine.select_action(skill.id())?;
        self.process_events();
        Ok(())
    }

    /// Player input. During Reaction it tries to parry; anything that is not
    /// a parry flips gravity.
    pub fn tap(&mut self) -> TapOutcome {
        let outcome = match self.machine.phase() {
            CombatPhase::Reaction if self.parry.attempt() => TapOutcome::Parried,
            CombatPhase::Reaction | CombatPhase::Strategy => {
                self.emit(EncounterCue::GravityFlip);
                TapOutcome::Flipped
            }
            _ => TapOutcome::Ignored,
        };
        self.process_events();
        outcome
    }

    pub fn purchase(&mut self, kind: UpgradeKind) -> Result<PurchaseReceipt, EncounterError> {
        let phase = self.machine.phase();
        if phase != CombatPhase::Shop {
            return Err(EncounterError::ShopClosed(phase));
        }
        let receipt = self.store.purchase(&mut self.record, kind)?;
        self.emit(EncounterCue::UpgradePurchased {
            kind,
            level: receipt.new_level,
        });
        Ok(receipt)
    }

    /// Leave the shop and face the next floor's enemy at full (upgraded) HP.
    pub fn close_shop(&mut self) -> Result<(), EncounterError> {
        self.machine.close_shop()?;
        let floor = self.machine.floor();
        self.enemy = Combatant::new(enemy_max_hp(floor));
        self.player = Combatant::new(self.record.max_hit_points());
        info!(
            floor,
            player_hp = self.player.max_hp,
            enemy_hp = self.enemy.max_hp,
            "floor entered"
        );
        self.process_events();
        self.emit(EncounterCue::FloorEntered {
            floor,
            enemy_hp: self.enemy.max_hp,
        });
        Ok(())
    }

    /// Advance the clock by `elapsed_ms`. Parry deadlines and scheduled steps
    /// fire in deadline order; on a tie the parry deadline goes first.
    pub fn update(&mut self, elapsed_ms: u64) {
        let target = self.steps.now_ms().saturating_add(elapsed_ms);
        loop {
            let parry_due = self.parry.next_deadline().filter(|d| *d <= target);
            let step_due = self.steps.next_deadline().filter(|d| *d <= target);
            match (parry_due, step_due) {
                (None, None) => break,
                (Some(deadline), step) if step.map_or(true, |s| deadline <= s) => {
                    self.steps.advance_clock(deadline);
                    self.parry.advance_to(deadline);
                }
                _ => {
                    let Some(fired) = self.steps.pop_due(target) else {
                        break;
                    };
                    self.parry.advance_to(fired.deadline_ms);
                    self.run_step(fired.payload);
                }
            }
            self.process_events();
        }
        self.steps.advance_clock(target);
        self.parry.advance_to(target);
        self.process_events();
    }

    fn run_step(&mut self, step: Step) {
        debug!(?step, now_ms = self.now_ms(), "running step");
        match step {
            Step::StartCombat => {
                if let Err(e) = self.machine.start_combat() {
                    debug!(error = %e, "combat start skipped");
                }
            }
            Step::EnemyAttack { parryable } => {
                self.emit(EncounterCue::EnemyTelegraph);
                self.steps
                    .schedule(self.config.enemy_windup_ms, Step::EnemyStrike { parryable });
            }
            Step::EnemyStrike { parryable: true } => {
                if let Err(e) = self.parry.open(self.config.parry_window_ms) {
                    warn!(error = %e, "enemy strike while a parry window is open");
                }
            }
            Step::EnemyStrike { parryable: false } => {
                let damage = scaled_damage(ENEMY_ATTACK_DAMAGE, DIRECT_HIT_MULTIPLIER);
                self.hit(Side::Player, damage, false);
                self.steps
                    .schedule(self.config.direct_hit_delay_ms, Step::EndReaction);
            }
            Step::EndReaction => self.end_reaction(),
            Step::EnemyDefeated => {
                if let Err(e) = self.machine.resolve_reaction_phase(true, false) {
                    debug!(error = %e, "enemy defeat resolved outside reaction");
                }
            }
            Step::AdvanceFloor => {
                if let Err(e) = self.machine.advance_after_victory() {
                    debug!(error = %e, "floor advance skipped");
                }
            }
            Step::BulletTimeEnd => {
                self.bullet_time = None;
                self.emit(EncounterCue::BulletTimeEnded);
            }
        }
    }

    fn process_events(&mut self) {
        loop {
            let mut handled = false;
            while let Some(event) = self.machine_events.pop() {
                handled = true;
                self.on_combat_event(event);
            }
            while let Some(event) = self.parry_events.pop() {
                handled = true;
                self.on_parry_event(event);
            }
            if !handled {
                break;
            }
        }
    }

    fn on_combat_event(&mut self, event: CombatEvent) {
        match event {
            CombatEvent::ActionSelected { action_id } => match Skill::from_id(&action_id) {
                Some(skill) => self.execute_skill(skill),
                None => warn!(%action_id, "unknown action selected"),
            },
            CombatEvent::PhaseChanged { from, to } => {
                self.emit(EncounterCue::PhaseChanged { from, to });
                match to {
                    CombatPhase::Victory => self.on_victory(),
                    CombatPhase::GameOver => {
                        info!(
                            floor = self.machine.floor(),
                            turn = self.machine.turn(),
                            "player defeated"
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    fn on_parry_event(&mut self, event: ParryEvent) {
        match event {
            ParryEvent::WindowOpened => self.emit(EncounterCue::ParryWindowOpened),
            ParryEvent::ParrySuccess => {
                self.emit(EncounterCue::ParrySucceeded);
                self.start_bullet_time();
                let reflected = scaled_damage(
                    ENEMY_ATTACK_DAMAGE,
                    PARRY_REFLECT_MULTIPLIER * self.record.damage_multiplier(),
                );
                self.hit(Side::Enemy, reflected, true);
                self.steps
                    .schedule(self.config.parry_resolve_delay_ms, Step::EndReaction);
            }
            ParryEvent::WindowMissed => {
                self.emit(EncounterCue::ParryMissed);
                self.hit(Side::Player, ENEMY_ATTACK_DAMAGE, false);
                self.steps
                    .schedule(self.config.miss_resolve_delay_ms, Step::EndReaction);
            }
        }
    }

    fn execute_skill(&mut self, skill: Skill) {
        self.emit(EncounterCue::SkillUsed { skill });
        if skill == Skill::Guard {
            self.player.activate_guard();
            self.steps.schedule(
                self.config.guard_delay_ms,
                Step::EnemyAttack { parryable: false },
            );
            return;
        }

        let damage = scaled_damage(skill.base_damage(), self.record.damage_multiplier());
        self.hit(Side::Enemy, damage, false);
        if !self.enemy.is_alive() {
            self.steps
                .schedule(self.config.enemy_death_delay_ms, Step::EnemyDefeated);
            return;
        }
        self.steps.schedule(
            self.config.attack_delay_ms,
            Step::EnemyAttack {
                parryable: skill.allows_parry(),
            },
        );
    }

    fn end_reaction(&mut self) {
        self.parry.reset();
        let player_alive = self.player.is_alive();
        let enemy_alive = self.enemy.is_alive();
        if let Err(e) = self
            .machine
            .resolve_reaction_phase(player_alive, enemy_alive)
        {
            debug!(error = %e, "reaction already resolved");
        }
    }

    fn on_victory(&mut self) {
        let amount = floor_reward(self.machine.floor());
        let balance = self.store.grant_reward(&mut self.record, amount);
        self.emit(EncounterCue::InkAwarded { amount, balance });
        self.steps
            .schedule(self.config.victory_delay_ms, Step::AdvanceFloor);
    }

    fn start_bullet_time(&mut self) {
        if let Some(id) = self.bullet_time.take() {
            self.steps.cancel(id);
        }
        let duration_ms = self.record.bullet_time_ms();
        self.bullet_time = Some(self.steps.schedule(duration_ms, Step::BulletTimeEnd));
        self.emit(EncounterCue::BulletTimeStarted {
            duration_ms,
            time_scale: BULLET_TIME_SCALE,
        });
    }

    fn hit(&mut self, target: Side, amount: u32, reflected: bool) -> u32 {
        let combatant = match target {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        };
        let was_alive = combatant.is_alive();
        let dealt = combatant.take_damage(amount);
        let died = was_alive && !combatant.is_alive();

        self.emit(EncounterCue::DamageDealt {
            target,
            amount: dealt,
            reflected,
        });
        if died {
            self.emit(EncounterCue::Defeated { side: target });
        }
        dealt
    }

    fn emit(&mut self, cue: EncounterCue) {
        self.cues.emit(&cue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrades::MemoryStorage;

    fn encounter() -> Encounter<MemoryStorage> {
        Encounter::new(
            EncounterConfig::default(),
            UpgradeStore::new(MemoryStorage::new()),
        )
    }

    #[test]
    fn test_combat_starts_after_delay() {
        let mut enc = encounter();
        enc.update(COMBAT_START_DELAY_MS - 1);
        assert_eq!(enc.phase(), CombatPhase::Idle);
        enc.update(1);
        assert_eq!(enc.phase(), CombatPhase::Strategy);
    }

    #[test]
    fn test_select_skill_outside_strategy_is_rejected() {
        let mut enc = encounter();
        assert!(matches!(
            enc.select_skill(Skill::Slash),
            Err(EncounterError::Transition(_))
        ));
        assert_eq!(enc.enemy().hp, 60);
    }

    #[test]
    fn test_slash_damages_enemy_immediately() {
        let mut enc = encounter();
        enc.update(COMBAT_START_DELAY_MS);
        enc.select_skill(Skill::Slash).unwrap();
        assert_eq!(enc.enemy().hp, 40);
        assert_eq!(enc.phase(), CombatPhase::Reaction);
        assert_eq!(enc.session().turn, 1);
    }

    #[test]
    fn test_parry_window_opens_after_windup() {
        let mut enc = encounter();
        enc.update(COMBAT_START_DELAY_MS);
        enc.select_skill(Skill::Slash).unwrap();
        enc.update(ATTACK_DELAY_MS + ENEMY_WINDUP_MS - 1);
        assert!(!enc.parry_state().is_open);
        enc.update(1);
        assert!(enc.parry_state().is_open);
        assert_eq!(
            enc.parry_state().deadline_ms,
            Some(enc.now_ms() + PARRY_WINDOW_MS)
        );
    }

    #[test]
    fn test_bullet_time_follows_parry() {
        let mut enc = encounter();
        enc.update(COMBAT_START_DELAY_MS);
        enc.select_skill(Skill::Slash).unwrap();
        enc.update(ATTACK_DELAY_MS + ENEMY_WINDUP_MS + 50);
        assert_eq!(enc.tap(), TapOutcome::Parried);
        assert!(enc.is_bullet_time());
        assert_eq!(enc.time_scale(), BULLET_TIME_SCALE);

        enc.update(BULLET_TIME_BASE_MS);
        assert!(!enc.is_bullet_time());
        assert_eq!(enc.time_scale(), 1.0);
    }

    #[test]
    fn test_purchase_requires_shop() {
        let mut enc = encounter();
        assert_eq!(
            enc.purchase(UpgradeKind::Pigment),
            Err(EncounterError::ShopClosed(CombatPhase::Idle))
        );
    }
}
