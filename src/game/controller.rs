use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::SystemTime;

use super::{DiceSource, Scheduler, TaskHandle, TaskKind};
use crate::destroyable::Destroyable;
use crate::error::GameError;
use crate::events::{EventEmitter, EventObserver, Unsubscriber};
use crate::model::{
    DieId, Difficulty, GameCommand, GameEvent, GameState, Leaderboard, LeaderboardEntry,
    PlayerProfile,
};
use crate::store::{ProfileStore, Scoreboard, SharedStore};

/// Owns one round of Tenzi plus the player's profile and leaderboard.
///
/// All mutation goes through the methods below; each dice-changing method
/// ends with [`GameController::evaluate_win`]. Listeners on the event channel
/// must not send commands back synchronously: the controller is borrowed
/// while it emits.
pub struct GameController {
    state: GameState,
    profile: PlayerProfile,
    scoreboard: Scoreboard,
    profiles: ProfileStore,
    dice_source: Box<dyn DiceSource>,
    scheduler: Box<dyn Scheduler>,
    round_timer: Option<TaskHandle>,
    celebration: Option<TaskHandle>,
    event_emitter: EventEmitter<GameEvent>,
    subscription: Option<Unsubscriber<GameCommand>>,
}

impl Destroyable for GameController {
    fn destroy(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.release_tasks();
    }
}

impl GameController {
    pub fn new(
        difficulty: Difficulty,
        mut dice_source: Box<dyn DiceSource>,
        scheduler: Box<dyn Scheduler>,
        store: SharedStore,
        event_emitter: EventEmitter<GameEvent>,
    ) -> Self {
        let profiles = ProfileStore::new(Rc::clone(&store));
        let profile = profiles.load();
        let scoreboard = Scoreboard::load(store);
        let state = GameState::new(difficulty, dice_source.as_mut());
        Self {
            state,
            profile,
            scoreboard,
            profiles,
            dice_source,
            scheduler,
            round_timer: None,
            celebration: None,
            event_emitter,
            subscription: None,
        }
    }

    /// Moves the controller behind `Rc<RefCell<_>>` and feeds it every command
    /// sent on `command_observer`.
    pub fn connect(self, command_observer: EventObserver<GameCommand>) -> Rc<RefCell<Self>> {
        let controller = Rc::new(RefCell::new(self));
        let handler = Rc::clone(&controller);
        let subscription = command_observer.subscribe(move |command| {
            handler.borrow_mut().handle_command(command.clone());
        });
        controller.borrow_mut().subscription = Some(subscription);
        controller
    }

    pub fn handle_command(&mut self, command: GameCommand) {
        trace!(target: "game", "Handling command: {:?}", command);
        let result = match command {
            GameCommand::NewGame(difficulty) => {
                self.start_round(difficulty);
                Ok(())
            }
            GameCommand::Roll => self.roll(),
            GameCommand::Hold(id) => self.hold(id),
            GameCommand::PrimaryAction => self.primary_action(),
            GameCommand::Tick => {
                self.tick();
                Ok(())
            }
            GameCommand::Celebrate => {
                self.celebrate();
                Ok(())
            }
            GameCommand::RequestReset => {
                self.request_reset();
                Ok(())
            }
            GameCommand::ResetRound => {
                self.reset_round();
                Ok(())
            }
            GameCommand::ResetAll => {
                self.reset_all();
                Ok(())
            }
            GameCommand::SetPlayerName(name) => self.set_player_name(&name),
            GameCommand::InitDisplay => {
                self.sync_display();
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!(target: "game", "Command rejected: {}", err);
            self.event_emitter.emit(GameEvent::CommandRejected(err));
        }
    }

    pub fn start_round(&mut self, difficulty: Difficulty) {
        self.release_tasks();
        self.state = GameState::new(difficulty, self.dice_source.as_mut());
        info!(target: "game", "New round; difficulty: {:?}", difficulty);
        self.event_emitter.emit(GameEvent::RoundStarted {
            difficulty,
            dice: self.state.dice.clone(),
        });
    }

    pub fn roll(&mut self) -> Result<(), GameError> {
        if self.state.won {
            return Err(GameError::RoundOver);
        }
        self.ensure_running();
        self.state.roll_unheld(self.dice_source.as_mut());
        debug!(target: "game", "Roll {}: {:?}", self.state.rolls, self.state.dice);
        self.event_emitter.emit(GameEvent::DiceRolled {
            dice: self.state.dice.clone(),
            rolls: self.state.rolls,
        });
        self.evaluate_win();
        Ok(())
    }

    pub fn hold(&mut self, id: DieId) -> Result<(), GameError> {
        if self.state.won {
            return Err(GameError::RoundOver);
        }
        if self.state.die(id).is_none() {
            return Err(GameError::UnknownDieId(id));
        }
        self.ensure_running();
        let held = match self.state.die_mut(id) {
            Some(die) => {
                die.toggle_held();
                die.held
            }
            None => return Err(GameError::UnknownDieId(id)),
        };
        self.event_emitter.emit(GameEvent::DieHeld { id, held });
        self.evaluate_win();
        Ok(())
    }

    /// Holds or releases the die at `index` (zero-based, in display order).
    pub fn hold_at(&mut self, index: usize) -> Result<(), GameError> {
        let id = self
            .state
            .dice
            .get(index)
            .map(|d| d.id)
            .ok_or(GameError::UnknownDieId(DieId::nil()))?;
        self.hold(id)
    }

    /// Marks the round won when the dice form a tenzie. Returns true only on
    /// the transition, so calling it again records nothing new.
    pub fn evaluate_win(&mut self) -> bool {
        if self.state.won || !self.state.is_tenzie() {
            return false;
        }
        self.state.won = true;
        self.state.clock = self.state.clock.stopped();
        self.round_timer = None;
        self.celebration = Some(self.scheduler.start(TaskKind::Celebration));

        let entry = LeaderboardEntry::new(
            self.profile.display_name(),
            self.state.elapsed_seconds(),
        )
        .with_round(self.state.difficulty, self.state.rolls, SystemTime::now());
        info!(
            target: "game",
            "Tenzie! {} in {}s after {} rolls",
            entry.player_name,
            entry.time_seconds,
            self.state.rolls
        );
        let leaderboard = self.scoreboard.record(entry.clone()).clone();
        self.event_emitter.emit(GameEvent::Won(entry));
        self.event_emitter
            .emit(GameEvent::LeaderboardChanged(leaderboard));
        true
    }

    pub fn tick(&mut self) {
        if self.state.is_running() {
            self.state.clock = self.state.clock.ticked();
            self.event_emitter
                .emit(GameEvent::TimerTicked(self.state.elapsed_seconds()));
        }
    }

    pub fn celebrate(&mut self) {
        if self.state.won {
            self.event_emitter.emit(GameEvent::Celebrate);
        }
    }

    pub fn primary_action(&mut self) -> Result<(), GameError> {
        if self.state.won {
            self.request_reset();
            Ok(())
        } else {
            self.roll()
        }
    }

    pub fn request_reset(&mut self) {
        self.event_emitter.emit(GameEvent::ResetRequested);
    }

    pub fn reset_round(&mut self) {
        self.event_emitter.emit(GameEvent::Reset { full: false });
        self.start_round(self.state.difficulty);
    }

    pub fn reset_all(&mut self) {
        self.scoreboard.clear();
        self.event_emitter.emit(GameEvent::Reset { full: true });
        self.start_round(self.state.difficulty);
        self.event_emitter.emit(GameEvent::LeaderboardChanged(
            self.scoreboard.leaderboard().clone(),
        ));
    }

    pub fn set_player_name(&mut self, name: &str) -> Result<(), GameError> {
        let name = self.profile.set_name(name)?.to_string();
        self.profiles.save(&self.profile);
        info!(target: "game", "Player name set to {:?}", name);
        self.event_emitter.emit(GameEvent::PlayerNameChanged(name));
        Ok(())
    }

    pub fn sync_display(&self) {
        self.event_emitter.emit(GameEvent::Snapshot {
            state: self.state.clone(),
            leaderboard: self.scoreboard.leaderboard().clone(),
            player_name: self.profile.name().map(str::to_string),
        });
    }

    fn ensure_running(&mut self) {
        if !self.state.is_running() {
            self.state.clock = self.state.clock.started();
            self.round_timer = Some(self.scheduler.start(TaskKind::RoundTimer));
            self.event_emitter.emit(GameEvent::RoundRunning);
        }
    }

    fn release_tasks(&mut self) {
        self.round_timer = None;
        self.celebration = None;
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.state.difficulty
    }

    pub fn player_name(&self) -> Option<&str> {
        self.profile.name()
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        self.scoreboard.leaderboard()
    }
}

#[cfg(test)]
mod tests {
    use test_context::test_context;

    use super::*;
    use crate::events::Channel;
    use crate::game::{ManualScheduler, ScriptedDice};
    use crate::model::RoundPhase;
    use crate::store::{KeyValueStore, MemoryStore, LEADERBOARD_KEY, PLAYER_NAME_KEY};
    use crate::tests::UsingLogger;

    struct Harness {
        controller: GameController,
        scheduler: ManualScheduler,
        store: Rc<RefCell<MemoryStore>>,
        events: Rc<RefCell<Vec<GameEvent>>>,
        _subscription: Unsubscriber<GameEvent>,
    }

    impl Harness {
        fn new(difficulty: Difficulty, dice: ScriptedDice) -> Self {
            Self::with_store(difficulty, dice, MemoryStore::new())
        }

        fn with_store(difficulty: Difficulty, dice: ScriptedDice, store: MemoryStore) -> Self {
            let (emitter, observer) = Channel::<GameEvent>::new();
            let events = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&events);
            let subscription = observer.subscribe(move |event| sink.borrow_mut().push(event.clone()));

            let scheduler = ManualScheduler::new();
            let store = Rc::new(RefCell::new(store));
            let controller = GameController::new(
                difficulty,
                Box::new(dice),
                Box::new(scheduler.clone()),
                store.clone(),
                emitter,
            );
            Self {
                controller,
                scheduler,
                store,
                events,
                _subscription: subscription,
            }
        }

        fn hold_all(&mut self) {
            for id in self.die_ids() {
                self.controller.hold(id).unwrap();
            }
        }

        fn die_ids(&self) -> Vec<DieId> {
            self.controller.state().dice.iter().map(|d| d.id).collect()
        }

        fn ticks(&mut self, n: u32) {
            for _ in 0..n {
                self.controller.tick();
            }
        }

        fn count(&self, matches: impl Fn(&GameEvent) -> bool) -> usize {
            self.events.borrow().iter().filter(|e| matches(e)).count()
        }

        fn leaderboard_times(&self) -> Vec<u32> {
            self.controller
                .leaderboard()
                .entries()
                .iter()
                .map(|e| e.time_seconds)
                .collect()
        }
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_start_round_every_difficulty(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Normal, ScriptedDice::new(vec![1, 2, 3, 4, 5, 6]));
        for difficulty in Difficulty::all() {
            harness.controller.start_round(difficulty);
            let state = harness.controller.state();
            assert_eq!(state.dice.len(), difficulty.dice_count());
            assert!(state.dice.iter().all(|d| !d.held && (1..=6).contains(&d.value)));
            assert_eq!(state.phase(), RoundPhase::Idle);
            assert!(!harness.scheduler.is_live(TaskKind::RoundTimer));
        }
        assert_eq!(
            harness.count(|e| matches!(e, GameEvent::RoundStarted { .. })),
            3
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_roll_changes_only_unheld_dice(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::new(vec![3, 1, 2, 5, 6, 4, 4, 4, 4]));
        let first = harness.die_ids()[0];
        assert_eq!(harness.controller.state().dice[0].value, 3);

        harness.controller.hold(first).unwrap();
        harness.controller.roll().unwrap();

        let dice = &harness.controller.state().dice;
        assert_eq!(dice[0].value, 3);
        assert!(dice[0].held);
        assert!(dice[1..].iter().all(|d| d.value == 4 && !d.held));
        assert_eq!(harness.controller.state().rolls, 1);
        assert!(!harness.controller.state().won);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_first_action_starts_timer_once(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::new(vec![1, 2, 3, 4, 5]));
        harness.ticks(3);
        assert_eq!(harness.controller.state().elapsed_seconds(), 0);

        harness.controller.roll().unwrap();
        harness.controller.roll().unwrap();
        assert_eq!(harness.controller.state().phase(), RoundPhase::Running);
        assert_eq!(harness.scheduler.live_count(TaskKind::RoundTimer), 1);
        assert_eq!(harness.count(|e| *e == GameEvent::RoundRunning), 1);

        harness.ticks(2);
        assert_eq!(harness.controller.state().elapsed_seconds(), 2);
        assert_eq!(
            harness.events.borrow().last(),
            Some(&GameEvent::TimerTicked(2))
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_forced_tenzie_wins(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::new(vec![1, 2, 3, 4, 5]));
        harness.controller.roll().unwrap();
        for die in harness.controller.state.dice.iter_mut() {
            die.value = 4;
            die.held = true;
        }

        assert!(harness.controller.evaluate_win());
        let state = harness.controller.state();
        assert!(state.won);
        assert!(!state.is_running());
        assert_eq!(state.phase(), RoundPhase::Won);
        assert!(!harness.scheduler.is_live(TaskKind::RoundTimer));
        assert!(harness.scheduler.is_live(TaskKind::Celebration));

        // idempotent
        assert!(!harness.controller.evaluate_win());
        assert_eq!(harness.controller.leaderboard().len(), 1);
        assert_eq!(harness.count(|e| matches!(e, GameEvent::Won(_))), 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_win_by_holding_records_named_times(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::constant(4));
        harness.controller.set_player_name("Ava").unwrap();

        harness.controller.roll().unwrap();
        harness.ticks(42);
        harness.hold_all();
        assert!(harness.controller.state().won);
        let entry = &harness.controller.leaderboard().entries()[0];
        assert_eq!(entry.player_name, "Ava");
        assert_eq!(entry.time_seconds, 42);
        assert_eq!(entry.difficulty, Some(Difficulty::Easy));
        assert_eq!(entry.rolls, Some(1));

        // clock is frozen after the win
        harness.ticks(5);
        assert_eq!(harness.controller.state().elapsed_seconds(), 42);

        harness.controller.reset_round();
        harness.controller.roll().unwrap();
        harness.ticks(10);
        harness.hold_all();

        assert_eq!(harness.leaderboard_times(), vec![10, 42]);
        assert!(harness
            .controller
            .leaderboard()
            .entries()
            .iter()
            .all(|e| e.player_name == "Ava"));

        let stored = harness.store.borrow().get(LEADERBOARD_KEY).unwrap().unwrap();
        assert!(stored.starts_with(r#"[{"name":"Ava","time":10"#));
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_leaderboard_capped_at_five(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::constant(6));
        for seconds in [30, 5, 25, 15, 20, 10, 35] {
            harness.controller.reset_round();
            harness.controller.roll().unwrap();
            harness.ticks(seconds);
            harness.hold_all();
            assert!(harness.controller.leaderboard().len() <= 5);
        }
        assert_eq!(harness.leaderboard_times(), vec![5, 10, 15, 20, 25]);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_anonymous_win(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::constant(2));
        harness.hold_all();
        assert_eq!(
            harness.controller.leaderboard().best().map(|e| e.player_name.as_str()),
            Some("Anonymous")
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_hold_toggles_and_unknown_id_is_rejected(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::new(vec![1, 2, 3, 4, 5]));
        let stranger = DieId::new_v4();
        assert_eq!(
            harness.controller.hold(stranger),
            Err(GameError::UnknownDieId(stranger))
        );
        assert_eq!(harness.controller.state().phase(), RoundPhase::Idle);
        assert!(!harness.scheduler.is_live(TaskKind::RoundTimer));

        harness.controller.hold_at(1).unwrap();
        assert!(harness.controller.state().dice[1].held);
        assert_eq!(harness.controller.state().phase(), RoundPhase::Running);
        harness.controller.hold_at(1).unwrap();
        assert!(!harness.controller.state().dice[1].held);

        assert!(harness.controller.hold_at(5).is_err());
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_won_round_rejects_play_and_asks_for_reset(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::constant(5));
        harness.hold_all();
        let dice_before = harness.controller.state().dice.clone();

        assert_eq!(harness.controller.roll(), Err(GameError::RoundOver));
        assert_eq!(
            harness.controller.hold(dice_before[0].id),
            Err(GameError::RoundOver)
        );
        assert_eq!(harness.controller.state().dice, dice_before);

        harness.controller.primary_action().unwrap();
        assert_eq!(harness.count(|e| *e == GameEvent::ResetRequested), 1);
        assert!(harness.controller.state().won);

        harness.controller.celebrate();
        assert_eq!(harness.count(|e| *e == GameEvent::Celebrate), 1);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_primary_action_rolls_before_win(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::new(vec![1, 2, 3, 4, 5]));
        harness.controller.primary_action().unwrap();
        assert_eq!(harness.controller.state().rolls, 1);
        assert_eq!(harness.count(|e| *e == GameEvent::ResetRequested), 0);

        harness.controller.celebrate();
        assert_eq!(harness.count(|e| *e == GameEvent::Celebrate), 0);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_reset_round_keeps_difficulty_name_and_scores(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Hard, ScriptedDice::constant(3));
        harness.controller.set_player_name("Ava").unwrap();
        harness.controller.roll().unwrap();
        harness.ticks(7);
        harness.hold_all();
        assert!(harness.scheduler.is_live(TaskKind::Celebration));
        let old_ids = harness.die_ids();

        harness.controller.reset_round();
        let state = harness.controller.state();
        assert_eq!(state.difficulty, Difficulty::Hard);
        assert_eq!(state.dice.len(), 15);
        assert_eq!(state.elapsed_seconds(), 0);
        assert_eq!(state.rolls, 0);
        assert!(!state.won && !state.is_running());
        assert!(state.dice.iter().all(|d| !d.held));
        assert!(harness.die_ids().iter().all(|id| !old_ids.contains(id)));
        assert_eq!(harness.controller.player_name(), Some("Ava"));
        assert_eq!(harness.controller.leaderboard().len(), 1);
        assert!(!harness.scheduler.is_live(TaskKind::Celebration));
        assert!(!harness.scheduler.is_live(TaskKind::RoundTimer));
        assert_eq!(
            harness.count(|e| *e == GameEvent::Reset { full: false }),
            1
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_reset_all_clears_leaderboard(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::constant(1));
        harness.hold_all();
        assert_eq!(harness.controller.leaderboard().len(), 1);

        harness.controller.reset_all();
        assert!(harness.controller.leaderboard().is_empty());
        assert_eq!(harness.store.borrow().get(LEADERBOARD_KEY).unwrap(), None);
        assert!(!harness.controller.state().won);
        assert_eq!(
            harness.events.borrow().last(),
            Some(&GameEvent::LeaderboardChanged(Leaderboard::new()))
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_blank_name_is_ignored(_: &mut UsingLogger) {
        let mut harness = Harness::new(Difficulty::Easy, ScriptedDice::new(vec![1, 2]));
        harness.controller.set_player_name(" Ava ").unwrap();
        assert_eq!(
            harness.controller.set_player_name("   "),
            Err(GameError::EmptyName)
        );
        assert_eq!(harness.controller.player_name(), Some("Ava"));
        assert_eq!(
            harness.store.borrow().get(PLAYER_NAME_KEY).unwrap().as_deref(),
            Some("Ava")
        );
        assert_eq!(
            harness.count(|e| matches!(e, GameEvent::PlayerNameChanged(_))),
            1
        );
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_loads_profile_and_scores_at_startup(_: &mut UsingLogger) {
        let store = MemoryStore::with_entries([
            (PLAYER_NAME_KEY, "Bo"),
            (LEADERBOARD_KEY, r#"[{"name":"Bo","time":12},{"name":"Cy","time":8}]"#),
        ]);
        let harness = Harness::with_store(Difficulty::Normal, ScriptedDice::constant(2), store);
        assert_eq!(harness.controller.player_name(), Some("Bo"));
        assert_eq!(harness.leaderboard_times(), vec![8, 12]);
    }

    #[test_context(UsingLogger)]
    #[test]
    fn test_commands_over_channel(_: &mut UsingLogger) {
        let harness = Harness::new(Difficulty::Easy, ScriptedDice::new(vec![1, 2, 3, 4, 5]));
        let events = Rc::clone(&harness.events);
        let scheduler = harness.scheduler.clone();
        let (commands, command_observer) = Channel::<GameCommand>::new();
        let controller = harness.controller.connect(command_observer);

        commands.emit(GameCommand::SetPlayerName("Ava".to_string()));
        commands.emit(GameCommand::Roll);
        commands.emit(GameCommand::Tick);
        commands.emit(GameCommand::Hold(DieId::nil()));
        commands.emit(GameCommand::InitDisplay);

        assert_eq!(controller.borrow().state().elapsed_seconds(), 1);
        assert!(events
            .borrow()
            .contains(&GameEvent::CommandRejected(GameError::UnknownDieId(DieId::nil()))));
        assert!(matches!(
            events.borrow().last(),
            Some(GameEvent::Snapshot { player_name: Some(name), .. }) if name == "Ava"
        ));

        controller.borrow_mut().destroy();
        assert!(!scheduler.is_live(TaskKind::RoundTimer));
        commands.emit(GameCommand::Roll);
        assert_eq!(controller.borrow().state().rolls, 1);

        commands.emit(GameCommand::NewGame(Difficulty::Hard));
        assert_eq!(controller.borrow().difficulty(), Difficulty::Easy);
    }
}
