use log::{info, trace, warn};
use std::cell::{Cell, RefCell};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use itertools::Itertools;
use tenzi::config::Settings;
use tenzi::destroyable::Destroyable;
use tenzi::events::{Channel, EventEmitter, EventObserver, Unsubscriber};
use tenzi::game::{GameController, RandomDice, TaskKind, TaskTick, ThreadScheduler};
use tenzi::model::{Difficulty, GameCommand, GameEvent, GameState, RoundPhase};
use tenzi::store::{shared, FileStore, MemoryStore, SharedStore};

const CELEBRATION_PULSES_SHOWN: u32 = 3;

enum Input {
    Line(String),
    Task(TaskTick),
    Closed,
}

fn init_logging() {
    env_logger::init();
}

fn open_store(data_dir: &Path) -> SharedStore {
    match FileStore::open(data_dir) {
        Ok(store) => shared(store),
        Err(err) => {
            warn!(target: "main", "Scores will not be saved ({}): {}", data_dir.display(), err);
            shared(MemoryStore::new())
        }
    }
}

fn spawn_stdin_reader(sender: Sender<Input>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if sender.send(Input::Line(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = sender.send(Input::Closed);
    });
}

fn spawn_task_forwarder(sender: Sender<Input>) -> Sender<TaskTick> {
    let (task_sender, task_receiver) = mpsc::channel::<TaskTick>();
    thread::spawn(move || {
        for tick in task_receiver {
            if sender.send(Input::Task(tick)).is_err() {
                break;
            }
        }
    });
    task_sender
}

fn render_board(state: &GameState) {
    let dice = state
        .dice
        .iter()
        .enumerate()
        .map(|(i, die)| {
            let face = if die.held {
                format!("[{}]", die.value)
            } else if state.is_mismatch(die) {
                format!("!{}!", die.value)
            } else {
                format!(" {} ", die.value)
            };
            format!("{:>2}:{}", i + 1, face)
        })
        .join(" ");
    println!("{}", dice);
    let status = match state.phase() {
        RoundPhase::Idle => "ready",
        RoundPhase::Running => "rolling",
        RoundPhase::Won => "TENZIE",
    };
    println!(
        "{} | {}s | {} rolls | {}/{} held | {}",
        state.difficulty,
        state.elapsed_seconds(),
        state.rolls,
        state.held_count(),
        state.dice.len(),
        status
    );
}

fn print_help() {
    println!("Commands:");
    println!("  roll (or empty line)     roll the unheld dice; after a win, start over");
    println!("  hold <n> [<n>...]        hold or release dice by position");
    println!("  name <name>              change your name");
    println!("  difficulty easy|normal|hard");
    println!("  new                      start a new game (asks first)");
    println!("  reset-all                new game and wipe the leaderboard");
    println!("  board | help | quit");
}

/// Prints the collaborator side of each event: cues, celebration, scores.
fn wire_presenter(
    observer: &EventObserver<GameEvent>,
    awaiting_confirmation: Rc<Cell<bool>>,
) -> Unsubscriber<GameEvent> {
    let pulses = Rc::new(Cell::new(0u32));
    observer.subscribe(move |event| match event {
        GameEvent::RoundStarted { difficulty, .. } => {
            pulses.set(0);
            println!("New round: {}", difficulty);
        }
        GameEvent::RoundRunning => println!("GOOOO!!!!"),
        GameEvent::Won(entry) => {
            println!("TENZIE!!!! {} finished in {}s", entry.player_name, entry.time_seconds);
        }
        GameEvent::Celebrate => {
            if pulses.get() < CELEBRATION_PULSES_SHOWN {
                pulses.set(pulses.get() + 1);
                println!("  * * * 🎉 * * *");
            }
        }
        GameEvent::ResetRequested => {
            awaiting_confirmation.set(true);
            println!("Are you sure you want to start a new game? (yes/no)");
        }
        GameEvent::LeaderboardChanged(leaderboard) => {
            if leaderboard.is_empty() {
                println!("Leaderboard cleared.");
            } else {
                println!("🏆 Leaderboard");
                for (i, entry) in leaderboard.entries().iter().enumerate() {
                    println!("  {}. {}", i + 1, entry.describe());
                }
            }
        }
        GameEvent::PlayerNameChanged(name) => println!("Welcome, {}!", name),
        GameEvent::CommandRejected(err) => println!("{}", err),
        GameEvent::Snapshot {
            leaderboard,
            player_name,
            ..
        } => {
            if let Some(name) = player_name {
                println!("Player: {}", name);
            }
            if let Some(best) = leaderboard.best() {
                println!("Best: {}", best.describe());
            }
        }
        _ => (),
    })
}

struct Driver {
    controller: Rc<RefCell<GameController>>,
    commands: EventEmitter<GameCommand>,
    awaiting_confirmation: Rc<Cell<bool>>,
    awaiting_name: bool,
    settings: Settings,
    data_dir: PathBuf,
}

impl Driver {
    /// Returns false when the player quits.
    fn handle_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if self.awaiting_name {
            self.commands
                .emit(GameCommand::SetPlayerName(line.to_string()));
            self.awaiting_name = self.controller.borrow().player_name().is_none();
            if self.awaiting_name {
                println!("Your name?");
            } else {
                print_help();
                self.render();
            }
            return true;
        }

        if self.awaiting_confirmation.replace(false) {
            match line.to_lowercase().as_str() {
                "y" | "yes" => self.commands.emit(GameCommand::ResetRound),
                _ => println!("Carrying on."),
            }
            self.render();
            return true;
        }

        let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
        match verb.to_lowercase().as_str() {
            "" | "roll" | "r" => self.commands.emit(GameCommand::PrimaryAction),
            "hold" | "h" => self.hold(rest),
            "name" => self
                .commands
                .emit(GameCommand::SetPlayerName(rest.to_string())),
            "difficulty" | "d" => match Difficulty::parse(rest) {
                Some(difficulty) => {
                    self.commands.emit(GameCommand::NewGame(difficulty));
                    self.settings.difficulty = difficulty;
                    if let Err(err) = self.settings.save(&self.data_dir) {
                        warn!(target: "main", "Could not save settings: {}", err);
                    }
                }
                None => println!("Pick easy, normal or hard."),
            },
            "new" => self.commands.emit(GameCommand::RequestReset),
            "reset-all" => self.commands.emit(GameCommand::ResetAll),
            "board" => self.commands.emit(GameCommand::InitDisplay),
            "help" | "?" => {
                print_help();
                return true;
            }
            "quit" | "q" | "exit" => return false,
            other => {
                println!("Unknown command {:?}; try help", other);
                return true;
            }
        }
        if !self.awaiting_confirmation.get() {
            self.render();
        }
        true
    }

    fn hold(&self, positions: &str) {
        for position in positions.split_whitespace() {
            let die_id = position.parse::<usize>().ok().and_then(|n| {
                n.checked_sub(1)
                    .and_then(|i| self.controller.borrow().state().dice.get(i).map(|d| d.id))
            });
            match die_id {
                Some(id) => self.commands.emit(GameCommand::Hold(id)),
                None => println!("No die at position {:?}", position),
            }
        }
    }

    fn render(&self) {
        render_board(self.controller.borrow().state());
    }
}

fn main() {
    init_logging();

    let data_dir = Settings::data_dir();
    let settings = Settings::load(&data_dir);
    let store = open_store(&data_dir);

    let (dice, seed) = RandomDice::seeded(Settings::seed_from_env());
    if Settings::is_debug_mode() {
        println!("Difficulty: {:?}; seed: {}", settings.difficulty, seed);
    }
    info!(target: "main", "Starting with data dir {}", data_dir.display());

    let (input_sender, input_receiver) = mpsc::channel::<Input>();
    let scheduler = ThreadScheduler::new(spawn_task_forwarder(input_sender.clone()));
    let live_tasks = scheduler.clone();
    spawn_stdin_reader(input_sender);

    let (event_emitter, event_observer) = Channel::<GameEvent>::new();
    let (command_emitter, command_observer) = Channel::<GameCommand>::new();
    let awaiting_confirmation = Rc::new(Cell::new(false));
    let presenter = wire_presenter(&event_observer, Rc::clone(&awaiting_confirmation));

    let controller = GameController::new(
        settings.difficulty,
        Box::new(dice),
        Box::new(scheduler),
        store,
        event_emitter,
    )
    .connect(command_observer);

    println!("Welcome to TENZI GAME!");
    println!("Roll dice until all show the same number. Hold dice between rolls.");
    let awaiting_name = controller.borrow().player_name().is_none();
    let mut driver = Driver {
        controller: Rc::clone(&controller),
        commands: command_emitter.clone(),
        awaiting_confirmation,
        awaiting_name,
        settings,
        data_dir,
    };
    if awaiting_name {
        println!("Your name?");
    } else {
        command_emitter.emit(GameCommand::InitDisplay);
        print_help();
        driver.render();
    }
    let _ = io::stdout().flush();

    for input in input_receiver {
        match input {
            Input::Line(line) => {
                if !driver.handle_line(&line) {
                    break;
                }
            }
            Input::Task(tick) if !live_tasks.is_current(&tick) => {
                trace!(target: "main", "Dropping tick from cancelled task {:?}", tick);
            }
            Input::Task(TaskTick {
                kind: TaskKind::RoundTimer,
                ..
            }) => command_emitter.emit(GameCommand::Tick),
            Input::Task(TaskTick {
                kind: TaskKind::Celebration,
                ..
            }) => command_emitter.emit(GameCommand::Celebrate),
            Input::Closed => break,
        }
        let _ = io::stdout().flush();
    }

    controller.borrow_mut().destroy();
    presenter.unsubscribe();
    println!("Bye!");
}
