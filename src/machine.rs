//! Turn-based session driver.
//!
//! A session runs from the story's entry point (or a saved turn boundary) until the next
//! line or character read, or until the story quits.  The state at a read is saved so the
//! next turn can be re-created from the story and the save state alone.
use std::fmt;

use crate::{
    config::Config,
    error::*,
    fatal_error,
    instruction::{decoder, processor, Instruction, NextAddress},
    zmachine::{rng::chacha_rng::ChaChaRng, rng::ZRng, ZMachine},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineState {
    /// Loaded, PC at the entry point
    Ready,
    Running,
    /// Stopped before a read instruction
    AwaitingInput,
    /// QUIT
    Halted,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// The result of one turn
pub struct Turn {
    /// The story quit
    halted: bool,
    /// Text printed during the turn
    output: String,
    /// Save state to resume from, if the story didn't quit
    save: Option<Vec<u8>>,
}

impl Turn {
    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn save(&self) -> Option<&[u8]> {
        self.save.as_deref()
    }
}

fn rng(config: &Config) -> Box<dyn ZRng> {
    match config.random_seed() {
        Some(seed) => Box::new(ChaChaRng::seeded(seed)),
        None => Box::new(ChaChaRng::new()),
    }
}

#[derive(Debug)]
pub struct Machine {
    zmachine: ZMachine,
    state: MachineState,
    instruction_count: usize,
}

impl Machine {
    /// Load a story
    ///
    /// # Arguments
    /// * `story` - Story file bytes
    /// * `config` - Runtime configuration
    ///
    /// # Returns
    /// [Result] with a [Machine] in the [MachineState::Ready] state or a [RuntimeError]
    pub fn new(story: Vec<u8>, config: &Config) -> Result<Machine, RuntimeError> {
        Ok(Machine {
            zmachine: ZMachine::new(story, rng(config))?,
            state: MachineState::Ready,
            instruction_count: 0,
        })
    }

    /// Rebuild a machine suspended at a turn boundary
    ///
    /// # Arguments
    /// * `story` - Story file bytes
    /// * `save` - Save state from a previous [Turn]
    /// * `config` - Runtime configuration
    ///
    /// # Returns
    /// [Result] with a [Machine] in the [MachineState::AwaitingInput] state or a [RuntimeError]
    pub fn restore(story: Vec<u8>, save: &[u8], config: &Config) -> Result<Machine, RuntimeError> {
        let mut zmachine = ZMachine::new(story, rng(config))?;
        zmachine.restore(save)?;
        info!(target: "app::state", "Restored turn at ${:05x}", zmachine.pc());
        Ok(Machine {
            zmachine,
            state: MachineState::AwaitingInput,
            instruction_count: 0,
        })
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn zmachine(&self) -> &ZMachine {
        &self.zmachine
    }

    /// Run the story from its entry point to the first read
    pub fn start(&mut self) -> Result<Turn, RuntimeError> {
        if self.state != MachineState::Ready {
            return fatal_error!(
                ErrorCode::InvalidState,
                "Start in state {}, expected {}",
                self.state,
                MachineState::Ready
            );
        }

        self.zmachine.initialize()?;
        info!(target: "app::state", "Start at ${:05x}", self.zmachine.pc());
        self.run()
    }

    /// Complete the pending read with a command and run to the next read.
    ///
    /// # Arguments
    /// * `command` - Player input, without a line terminator
    ///
    /// # Returns
    /// [Result] with the [Turn] or a [RuntimeError]
    pub fn resume(&mut self, command: &str) -> Result<Turn, RuntimeError> {
        if command.contains(['\n', '\r']) {
            return fatal_error!(
                ErrorCode::InvalidInput,
                "Command {:?} contains a line terminator",
                command
            );
        }

        if self.state != MachineState::AwaitingInput {
            return fatal_error!(
                ErrorCode::InvalidState,
                "Resume in state {}, expected {}",
                self.state,
                MachineState::AwaitingInput
            );
        }

        let pc = self.zmachine.pc();
        let instruction = self.decode(pc)?;
        if !instruction.opcode().is_read() {
            return fatal_error!(
                ErrorCode::InvalidState,
                "Resume at ${:05x}, which is not a read: {}",
                pc,
                instruction
            );
        }

        info!(target: "app::stream", "Command: {:?}", command);
        self.state = MachineState::Running;
        self.zmachine.set_input(&format!("{}\n", command));
        self.execute(&instruction)?;
        if self.state == MachineState::Halted {
            Ok(self.halt())
        } else {
            self.run()
        }
    }

    fn decode(&self, pc: usize) -> Result<Instruction, RuntimeError> {
        decoder::decode_instruction(&self.zmachine, pc).map_err(|e| e.at(pc, "undecoded"))
    }

    fn execute(&mut self, instruction: &Instruction) -> Result<(), RuntimeError> {
        self.instruction_count += 1;
        log_mdc::insert("instruction_count", format!("{:8x}", self.instruction_count));
        info!(target: "app::instruction", "{}", instruction);

        match processor::dispatch(&mut self.zmachine, instruction) {
            Ok(NextAddress::Address(a)) => {
                self.zmachine.set_pc(a);
                Ok(())
            }
            Ok(NextAddress::Quit) => {
                info!(target: "app::state", "Quit after {} instructions", self.instruction_count);
                self.state = MachineState::Halted;
                Ok(())
            }
            Err(e) => {
                error!(target: "app::instruction", "{}: {}", instruction, e);
                Err(e.at(instruction.address(), &instruction.to_string()))
            }
        }
    }

    fn halt(&mut self) -> Turn {
        Turn {
            halted: true,
            output: self.zmachine.take_output(),
            save: None,
        }
    }

    fn run(&mut self) -> Result<Turn, RuntimeError> {
        self.state = MachineState::Running;
        loop {
            let instruction = self.decode(self.zmachine.pc())?;
            if instruction.opcode().is_read() {
                self.zmachine
                    .check_suspend_streams()
                    .map_err(|e| e.at(instruction.address(), &instruction.to_string()))?;
                self.state = MachineState::AwaitingInput;
                let save = self.zmachine.save();
                debug!(target: "app::state", "Awaiting input at ${:05x}, {} instructions", instruction.address(), self.instruction_count);
                return Ok(Turn {
                    halted: false,
                    output: self.zmachine.take_output(),
                    save: Some(save),
                });
            }

            self.execute(&instruction)?;
            if self.state == MachineState::Halted {
                return Ok(self.halt());
            }
        }
    }
}

/// Run a story to its first read
///
/// # Arguments
/// * `story` - Story file bytes
/// * `config` - Runtime configuration
///
/// # Returns
/// [Result] with the [Turn] or a [RuntimeError]
pub fn start(story: Vec<u8>, config: &Config) -> Result<Turn, RuntimeError> {
    Machine::new(story, config)?.start()
}

/// Resume a saved story with a command and run to the next read
///
/// # Arguments
/// * `story` - Story file bytes
/// * `save` - Save state from the previous [Turn]
/// * `command` - Player input, without a line terminator
/// * `config` - Runtime configuration
///
/// # Returns
/// [Result] with the [Turn] or a [RuntimeError]
pub fn resume(
    story: Vec<u8>,
    save: &[u8],
    command: &str,
    config: &Config,
) -> Result<Turn, RuntimeError> {
    Machine::restore(story, save, config)?.resume(command)
}
