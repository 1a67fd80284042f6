use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chip8::display::MonoTermDisplay;
use chip8::input::TermInput;
use chip8::instruction::disassemble;
use chip8::memory::PROGRAM_ADDR;
use chip8::sound::{Mute, SimpleBeep, Sound};
use chip8::{Config, Machine, ResetPolicy};

/// Run a CHIP-8 program in the terminal. Keys 1234/qwer/asdf/zxcv map to the
/// hex pad; Esc quits.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// program image to load at 0x200
    rom: PathBuf,

    /// instructions per second
    #[arg(long, default_value_t = chip8::config::DEFAULT_CPU_HZ)]
    cpu_hz: u32,

    /// stop after this many frames (0 = until Esc)
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// beep through the PC speaker
    #[arg(long)]
    sound: bool,

    /// seed for the random opcode
    #[arg(long)]
    seed: Option<u64>,

    /// cap the call stack at this depth
    #[arg(long)]
    stack_limit: Option<usize>,

    /// reset registers, timers and display on load, not just memory
    #[arg(long)]
    full_reset: bool,

    /// print the program's instructions and exit
    #[arg(long)]
    disassemble: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            cpu_hz: self.cpu_hz.max(1),
            reset_policy: if self.full_reset {
                ResetPolicy::Full
            } else {
                ResetPolicy::MemoryOnly
            },
            stack_limit: self.stack_limit,
            rng_seed: self.seed,
            ..Config::default()
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let rom = fs::read(&args.rom)?;
    log::info!("read {} bytes from {}", rom.len(), args.rom.display());

    if args.disassemble {
        for (addr, opcode, instruction) in disassemble(&rom, PROGRAM_ADDR) {
            match instruction {
                Some(i) => println!("{:03X}  {:04X}  {}", addr, opcode, i),
                None => println!("{:03X}  {:04X}  ??", addr, opcode),
            }
        }
        return Ok(());
    }

    let config = args.config();
    let sound: Box<dyn Sound> = if args.sound {
        Box::new(SimpleBeep)
    } else {
        Box::new(Mute)
    };
    // input first: it puts the terminal in raw mode
    let mut input = TermInput::new()?;
    let display = MonoTermDisplay::new()?;
    let mut machine = Machine::new(&config, Box::new(display), sound);
    machine.load_program(&rom)?;
    machine.main_loop(&mut input, args.frames)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<chip8::VmError>().and_then(|vm| vm.pc()) {
                Some(pc) => log::error!("machine stopped at {:#05X}: {}", pc, e),
                None => log::error!("{}", e),
            }
            eprintln!("chip8: {}", e);
            ExitCode::FAILURE
        }
    }
}
