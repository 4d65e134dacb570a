//! Operate one Dynamixel actuator from the command line.
//!
//! ```bash
//! dxl-wizard --port /dev/ttyUSB0 --id 1 ping
//! dxl-wizard goal 2048
//! dxl-wizard read-register present_temperature
//! dxl-wizard shell
//! ```

use {
    clap::{Parser, Subcommand, ValueEnum},
    dxl_driver::{
        Error, Policy, Session,
        system::SystemPorts,
        worker::{self, Handle},
    },
    dxl_packet::control_table::{self, Access, Entry},
    env_logger::TimestampPrecision,
    std::{
        io::{self, BufRead, Write},
        process::ExitCode,
        time::Duration,
    },
};

#[derive(Debug, Parser)]
#[command(name = "dxl-wizard", version, about = "Talk to a Dynamixel actuator over Protocol 2.0")]
struct Cli {
    /// Serial port the bus is attached to.
    #[arg(long, env = "DXL_PORT", default_value = "/dev/ttyUSB0")]
    port: String,
    #[arg(long, env = "DXL_BAUD", default_value_t = 57_600)]
    baud: u32,
    /// Device ID to address (0..=252).
    #[arg(long, env = "DXL_ID", default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=252))]
    id: u8,
    /// How long to wait for each status packet.
    #[arg(long, env = "DXL_TIMEOUT_MS", default_value_t = Policy::DEFAULT_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
    /// Write+read cycles per transaction, counting the first.
    #[arg(long, env = "DXL_ATTEMPTS", default_value_t = Policy::DEFAULT_ATTEMPTS, value_parser = clap::value_parser!(u8).range(1..))]
    attempts: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask the device for its model number and firmware version.
    Ping,
    /// Enable or disable torque.
    Torque { state: OnOff },
    /// Enable torque, then move to a goal position (0..=4095).
    Goal { position: u32 },
    /// Read the present position.
    Read,
    /// Read any control-table item by name, e.g. `present_temperature`.
    ReadRegister {
        #[arg(value_parser = register)]
        entry: &'static Entry,
    },
    /// List the control-table items `read-register` knows.
    Registers,
    /// List attached serial ports.
    Ports,
    /// Interactive prompt on one open connection.
    Shell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnOff {
    On,
    Off,
}

fn register(name: &str) -> Result<&'static Entry, String> {
    control_table::lookup(name)
        .ok_or_else(|| format!("unknown register `{name}`; try `dxl-wizard registers`"))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(Some(TimestampPrecision::Millis))
        .format_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:?} error: {e}", e.class());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    match cli.command {
        Command::Registers => {
            for entry in control_table::ENTRIES {
                println!(
                    "{:>4}  {}B  {}  {:<20} {}",
                    entry.address,
                    entry.width.bytes(),
                    match entry.access {
                        Access::ReadOnly => "R ",
                        Access::ReadWrite => "RW",
                    },
                    entry.name,
                    entry.description,
                );
            }
            return Ok(());
        }
        Command::Ports => {
            for port in SystemPorts::available().map_err(Error::Ports)? {
                println!("{port}");
            }
            return Ok(());
        }
        _ => {}
    }

    let policy = Policy::default()
        .with_timeout(Duration::from_millis(cli.timeout_ms))
        .with_attempts(cli.attempts);
    let mut session = Session::new(SystemPorts, policy, cli.id)?;

    if matches!(cli.command, Command::Shell) {
        return shell(worker::spawn(session), cli);
    }

    session.connect(&cli.port, cli.baud)?;
    match cli.command {
        Command::Ping => {
            let ping = session.ping()?;
            println!(
                "ID {}: model {}, firmware {}",
                session.id(),
                ping.model_number,
                ping.firmware_version,
            );
        }
        Command::Torque { state } => session.set_torque(matches!(state, OnOff::On))?,
        Command::Goal { position } => {
            session.set_torque(true)?;
            session.write_goal_position(position)?;
        }
        Command::Read => println!("{}", session.read_present_position()?),
        Command::ReadRegister { entry } => {
            let id = session.id();
            let value = session
                .client()?
                .read_register(id, entry.address, entry.width)?;
            println!("{}: {value}", entry.name);
        }
        Command::Registers | Command::Ports | Command::Shell => {}
    }
    session.disconnect();
    Ok(())
}

const SHELL_HELP: &str = "\
commands:
  torque on|off|toggle
  goal <0..=4095>
  read
  ping
  id <0..=252>
  state
  quit";

fn shell(worker: Handle<SystemPorts>, cli: &Cli) -> Result<(), Error> {
    worker.connect(cli.port.clone(), cli.baud).wait()?;
    println!("{SHELL_HELP}");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("dxl> ");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        let result = match *words.as_slice() {
            [] => continue,
            ["quit" | "exit"] => break,
            ["torque", "on"] => worker.set_torque(true).wait(),
            ["torque", "off"] => worker.set_torque(false).wait(),
            ["torque", "toggle"] => worker.toggle_torque().wait(),
            ["goal", position] => match position.parse() {
                Ok(position) => worker.write_goal_position(position).wait(),
                Err(e) => {
                    println!("bad position `{position}`: {e}");
                    continue;
                }
            },
            ["read"] => worker
                .read_present_position()
                .wait()
                .map(|position| println!("{position}")),
            ["ping"] => worker.ping().wait().map(|ping| {
                println!(
                    "model {}, firmware {}",
                    ping.model_number, ping.firmware_version,
                );
            }),
            ["id", id] => match id.parse() {
                Ok(id) => worker.set_id(id).wait(),
                Err(e) => {
                    println!("bad ID `{id}`: {e}");
                    continue;
                }
            },
            ["state"] => worker.state().wait().map(|state| println!("{state:?}")),
            _ => {
                println!("{SHELL_HELP}");
                continue;
            }
        };
        if let Err(e) = result {
            println!("{:?} error: {e}", e.class());
        }
    }

    let _ = worker.shutdown()?;
    Ok(())
}
