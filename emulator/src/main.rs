mod command;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use session::Session;

fn main() -> io::Result<()> {
    let address = parse_address_override().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: decoder-emulator [--address <0-255 | 0xNN>]");
        process::exit(2);
    });

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(address);
    let mut line = String::new();

    writeln!(
        writer,
        "Remote decoder emulator ready. Type `help` for commands or `exit` to quit."
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_command(trimmed) {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_address_override() -> Result<Option<u8>, String> {
    let mut args = env::args().skip(1);
    let Some(arg) = args.next() else {
        return Ok(None);
    };

    let value = if let Some(value) = arg.strip_prefix("--address=") {
        value.to_string()
    } else if arg == "--address" {
        args.next().ok_or("Expected value after --address")?
    } else {
        return Err(format!("Unknown argument `{arg}`"));
    };

    let parsed = if let Some(hex) = value.strip_prefix("0x") {
        u8::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed
        .map(Some)
        .map_err(|_| format!("Invalid address `{value}`"))
}
