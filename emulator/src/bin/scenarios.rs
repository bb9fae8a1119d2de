//! Replays canned command scripts and prints their transcripts.
//!
//! Covers the canonical decode scenarios end to end: a clean decode with an
//! idempotent repeat, an address mismatch, mid-frame corruption, and the
//! inactivity timeout.

#[allow(dead_code)]
#[path = "../command.rs"]
mod command;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::Session;

fn main() {
    run_scenario(
        "clean decode and repeat",
        &["send data=5", "send data=5", "status"],
    );
    run_scenario(
        "address mismatch",
        &["send data=10", "send address=0x0F data=10", "status"],
    );
    run_scenario("mid-frame corruption", &["noise", "status", "send data=3"]);
    run_scenario(
        "inactivity timeout",
        &["send data=7", "idle 129", "status"],
    );
}

fn run_scenario(title: &str, commands: &[&str]) {
    println!("== {title} ==");
    let mut session = Session::new(None);
    for command in commands {
        println!("> {command}");
        for line in session.handle_command(command) {
            println!("{line}");
        }
    }
    println!();
}
