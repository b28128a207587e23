//! Line-oriented stand-in for the physical button and the remote control.

use crossbeam_channel::Sender;
use std::io::BufRead;
use std::thread::{self, JoinHandle};
use wakeline::{ButtonPress, RemoteCommand, Trigger};

#[derive(Debug, PartialEq)]
pub(crate) enum ConsoleCommand {
    Trigger(Trigger),
    Quit,
}

pub(crate) fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let word = line.trim().to_ascii_lowercase();
    if let Some(press) = ButtonPress::parse(&word) {
        return Some(ConsoleCommand::Trigger(Trigger::Button(press)));
    }
    if let Some(command) = RemoteCommand::parse(&word) {
        return Some(ConsoleCommand::Trigger(Trigger::Remote(command)));
    }
    let trigger = match word.as_str() {
        "wake" => Trigger::WakeWord,
        "done" => Trigger::PlaybackFinished,
        "fault" => Trigger::Fault("operator fault".to_string()),
        "quit" | "exit" => return Some(ConsoleCommand::Quit),
        _ => return None,
    };
    Some(ConsoleCommand::Trigger(trigger))
}

/// Read stdin until EOF or `quit`. Either one fires `shutdown`.
pub(crate) fn spawn_console_thread(
    triggers: Sender<Trigger>,
    shutdown: Sender<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(ConsoleCommand::Trigger(trigger)) => {
                    if triggers.send(trigger).is_err() {
                        break;
                    }
                }
                Some(ConsoleCommand::Quit) => break,
                None => eprintln!(
                    "unknown command '{}'; try short, long, start, cancel, reset, wake, done, quit",
                    line.trim()
                ),
            }
        }
        let _ = shutdown.send(());
    })
}
