//! Loads a task file - a plain-text script of commands - into a queue.
//!
//! Lines may carry a trailing `#` comment, and a single line may chain
//! several commands separated by `;`. Parsed commands are inserted at
//! the front of the script queue in the order they appear in the file,
//! so a freshly loaded task file runs before whatever the queue already
//! held, top-to-bottom.

use std::io;

use super::queue::{Channel, CommandQueues};

/// Strips `#` comments and `;`-chaining from `contents`, dropping blank
/// lines. Order is preserved top-to-bottom, left-to-right.
pub fn parse_task_commands(contents: &str) -> Vec<String> {
    let mut commands = Vec::new();
    for raw_line in contents.lines() {
        let line = match raw_line.split_once('#') {
            Some((before, _)) => before,
            None => raw_line,
        };
        for chunk in line.split(';') {
            let command = chunk.trim();
            if !command.is_empty() {
                commands.push(command.to_string());
            }
        }
    }
    commands
}

/// Reads `path`, parses its commands, and inserts them at the front of
/// `queues`' script channel in file order. Returns the number of
/// commands loaded.
pub fn load_task_file(path: &str, queues: &mut CommandQueues) -> io::Result<usize> {
    let contents = std::fs::read_to_string(path)?;
    let commands = parse_task_commands(&contents);
    let count = commands.len();
    queues.push_front_all(Channel::Script, commands);
    Ok(count)
}
