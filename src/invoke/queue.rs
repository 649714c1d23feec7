//! Three independent command queues feeding the per-object command tree:
//! `script` (entity rule scripts), `internal` (engine-issued bookkeeping),
//! and `always` (re-enqueued every frame, used for persistent behaviors).
//!
//! Each queue tracks a `wait_counter`: a command can ask the queue to
//! pause for N frames (e.g. a cooldown) before resuming. A critical
//! failure from one command halts the rest of that queue for the current
//! drain - later commands in the same queue don't run - but does not
//! affect the other two queues.

use std::collections::VecDeque;

use crate::error::{CommandOutcome, CriticalError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Script,
    Internal,
    Always,
}

pub const CHANNELS: [Channel; 3] = [Channel::Script, Channel::Internal, Channel::Always];

#[derive(Default)]
struct Queue {
    commands: VecDeque<String>,
    wait_counter: u32,
}

/// Owns the three command queues for one render object.
#[derive(Default)]
pub struct CommandQueues {
    script: Queue,
    internal: Queue,
    always: Queue,
}

impl CommandQueues {
    pub fn push(&mut self, channel: Channel, command: String) {
        self.queue_mut(channel).commands.push_back(command);
    }

    pub fn pause(&mut self, channel: Channel, frames: u32) {
        self.queue_mut(channel).wait_counter = frames;
    }

    /// Insert `commands` at the front of `channel`, preserving their
    /// relative order, ahead of whatever was already queued. Used by
    /// task-file loading so a loaded script's commands run before
    /// anything queued earlier this frame, in the order they appeared
    /// in the file.
    pub fn push_front_all(&mut self, channel: Channel, commands: impl IntoIterator<Item = String>) {
        let q = self.queue_mut(channel);
        for command in commands.into_iter().collect::<Vec<_>>().into_iter().rev() {
            q.commands.push_front(command);
        }
    }

    fn queue_mut(&mut self, channel: Channel) -> &mut Queue {
        match channel {
            Channel::Script => &mut self.script,
            Channel::Internal => &mut self.internal,
            Channel::Always => &mut self.always,
        }
    }

    fn queue(&self, channel: Channel) -> &Queue {
        match channel {
            Channel::Script => &self.script,
            Channel::Internal => &self.internal,
            Channel::Always => &self.always,
        }
    }

    pub fn is_waiting(&self, channel: Channel) -> bool {
        self.queue(channel).wait_counter > 0
    }

    pub fn pending(&self, channel: Channel) -> usize {
        self.queue(channel).commands.len()
    }

    /// Drain `channel`, calling `run` for each command in order, until
    /// empty or a critical failure halts the rest of this drain. Ticks
    /// down the wait counter first; if still waiting, does nothing.
    pub fn drain<F>(&mut self, channel: Channel, mut run: F) -> Option<CriticalError>
    where
        F: FnMut(&str) -> CommandOutcome,
    {
        {
            let q = self.queue_mut(channel);
            if q.wait_counter > 0 {
                q.wait_counter -= 1;
                return None;
            }
        }

        loop {
            let next = self.queue_mut(channel).commands.pop_front();
            let Some(command) = next else {
                return None;
            };
            match run(&command) {
                Ok(_non_critical) => continue,
                Err(critical) => return Some(critical),
            }
        }
    }

    /// `always` commands are re-armed at the end of every frame so they
    /// keep firing; callers pass the fixed set to refill with.
    pub fn rearm_always(&mut self, commands: impl IntoIterator<Item = String>) {
        self.always.commands = commands.into_iter().collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_fifo_order() {
        let mut q = CommandQueues::default();
        q.push(Channel::Script, "a".into());
        q.push(Channel::Script, "b".into());
        let mut seen = Vec::new();
        q.drain(Channel::Script, |cmd| {
            seen.push(cmd.to_string());
            Ok(crate::error::NonCriticalError::None)
        });
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn critical_failure_halts_remaining_queue() {
        let mut q = CommandQueues::default();
        q.push(Channel::Script, "ok".into());
        q.push(Channel::Script, "boom".into());
        q.push(Channel::Script, "never".into());
        let mut seen = Vec::new();
        let halted = q.drain(Channel::Script, |cmd| {
            seen.push(cmd.to_string());
            if cmd == "boom" {
                Err(CriticalError::General("boom".into()))
            } else {
                Ok(crate::error::NonCriticalError::None)
            }
        });
        assert!(halted.is_some());
        assert_eq!(seen, vec!["ok", "boom"]);
        assert_eq!(q.pending(Channel::Script), 1);
    }

    #[test]
    fn wait_counter_pauses_drain() {
        let mut q = CommandQueues::default();
        q.push(Channel::Internal, "cmd".into());
        q.pause(Channel::Internal, 2);

        let mut calls = 0;
        q.drain(Channel::Internal, |_| {
            calls += 1;
            Ok(crate::error::NonCriticalError::None)
        });
        assert_eq!(calls, 0);
        assert!(q.is_waiting(Channel::Internal));

        q.drain(Channel::Internal, |_| {
            calls += 1;
            Ok(crate::error::NonCriticalError::None)
        });
        assert_eq!(calls, 0);
        assert!(!q.is_waiting(Channel::Internal));

        q.drain(Channel::Internal, |_| {
            calls += 1;
            Ok(crate::error::NonCriticalError::None)
        });
        assert_eq!(calls, 1);
    }

    #[test]
    fn push_front_all_preserves_file_order_ahead_of_existing_queue() {
        let mut q = CommandQueues::default();
        q.push(Channel::Script, "existing".into());
        q.push_front_all(Channel::Script, vec!["first".to_string(), "second".to_string()]);

        let mut seen = Vec::new();
        q.drain(Channel::Script, |cmd| {
            seen.push(cmd.to_string());
            Ok(crate::error::NonCriticalError::None)
        });
        assert_eq!(seen, vec!["first", "second", "existing"]);
    }

    #[test]
    fn always_channel_rearms() {
        let mut q = CommandQueues::default();
        q.rearm_always(vec!["tick".to_string()]);
        assert_eq!(q.pending(Channel::Always), 1);
        q.drain(Channel::Always, |_| Ok(crate::error::NonCriticalError::None));
        assert_eq!(q.pending(Channel::Always), 0);
        q.rearm_always(vec!["tick".to_string()]);
        assert_eq!(q.pending(Channel::Always), 1);
    }
}
