//! A virtual clock decoupled from wall-clock time: callers either step it
//! with a fixed delta (deterministic replays, tests) or let it measure
//! real elapsed time between ticks. Stopping it freezes the virtual clock
//! without losing accumulated time.
//!
//! Every `tick()` also rolls the two RNG streams published into the
//! global document each frame: `rand`, a flat draw in `[0, 1)`, and
//! `rrand`, an accumulator re-seeded from `rand` each frame and folded
//! back into `[0, 1)` - a slow-moving value entries can read across many
//! frames instead of a fresh coin flip every time.

use std::time::Instant;

use rand::Rng;

enum Mode {
    Fixed(f64),
    Measured,
}

pub struct TimeKeeper {
    mode: Mode,
    running: bool,
    virtual_time: f64,
    last_tick: Option<Instant>,
    frame: u64,
    rand_value: f64,
    rrand_value: f64,
}

impl TimeKeeper {
    pub fn fixed_step(dt: f64) -> Self {
        TimeKeeper {
            mode: Mode::Fixed(dt),
            running: false,
            virtual_time: 0.0,
            last_tick: None,
            frame: 0,
            rand_value: 0.0,
            rrand_value: 0.0,
        }
    }

    pub fn measured() -> Self {
        TimeKeeper {
            mode: Mode::Measured,
            running: false,
            virtual_time: 0.0,
            last_tick: None,
            frame: 0,
            rand_value: 0.0,
            rrand_value: 0.0,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.last_tick = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn virtual_time(&self) -> f64 {
        self.virtual_time
    }

    /// Monotonic count of `tick()` calls, including while stopped.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// This frame's flat `rand` draw, in `[0, 1)`.
    pub fn rand_value(&self) -> f64 {
        self.rand_value
    }

    /// This frame's `rrand` roll accumulator, in `[0, 1)`.
    pub fn rrand_value(&self) -> f64 {
        self.rrand_value
    }

    /// Advance the clock one tick, returning the delta applied. Zero
    /// while stopped. The frame counter and RNG streams advance
    /// regardless of whether the clock itself is running.
    pub fn tick(&mut self) -> f64 {
        self.frame += 1;
        self.rand_value = rand::thread_rng().gen_range(0.0..1.0);
        self.rrand_value = (self.rrand_value + self.rand_value) % 1.0;

        if !self.running {
            return 0.0;
        }
        let dt = match self.mode {
            Mode::Fixed(dt) => dt,
            Mode::Measured => {
                let now = Instant::now();
                let dt = match self.last_tick {
                    Some(prev) => now.duration_since(prev).as_secs_f64(),
                    None => 0.0,
                };
                self.last_tick = Some(now);
                dt
            }
        };
        self.virtual_time += dt;
        dt
    }

    /// The delta the next `tick()` would apply, without committing it.
    /// For `Fixed` this is exact; for `Measured` while stopped it's 0.
    pub fn projected_dt(&self) -> f64 {
        match self.mode {
            Mode::Fixed(dt) => dt,
            Mode::Measured => {
                if !self.running {
                    return 0.0;
                }
                match self.last_tick {
                    Some(prev) => Instant::now().duration_since(prev).as_secs_f64(),
                    None => 0.0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_step_advances_by_exact_delta() {
        let mut tk = TimeKeeper::fixed_step(0.1);
        tk.start();
        assert_eq!(tk.tick(), 0.1);
        assert_eq!(tk.tick(), 0.1);
        assert!((tk.virtual_time() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn stopped_clock_does_not_advance() {
        let mut tk = TimeKeeper::fixed_step(0.1);
        assert_eq!(tk.tick(), 0.0);
        assert_eq!(tk.virtual_time(), 0.0);
    }

    #[test]
    fn stop_then_start_preserves_accumulated_time() {
        let mut tk = TimeKeeper::fixed_step(1.0);
        tk.start();
        tk.tick();
        tk.stop();
        assert_eq!(tk.virtual_time(), 1.0);
        tk.start();
        tk.tick();
        assert_eq!(tk.virtual_time(), 2.0);
    }

    #[test]
    fn frame_counter_and_rng_streams_advance_even_while_stopped() {
        let mut tk = TimeKeeper::fixed_step(0.1);
        assert_eq!(tk.frame_count(), 0);
        tk.tick();
        assert_eq!(tk.frame_count(), 1);
        assert!((0.0..1.0).contains(&tk.rand_value()));
        assert!((0.0..1.0).contains(&tk.rrand_value()));
        tk.tick();
        assert_eq!(tk.frame_count(), 2);
    }
}
