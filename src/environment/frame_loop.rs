//! Drives one frame: advance the clock, publish input, dispatch invoke
//! entries over the camera window, drain command queues, then apply any
//! forced overrides - direct writes to the global document that bypass
//! rules entirely and always take effect last.

use crate::object::CommandRegistry;

use super::environment::Environment;
use super::tile::{Layer, TileCoord};
use super::time_keeper::TimeKeeper;

/// A direct global-document write that takes effect after every other
/// frame step, useful for debug overrides and editor tooling.
pub struct ForcedOverride {
    pub path: String,
    pub value: f64,
}

pub struct FrameLoop {
    pub environment: Environment,
    pub clock: TimeKeeper,
}

impl FrameLoop {
    pub fn new(environment: Environment, clock: TimeKeeper) -> Self {
        FrameLoop { environment, clock }
    }

    /// Run one frame. `pressed_keys` are the currently-held key names;
    /// normalized (lowercase, spaces to underscores) before publishing,
    /// and dropped if normalization leaves a name that clashes with path
    /// syntax. Published each frame as `input.keyboard.current.<name>`
    /// (0/1) and `input.keyboard.delta.<name>` (-1/0/+1 edge versus last
    /// frame).
    pub fn step(
        &mut self,
        pressed_keys: &[&str],
        camera: TileCoord,
        layers: &[Layer],
        registry: &CommandRegistry,
        forced_overrides: &[ForcedOverride],
    ) {
        let dt = self.clock.tick();
        let pressed: std::collections::HashSet<String> =
            pressed_keys.iter().filter_map(|raw| normalize_key_name(raw)).collect();
        {
            let mut global = self.environment.global_doc.write();
            global.set("time.dt", dt);
            global.set("time.t", self.clock.virtual_time());
            global.set("time.dt_ms", dt * 1000.0);
            global.set("time.t_ms", self.clock.virtual_time() * 1000.0);
            global.set("time.frame", self.clock.frame_count() as i64);
            global.set("rand", self.clock.rand_value());
            global.set("rrand", self.clock.rrand_value());

            for key in &["up", "down", "left", "right", "action", "cancel"] {
                let current_path = format!("input.keyboard.current.{}", key);
                let delta_path = format!("input.keyboard.delta.{}", key);
                let was_pressed = global.get::<i64>(&current_path, 0) != 0;
                let now_pressed = pressed.contains(*key);
                let delta: i64 = match (was_pressed, now_pressed) {
                    (false, true) => 1,
                    (true, false) => -1,
                    _ => 0,
                };
                global.set(current_path.as_str(), if now_pressed { 1_i64 } else { 0_i64 });
                global.set(delta_path.as_str(), delta);
            }
        }

        self.environment.update(camera, layers);
        self.environment.drain_queues(registry);

        {
            let mut global = self.environment.global_doc.write();
            for over in forced_overrides {
                global.set(over.path.as_str(), over.value);
            }
        }

        self.environment.purge();
    }
}

/// Lowercases and replaces spaces with underscores; drops names that would
/// collide with path syntax (`.`, `[`, `]`, `:`, `{`, `}`, `$`) or are empty
/// after trimming.
fn normalize_key_name(raw: &str) -> Option<String> {
    let name = raw.trim().to_lowercase().replace(' ', "_");
    if name.is_empty() || name.chars().any(|c| matches!(c, '.' | '[' | ']' | ':' | '{' | '}' | '$')) {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::invoke::EntryDef;
    use crate::object::RenderObject;

    #[test]
    fn forced_override_applies_after_dispatch() {
        let env = Environment::new(10.0, 0.0, 4);
        let mut frame = FrameLoop::new(env, TimeKeeper::fixed_step(1.0 / 60.0));
        frame.clock.start();

        let mut obj = RenderObject::new(Document::new());
        let def = EntryDef {
            topic: "tick".into(),
            logical_arg: "1".into(),
            exprs: vec!["global.score=$(1)".into()],
            functioncalls_self: vec![],
            functioncalls_other: vec![],
            functioncalls_global: vec![],
        };
        obj.set_entry_defs(&[def]).unwrap();
        frame.environment.append(Layer::General, obj);

        let registry = CommandRegistry::builder().build();
        let overrides = vec![ForcedOverride {
            path: "score".into(),
            value: 42.0,
        }];
        frame.step(&[], TileCoord { x: 0, y: 0 }, &[Layer::General], &registry, &overrides);

        assert_eq!(
            frame.environment.global_doc.write().get::<f64>("score", 0.0),
            42.0
        );
    }

    #[test]
    fn input_keys_are_normalized_and_reset_each_frame() {
        let env = Environment::new(10.0, 0.0, 4);
        let mut frame = FrameLoop::new(env, TimeKeeper::fixed_step(1.0 / 60.0));
        frame.clock.start();
        let registry = CommandRegistry::builder().build();

        frame.step(&["UP"], TileCoord { x: 0, y: 0 }, &[], &registry, &[]);
        assert_eq!(
            frame.environment.global_doc.write().get::<i64>("input.keyboard.current.up", -1),
            1
        );
        assert_eq!(
            frame.environment.global_doc.write().get::<i64>("input.keyboard.delta.up", -99),
            1
        );

        frame.step(&[], TileCoord { x: 0, y: 0 }, &[], &registry, &[]);
        assert_eq!(
            frame.environment.global_doc.write().get::<i64>("input.keyboard.current.up", -1),
            0
        );
        assert_eq!(
            frame.environment.global_doc.write().get::<i64>("input.keyboard.delta.up", -99),
            -1
        );
    }

    #[test]
    fn time_and_rng_streams_are_published_each_frame() {
        let env = Environment::new(10.0, 0.0, 4);
        let mut frame = FrameLoop::new(env, TimeKeeper::fixed_step(0.5));
        frame.clock.start();
        let registry = CommandRegistry::builder().build();

        frame.step(&[], TileCoord { x: 0, y: 0 }, &[], &registry, &[]);

        let mut global = frame.environment.global_doc.write();
        assert_eq!(global.get::<f64>("time.dt", 0.0), 0.5);
        assert_eq!(global.get::<f64>("time.dt_ms", 0.0), 500.0);
        assert_eq!(global.get::<f64>("time.t_ms", 0.0), 500.0);
        assert_eq!(global.get::<i64>("time.frame", 0), 1);
        assert!((0.0..1.0).contains(&global.get::<f64>("rand", -1.0)));
        assert!((0.0..1.0).contains(&global.get::<f64>("rrand", -1.0)));
    }
}
