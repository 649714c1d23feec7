//! A small fixed pool of reusable evaluation scratch stacks.
//!
//! Pair evaluation runs many expressions concurrently across worker
//! threads (see the invoke dispatcher). Giving every evaluation its own
//! `Vec<f64>` would mean an allocation per expression per frame; instead
//! callers borrow one of `POOL_SIZE` shared stacks, picked at random
//! rather than round-robin so contention stays low without any shared
//! counter to synchronize on.

use parking_lot::Mutex;
use rand::Rng;

use super::eval::{self, VariableResolver};
use super::instr::Program;
use super::template::Template;

pub const POOL_SIZE: usize = 8;

pub struct ExpressionPool {
    slots: Vec<Mutex<Vec<f64>>>,
}

impl Default for ExpressionPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionPool {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(POOL_SIZE);
        for _ in 0..POOL_SIZE {
            slots.push(Mutex::new(Vec::new()));
        }
        ExpressionPool { slots }
    }

    pub fn eval(
        &self,
        program: &Program,
        resolver: &mut dyn VariableResolver,
    ) -> Result<f64, String> {
        let idx = rand::thread_rng().gen_range(0..self.slots.len());
        let mut stack = self.slots[idx].lock();
        eval::eval(program, resolver, &mut stack)
    }

    pub fn eval_template_f64(
        &self,
        template: &Template,
        resolver: &mut dyn VariableResolver,
    ) -> Result<f64, String> {
        let idx = rand::thread_rng().gen_range(0..self.slots.len());
        let mut stack = self.slots[idx].lock();
        template.eval_to_f64(resolver, &mut stack)
    }

    pub fn eval_template_string(
        &self,
        template: &Template,
        resolver: &mut dyn VariableResolver,
    ) -> Result<String, String> {
        let idx = rand::thread_rng().gen_range(0..self.slots.len());
        let mut stack = self.slots[idx].lock();
        template.eval_to_string(resolver, &mut stack)
    }
}
