//! Clock capability — lets tests substitute a fixed time without touching
//! the system clock, the same pattern the teacher's `ExecutorConfig` reaches
//! for with injected duration values.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
