//! Timestamp-based session identifiers.
//!
//! Ids look like `{bot}_{YYYY-MM-DDTHH:MM:SS.ffffff}` in UTC. Within one
//! process the generator never hands out the same microsecond twice; across
//! processes two requests in the same microsecond can still collide.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use personachat_types::persona::Persona;

const ID_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Issues strictly increasing session ids for this process.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    last_micros: AtomicI64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh id for `bot` based on the current time.
    pub fn next(&self, bot: Persona) -> String {
        self.next_at(bot, Utc::now())
    }

    fn next_at(&self, bot: Persona, now: DateTime<Utc>) -> String {
        let now_micros = now.timestamp_micros();
        let mut prev = self.last_micros.load(Ordering::Acquire);
        let issued = loop {
            let candidate = now_micros.max(prev.saturating_add(1));
            match self.last_micros.compare_exchange_weak(
                prev,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break candidate,
                Err(actual) => prev = actual,
            }
        };

        let stamp = DateTime::from_timestamp_micros(issued).unwrap_or(now);
        format!("{}_{}", bot.bot_id(), stamp.format(ID_TIMESTAMP_FORMAT))
    }
}
