//! Server timestamps.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Timelike, Utc};

/// Hands out UTC instants at microsecond precision, each strictly later than
/// the one before. Ties and backwards wall-clock steps are resolved by
/// advancing one microsecond past the previous stamp.
#[derive(Debug, Default)]
pub struct MonotonicClock {
  last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
  /// A clock that will never issue a stamp at or before `floor`.
  pub fn starting_after(floor: Option<DateTime<Utc>>) -> Self {
    Self { last: Mutex::new(floor.map(truncate_to_micros)) }
  }

  pub fn now(&self) -> DateTime<Utc> {
    let wall = truncate_to_micros(Utc::now());
    let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
    let next = match *last {
      Some(prev) if wall <= prev => prev + TimeDelta::microseconds(1),
      _ => wall,
    };
    *last = Some(next);
    next
  }
}

fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
  let nanos = dt.nanosecond();
  dt.with_nanosecond(nanos - nanos % 1_000).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stamps_strictly_increase() {
    let clock = MonotonicClock::default();
    let mut prev = clock.now();
    for _ in 0..1_000 {
      let next = clock.now();
      assert!(next > prev);
      prev = next;
    }
  }

  #[test]
  fn stamp_is_not_before_wall_clock() {
    let clock = MonotonicClock::starting_after(Some(Utc::now() - TimeDelta::hours(1)));
    for _ in 0..100 {
      let before = truncate_to_micros(Utc::now());
      assert!(clock.now() >= before);
    }
  }

  #[test]
  fn future_floor_is_respected() {
    let floor = Utc::now() + TimeDelta::hours(1);
    let clock = MonotonicClock::starting_after(Some(floor));
    assert_eq!(clock.now(), truncate_to_micros(floor) + TimeDelta::microseconds(1));
  }
}
