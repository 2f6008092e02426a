use chrono::{NaiveDate, Utc};
use std::sync::Arc;

/// Source of "today" for fines and leave dates.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub type SharedClock = Arc<dyn Clock>;

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
