//! Snowflake identifier generator
//!
//! Thin wrapper over `rs-snowflake` with validated configuration. Layout
//! (63 usable bits, always positive):
//! `[41 bits ms since epoch][10 bits machine id][12 bits sequence]`
//!
//! The crate splits the 10 machine bits into a 5-bit machine and a 5-bit
//! node field; the configured id is spread across both.

use chrono::{NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use snowflake::SnowflakeIdGenerator;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::domain::ports::IdGenerator;
use crate::error::{Result, StorageError};

const NODE_BITS: u32 = 5;
const NODE_MASK: i64 = (1 << NODE_BITS) - 1;
const MAX_MACHINE_ID: i64 = (1 << (2 * NODE_BITS)) - 1;

pub struct Snowflake {
    machine_id: i64,
    inner: Mutex<SnowflakeIdGenerator>,
}

impl std::fmt::Debug for Snowflake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snowflake")
            .field("machine_id", &self.machine_id)
            .finish_non_exhaustive()
    }
}

impl Snowflake {
    /// `start_date` is `YYYY-MM-DD` (UTC midnight); `machine_id` is 1..=1023
    pub fn new(start_date: &str, machine_id: i64) -> Result<Self> {
        if !(1..=MAX_MACHINE_ID).contains(&machine_id) {
            return Err(StorageError::config(format!(
                "machine id {} out of range 1..={}",
                machine_id, MAX_MACHINE_ID
            )));
        }

        let epoch = parse_epoch(start_date)?;

        // Both halves fit in 5 bits after the range check
        let high = (machine_id >> NODE_BITS) as i32;
        let low = (machine_id & NODE_MASK) as i32;

        Ok(Self {
            machine_id,
            inner: Mutex::new(SnowflakeIdGenerator::with_epoch(high, low, epoch)),
        })
    }

    pub fn machine_id(&self) -> i64 {
        self.machine_id
    }
}

fn parse_epoch(start_date: &str) -> Result<SystemTime> {
    let invalid = || StorageError::config(format!("invalid start date '{}'", start_date));

    let date = NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
        .map_err(|e| invalid().with_source(e))?;
    let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?;
    let epoch_ms = Utc.from_utc_datetime(&midnight).timestamp_millis();

    if epoch_ms > Utc::now().timestamp_millis() {
        return Err(StorageError::config(format!(
            "start date '{}' is in the future",
            start_date
        )));
    }
    let epoch_ms = u64::try_from(epoch_ms).map_err(|_| {
        StorageError::config(format!("start date '{}' is before 1970-01-01", start_date))
    })?;

    Ok(UNIX_EPOCH + Duration::from_millis(epoch_ms))
}

impl IdGenerator for Snowflake {
    fn next_id(&self) -> i64 {
        self.inner.lock().generate()
    }
}
