//! In-memory [`ReadingSource`] for tests.
//!
//! Responses are scripted per `(coordinates, mode)` pair. Unscripted
//! requests fail with a transport error. Every call is recorded so tests
//! can assert which fetches happened.

use std::collections::BTreeMap;
use std::sync::Mutex;

use air_compare_reading_models::{Coordinates, FetchMode, Reading};
use async_trait::async_trait;
use chrono::Datelike as _;

use crate::{ReadingError, ReadingSource};

/// A scripted outcome for one request.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return this reading.
    Reading(Reading),
    /// Fail with [`ReadingError::Transport`].
    Transport(String),
    /// Fail with [`ReadingError::NoData`].
    NoData,
}

/// Which request a script entry answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScriptedMode {
    /// Current conditions.
    Current,
    /// Historical data for any date in this year.
    Year(i32),
}

impl From<FetchMode> for ScriptedMode {
    fn from(mode: FetchMode) -> Self {
        match mode {
            FetchMode::Current => Self::Current,
            FetchMode::Historical { date } => Self::Year(date.year()),
        }
    }
}

type Key = (String, ScriptedMode);

fn key(coordinates: Coordinates, mode: ScriptedMode) -> Key {
    (
        format!("{:.4},{:.4}", coordinates.latitude, coordinates.longitude),
        mode,
    )
}

/// Scripted [`ReadingSource`].
#[derive(Default)]
pub struct ScriptedSource {
    responses: BTreeMap<Key, Scripted>,
    calls: Mutex<Vec<(Coordinates, FetchMode)>>,
}

impl ScriptedSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for a coordinate and mode.
    #[must_use]
    pub fn with(mut self, coordinates: Coordinates, mode: ScriptedMode, outcome: Scripted) -> Self {
        self.responses.insert(key(coordinates, mode), outcome);
        self
    }

    /// Scripts a successful reading.
    #[must_use]
    pub fn with_reading(self, coordinates: Coordinates, mode: ScriptedMode, reading: Reading) -> Self {
        self.with(coordinates, mode, Scripted::Reading(reading))
    }

    /// All requests made so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<(Coordinates, FetchMode)> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    async fn fetch(
        &self,
        coordinates: Coordinates,
        mode: FetchMode,
    ) -> Result<Reading, ReadingError> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push((coordinates, mode));

        match self.responses.get(&key(coordinates, mode.into())) {
            Some(Scripted::Reading(reading)) => Ok(reading.clone()),
            Some(Scripted::Transport(message)) => Err(ReadingError::Transport {
                message: message.clone(),
            }),
            Some(Scripted::NoData) => Err(ReadingError::NoData {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            }),
            None => Err(ReadingError::Transport {
                message: format!("no scripted response for {mode}"),
            }),
        }
    }
}
