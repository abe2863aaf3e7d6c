use serde::{Deserialize, Deserializer, Serialize};

/// Authoritative remaining-time value as last fetched from the server.
///
/// Missing or null numeric fields count as zero. Fields may go negative
/// once the event is under way; the total is floored at zero. The started
/// flag is
/// published as `isStarted` by the exam endpoint and as `isstarted` by the
/// admin statistics endpoint; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub days: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hours: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub minutes: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub seconds: i64,
    #[serde(
        rename = "isStarted",
        alias = "isstarted",
        default,
        deserialize_with = "null_as_default"
    )]
    pub started: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl CountdownSnapshot {
    pub fn new(days: i64, hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
            ..Self::default()
        }
    }

    /// Total remaining seconds described by this snapshot.
    pub fn total_seconds(&self) -> u64 {
        let total = self
            .days
            .saturating_mul(24)
            .saturating_add(self.hours)
            .saturating_mul(60)
            .saturating_add(self.minutes)
            .saturating_mul(60)
            .saturating_add(self.seconds);
        u64::try_from(total).unwrap_or(0)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
