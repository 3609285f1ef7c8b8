use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_newtype!(JobId);
id_newtype!(StageId);
id_newtype!(CandidateId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub title: String,
}

/// A backend-defined hiring step. `order` is the left-to-right column position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: CandidateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-text origin label ("LinkedIn", "Referral", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "applied_at_format"
    )]
    pub applied_at: Option<DateTime<Utc>>,
    /// AI-computed fit, 0 to 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    pub stage_id: StageId,
}

impl Candidate {
    pub fn new(id: impl Into<String>, stage_id: impl Into<String>) -> Self {
        Self {
            id: CandidateId::new(id),
            name: None,
            email: None,
            title: None,
            source: None,
            applied_at: None,
            match_score: None,
            stage_id: StageId::new(stage_id),
        }
    }
}

/// Client-side filters applied before bucketing. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    #[serde(default)]
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(default)]
    pub ai_only: bool,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.min_score.is_none() && !self.ai_only
    }
}

/// Backends send either full RFC 3339 timestamps or bare `YYYY-MM-DD` dates.
mod applied_at_format {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| D::Error::custom(format!("invalid appliedAt '{raw}': {e}")))?;
        Ok(date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()))
    }
}
