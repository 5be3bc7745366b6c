use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::http::Response;

/// A value together with the moment it was cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.cached_at
    }

    pub fn age_minutes(&self) -> i64 {
        self.age().num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative ages)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_older_than(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }
}

/// A response as kept in a cache store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub url: String,
    pub response: Response,
    /// Written eagerly from the install manifest; exempt from eviction.
    #[serde(default)]
    pub precached: bool,
}
