use serde::{Deserialize, Serialize};

/// Default priority at or above which a job goes to the high lane
pub const DEFAULT_PRIORITY_THRESHOLD: i32 = 5;

/// Input lane a job is queued on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// The only lane of a single-lane pool
    Default,

    /// Serviced before `Low` whenever it holds jobs
    High,

    /// Serviced only while `High` is empty
    Low,
}

impl Lane {
    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Lane {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            _ => Err(format!("Invalid lane: {}", s)),
        }
    }
}

/// How submitted jobs are spread over lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheduling {
    /// One FIFO lane
    Fifo,

    /// High lane for `priority >= threshold`, low lane otherwise
    Priority { threshold: i32 },
}

impl Scheduling {
    /// Two-lane scheduling with the given threshold
    pub fn priority(threshold: i32) -> Self {
        Self::Priority { threshold }
    }

    /// Lanes in service order
    pub fn lanes(&self) -> &'static [Lane] {
        match self {
            Self::Fifo => &[Lane::Default],
            Self::Priority { .. } => &[Lane::High, Lane::Low],
        }
    }

    /// Lane a job with the given priority is routed to
    pub fn lane_for(&self, priority: i32) -> Lane {
        match *self {
            Self::Fifo => Lane::Default,
            Self::Priority { threshold } if priority >= threshold => Lane::High,
            Self::Priority { .. } => Lane::Low,
        }
    }
}

impl Default for Scheduling {
    fn default() -> Self {
        Self::Fifo
    }
}
