use serde::{Deserialize, Serialize};

/// A point-in-time reading of one gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub name: String,
    pub help: String,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, help: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            value,
        }
    }
}
