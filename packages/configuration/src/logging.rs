use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct Logging {
    /// Logging level. Possible values are: `off`, `error`, `warn`, `info`,
    /// `debug` and `trace`. Default is `info`.
    #[serde(default)]
    pub threshold: Threshold,

    /// Layout of the log lines: `default`, `compact` or `json`.
    #[serde(default)]
    pub style: Style,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    /// Nothing is logged.
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Hash, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Multi-field human readable lines.
    #[default]
    Default,
    Compact,
    /// One JSON object per line, for log shippers.
    Json,
}
