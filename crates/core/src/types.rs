/// Session identifiers are opaque strings (`session_<uuid>`).
pub type SessionId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
