use serde::{Deserialize, Serialize};

/// Test metadata owned by the external catalog, consumed read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMeta {
    pub duration_minutes: i32,
    /// Passing threshold as a percentage; meeting it exactly passes.
    pub passing_score: i32,
}

/// A catalog question. Its position in the order-sorted question list IS
/// the question index answers refer to; there is no question identity here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_option_index: i32,
}
