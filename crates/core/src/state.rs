use serde::Serialize;

/// State of a pending remote operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum ResultState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> ResultState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResultState::Loading)
    }

    /// True once the operation has produced a value or an error.
    pub fn is_settled(&self) -> bool {
        !self.is_loading()
    }
}
