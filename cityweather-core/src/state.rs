/// Lifecycle of an asynchronous operation as seen by a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum UiState<T> {
    /// Nothing requested, nothing to show.
    Idle,
    Loading,
    Success(T),
    /// Human-readable failure of the last attempt.
    Error(String),
}

impl<T> UiState<T> {
    /// `Success` or `Error`: the attempt has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UiState::Success(_) | UiState::Error(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            UiState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UiState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UiState<U> {
        match self {
            UiState::Idle => UiState::Idle,
            UiState::Loading => UiState::Loading,
            UiState::Success(data) => UiState::Success(f(data)),
            UiState::Error(message) => UiState::Error(message),
        }
    }
}
