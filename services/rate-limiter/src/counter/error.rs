use thiserror::Error;

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),

    #[error("window of {0:?} for {1} is beyond the clock range")]
    WindowOutOfRange(std::time::Duration, String),
}
