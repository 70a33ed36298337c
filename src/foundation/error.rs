use crate::scene::playback::TimeWindow;

/// Convenience result type used across motionshader.
pub type MotionResult<T> = Result<T, MotionError>;

/// Top-level error taxonomy for a render.
///
/// Every variant is fatal for the render that raised it; nothing is retried internally.
#[derive(thiserror::Error, Debug)]
pub enum MotionError {
    /// Invalid viewport, playback, or option parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// The basemap could not be fetched or decoded.
    #[error("tile fetch error: {0}")]
    TileFetch(String),

    /// The windowed point fetch failed for `window`.
    #[error("data source error for window {window}: {message}")]
    DataSource {
        /// Window whose subset failed.
        window: TimeWindow,
        /// Underlying failure description.
        message: String,
    },

    /// Rasterization or compositing failed.
    #[error("render error: {0}")]
    Render(String),

    /// The frame sink rejected a frame or failed to write its output.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The render was cancelled before `window` was fetched.
    #[error("render cancelled before window {window}")]
    Cancelled {
        /// First window that was not rendered.
        window: TimeWindow,
    },

    /// Malformed render configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MotionError {
    /// Build a [`MotionError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MotionError::TileFetch`] value.
    pub fn tile_fetch(msg: impl Into<String>) -> Self {
        Self::TileFetch(msg.into())
    }

    /// Build a [`MotionError::DataSource`] value.
    pub fn data_source(window: TimeWindow, msg: impl Into<String>) -> Self {
        Self::DataSource {
            window,
            message: msg.into(),
        }
    }

    /// Build a [`MotionError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MotionError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`MotionError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
