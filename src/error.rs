use crate::{ActorError, ChannelError, ConfigurationError, GenerationError};
use std::fmt::{Display, Formatter};

impl ConfigurationError {
    pub fn new(what: String, message: String) -> Self {
        Self { message, what }
    }

    #[inline]
    pub fn what(&self) -> &str {
        &self.what
    }
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigurationError: {}-{}", self.what, self.message)
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::ValuesExhausted(label) => {
                write!(f, "No value left in the pool assigned to '{}'.", label)
            }
            GenerationError::UnresolvedDependency(label) => {
                write!(
                    f,
                    "The relation '{}' could not be resolved from the emitted variables.",
                    label
                )
            }
            GenerationError::InvalidSelection(message) => {
                write!(f, "Invalid alternative selection: {}.", message)
            }
            GenerationError::Unsupported(message) => write!(f, "{}", message),
        }
    }
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::Timeout => write!(f, "Timed out waiting for a frame."),
            ChannelError::Stopped => write!(f, "The actor was asked to stop."),
            ChannelError::Closed => write!(f, "The peer endpoint is gone."),
            ChannelError::Io(message) => write!(f, "Transport failure: {}.", message),
        }
    }
}

impl Display for ActorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorError::UnknownSymbol { state, message } => write!(
                f,
                "Received an unknown message of {} bytes at state '{}'.",
                message.len(),
                state
            ),
            ActorError::UnexpectedSymbol { state, symbol, .. } => write!(
                f,
                "Received symbol '{}' at state '{}' but no transition expects it.",
                symbol, state
            ),
            ActorError::Generation(err) => write!(f, "{}", err),
            ActorError::Configuration(err) => write!(f, "{}", err),
            ActorError::Transport(err) => write!(f, "{}", err),
        }
    }
}

impl From<GenerationError> for ActorError {
    fn from(err: GenerationError) -> Self {
        ActorError::Generation(err)
    }
}

impl From<ConfigurationError> for ActorError {
    fn from(err: ConfigurationError) -> Self {
        ActorError::Configuration(err)
    }
}

impl From<ChannelError> for ActorError {
    fn from(err: ChannelError) -> Self {
        ActorError::Transport(err)
    }
}
