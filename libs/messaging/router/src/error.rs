//! Route errors

/// Why a tuple could not be handed to a route's transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The route reported a permanent failure and sends nothing
    #[error("Route {0} is unavailable")]
    Unavailable(String),

    /// The transport never carries tuples of this type
    #[error("Route {route} refuses {tuple_type} tuples")]
    Refused { route: String, tuple_type: String },

    /// No partner, or the partner has stopped
    #[error("Route {0} is disconnected")]
    Disconnected(String),

    #[error("Transport error on {route}: {reason}")]
    Transport { route: String, reason: String },
}

/// Result type for route operations
pub type RouteResult<T> = std::result::Result<T, RouteError>;
