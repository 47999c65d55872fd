//! Envelope constants
//!
//! Reserved tuple keys, tuple types and actor names that every component of
//! the tuple space agrees on. Concrete transports must carry the envelope keys
//! unchanged.

/// Reserved tuple keys
pub mod keys {
    pub const TYPE: &str = "type";
    pub const SOURCE_ACTOR: &str = "sourceActor";
    pub const SOURCE_ID: &str = "sourceID";
    pub const DESTINATION_ACTOR: &str = "destinationActor";
    pub const DESTINATION_ID: &str = "destinationID";

    /// Envelope keys, in the order dumps print them
    pub const ENVELOPE: [&str; 5] = [
        TYPE,
        SOURCE_ACTOR,
        SOURCE_ID,
        DESTINATION_ACTOR,
        DESTINATION_ID,
    ];

    // Control tuple payload
    pub const TYPES: &str = "types";
    pub const DESTINATION_IDS: &str = "destinationIDs";
    pub const DESTINATION_ACTORS: &str = "destinationActors";
    pub const VALUES: &str = "values";
    pub const ACTION: &str = "action";

    pub const COORDINATES: &str = "coordinates";
    pub const WORLD_ID: &str = "worldID";
    pub const DATA: &str = "data";
    pub const SEALING_KEY: &str = "sealingKey";
}

/// Reserved tuple types
pub mod types {
    /// Subscription control tuple, routable regardless of criteria
    pub const ROUTING_CRITERIA: &str = "RoutingCriteria";
    /// Credential exchange, never crosses a thread boundary or gets forwarded
    pub const AUTHENTICATE: &str = "Authenticate";
    pub const TICK: &str = "Tick";
    pub const TIME: &str = "Time";
}

/// Reserved actor names
pub mod actors {
    /// World broadcast actor; tuples to or from it stay in-process
    pub const WORLD: &str = "World";
    pub const ASSET_LOADER: &str = "AssetLoader";
    pub const TELEGRAM_LOADER: &str = "TelegramLoader";
    pub const WORLD_LOADER: &str = "WorldLoader";
    pub const INVITE_FRIEND_CLIENT: &str = "InviteFriendClient";
}

/// Control tuple actions
pub mod actions {
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
}
