//! # Tuple Space Configuration
//!
//! Settings shared by routers, promises and Hydra pump threads, loaded from
//! an optional TOML file with `TUPLESPACE__*` environment overrides.
//!
//! ## Usage
//!
//! ```rust
//! use tuple_config::{TupleLogMode, TupleSpaceConfig};
//!
//! let config = TupleSpaceConfig::from_toml_str(
//!     r#"
//!     [router]
//!     name = "client"
//!     log_tuples = "brief"
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.router.log_tuples, TupleLogMode::Brief);
//! assert_eq!(config.promise.poll_interval_ms, 10);
//! ```

pub mod settings;

pub use settings::{
    HydraSettings, LoggingSettings, PromiseSettings, RouterSettings, TupleLogMode,
    TupleSpaceConfig, WorldAccessSettings, ENV_PREFIX,
};
