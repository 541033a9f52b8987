/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const CENTERS_ROUTE_COMPONENT: &str = "centers";
pub const CENTERS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", CENTERS_ROUTE_COMPONENT);

pub const RULES_ROUTE_COMPONENT: &str = "rules";
pub const EXCEPTIONS_ROUTE_COMPONENT: &str = "exceptions";

/// Request header naming who performs an admin write; recorded in the audit log.
pub const ACTOR_HEADER: &str = "x-timeledger-actor";
pub const DEFAULT_ACTOR: &str = "api";

/// Largest expansion window accepted when configuration does not override it.
pub const DEFAULT_MAX_WINDOW_DAYS: u32 = 400;

/// Lead time applied when a center's settings do not name one.
pub const DEFAULT_EXCEPTION_LEAD_DAYS: u32 = 14;

/// The expander polls for cancellation once per this many emitted records.
pub const CANCELLATION_CHECK_INTERVAL: usize = 1_000;

/// Component tag attached to upstream fetch failures.
pub const FETCH_COMPONENT: &str = "expander.fetch";

/// Wire formats.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
