/// Namespace backed by the IANA root.
pub const CACHE_IANA: &str = "iana";

/// Namespace backed by the OpenNIC root.
pub const CACHE_OPENNIC: &str = "opennic";
