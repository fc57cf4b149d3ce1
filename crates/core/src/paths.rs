//! Well-known Signal K path constants and the [`WatchedPath`] dispatch enum.
//!
//! These are the canonical telemetry keys the monitor subscribes to and
//! reacts on. Anything else that arrives on the feed is stored but otherwise
//! ignored.

/// Context every subscription is scoped to.
pub const CONTEXT_SELF: &str = "vessels.self";

/// Maximum swing radius configured by the anchor alarm. Present (non-null)
/// while an anchor is set, explicitly `null` once it is raised.
pub const PATH_ANCHOR_MAX_RADIUS: &str = "navigation.anchor.maxRadius";

/// Current distance from the anchor position, in metres.
pub const PATH_ANCHOR_CURRENT_RADIUS: &str = "navigation.anchor.currentRadius";

/// True bearing from the vessel to the anchor, in radians.
pub const PATH_ANCHOR_BEARING_TRUE: &str = "navigation.anchor.bearingTrue";

/// Depth below the water surface, in metres.
pub const PATH_DEPTH_BELOW_SURFACE: &str = "environment.depth.belowSurface";

/// GNSS position fix.
pub const PATH_POSITION: &str = "navigation.position";

/// Notification object raised by the anchor alarm.
pub const PATH_NOTIFICATION_ANCHOR: &str = "notifications.navigation.anchor";

/// Notification object raised by the depth alarm.
pub const PATH_NOTIFICATION_DEPTH: &str = "notifications.environment.depth.belowSurface";

/// Subscription patterns requested from the server.
pub const SUBSCRIPTION_PATTERNS: [&str; 4] = [
    "notifications.*",
    "navigation.anchor.*",
    "environment.depth.*",
    PATH_POSITION,
];

/// A telemetry path classified by the signal family it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchedPath {
    AnchorMaxRadius,
    AnchorCurrentRadius,
    AnchorBearingTrue,
    DepthBelowSurface,
    Position,
    AnchorNotification,
    DepthNotification,
    /// Any path the monitor does not react to.
    Other(String),
}

impl WatchedPath {
    /// Classify a raw Signal K path.
    pub fn parse(path: &str) -> Self {
        match path {
            PATH_ANCHOR_MAX_RADIUS => Self::AnchorMaxRadius,
            PATH_ANCHOR_CURRENT_RADIUS => Self::AnchorCurrentRadius,
            PATH_ANCHOR_BEARING_TRUE => Self::AnchorBearingTrue,
            PATH_DEPTH_BELOW_SURFACE => Self::DepthBelowSurface,
            PATH_POSITION => Self::Position,
            PATH_NOTIFICATION_ANCHOR => Self::AnchorNotification,
            PATH_NOTIFICATION_DEPTH => Self::DepthNotification,
            other => Self::Other(other.to_string()),
        }
    }

    /// The raw Signal K path string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::AnchorMaxRadius => PATH_ANCHOR_MAX_RADIUS,
            Self::AnchorCurrentRadius => PATH_ANCHOR_CURRENT_RADIUS,
            Self::AnchorBearingTrue => PATH_ANCHOR_BEARING_TRUE,
            Self::DepthBelowSurface => PATH_DEPTH_BELOW_SURFACE,
            Self::Position => PATH_POSITION,
            Self::AnchorNotification => PATH_NOTIFICATION_ANCHOR,
            Self::DepthNotification => PATH_NOTIFICATION_DEPTH,
            Self::Other(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_paths_round_trip_through_parse() {
        for path in [
            PATH_ANCHOR_MAX_RADIUS,
            PATH_ANCHOR_CURRENT_RADIUS,
            PATH_ANCHOR_BEARING_TRUE,
            PATH_DEPTH_BELOW_SURFACE,
            PATH_POSITION,
            PATH_NOTIFICATION_ANCHOR,
            PATH_NOTIFICATION_DEPTH,
        ] {
            let watched = WatchedPath::parse(path);
            assert!(!matches!(watched, WatchedPath::Other(_)), "{path}");
            assert_eq!(watched.as_str(), path);
        }
    }

    #[test]
    fn unknown_path_is_other() {
        let watched = WatchedPath::parse("navigation.speedOverGround");
        assert_eq!(
            watched,
            WatchedPath::Other("navigation.speedOverGround".to_string())
        );
        assert_eq!(watched.as_str(), "navigation.speedOverGround");
    }

    #[test]
    fn depth_notification_is_not_depth_value() {
        assert_eq!(
            WatchedPath::parse(PATH_NOTIFICATION_DEPTH),
            WatchedPath::DepthNotification
        );
        assert_eq!(
            WatchedPath::parse(PATH_DEPTH_BELOW_SURFACE),
            WatchedPath::DepthBelowSurface
        );
    }
}
