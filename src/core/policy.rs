//! Check-in rules applied around the zone validator: fix accuracy, fix age,
//! any-zone authorization and the boundary tolerance.

use std::fmt::{self, Display};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::data::{Direction, LocationFix, Zone, ZoneValidation};
use super::validate::validate_zones_with_direction;

/// positions this close to a zone boundary are accepted to absorb GPS jitter
pub const BOUNDARY_TOLERANCE_METERS: f64 = 3.0;
/// accuracy limit used when the fix is taken in the background during check-in
pub const DEFAULT_MAX_ACCURACY_METERS: f64 = 50.0;
pub const STRICT_MAX_ACCURACY_METERS: f64 = 30.0;

/// whether an employee is bound to their assigned zones
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ZoneAuthorization {
    AnyZone,
    AssignedZones,
}

impl ZoneAuthorization {
    /// backend flag `employeeAuthorizeAnyZones`, only `1` lifts the restriction
    pub fn from_flag(flag: i64) -> Self {
        if flag == 1 {
            ZoneAuthorization::AnyZone
        } else {
            ZoneAuthorization::AssignedZones
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckInPolicy {
    pub boundary_tolerance: f64,
    pub max_accuracy: f64,
    pub max_fix_age: Option<Duration>,
}

impl Default for CheckInPolicy {
    fn default() -> Self {
        CheckInPolicy {
            boundary_tolerance: BOUNDARY_TOLERANCE_METERS,
            max_accuracy: DEFAULT_MAX_ACCURACY_METERS,
            max_fix_age: None,
        }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum CheckInDecision {
    /// inside a zone, or outside by no more than the boundary tolerance
    Permitted { validation: ZoneValidation },
    PermittedAnyZone,
    #[serde(rename_all = "camelCase")]
    OutsideZone {
        zone_index: usize,
        distance: f64,
        direction: Direction,
    },
    /// no usable zones are configured for the employee
    NoZonesAssigned,
    InsufficientAccuracy { accuracy: f64, limit: f64 },
    #[serde(rename_all = "camelCase")]
    StaleFix { age_seconds: i64, limit_seconds: i64 },
}

impl CheckInDecision {
    pub fn is_permitted(&self) -> bool {
        matches!(
            self,
            CheckInDecision::Permitted { .. } | CheckInDecision::PermittedAnyZone
        )
    }
}

impl Display for CheckInDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInDecision::Permitted { validation } => match validation.zone_index {
                Some(i) if validation.inside => write!(f, "check-in permitted: inside zone {i}"),
                Some(i) => write!(
                    f,
                    "check-in permitted: {:.2} m from zone {i}, within tolerance",
                    validation.distance
                ),
                None => write!(f, "check-in permitted"),
            },
            CheckInDecision::PermittedAnyZone => {
                write!(f, "check-in permitted: employee may check in from any zone")
            }
            CheckInDecision::OutsideZone {
                zone_index,
                distance,
                direction,
            } => write!(
                f,
                "outside the allowed zones: {distance:.2} m to the {direction} (zone {zone_index})"
            ),
            CheckInDecision::NoZonesAssigned => write!(f, "no zones assigned to this employee"),
            CheckInDecision::InsufficientAccuracy { accuracy, limit } => write!(
                f,
                "location precision too low: ±{accuracy:.1} m, at most ±{limit:.1} m required"
            ),
            CheckInDecision::StaleFix {
                age_seconds,
                limit_seconds,
            } => write!(
                f,
                "location fix is {age_seconds} s old, at most {limit_seconds} s allowed"
            ),
        }
    }
}

impl CheckInPolicy {
    pub fn strict() -> Self {
        CheckInPolicy {
            max_accuracy: STRICT_MAX_ACCURACY_METERS,
            ..Default::default()
        }
    }

    pub fn evaluate(
        &self,
        fix: &LocationFix,
        authorization: ZoneAuthorization,
        zones: &[Zone],
        now: DateTime<Utc>,
    ) -> CheckInDecision {
        let decision = self.decide(fix, authorization, zones, now);
        info!(%fix, ?authorization, permitted = decision.is_permitted(), "{decision}");
        decision
    }

    fn decide(
        &self,
        fix: &LocationFix,
        authorization: ZoneAuthorization,
        zones: &[Zone],
        now: DateTime<Utc>,
    ) -> CheckInDecision {
        if !fix.accuracy.is_finite() || fix.accuracy > self.max_accuracy {
            return CheckInDecision::InsufficientAccuracy {
                accuracy: fix.accuracy,
                limit: self.max_accuracy,
            };
        }

        if let Some(limit) = self.max_fix_age {
            let age = fix.age(now);
            if age > limit {
                return CheckInDecision::StaleFix {
                    age_seconds: age.num_seconds(),
                    limit_seconds: limit.num_seconds(),
                };
            }
        }

        if authorization == ZoneAuthorization::AnyZone {
            return CheckInDecision::PermittedAnyZone;
        }

        let validation = validate_zones_with_direction(fix.latitude, fix.longitude, zones);
        debug!(%validation, "zone validation");

        match (validation.zone_index, validation.direction) {
            (None, _) => CheckInDecision::NoZonesAssigned,
            _ if validation.distance <= self.boundary_tolerance => {
                CheckInDecision::Permitted { validation }
            }
            (Some(zone_index), Some(direction)) => CheckInDecision::OutsideZone {
                zone_index,
                distance: validation.distance,
                direction,
            },
            (Some(_), None) => CheckInDecision::NoZonesAssigned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn office() -> Zone {
        [[0.0, 0.0], [0.0, 0.001], [0.001, 0.001], [0.001, 0.0]]
            .into_iter()
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
    }

    fn fix(lat: f64, lng: f64, accuracy: f64) -> LocationFix {
        LocationFix::new(lat, lng, accuracy, now())
    }

    #[test]
    fn inside_zone_is_permitted() {
        let decision = CheckInPolicy::default().evaluate(
            &fix(0.0005, 0.0005, 10.0),
            ZoneAuthorization::AssignedZones,
            &[office()],
            now(),
        );
        assert!(decision.is_permitted());
        assert_eq!(
            decision,
            CheckInDecision::Permitted {
                validation: ZoneValidation::inside(0)
            }
        );
    }

    #[test]
    fn within_tolerance_is_permitted() {
        // ~2.2 m east of the east edge
        let decision = CheckInPolicy::default().evaluate(
            &fix(0.0005, 0.00102, 10.0),
            ZoneAuthorization::AssignedZones,
            &[office()],
            now(),
        );
        match decision {
            CheckInDecision::Permitted { validation } => {
                assert!(!validation.inside);
                assert!(validation.distance > 0.0 && validation.distance <= BOUNDARY_TOLERANCE_METERS);
            }
            other => panic!("expected permitted, got {other:?}"),
        }
    }

    #[test]
    fn beyond_tolerance_is_rejected_with_hint() {
        // ~11 m north of the north edge
        let decision = CheckInPolicy::default().evaluate(
            &fix(0.0011, 0.0005, 10.0),
            ZoneAuthorization::AssignedZones,
            &[office()],
            now(),
        );
        match decision {
            CheckInDecision::OutsideZone {
                zone_index,
                distance,
                direction,
            } => {
                assert_eq!(zone_index, 0);
                assert!(distance > 10.0 && distance < 12.0, "distance {distance}");
                assert_eq!(direction, Direction::South);
            }
            other => panic!("expected outside, got {other:?}"),
        }
        assert!(!decision.is_permitted());
    }

    #[test]
    fn accuracy_is_checked_before_authorization() {
        let decision = CheckInPolicy::default().evaluate(
            &fix(50.0, 50.0, 80.0),
            ZoneAuthorization::AnyZone,
            &[],
            now(),
        );
        assert_eq!(
            decision,
            CheckInDecision::InsufficientAccuracy {
                accuracy: 80.0,
                limit: DEFAULT_MAX_ACCURACY_METERS
            }
        );

        let strict = CheckInPolicy::strict().evaluate(
            &fix(0.0005, 0.0005, 40.0),
            ZoneAuthorization::AssignedZones,
            &[office()],
            now(),
        );
        assert!(matches!(strict, CheckInDecision::InsufficientAccuracy { .. }));
    }

    #[test]
    fn any_zone_skips_geometry() {
        let decision = CheckInPolicy::default().evaluate(
            &fix(50.0, 50.0, 5.0),
            ZoneAuthorization::AnyZone,
            &[office()],
            now(),
        );
        assert_eq!(decision, CheckInDecision::PermittedAnyZone);
    }

    #[test]
    fn missing_zones_are_their_own_condition() {
        let policy = CheckInPolicy::default();
        let empty = policy.evaluate(&fix(0.0, 0.0, 5.0), ZoneAuthorization::AssignedZones, &[], now());
        assert_eq!(empty, CheckInDecision::NoZonesAssigned);

        let line: Zone = [[0.0, 0.0], [1.0, 1.0]].into_iter().collect();
        let degenerate = policy.evaluate(&fix(0.0, 0.0, 5.0), ZoneAuthorization::AssignedZones, &[line], now());
        assert_eq!(degenerate, CheckInDecision::NoZonesAssigned);
    }

    #[test]
    fn stale_fix_is_rejected() {
        let policy = CheckInPolicy {
            max_fix_age: Some(Duration::seconds(30)),
            ..Default::default()
        };
        let old = LocationFix::new(0.0005, 0.0005, 5.0, now() - Duration::seconds(90));
        let decision = policy.evaluate(&old, ZoneAuthorization::AssignedZones, &[office()], now());
        assert_eq!(
            decision,
            CheckInDecision::StaleFix {
                age_seconds: 90,
                limit_seconds: 30
            }
        );

        let fresh = LocationFix::new(0.0005, 0.0005, 5.0, now() - Duration::seconds(10));
        assert!(policy
            .evaluate(&fresh, ZoneAuthorization::AssignedZones, &[office()], now())
            .is_permitted());
    }

    #[test]
    fn authorization_flag() {
        assert_eq!(ZoneAuthorization::from_flag(1), ZoneAuthorization::AnyZone);
        assert_eq!(ZoneAuthorization::from_flag(0), ZoneAuthorization::AssignedZones);
        assert_eq!(ZoneAuthorization::from_flag(2), ZoneAuthorization::AssignedZones);
    }

    #[test]
    fn decision_messages() {
        let outside = CheckInDecision::OutsideZone {
            zone_index: 1,
            distance: 12.346,
            direction: Direction::Northeast,
        };
        assert_eq!(
            outside.to_string(),
            "outside the allowed zones: 12.35 m to the northeast (zone 1)"
        );
        let json = serde_json::to_value(outside).unwrap();
        assert_eq!(json["decision"], "outsideZone");
        assert_eq!(json["zoneIndex"], 1);
        assert_eq!(json["direction"], "northeast");
    }
}
