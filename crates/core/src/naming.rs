//! Timestamp formats and artifact file names.
//!
//! Artifacts are keyed by calendar date (`YYYY-MM-DD`) or by cycle
//! timestamp (`YYYY-MM-DDTHH:MM:SS`). Attachment names also carry the
//! notification kind and a per-run sequence number, so two notifications
//! raised within the same second never share a file.

use chrono::NaiveDateTime;

use crate::extremum::ExtremumKind;
use crate::notification::NotificationKind;

/// `YYYY-MM-DDTHH:MM:SS`, second precision.
pub fn iso_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// `YYYY-MM-DD`.
pub fn date_stamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Chart image attached to notifications: `{timestamp}_{kind}_{seq}_sound.png`.
pub fn chart_file_name(at: NaiveDateTime, kind: NotificationKind, seq: u64) -> String {
    format!("{}_sound.png", attachment_stem(at, kind, seq))
}

/// Series export attached to notifications: `{timestamp}_{kind}_{seq}_sound.csv`.
pub fn series_file_name(at: NaiveDateTime, kind: NotificationKind, seq: u64) -> String {
    format!("{}_sound.csv", attachment_stem(at, kind, seq))
}

fn attachment_stem(at: NaiveDateTime, kind: NotificationKind, seq: u64) -> String {
    format!("{}_{}_{seq}", iso_timestamp(at), kind.as_str())
}

/// Raw capture kept for the day's extremum: `{date}_{min|max}.raw`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use soundwatch_core::extremum::ExtremumKind;
/// use soundwatch_core::naming::extremum_file_name;
///
/// let at = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// assert_eq!(extremum_file_name(at, ExtremumKind::Min), "2026-07-01_min.raw");
/// ```
pub fn extremum_file_name(at: NaiveDateTime, kind: ExtremumKind) -> String {
    format!("{}_{}.raw", date_stamp(at), kind.as_str())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 58, 750)
            .unwrap()
    }

    #[test]
    fn timestamps_drop_sub_seconds() {
        assert_eq!(iso_timestamp(at()), "2026-12-31T23:59:58");
        assert_eq!(date_stamp(at()), "2026-12-31");
    }

    #[test]
    fn artifact_names() {
        assert_eq!(
            chart_file_name(at(), NotificationKind::Heartbeat, 3),
            "2026-12-31T23:59:58_heartbeat_3_sound.png"
        );
        assert_eq!(
            series_file_name(at(), NotificationKind::PowerWarning, 0),
            "2026-12-31T23:59:58_power_warning_0_sound.csv"
        );
        assert_eq!(extremum_file_name(at(), ExtremumKind::Max), "2026-12-31_max.raw");
    }

    #[test]
    fn same_second_attachments_do_not_collide() {
        let heartbeat = chart_file_name(at(), NotificationKind::Heartbeat, 7);
        let alarm = chart_file_name(at(), NotificationKind::Alarm, 8);
        let next_alarm = chart_file_name(at(), NotificationKind::Alarm, 9);
        assert_ne!(heartbeat, alarm);
        assert_ne!(alarm, next_alarm);
    }
}
