//! Property-based tests for teelog using proptest

use proptest::prelude::*;
use teelog::core::level_filter::LevelFilter;
use teelog::core::log_entry::LogEntry;
use teelog::core::{Encoder, EncoderConfig};
use teelog::prelude::*;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.as_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    #[test]
    fn test_log_level_integer_roundtrip(level in any_level()) {
        prop_assert_eq!(LogLevel::try_from(level.as_i8()), Ok(level));
    }

    /// Ordering follows the integer scale
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, a.as_i8() <= b.as_i8());
        prop_assert_eq!(a < b, a.as_i8() < b.as_i8());
    }

    #[test]
    fn test_log_level_case_insensitive(level in any_level(), upper in any::<bool>()) {
        let name = if upper {
            level.as_str().to_uppercase()
        } else {
            level.as_str().to_string()
        };
        prop_assert_eq!(name.parse::<LogLevel>().unwrap(), level);
    }
}

// ============================================================================
// Level Filter Tests
// ============================================================================

proptest! {
    /// With level separation every admitted level lands in exactly one half
    #[test]
    fn test_split_filters_never_overlap(min in any_level(), level in any_level()) {
        let info = LevelFilter::info_range(min);
        let warn = LevelFilter::warn_and_above(min);

        prop_assert!(!(info.enabled(level) && warn.enabled(level)));
        prop_assert_eq!(
            info.enabled(level) || warn.enabled(level),
            LevelFilter::at_least(min).enabled(level)
        );
    }

    #[test]
    fn test_warn_boundary_goes_to_warn_half(min in any_level()) {
        let admitted = LevelFilter::at_least(min).enabled(LogLevel::Warn);
        prop_assert!(!LevelFilter::info_range(min).enabled(LogLevel::Warn));
        prop_assert_eq!(LevelFilter::warn_and_above(min).enabled(LogLevel::Warn), admitted);
    }

    #[test]
    fn test_below_min_never_admitted(min in any_level(), level in any_level()) {
        prop_assume!(level < min);
        prop_assert!(!LevelFilter::at_least(min).enabled(level));
        prop_assert!(!LevelFilter::info_range(min).enabled(level));
        prop_assert!(!LevelFilter::warn_and_above(min).enabled(level));
    }
}

// ============================================================================
// Encoder Tests
// ============================================================================

proptest! {
    /// Console records are one line whatever the message holds
    #[test]
    fn test_console_record_is_single_line(message in ".*", level in any_level()) {
        let encoder = Encoder::new(Encoding::Console, EncoderConfig::default());
        let record = encoder.encode(&LogEntry::new(level, message), false);

        prop_assert!(record.ends_with('\n'));
        prop_assert_eq!(record.matches('\n').count(), 1);
        prop_assert!(!record.contains('\r'));
    }

    /// JSON records keep the message and field values verbatim
    #[test]
    fn test_json_record_round_trip(
        message in ".*",
        key in "[a-z]{1,12}",
        value in ".*",
        level in any_level(),
    ) {
        let entry = LogEntry::new(level, message.clone()).with_fields(vec![with(key.clone(), value.clone())]);
        let record = Encoder::new(Encoding::Json, EncoderConfig::default()).encode(&entry, false);

        let parsed: serde_json::Value = serde_json::from_str(record.trim_end()).unwrap();
        prop_assert_eq!(parsed["msg"].as_str().unwrap(), message.as_str());
        prop_assert_eq!(parsed["level"].as_str().unwrap(), level.as_str());
        // Fields named like an entry element are moved aside, never dropped
        let reserved = ["time", "level", "logger", "file", "msg", "stacktrace"];
        let written_key = if reserved.contains(&key.as_str()) {
            format!("fields.{}", key)
        } else {
            key.clone()
        };
        prop_assert_eq!(parsed[written_key.as_str()].as_str().unwrap(), value.as_str());
    }
}
