use assert_matches::assert_matches;
use camino::Utf8Path;
use chrono::NaiveDate;

use snipify::domain::RawIdentity;
use snipify::error::SnipError;

#[test]
fn parse_raw_identity_fields() {
    let id: RawIdentity = "DEV-HOSTAAA01-20240101-120000-A1.iqs".parse().unwrap();
    assert_eq!(id.prefix(), "DEV");
    assert_eq!(id.hostname(), "HOSTAAA01");
    assert_eq!(id.date(), "20240101");
    assert_eq!(id.time(), "120000");
    assert_eq!(id.mnemonic_id(), "A1");
    assert_eq!(id.raw_datetime(), "20240101-120000");
}

#[test]
fn reconstructed_name_round_trips() {
    for name in [
        "DEV-HOSTAAA01-20240101-120000-A1",
        "-HOSTAAA01-20240101-120000-A1",
        "lab_7-x1y2z3w4v-19991231-235959-blank_03",
    ] {
        let id: RawIdentity = name.parse().unwrap();
        assert_eq!(id.to_string(), name);
        let again: RawIdentity = id.to_string().parse().unwrap();
        assert_eq!(again, id);
    }
}

#[test]
fn parse_from_path_uses_file_name() {
    let id = RawIdentity::from_path(Utf8Path::new(
        "/data/raw/DEV-HOSTAAA01-20240101-120000-B2.csv",
    ))
    .unwrap();
    assert_eq!(id.mnemonic_id(), "B2");
}

#[test]
fn short_hostname_is_rejected() {
    let err = "DEV-HOST01-20240101-120000-A1.iqs"
        .parse::<RawIdentity>()
        .unwrap_err();
    assert_matches!(err, SnipError::PatternMismatch(name) if name.contains("HOST01"));
}

#[test]
fn non_digit_date_is_rejected() {
    let err = "DEV-HOSTAAA01-2024010A-120000-A1.iqs"
        .parse::<RawIdentity>()
        .unwrap_err();
    assert_matches!(err, SnipError::PatternMismatch(_));
}

#[test]
fn match_is_anchored_at_start() {
    let err = "x.DEV-HOSTAAA01-20240101-120000-A1.iqs"
        .parse::<RawIdentity>()
        .unwrap_err();
    assert_matches!(err, SnipError::PatternMismatch(_));
}

#[test]
fn missing_mnemonic_id_is_rejected() {
    let err = "DEV-HOSTAAA01-20240101-120000-.iqs"
        .parse::<RawIdentity>()
        .unwrap_err();
    assert_matches!(err, SnipError::PatternMismatch(_));
}

#[test]
fn recorded_at_only_for_real_timestamps() {
    let id: RawIdentity = "DEV-HOSTAAA01-20240101-120000-A1".parse().unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    assert_eq!(id.recorded_at(), Some(expected));

    let odd: RawIdentity = "DEV-HOSTAAA01-20241399-120000-A1".parse().unwrap();
    assert_eq!(odd.recorded_at(), None);
}
