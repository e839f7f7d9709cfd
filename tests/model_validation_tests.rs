use chrono::NaiveDate;
use serde_json::json;
use users_service::{
    bind::Validate,
    date::SimpleDate,
    error::BindError,
    models::{AgeStats, IdUserEnvelope, NewUser, User, UserId, UserWithAge},
};

// --- Test Data Helpers ---

fn june_sixth() -> SimpleDate {
    SimpleDate::new(NaiveDate::from_ymd_opt(1996, 6, 6).unwrap())
}

fn testy() -> NewUser {
    NewUser {
        first_name: "Testy".to_string(),
        last_name: "McTesterson".to_string(),
        email: "t@x.com".to_string(),
        birthday: june_sixth(),
    }
}

// --- SimpleDate ---

#[test]
fn test_simple_date_json_round_trip() {
    let encoded = serde_json::to_string(&june_sixth()).unwrap();
    assert_eq!(encoded, "\"1996-06-06\"");

    let decoded: SimpleDate = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, june_sixth());
}

#[test]
fn test_simple_date_empty_and_null_decode_to_zero() {
    let empty: SimpleDate = serde_json::from_str("\"\"").unwrap();
    let null_literal: SimpleDate = serde_json::from_str("null").unwrap();
    let null_string: SimpleDate = serde_json::from_str("\"null\"").unwrap();

    assert!(empty.is_zero());
    assert!(null_literal.is_zero());
    assert!(null_string.is_zero());
}

#[test]
fn test_simple_date_zero_encodes_as_year_one() {
    assert_eq!(SimpleDate::zero().to_string(), "0001-01-01");
    assert_eq!(SimpleDate::default(), SimpleDate::zero());

    // Zero survives a round trip instead of collapsing to empty.
    let decoded: SimpleDate = "0001-01-01".parse().unwrap();
    assert!(decoded.is_zero());
}

#[test]
fn test_simple_date_malformed_input_names_the_input() {
    let err = "06/06/1996".parse::<SimpleDate>().unwrap_err();
    assert_eq!(err.input, "06/06/1996");
    assert!(err.to_string().contains("06/06/1996"));

    let json_err = serde_json::from_str::<SimpleDate>("\"1996-13-40\"").unwrap_err();
    assert!(json_err.to_string().contains("1996-13-40"), "got: {json_err}");
}

#[test]
fn test_simple_date_rejects_timestamps() {
    assert!("1996-06-06T00:00:00Z".parse::<SimpleDate>().is_err());
}

#[test]
fn test_simple_date_store_value_is_midnight_utc() {
    let stamp = june_sixth().to_date_time();
    assert_eq!(stamp.to_rfc3339(), "1996-06-06T00:00:00+00:00");
    assert_eq!(SimpleDate::from(stamp), june_sixth());
}

// --- JSON Shapes ---

#[test]
fn test_user_json_shape() {
    let user = User::from_new(7, testy());
    let value = serde_json::to_value(&user).unwrap();

    assert_eq!(
        value,
        json!({
            "id": 7,
            "first_name": "Testy",
            "last_name": "McTesterson",
            "email": "t@x.com",
            "birthday": "1996-06-06"
        })
    );
}

#[test]
fn test_user_with_age_is_flat() {
    let with_age = UserWithAge {
        user: User::from_new(3, testy()),
        age_in_years: 29,
    };
    let value = serde_json::to_value(&with_age).unwrap();

    assert_eq!(value["id"], 3);
    assert_eq!(value["birthday"], "1996-06-06");
    assert_eq!(value["age_in_years"], 29);
    assert!(value.get("user").is_none(), "user fields must not be nested");
}

#[test]
fn test_id_user_envelope_shape() {
    let body = IdUserEnvelope {
        user: UserId { id: 1 },
    };
    assert_eq!(
        serde_json::to_string(&body).unwrap(),
        r#"{"user":{"id":1}}"#
    );
}

#[test]
fn test_age_stats_total_and_keys() {
    let stats = AgeStats {
        preteen: 1,
        thirties: 2,
        centurion: 1,
        ..AgeStats::default()
    };
    assert_eq!(stats.total(), 4);

    let value = serde_json::to_value(stats).unwrap();
    let keys: Vec<&str> = value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    for key in [
        "preteen",
        "teens",
        "twenties",
        "thirties",
        "forties",
        "fifties",
        "sixties",
        "seventies",
        "eighties",
        "nineties",
        "centurion",
    ] {
        assert!(keys.contains(&key), "missing bucket {key}");
    }
    assert_eq!(keys.len(), 11);
}

// --- Validation ---

#[test]
fn test_new_user_validation_accepts_complete_payload() {
    assert!(testy().validate().is_ok());
}

#[test]
fn test_new_user_validation_names_missing_field() {
    let mut payload = testy();
    payload.email = String::new();
    match payload.validate() {
        Err(BindError::Missing(field)) => assert_eq!(field, "email"),
        other => panic!("expected missing email, got {other:?}"),
    }

    let mut payload = testy();
    payload.birthday = SimpleDate::zero();
    match payload.validate() {
        Err(BindError::Missing(field)) => assert_eq!(field, "birthday"),
        other => panic!("expected missing birthday, got {other:?}"),
    }
}

#[test]
fn test_new_user_validation_checks_presence_only() {
    // Blank and malformed values are still present.
    let payload = NewUser {
        first_name: " ".to_string(),
        email: "not-an-email".to_string(),
        ..testy()
    };
    assert!(payload.validate().is_ok());
}

#[test]
fn test_user_and_id_validation_require_id() {
    assert!(matches!(
        UserId { id: 0 }.validate(),
        Err(BindError::Missing("id"))
    ));
    assert!(UserId { id: 5 }.validate().is_ok());

    let user = User::from_new(0, testy());
    assert!(matches!(user.validate(), Err(BindError::Missing("id"))));
    assert!(User::from_new(5, testy()).validate().is_ok());
}
