use almo_logging::parse_level;
use log::LevelFilter;

#[test]
fn parses_known_levels_case_insensitively() {
    assert_eq!(parse_level("DEBUG"), Some(LevelFilter::Debug));
    assert_eq!(parse_level(" warning "), Some(LevelFilter::Warn));
    assert_eq!(parse_level("off"), Some(LevelFilter::Off));
    assert_eq!(parse_level("Trace"), Some(LevelFilter::Trace));
    assert_eq!(parse_level("WARN\n"), Some(LevelFilter::Warn));
    assert_eq!(parse_level("error"), Some(LevelFilter::Error));
}

#[test]
fn unknown_level_is_none() {
    assert_eq!(parse_level("verbose"), None);
    assert_eq!(parse_level(""), None);
}
