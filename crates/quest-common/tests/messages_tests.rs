use std::io::Write;

use quest_common::{messages, QuestError};

#[test]
fn loads_ordered_list() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"["hello", "world"]"#).unwrap();
    let list = messages::load(file.path()).unwrap();
    assert_eq!(&*list, &["hello".to_string(), "world".to_string()]);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = messages::load(dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(err, QuestError::MessageFile { .. }));
}

#[test]
fn non_string_entries_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"["hello", 3]"#).unwrap();
    let err = messages::load(file.path()).unwrap_err();
    assert!(matches!(err, QuestError::MessageFormat { .. }));
}
