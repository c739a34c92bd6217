use super::*;
use crate::domain::{NoteId, NOTE_COLORS};
use chrono::{TimeZone, Utc};

fn note(id: i64, title: &str, millis: i64, color: u32) -> Note {
    Note::new(
        title,
        "body",
        Utc.timestamp_millis_opt(millis).single().expect("timestamp"),
        color,
    )
    .with_id(NoteId(id))
}

fn ids(notes: &[Note]) -> Vec<i64> {
    notes.iter().map(|n| n.id.expect("id").0).collect()
}

#[test]
fn default_sort_is_newest_first() {
    assert_eq!(
        SortSpec::default(),
        SortSpec::ByDate(SortDirection::Descending)
    );
}

#[test]
fn spec_equality_requires_same_criterion_and_direction() {
    let date_desc = SortSpec::ByDate(SortDirection::Descending);
    assert_eq!(date_desc, SortSpec::ByDate(SortDirection::Descending));
    assert_ne!(date_desc, SortSpec::ByDate(SortDirection::Ascending));
    assert_ne!(date_desc, SortSpec::ByTitle(SortDirection::Descending));
}

#[test]
fn sorts_by_date_in_both_directions() {
    let notes = vec![note(1, "a", 200, 0), note(2, "b", 100, 0), note(3, "c", 300, 0)];

    let newest_first = sort_notes(SortSpec::ByDate(SortDirection::Descending), notes.clone());
    assert_eq!(ids(&newest_first), vec![3, 1, 2]);

    let oldest_first = sort_notes(SortSpec::ByDate(SortDirection::Ascending), notes);
    assert_eq!(ids(&oldest_first), vec![2, 1, 3]);
}

#[test]
fn title_sort_ignores_case() {
    let notes = vec![note(1, "banana", 0, 0), note(2, "Apple", 0, 0), note(3, "cherry", 0, 0)];
    let sorted = sort_notes(SortSpec::ByTitle(SortDirection::Ascending), notes);
    assert_eq!(ids(&sorted), vec![2, 1, 3]);
}

#[test]
fn sorts_by_packed_color() {
    let notes = vec![
        note(1, "a", 0, NOTE_COLORS[3]),
        note(2, "b", 0, NOTE_COLORS[0]),
        note(3, "c", 0, NOTE_COLORS[1]),
    ];
    let sorted = sort_notes(SortSpec::ByColor(SortDirection::Descending), notes);
    assert_eq!(ids(&sorted), vec![2, 3, 1]);
}

#[test]
fn equal_keys_fall_back_to_ascending_id_in_either_direction() {
    let notes = vec![note(9, "x", 500, 0), note(4, "y", 500, 0), note(7, "z", 100, 0)];

    for spec in [
        SortSpec::ByDate(SortDirection::Descending),
        SortSpec::ByDate(SortDirection::Ascending),
    ] {
        let first = sort_notes(spec, notes.clone());
        let mut reversed_input = notes.clone();
        reversed_input.reverse();
        let second = sort_notes(spec, reversed_input);
        assert_eq!(ids(&first), ids(&second), "unstable ordering for {spec}");

        let tied: Vec<i64> = ids(&first).into_iter().filter(|id| *id != 7).collect();
        assert_eq!(tied, vec![4, 9]);
    }
}

#[test]
fn parses_and_displays_sort_specs() {
    assert_eq!(
        "title-asc".parse::<SortSpec>(),
        Ok(SortSpec::ByTitle(SortDirection::Ascending))
    );
    assert_eq!(
        "Color:descending".parse::<SortSpec>(),
        Ok(SortSpec::ByColor(SortDirection::Descending))
    );
    assert_eq!(
        "date".parse::<SortSpec>(),
        Ok(SortSpec::ByDate(SortDirection::Descending))
    );
    assert!("size-asc".parse::<SortSpec>().is_err());
    assert!("date-sideways".parse::<SortSpec>().is_err());

    for spec in [
        SortSpec::ByTitle(SortDirection::Descending),
        SortSpec::ByColor(SortDirection::Ascending),
    ] {
        assert_eq!(spec.to_string().parse::<SortSpec>(), Ok(spec));
    }
}

#[test]
fn with_direction_keeps_criterion() {
    let spec = SortSpec::ByColor(SortDirection::Ascending).with_direction(SortDirection::Descending);
    assert_eq!(spec, SortSpec::ByColor(SortDirection::Descending));
}

#[test]
fn sort_spec_serializes_with_tag_and_direction() {
    let json = serde_json::to_string(&SortSpec::ByTitle(SortDirection::Ascending)).expect("json");
    assert_eq!(json, r#"{"by":"by_title","direction":"ascending"}"#);
}
