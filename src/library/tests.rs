use super::*;
use crate::config::TrackDisplayField;
use std::path::Path;

fn track(id: u64, title: &str, artist: Option<&str>, data: &str) -> Track {
    Track {
        id,
        title: title.to_string(),
        artist: artist.map(str::to_string),
        data: data.to_string(),
        image: None,
    }
}

#[test]
fn display_from_fields_can_format_artist_title() {
    let t = track(1, "Song", Some("Artist"), "/tmp/Song.mp3");
    assert_eq!(
        display_from_fields(&t, &[TrackDisplayField::Artist, TrackDisplayField::Title], " - "),
        "Artist - Song"
    );

    let padded = track(1, "Song", Some("  Artist  "), "/tmp/Song.mp3");
    assert_eq!(
        display_from_fields(
            &padded,
            &[TrackDisplayField::Artist, TrackDisplayField::Title],
            " - "
        ),
        "Artist - Song"
    );

    let no_artist = track(1, "Song", None, "/tmp/Song.mp3");
    assert_eq!(
        display_from_fields(
            &no_artist,
            &[TrackDisplayField::Artist, TrackDisplayField::Title],
            " - "
        ),
        "Song"
    );
}

#[test]
fn display_from_fields_uses_filename_of_uri_locators() {
    let t = track(1, "Title", None, "file:///music/some-file.flac");
    assert_eq!(
        display_from_fields(&t, &[TrackDisplayField::Filename], " - "),
        "some-file"
    );
}

#[test]
fn same_track_by_id_or_by_title_and_locator() {
    let a = track(1, "Song", None, "/m/a.mp3");

    assert!(a.is_same_track(&track(1, "Renamed", Some("X"), "/m/moved.mp3")));
    assert!(a.is_same_track(&track(2, "Song", None, "/m/a.mp3")));
    assert!(!a.is_same_track(&track(2, "Song", None, "/m/b.mp3")));
    assert!(!a.is_same_track(&track(2, "Other", None, "/m/a.mp3")));
}

#[test]
fn locator_to_path_accepts_file_uris_and_plain_paths() {
    assert_eq!(locator_to_path("file:///m/a.mp3"), Path::new("/m/a.mp3"));
    assert_eq!(locator_to_path("/m/a.mp3"), Path::new("/m/a.mp3"));
    assert_eq!(locator_to_path("relative/a.mp3"), Path::new("relative/a.mp3"));
}

#[test]
fn file_uris_are_percent_decoded() {
    assert_eq!(
        locator_to_path("file:///music/My%20Song.mp3"),
        Path::new("/music/My Song.mp3")
    );
    assert_eq!(
        locator_to_path("file://localhost/music/a.mp3"),
        Path::new("/music/a.mp3")
    );
    assert_eq!(
        locator_to_path("/music/My Song.mp3"),
        Path::new("/music/My Song.mp3")
    );
}

#[test]
fn artist_falls_back_to_unknown() {
    assert_eq!(track(1, "S", None, "/a").artist_or_unknown(), "Unknown Artist");
    assert_eq!(track(1, "S", Some("  "), "/a").artist_or_unknown(), "Unknown Artist");
    assert_eq!(track(1, "S", Some("Band"), "/a").artist_or_unknown(), "Band");
}

#[test]
fn track_ids_differ_per_path_and_are_deterministic() {
    let a = track_id_for(Path::new("/music/a.mp3"));
    let b = track_id_for(Path::new("/music/b.mp3"));
    assert_ne!(a, b);
    assert_eq!(a, track_id_for(Path::new("/music/a.mp3")));
}
