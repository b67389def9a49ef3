//! Rendering of folder listings
//!
//! Shared by `ls` and `browse`: a table for humans, a serializable document
//! for `--json`.

use bv_core::{Entry, ListingSession};
use comfy_table::{Cell, Color, Table, presets};
use mime_guess::mime;
use serde::Serialize;

/// What an entry looks like to the user, guessed from its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    Image,
    Video,
    Audio,
    Archive,
    Text,
    Other,
}

impl EntryKind {
    pub fn of(entry: &Entry<'_>) -> Self {
        let object = match entry {
            Entry::Folder(_) => return EntryKind::Folder,
            Entry::Object(object) => object,
        };

        let Some(guess) = mime_guess::from_path(&object.key).first() else {
            return EntryKind::Other;
        };

        match (guess.type_(), guess.subtype().as_str()) {
            (mime::IMAGE, _) => EntryKind::Image,
            (mime::VIDEO, _) => EntryKind::Video,
            (mime::AUDIO, _) => EntryKind::Audio,
            (mime::TEXT, _) => EntryKind::Text,
            (mime::APPLICATION, "json" | "xml" | "javascript") => EntryKind::Text,
            (
                mime::APPLICATION,
                "zip" | "gzip" | "x-gzip" | "x-tar" | "x-7z-compressed" | "x-bzip2" | "x-xz"
                | "vnd.rar",
            ) => EntryKind::Archive,
            _ => EntryKind::Other,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            EntryKind::Folder => "📁",
            EntryKind::Image => "🖼️",
            EntryKind::Video => "🎥",
            EntryKind::Audio => "🎵",
            EntryKind::Archive => "📦",
            EntryKind::Text | EntryKind::Other => "📄",
        }
    }
}

/// One entry of a listing document
#[derive(Debug, Serialize)]
pub struct EntryOutput<'a> {
    name: &'a str,
    key: &'a str,
    kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<jiff::Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_class: Option<&'a str>,
    archived: bool,
}

impl<'a> From<Entry<'a>> for EntryOutput<'a> {
    fn from(entry: Entry<'a>) -> Self {
        let kind = EntryKind::of(&entry);
        match entry {
            Entry::Folder(prefix) => Self {
                name: entry.display_name(),
                key: prefix,
                kind,
                size_bytes: None,
                size_human: None,
                last_modified: None,
                storage_class: None,
                archived: false,
            },
            Entry::Object(object) => Self {
                name: entry.display_name(),
                key: &object.key,
                kind,
                size_bytes: Some(object.size),
                size_human: Some(object.size_human()),
                last_modified: object.last_modified,
                storage_class: Some(object.storage_tier.as_str()),
                archived: object.storage_tier.is_archived(),
            },
        }
    }
}

/// JSON document describing the filtered view of a session
#[derive(Debug, Serialize)]
pub struct ListingOutput<'a> {
    bucket: &'a str,
    prefix: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    filter: &'a str,
    entries: Vec<EntryOutput<'a>>,
    total_folders: usize,
    total_files: usize,
    has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation_token: Option<&'a str>,
}

impl<'a> ListingOutput<'a> {
    pub fn new(bucket: &'a str, session: &'a ListingSession) -> Self {
        Self {
            bucket,
            prefix: session.prefix(),
            filter: session.filter(),
            entries: session
                .filtered_view()
                .into_iter()
                .map(EntryOutput::from)
                .collect(),
            total_folders: session.folders().len(),
            total_files: session.files().len(),
            has_more: session.has_more(),
            continuation_token: session.continuation_token(),
        }
    }
}

/// Table of entries for human output
pub fn listing_table(entries: &[Entry<'_>], colors: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    if !colors {
        table.force_no_tty();
    }
    table.set_header(vec!["", "NAME", "SIZE", "MODIFIED", "CLASS"]);

    for entry in entries {
        let kind = EntryKind::of(entry);
        match entry {
            Entry::Folder(_) => {
                let name = format!("{}/", entry.display_name());
                table.add_row(vec![
                    Cell::new(kind.icon()),
                    Cell::new(name).fg(Color::Blue),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(""),
                ]);
            }
            Entry::Object(object) => {
                let modified = object
                    .last_modified
                    .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                let class = Cell::new(object.storage_tier.as_str());
                let class = if object.storage_tier.is_archived() {
                    class.fg(Color::Yellow)
                } else {
                    class
                };
                table.add_row(vec![
                    Cell::new(kind.icon()),
                    Cell::new(entry.display_name()),
                    Cell::new(object.size_human()),
                    Cell::new(modified),
                    class,
                ]);
            }
        }
    }

    table
}

/// One-line summary printed under a listing
pub fn summary_line(session: &ListingSession) -> String {
    let mut line = format!(
        "{} folders, {} files",
        session.folders().len(),
        session.files().len()
    );
    if !session.filter().is_empty() {
        line.push_str(&format!(
            ", {} matching '{}'",
            session.filtered_view().len(),
            session.filter()
        ));
    }
    if session.has_more() {
        line.push_str(" (more available)");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use bv_core::{ListPage, ObjectRef, StorageTier};

    fn object(key: &str) -> ObjectRef {
        ObjectRef::new(key, 1536)
    }

    fn session_with(folders: &[&str], objects: Vec<ObjectRef>, truncated: bool) -> ListingSession {
        let mut session = ListingSession::new();
        let ticket = session.open("photos/");
        session
            .complete(
                &ticket,
                Ok(ListPage {
                    folder_prefixes: folders.iter().map(|f| f.to_string()).collect(),
                    object_items: objects,
                    next_continuation_token: truncated.then(|| "tok".to_string()),
                    is_truncated: truncated,
                }),
            )
            .unwrap();
        session
    }

    #[test]
    fn test_entry_kind() {
        let jpg = object("photos/a.JPG");
        let mp4 = object("clips/b.mp4");
        let zip = object("backup.zip");
        let csv = object("data/report.csv");
        let bin = object("blob");

        assert_eq!(EntryKind::of(&Entry::Folder("photos/")), EntryKind::Folder);
        assert_eq!(EntryKind::of(&Entry::Object(&jpg)), EntryKind::Image);
        assert_eq!(EntryKind::of(&Entry::Object(&mp4)), EntryKind::Video);
        assert_eq!(EntryKind::of(&Entry::Object(&zip)), EntryKind::Archive);
        assert_eq!(EntryKind::of(&Entry::Object(&csv)), EntryKind::Text);
        assert_eq!(EntryKind::of(&Entry::Object(&bin)), EntryKind::Other);
    }

    #[test]
    fn test_entry_output_json() {
        let mut archived = object("photos/old.jpg");
        archived.storage_tier = StorageTier::Glacier;
        let output = EntryOutput::from(Entry::Object(&archived));

        insta::assert_json_snapshot!(output, @r#"
        {
          "name": "old.jpg",
          "key": "photos/old.jpg",
          "kind": "image",
          "size_bytes": 1536,
          "size_human": "1.50 KiB",
          "storage_class": "GLACIER",
          "archived": true
        }
        "#);
    }

    #[test]
    fn test_listing_output() {
        let mut session = session_with(
            &["photos/2023/"],
            vec![object("photos/a.jpg"), object("photos/b.txt")],
            true,
        );
        session.set_filter("A");

        let value = serde_json::to_value(ListingOutput::new("media", &session)).unwrap();
        assert_eq!(value["bucket"], "media");
        assert_eq!(value["prefix"], "photos/");
        assert_eq!(value["filter"], "A");
        assert_eq!(value["total_files"], 2);
        assert_eq!(value["has_more"], true);
        assert_eq!(value["continuation_token"], "tok");

        let entries = value["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["key"], "photos/a.jpg");
    }

    #[test]
    fn test_listing_output_omits_empty_filter() {
        let session = session_with(&["photos/2023/"], vec![], false);
        let value = serde_json::to_value(ListingOutput::new("media", &session)).unwrap();
        assert!(value.get("filter").is_none());
        assert!(value.get("continuation_token").is_none());
        assert_eq!(value["entries"][0]["kind"], "folder");
        assert_eq!(value["entries"][0]["name"], "2023");
        assert!(value["entries"][0].get("size_bytes").is_none());
    }

    #[test]
    fn test_listing_table_rows() {
        let session = session_with(&["photos/2023/"], vec![object("photos/a.jpg")], false);
        let view = session.filtered_view();
        let rendered = listing_table(&view, false).to_string();
        assert!(rendered.contains("2023/"));
        assert!(rendered.contains("a.jpg"));
        assert!(rendered.contains("1.50 KiB"));
        assert!(rendered.contains("STANDARD"));
    }

    #[test]
    fn test_summary_line() {
        let mut session = session_with(
            &["photos/2023/"],
            vec![object("photos/a.jpg"), object("photos/b.jpg")],
            true,
        );
        insta::assert_snapshot!(summary_line(&session), @"1 folders, 2 files (more available)");

        session.set_filter("b.");
        insta::assert_snapshot!(
            summary_line(&session),
            @"1 folders, 2 files, 1 matching 'b.' (more available)"
        );
    }
}
