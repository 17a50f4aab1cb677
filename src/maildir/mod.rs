//! Maildir access: path resolution, folder enumeration, message listing and
//! the flag-letter rewrites backing read/star/delete.
//!
//! One file per message; flags are encoded in the filename after the `:2,`
//! delimiter (`S` seen, `F` flagged, etc.). Folders other than INBOX live in
//! dot-prefixed subdirectories of the maildir root.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::mailbox::MailboxRecord;
use crate::models::message::{fallback_folders, FolderSummary, MessageSummary};

const FLAG_DELIMITER: &str = ":2,";
const SNIPPET_LEN: usize = 100;

/// Join storage base, storage node and the per-user maildir column into the
/// on-disk maildir root, falling back to configured defaults where the
/// record leaves base or node empty.
pub fn resolve_maildir(config: &Config, record: &MailboxRecord) -> PathBuf {
    let base = record
        .storagebasedirectory
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(&config.storage_base);
    let node = record
        .storagenode
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(&config.storage_node);
    Path::new(base).join(node).join(&record.maildir)
}

/// `INBOX` maps to the maildir root, anything else to a dot-prefixed
/// subdirectory. Rejects names that would escape the maildir.
fn folder_dir(root: &Path, folder: &str) -> Option<PathBuf> {
    if folder.contains('/') || folder.contains('\\') || folder == ".." || folder.is_empty() {
        return None;
    }
    if folder.eq_ignore_ascii_case("INBOX") {
        Some(root.to_path_buf())
    } else if folder.starts_with('.') {
        Some(root.join(folder))
    } else {
        Some(root.join(format!(".{folder}")))
    }
}

fn flag_letters(filename: &str) -> &str {
    filename
        .rfind(FLAG_DELIMITER)
        .map(|i| &filename[i + FLAG_DELIMITER.len()..])
        .unwrap_or("")
}

/// Files in the folder's `cur/` carrying a flags delimiter, sorted strictly
/// descending by modification time (filename as tiebreak so paging is
/// deterministic). A missing directory yields an empty listing.
fn sorted_entries(dir: &Path) -> Vec<(PathBuf, SystemTime)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<(PathBuf, SystemTime)> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| e.file_name().to_string_lossy().contains(FLAG_DELIMITER))
        .filter_map(|e| {
            let mtime = e.metadata().ok()?.modified().ok()?;
            Some((e.path(), mtime))
        })
        .collect();
    files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
    files
}

/// List one folder page. Returns the parsed page plus the total number of
/// messages in the folder; a nonexistent folder is an empty result, not an
/// error.
pub fn list_messages(
    root: &Path,
    folder: &str,
    limit: usize,
    offset: usize,
) -> (Vec<MessageSummary>, usize) {
    let Some(dir) = folder_dir(root, folder) else {
        return (Vec::new(), 0);
    };
    let files = sorted_entries(&dir.join("cur"));
    let total = files.len();

    let page = files
        .iter()
        .enumerate()
        .skip(offset)
        .take(limit)
        .filter_map(|(idx, (path, _))| {
            let content = fs::read_to_string(path).ok()?;
            let filename = path.file_name()?.to_string_lossy();
            Some(parse_message(
                &content,
                &filename,
                (idx + 1) as u64,
                folder,
            ))
        })
        .collect();
    (page, total)
}

/// Resolve a 1-based listing position back to a file path. Ids are derived
/// from the current scan and are not stable across scans.
pub fn message_path(root: &Path, folder: &str, id: u64) -> Option<PathBuf> {
    if id == 0 {
        return None;
    }
    let dir = folder_dir(root, folder)?;
    sorted_entries(&dir.join("cur"))
        .into_iter()
        .nth((id - 1) as usize)
        .map(|(path, _)| path)
}

pub fn get_message(root: &Path, folder: &str, id: u64) -> Option<MessageSummary> {
    let path = message_path(root, folder, id)?;
    let content = fs::read_to_string(&path).ok()?;
    let filename = path.file_name()?.to_string_lossy().to_string();
    Some(parse_message(&content, &filename, id, folder))
}

/// Split a message file into its header block (lines up to the first blank
/// line) and body, and pick out the From/Subject/Date fields.
pub fn parse_message(content: &str, filename: &str, id: u64, folder: &str) -> MessageSummary {
    let mut sender = String::new();
    let mut email = String::new();
    let mut subject = String::new();
    let mut date: Option<DateTime<Utc>> = None;

    let mut body = String::new();
    let mut in_body = false;
    for line in content.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if in_body {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(line);
            continue;
        }
        if line.is_empty() {
            in_body = true;
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let value = value.trim();
            if key.eq_ignore_ascii_case("from") {
                let (n, a) = parse_from(value);
                sender = n;
                email = a;
            } else if key.eq_ignore_ascii_case("subject") {
                subject = value.to_string();
            } else if key.eq_ignore_ascii_case("date") {
                date = DateTime::parse_from_rfc2822(value)
                    .ok()
                    .map(|d| d.with_timezone(&Utc));
            }
        }
    }

    let flags = flag_letters(filename);
    MessageSummary {
        id,
        sender,
        email,
        subject,
        snippet: snippet(&body),
        body,
        // Missing or unparseable Date falls back to "now". This is a policy
        // default, not a real received date.
        date: date.unwrap_or_else(Utc::now),
        unread: !flags.contains('S'),
        starred: flags.contains('F'),
        folder: folder.to_string(),
    }
}

/// `Display Name <addr>` splits on the first angle bracket pair; a bare
/// value is used as both display name and address.
fn parse_from(value: &str) -> (String, String) {
    if let (Some(l), Some(r)) = (value.find('<'), value.find('>')) {
        if l < r {
            let addr = value[l + 1..r].trim().to_string();
            let name = value[..l].trim().trim_matches('"').to_string();
            let name = if name.is_empty() { addr.clone() } else { name };
            return (name, addr);
        }
    }
    (value.to_string(), value.to_string())
}

/// First 100 characters of the body with whitespace runs collapsed.
fn snippet(body: &str) -> String {
    let collapsed: Vec<&str> = body.split_whitespace().collect();
    collapsed.join(" ").chars().take(SNIPPET_LEN).collect()
}

/// Counts only files the listing would show (those carrying the flags
/// delimiter), so folder counts never exceed the listed messages.
fn unread_count(cur: &Path) -> usize {
    let Ok(entries) = fs::read_dir(cur) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            name.contains(FLAG_DELIMITER) && !flag_letters(&name).contains('S')
        })
        .count()
}

/// INBOX plus every dot-prefixed directory under the maildir root, each with
/// its unread count. Any error reading the root is absorbed into the fixed
/// fallback set with zero counts.
pub fn list_folders(root: &Path) -> Vec<FolderSummary> {
    let entries = match fs::read_dir(root) {
        Ok(e) => e,
        Err(_) => return fallback_folders(),
    };

    let mut folders = vec![FolderSummary::new(
        "INBOX",
        "Inbox",
        unread_count(&root.join("cur")),
    )];

    let mut extra: Vec<FolderSummary> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let raw = e.file_name().to_string_lossy().to_string();
            let name = raw.strip_prefix('.')?.to_string();
            if name.is_empty() {
                return None;
            }
            let display = if name == "Junk" { "Spam" } else { &name };
            let count = unread_count(&e.path().join("cur"));
            Some(FolderSummary::new(&name, display, count))
        })
        .collect();
    extra.sort_by(|a, b| a.name.cmp(&b.name));
    folders.extend(extra);
    folders
}

/// Rewrite the `:2,` flag suffix and rename the file in place.
fn rename_with_flags(path: &Path, add: &[char], remove: &[char]) -> Result<(), ApiError> {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .ok_or_else(|| ApiError::not_found("Email not found"))?;

    let (base, existing) = match filename.rfind(FLAG_DELIMITER) {
        Some(i) => (&filename[..i], &filename[i + FLAG_DELIMITER.len()..]),
        None => (filename.as_str(), ""),
    };

    let mut letters: Vec<char> = existing.chars().collect();
    for c in add {
        if !letters.contains(c) {
            letters.push(*c);
        }
    }
    letters.retain(|c| !remove.contains(c));
    // maildir wants the flag letters in ASCII order
    letters.sort_unstable();

    let new_name = format!("{base}{FLAG_DELIMITER}{}", letters.iter().collect::<String>());
    if new_name == filename {
        return Ok(());
    }
    let new_path = path.with_file_name(new_name);
    fs::rename(path, new_path).map_err(|e| ApiError::Dependency(e.into()))
}

pub fn mark_read(root: &Path, folder: &str, id: u64) -> Result<(), ApiError> {
    let path = message_path(root, folder, id)
        .ok_or_else(|| ApiError::not_found("Email not found"))?;
    rename_with_flags(&path, &['S'], &[])
}

pub fn set_starred(root: &Path, folder: &str, id: u64, starred: bool) -> Result<(), ApiError> {
    let path = message_path(root, folder, id)
        .ok_or_else(|| ApiError::not_found("Email not found"))?;
    if starred {
        rename_with_flags(&path, &['F'], &[])
    } else {
        rename_with_flags(&path, &[], &['F'])
    }
}

/// Move the message into `.Trash/cur`, or unlink it when it is already in
/// Trash.
pub fn delete_message(root: &Path, folder: &str, id: u64) -> Result<(), ApiError> {
    let path = message_path(root, folder, id)
        .ok_or_else(|| ApiError::not_found("Email not found"))?;
    if folder.eq_ignore_ascii_case("Trash") || folder == ".Trash" {
        return fs::remove_file(&path).map_err(|e| ApiError::Dependency(e.into()));
    }
    let trash_cur = root.join(".Trash").join("cur");
    fs::create_dir_all(&trash_cur).map_err(|e| ApiError::Dependency(e.into()))?;
    let filename = path
        .file_name()
        .ok_or_else(|| ApiError::not_found("Email not found"))?;
    fs::rename(&path, trash_cur.join(filename)).map_err(|e| ApiError::Dependency(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_message(dir: &Path, name: &str, content: &str, mtime_secs: u64) {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs))
            .unwrap();
    }

    fn sample(root: &Path) {
        let cur = root.join("cur");
        write_message(
            &cur,
            "1000.M1.host:2,S",
            "From: Jane <jane@x.com>\nSubject: Oldest\nDate: Mon, 01 Jan 2024 10:00:00 +0000\n\nfirst body",
            1_000,
        );
        write_message(
            &cur,
            "2000.M2.host:2,",
            "From: Bob <bob@y.com>\nSubject: Middle\nDate: Tue, 02 Jan 2024 10:00:00 +0000\n\nsecond body",
            2_000,
        );
        write_message(
            &cur,
            "3000.M3.host:2,FS",
            "From: Eve <eve@z.com>\nSubject: Newest\nDate: Wed, 03 Jan 2024 10:00:00 +0000\n\nthird body",
            3_000,
        );
        // no flags delimiter: excluded from listings
        write_message(&cur, "stray-file", "From: x\n\nignored", 4_000);
    }

    #[test]
    fn listing_sorts_descending_by_mtime() {
        let tmp = TempDir::new().unwrap();
        sample(tmp.path());
        let (msgs, total) = list_messages(tmp.path(), "INBOX", 50, 0);
        assert_eq!(total, 3);
        let subjects: Vec<&str> = msgs.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, ["Newest", "Middle", "Oldest"]);
        assert_eq!(msgs[0].id, 1);
        assert_eq!(msgs[2].id, 3);
    }

    #[test]
    fn paging_never_duplicates_or_skips() {
        let tmp = TempDir::new().unwrap();
        sample(tmp.path());
        let (all, _) = list_messages(tmp.path(), "INBOX", 50, 0);
        let (page1, _) = list_messages(tmp.path(), "INBOX", 2, 0);
        let (page2, _) = list_messages(tmp.path(), "INBOX", 2, 2);
        let paged: Vec<String> = page1
            .iter()
            .chain(page2.iter())
            .map(|m| m.subject.clone())
            .collect();
        let full: Vec<String> = all.iter().map(|m| m.subject.clone()).collect();
        assert_eq!(paged, full);
    }

    #[test]
    fn missing_folder_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        let (msgs, total) = list_messages(tmp.path(), "Nonexistent", 50, 0);
        assert!(msgs.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn named_folder_maps_to_dot_directory() {
        let tmp = TempDir::new().unwrap();
        write_message(
            &tmp.path().join(".Sent").join("cur"),
            "1.M1.host:2,S",
            "Subject: Sent one\n\nbody",
            100,
        );
        let (msgs, _) = list_messages(tmp.path(), "Sent", 50, 0);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].subject, "Sent one");
        assert_eq!(msgs[0].folder, "Sent");
    }

    #[test]
    fn header_parsing() {
        let msg = parse_message(
            "From: Jane <jane@x.com>\r\nSubject: Hi\r\nDate: Mon, 01 Jan 2024 10:00:00 +0000\r\n\r\nHello world",
            "1.M1.host:2,",
            1,
            "INBOX",
        );
        assert_eq!(msg.sender, "Jane");
        assert_eq!(msg.email, "jane@x.com");
        assert_eq!(msg.subject, "Hi");
        assert_eq!(msg.snippet, "Hello world");
        assert_eq!(msg.body, "Hello world");
        assert_eq!(msg.date.to_rfc2822(), "Mon, 1 Jan 2024 10:00:00 +0000");
    }

    #[test]
    fn from_without_angle_brackets() {
        let msg = parse_message("From: noreply@github.com\n\nx", "1:2,", 1, "INBOX");
        assert_eq!(msg.sender, "noreply@github.com");
        assert_eq!(msg.email, "noreply@github.com");
    }

    #[test]
    fn invalid_date_defaults_to_now() {
        let before = Utc::now();
        let msg = parse_message("Date: not a date\n\nx", "1:2,", 1, "INBOX");
        assert!(msg.date >= before);
    }

    #[test]
    fn snippet_collapses_whitespace_and_truncates() {
        let body = format!("a  b\t\nc {}", "x".repeat(200));
        let msg = parse_message(&format!("Subject: s\n\n{body}"), "1:2,", 1, "INBOX");
        assert!(msg.snippet.starts_with("a b c x"));
        assert_eq!(msg.snippet.chars().count(), 100);
    }

    #[test]
    fn flag_letters_drive_read_and_starred() {
        let seen = parse_message("Subject: s\n\nb", "1.M1.host:2,S", 1, "INBOX");
        assert!(!seen.unread);
        assert!(!seen.starred);

        let flagged = parse_message("Subject: s\n\nb", "1.M1.host:2,F", 1, "INBOX");
        assert!(flagged.unread);
        assert!(flagged.starred);
    }

    #[test]
    fn folders_enumerated_with_unread_counts() {
        let tmp = TempDir::new().unwrap();
        sample(tmp.path());
        write_message(
            &tmp.path().join(".Junk").join("cur"),
            "1.M1.host:2,",
            "Subject: spam\n\nb",
            10,
        );
        let folders = list_folders(tmp.path());
        assert_eq!(folders[0].name, "INBOX");
        // only "2000.M2.host:2," counts: it lacks the S letter, and
        // "stray-file" has no flags delimiter so the listing excludes it
        assert_eq!(folders[0].count, 1);
        let (inbox, _) = list_messages(tmp.path(), "INBOX", 50, 0);
        assert_eq!(inbox.iter().filter(|m| m.unread).count(), folders[0].count);
        let junk = folders.iter().find(|f| f.name == "Junk").unwrap();
        assert_eq!(junk.display_name, "Spam");
        assert_eq!(junk.count, 1);
    }

    #[test]
    fn folder_listing_failure_yields_fallback_set() {
        let folders = list_folders(Path::new("/nonexistent/maildir/root"));
        let names: Vec<&str> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["INBOX", "Sent", "Drafts", "Trash", "Junk"]);
        assert!(folders.iter().all(|f| f.count == 0));
    }

    #[test]
    fn mark_read_rewrites_filename() {
        let tmp = TempDir::new().unwrap();
        sample(tmp.path());
        // id 2 is "Middle" (2000.M2.host:2,)
        mark_read(tmp.path(), "INBOX", 2).unwrap();
        assert!(tmp.path().join("cur").join("2000.M2.host:2,S").exists());
        let (msgs, _) = list_messages(tmp.path(), "INBOX", 50, 0);
        assert!(!msgs[1].unread);
    }

    #[test]
    fn star_and_unstar() {
        let tmp = TempDir::new().unwrap();
        sample(tmp.path());
        set_starred(tmp.path(), "INBOX", 2, true).unwrap();
        assert!(tmp.path().join("cur").join("2000.M2.host:2,F").exists());
        set_starred(tmp.path(), "INBOX", 2, false).unwrap();
        assert!(tmp.path().join("cur").join("2000.M2.host:2,").exists());
    }

    #[test]
    fn flag_letters_stay_sorted() {
        let tmp = TempDir::new().unwrap();
        sample(tmp.path());
        // id 1 is "Newest" (3000.M3.host:2,FS): adding S again must not dup
        mark_read(tmp.path(), "INBOX", 1).unwrap();
        assert!(tmp.path().join("cur").join("3000.M3.host:2,FS").exists());
    }

    #[test]
    fn delete_moves_to_trash_then_unlinks() {
        let tmp = TempDir::new().unwrap();
        sample(tmp.path());
        delete_message(tmp.path(), "INBOX", 1).unwrap();
        let (msgs, _) = list_messages(tmp.path(), "INBOX", 50, 0);
        assert_eq!(msgs.len(), 2);
        let (trash, _) = list_messages(tmp.path(), "Trash", 50, 0);
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].subject, "Newest");

        delete_message(tmp.path(), "Trash", 1).unwrap();
        let (trash, _) = list_messages(tmp.path(), "Trash", 50, 0);
        assert!(trash.is_empty());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let tmp = TempDir::new().unwrap();
        sample(tmp.path());
        assert!(matches!(
            mark_read(tmp.path(), "INBOX", 99),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn path_resolution_prefers_record_fields() {
        let config = test_config();
        let mut record = test_record();
        record.storagebasedirectory = Some("/srv/mail".into());
        record.storagenode = Some("node2".into());
        assert_eq!(
            resolve_maildir(&config, &record),
            Path::new("/srv/mail/node2/x.com/jane/Maildir")
        );

        record.storagebasedirectory = None;
        record.storagenode = Some(String::new());
        assert_eq!(
            resolve_maildir(&config, &record),
            Path::new("/var/vmail/vmail1/x.com/jane/Maildir")
        );

        fn test_record() -> MailboxRecord {
            MailboxRecord {
                username: "jane@x.com".into(),
                password: String::new(),
                name: "Jane".into(),
                domain: "x.com".into(),
                active: true,
                enablesmtp: true,
                enableimap: true,
                quota: 0,
                storagebasedirectory: None,
                storagenode: None,
                maildir: "x.com/jane/Maildir".into(),
                created: None,
            }
        }
    }

    fn test_config() -> Config {
        Config {
            db_host: "localhost".into(),
            db_port: 3306,
            db_user: "vmail".into(),
            db_password: String::new(),
            db_name: "vmail".into(),
            smtp_host: "localhost".into(),
            smtp_port: 587,
            storage_base: "/var/vmail".into(),
            storage_node: "vmail1".into(),
            jwt_secret: "s".into(),
            port: 3001,
            demo_mode: false,
            doveadm_path: "doveadm".into(),
            doveadm_timeout: std::time::Duration::from_secs(5),
        }
    }
}
