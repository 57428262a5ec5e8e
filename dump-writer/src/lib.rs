//! Top-level revision loop: walks a remote revision range, drives the
//! delta editor for each one, and streams the resulting dumpstream to an
//! output writer.
//!
//! This is the only crate that touches every other component directly —
//! C1 through C6 all get driven from here, in the order `dump.c`'s
//! `do_dump` drives them: acquire a revision's log entry, emit the
//! revision header, drive the remote's diff through the delta editor,
//! write whatever node records it produced, then commit the new tree and
//! property state before moving to the next revision.

use std::io::Write;
use std::path::{Path, PathBuf};

use content_cache::ContentCache;
use copy_resolver::CopyResolver;
use delta_driver::DeltaDriver;
use dumpstream::{FormatVersion, NodeAction, NodeKind, NodeRecord, Properties};
use log_service::LogService;
use path_repo::{PathRepo, RevisionMapEntry};
use prop_store::PropStore;
use svn_client::{LogEntry, RaSession};

mod error;
pub use error::Error;

/// The dumped end revision: either a literal remote revision number, or a
/// request to resolve the server's current youngest revision at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndRevision {
    Head,
    Literal(u64),
}

/// The configuration surface of §6.2, already parsed out of whatever CLI
/// representation the root binary uses. `dump-writer` never parses argv
/// itself — that stays the root binary's job (see `src/main.rs`).
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// The path of the dumped subtree, relative to the repository root.
    /// Empty means the whole repository.
    pub session_prefix: String,
    pub start: u64,
    pub end: EndRevision,
    pub incremental: bool,
    pub keep_revnums: bool,
    pub use_deltas: bool,
    pub dry_run: bool,
    pub no_incremental_header: bool,
    /// A path prepended to every emitted `Node-path`/`Node-copyfrom-path`,
    /// distinct from `session_prefix`: this one never touches what's
    /// fetched from the remote, only what's written to the dumpstream.
    pub output_prefix: Option<String>,
    pub temp_dir: PathBuf,
    pub dump_format: u8,
}

impl DumpOptions {
    /// Resolves `dump_format`/`use_deltas` to the dumpstream format version
    /// they imply, rejecting the one combination that makes no sense
    /// (`use_deltas` with the version-2 format, which has no delta
    /// encoding). The root binary uses this to build the `dumpstream::Writer`
    /// it passes to [`DumpWriter::run`], so both sides agree on the format.
    pub fn format_version(&self) -> Result<FormatVersion, Error> {
        match self.dump_format {
            2 if !self.use_deltas => Ok(FormatVersion::V2),
            3 => Ok(FormatVersion::V3),
            2 => Err(Error::IncompatibleOptions(
                "use_deltas requires dump_format 3",
            )),
            _ => Err(Error::IncompatibleOptions("dump_format must be 2 or 3")),
        }
    }

    /// Rejects the one combination §9's open question on `keep_revnums` +
    /// mid-range `incremental` leaves unspecified, rather than guessing at
    /// padding semantics for revisions before `start` that never get a
    /// chance to be padded in. See DESIGN.md's Open Question decision 4.
    fn validate(&self) -> Result<(), Error> {
        if self.keep_revnums && self.incremental && self.start > 0 {
            return Err(Error::IncompatibleOptions(
                "keep_revnums cannot be combined with an incremental dump starting past revision 0",
            ));
        }
        Ok(())
    }
}

const PADDING_MESSAGE: &str = "This is an empty revision for padding.";

/// Owns every persistent component (C1-C3) for the lifetime of one dump
/// run, and drives C4-C6 against a caller-supplied remote session.
pub struct DumpWriter {
    options: DumpOptions,
    path_repo: PathRepo,
    prop_store: PropStore,
    content_cache: ContentCache,
    log_service: LogService,
    revmap: Vec<RevisionMapEntry>,
}

impl DumpWriter {
    pub fn open(options: DumpOptions) -> Result<Self, Error> {
        options.format_version()?;
        options.validate()?;
        std::fs::create_dir_all(&options.temp_dir)?;

        let path_repo = PathRepo::open(options.temp_dir.join("paths.db"))?;
        let prop_store = PropStore::open(options.temp_dir.join("props.db"))?;
        let content_cache = ContentCache::open(&options.temp_dir)?;
        let log_service = LogService::new(options.session_prefix.clone());

        Ok(Self {
            options,
            path_repo,
            prop_store,
            content_cache,
            log_service,
            revmap: Vec::new(),
        })
    }

    /// The working directory backing this run's persisted state, exposed
    /// so the caller can remove it on success or report it on failure
    /// (§4.7 step 7 — cleanup lifecycle is the caller's responsibility,
    /// not this component's).
    pub fn working_dir(&self) -> &Path {
        &self.options.temp_dir
    }

    /// Drives the whole revision loop against `session`, writing the
    /// resulting dumpstream to `writer`.
    pub async fn run<S, W>(&mut self, session: &S, writer: &mut dumpstream::Writer<W>) -> Result<(), Error>
    where
        S: RaSession,
        W: Write,
    {
        let format = self.options.format_version()?;

        // Step 1: resolve the true end revision. Per the reference
        // implementation this is a single `stat` against the literal end
        // sentinel rather than a dedicated "latest revision" call.
        let end_sentinel = match self.options.end {
            EndRevision::Head => svn_client::HEAD_REVISION,
            EndRevision::Literal(r) => r,
        };
        let root_at_end = session
            .stat(&self.options.session_prefix, end_sentinel)
            .await?
            .ok_or_else(|| Error::RootNotFound(self.options.session_prefix.clone(), end_sentinel))?;
        let end = root_at_end.created_rev;

        // Step 2: if dumping a subdirectory from the very beginning,
        // substitute the first revision at which it actually existed.
        let mut start = self.options.start;
        if !self.options.session_prefix.is_empty() && start == 0 {
            let (first, _) = self.log_service.range_of(session, 0, end).await?;
            start = first;
        }

        // Step 3: the start revision must actually contain the session
        // root, or there is nothing to dump.
        session
            .check_path(&self.options.session_prefix, start)
            .await?
            .ok_or_else(|| Error::RootNotFound(self.options.session_prefix.clone(), start))?;

        let resolver = CopyResolver::new(
            self.options.session_prefix.clone(),
            start,
            self.options.incremental,
            self.options.keep_revnums,
        );

        let mut first_diff_done = false;

        // Step 4: prime phase. Replays every revision before `start` into
        // C1 directly from log metadata (no node records ever pass
        // through the delta editor for these), then runs one real diff
        // from the empty revision to `start` to seed C2/C3 with the
        // current property and content state — discarding whatever node
        // records that diff produces, since none of it is ever dumped.
        if start > 0 && self.options.incremental {
            self.prime(session, start, &resolver, format).await?;
            first_diff_done = true;
        }

        // Step 5: dumpstream header.
        let suppress_header =
            self.options.incremental && start > 0 && self.options.no_incremental_header;
        if !suppress_header {
            let uuid = session.get_uuid().await?;
            writer.header(Some(&uuid))?;
        }

        // Step 6: the main revision loop. Only revisions that actually
        // touched the session root are fetched (log-service already
        // filters on the remote side); `keep_revnums` re-inflates the
        // gaps between them with padding revisions so the local counter
        // always lands on the corresponding remote number.
        let mut entries = Vec::new();
        self.log_service
            .fetch_all(session, start, end, &mut entries, |_| {})
            .await?;

        let mut local_revnum = if self.options.keep_revnums { start } else { 0 };
        let mut prefix_dirs_done = self.options.output_prefix.is_none();

        for entry in &entries {
            let remote = entry.revision;

            if self.options.keep_revnums {
                while local_revnum < remote {
                    self.write_padding_revision(writer, local_revnum)?;
                    self.revmap.push(RevisionMapEntry {
                        local: local_revnum,
                        remote: local_revnum,
                    });
                    local_revnum += 1;
                }
            }

            writer.revision(local_revnum, &revision_properties(entry))?;

            // §4.7.2: base revision is the previous remote revision,
            // never allowed below `start - 1` — which the prime phase
            // above already established as the floor of what C1/C2/C3
            // know about.
            let base = remote.saturating_sub(1).max(start.saturating_sub(1));
            let start_empty = !first_diff_done;
            first_diff_done = true;

            let driver = DeltaDriver::new(
                &mut self.content_cache,
                &mut self.prop_store,
                &mut self.path_repo,
                &resolver,
                &self.revmap,
                entry,
                local_revnum,
                format,
                self.options.use_deltas,
                self.options.dry_run,
            );
            let mut driver = session.do_diff(base, remote, start_empty, driver).await?;
            let emitted = std::mem::take(&mut driver.emitted);
            drop(driver);

            if !prefix_dirs_done && local_revnum == 1 {
                for record in prefix_directory_records(self.options.output_prefix.as_deref().unwrap()) {
                    writer.node(&record)?;
                }
                prefix_dirs_done = true;
            }

            for mut record in emitted {
                apply_output_prefix(&mut record, self.options.output_prefix.as_deref());
                writer.node(&record)?;
            }

            self.path_repo
                .commit_log(session, &self.options.session_prefix, entry, local_revnum, &self.revmap)
                .await
                .map_err(|e| {
                    self.path_repo.discard();
                    e
                })?;

            self.revmap.push(RevisionMapEntry {
                local: local_revnum,
                remote,
            });
            local_revnum += 1;
        }

        Ok(())
    }

    async fn prime<S: RaSession>(
        &mut self,
        session: &S,
        start: u64,
        resolver: &CopyResolver,
        format: FormatVersion,
    ) -> Result<(), Error> {
        let mut logs = Vec::new();
        self.log_service
            .fetch_all(session, 0, start.saturating_sub(1), &mut logs, |_| {})
            .await?;

        // §4.7.1: keep log-sequence indices aligned with local revision
        // numbers when the dumped subdirectory didn't exist at remote
        // revision 0, so downstream lookups by revision number stay
        // consistent.
        if !self.options.session_prefix.is_empty() && logs.first().map(|e| e.revision) != Some(0) {
            logs.insert(0, LogEntry { revision: 0, ..Default::default() });
        }

        // A revision map scoped to the prime phase alone: a pre-`start`
        // copy can cite an even earlier pre-`start` revision, so
        // `commit_log` still needs *some* translation table while
        // replaying this history, but it must never leak into
        // `self.revmap`. The main loop's own local numbering starts over
        // from its own baseline (0, unless `keep_revnums`); feeding these
        // pre-`start` entries into the shared revmap would let a copy
        // sourced from inside the dumped range resolve against a
        // pre-`start` local number that the output dumpstream never
        // actually emits, and `path_repo::expand_copy`'s identical lookup
        // would then reconstruct the wrong tree to copy from.
        let mut prime_revmap = Vec::new();
        for entry in &logs {
            prime_revmap.push(RevisionMapEntry {
                local: entry.revision,
                remote: entry.revision,
            });
            self.path_repo
                .commit_log(session, &self.options.session_prefix, entry, entry.revision, &prime_revmap)
                .await
                .map_err(|e| {
                    self.path_repo.discard();
                    e
                })?;
        }

        let dummy_log = LogEntry { revision: start, ..Default::default() };
        let driver = DeltaDriver::new(
            &mut self.content_cache,
            &mut self.prop_store,
            &mut self.path_repo,
            resolver,
            &prime_revmap,
            &dummy_log,
            start,
            format,
            self.options.use_deltas,
            false,
        );
        // base=0 target=start, start_empty=true: a full sync from the
        // empty tree, driven purely to fill C2/C3. Its node records are
        // never written anywhere.
        let _driver = session.do_diff(0, start, true, driver).await?;

        Ok(())
    }

    fn write_padding_revision<W: Write>(&self, writer: &mut dumpstream::Writer<W>, local_revnum: u64) -> Result<(), Error> {
        let mut props = Properties::new();
        props.set("svn:log", PADDING_MESSAGE);
        writer.revision(local_revnum, &props)?;
        Ok(())
    }
}

fn revision_properties(entry: &LogEntry) -> Properties {
    let mut props = Properties::new();
    if let Some(author) = &entry.author {
        props.set("svn:author", author.clone());
    }
    if let Some(date) = &entry.date {
        props.set("svn:date", date.clone());
    }
    if let Some(message) = &entry.message {
        props.set("svn:log", message.clone());
    }
    props
}

fn apply_output_prefix(record: &mut NodeRecord, prefix: Option<&str>) {
    let prefix = match prefix {
        Some(p) if !p.is_empty() => p,
        _ => return,
    };
    record.path = format!("{}/{}", prefix, record.path);
    if let Some(copy_from) = &mut record.copy_from {
        copy_from.path = format!("{}/{}", prefix, copy_from.path);
    }
}

/// One synthetic `Node-action: add` of kind `dir` per path segment of
/// `prefix`, parent before child, each carrying an (empty) property block
/// so it dumps a `PROPS-END`-only body.
fn prefix_directory_records(prefix: &str) -> Vec<NodeRecord> {
    let mut records = Vec::new();
    let mut built = String::new();
    for segment in prefix.split('/').filter(|s| !s.is_empty()) {
        if !built.is_empty() {
            built.push('/');
        }
        built.push_str(segment);
        records.push(
            NodeRecord::new(built.clone(), NodeAction::Add)
                .kind(NodeKind::Dir)
                .properties(Properties::new()),
        );
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_directory_records_are_parent_before_child() {
        let records = prefix_directory_records("a/b/c");
        let paths: Vec<_> = records.iter().map(|r| r.path.clone()).collect();
        assert_eq!(paths, vec!["a", "a/b", "a/b/c"]);
        assert!(records.iter().all(|r| r.kind == Some(NodeKind::Dir)));
        assert!(records.iter().all(|r| r.action == NodeAction::Add));
    }

    #[test]
    fn output_prefix_is_prepended_to_path_and_copyfrom() {
        let mut record = NodeRecord::new("trunk/a", NodeAction::Add).copy_from(3, "trunk/b");
        apply_output_prefix(&mut record, Some("import"));
        assert_eq!(record.path, "import/trunk/a");
        assert_eq!(record.copy_from.unwrap().path, "import/trunk/b");
    }

    #[test]
    fn empty_output_prefix_is_a_no_op() {
        let mut record = NodeRecord::new("trunk/a", NodeAction::Add);
        apply_output_prefix(&mut record, Some(""));
        assert_eq!(record.path, "trunk/a");
    }

    #[test]
    fn revision_properties_includes_only_present_fields() {
        let entry = LogEntry {
            revision: 1,
            author: Some("jrandom".into()),
            date: None,
            message: Some("hello".into()),
            ..Default::default()
        };
        let mut expected = Properties::new();
        expected.set("svn:author", "jrandom");
        expected.set("svn:log", "hello");
        assert_eq!(revision_properties(&entry), expected);
    }
}


#[cfg(test)]
mod integration_tests {
    use super::fake_session::FakeSession;
    use super::*;

    fn options(temp_dir: std::path::PathBuf, end: u64) -> DumpOptions {
        DumpOptions {
            session_prefix: String::new(),
            start: 0,
            end: EndRevision::Literal(end),
            incremental: false,
            keep_revnums: false,
            use_deltas: false,
            dry_run: false,
            no_incremental_header: false,
            output_prefix: None,
            temp_dir,
            dump_format: 2,
        }
    }

    #[test]
    fn keep_revnums_with_mid_range_incremental_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path().to_path_buf(), 5);
        opts.start = 3;
        opts.incremental = true;
        opts.keep_revnums = true;

        assert!(matches!(DumpWriter::open(opts), Err(Error::IncompatibleOptions(_))));
    }

    #[test]
    fn keep_revnums_with_incremental_from_zero_is_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path().to_path_buf(), 5);
        opts.incremental = true;
        opts.keep_revnums = true;

        assert!(DumpWriter::open(opts).is_ok());
    }

    #[tokio::test]
    async fn empty_repository_dumps_only_the_zero_revision() {
        let dir = tempfile::tempdir().unwrap();
        let session =
            FakeSession::new("aaaaaaaa-0000-0000-0000-000000000000").with_log(LogEntry { revision: 0, ..Default::default() });

        let mut buf = Vec::new();
        let mut writer = dumpstream::Writer::new(&mut buf, FormatVersion::V2);
        let mut dw = DumpWriter::open(options(dir.path().to_path_buf(), 0)).unwrap();
        dw.run(&session, &mut writer).await.unwrap();
        drop(writer);

        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("SVN-fs-dump-format-version: 2\n\n"));
        assert!(out.contains("UUID: aaaaaaaa-0000-0000-0000-000000000000\n"));
        assert!(out.contains("Revision-number: 0\n"));
        assert!(!out.contains("Node-path"));
    }

    #[tokio::test]
    async fn single_file_add_emits_one_node_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut rev1 = LogEntry {
            revision: 1,
            author: Some("jrandom".into()),
            message: Some("add README".into()),
            ..Default::default()
        };
        rev1.changed_paths.insert("README".into(), super::fake_session::changed_path_add());

        let session = FakeSession::new("aaaaaaaa-0000-0000-0000-000000000000")
            .with_log(LogEntry { revision: 0, ..Default::default() })
            .with_log(rev1)
            .with_add(1, "README", b"hello\n");

        let mut buf = Vec::new();
        let mut writer = dumpstream::Writer::new(&mut buf, FormatVersion::V2);
        let mut dw = DumpWriter::open(options(dir.path().to_path_buf(), 1)).unwrap();
        dw.run(&session, &mut writer).await.unwrap();
        drop(writer);

        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Revision-number: 1\n"));
        assert!(out.contains("svn:author"));
        assert!(out.contains("Node-path: README\n"));
        assert!(out.contains("Node-action: add\n"));
        assert!(out.contains("Node-kind: file\n"));
        assert!(out.contains("Text-content-length: 6\n"));
        assert!(out.contains("Text-content-md5: b1946ac92492d2347c6235b4d2611184\n"));
        assert!(out.contains("Content-length: 16\n"));
        assert!(out.contains("PROPS-END\nhello\n"));
    }

    #[tokio::test]
    async fn directory_copy_then_child_modify_emits_no_child_add() {
        use super::fake_session::ScriptedOp;

        let dir = tempfile::tempdir().unwrap();

        let mut rev1 = LogEntry {
            revision: 1,
            author: Some("jrandom".into()),
            ..Default::default()
        };
        rev1.changed_paths.insert("trunk/file.txt".into(), super::fake_session::changed_path_add());

        let mut rev2 = LogEntry {
            revision: 2,
            author: Some("jrandom".into()),
            ..Default::default()
        };
        rev2
            .changed_paths
            .insert("branches/v1".into(), super::fake_session::changed_path_copy("trunk", 1));

        let mut rev3 = LogEntry {
            revision: 3,
            author: Some("jrandom".into()),
            ..Default::default()
        };
        rev3
            .changed_paths
            .insert("branches/v1/file.txt".into(), super::fake_session::changed_path_modify());

        let session = FakeSession::new("aaaaaaaa-0000-0000-0000-000000000000")
            .with_log(LogEntry { revision: 0, ..Default::default() })
            .with_log(rev1)
            .with_log(rev2)
            .with_log(rev3)
            .with_add(1, "trunk/file.txt", b"hi\n")
            .with_op(
                2,
                ScriptedOp::AddDirCopy {
                    path: "branches/v1",
                    from_path: "trunk",
                    from_rev: 1,
                },
            )
            .with_op(
                3,
                ScriptedOp::ModifyFile {
                    path: "branches/v1/file.txt",
                    content: b"hi there\n",
                },
            );

        let mut buf = Vec::new();
        let mut writer = dumpstream::Writer::new(&mut buf, FormatVersion::V2);
        let mut dw = DumpWriter::open(options(dir.path().to_path_buf(), 3)).unwrap();
        dw.run(&session, &mut writer).await.unwrap();
        drop(writer);

        let out = String::from_utf8(buf).unwrap();

        let rev2_start = out.find("Revision-number: 2\n").unwrap();
        let rev3_start = out.find("Revision-number: 3\n").unwrap();
        let rev2_body = &out[rev2_start..rev3_start];

        assert!(rev2_body.contains("Node-path: branches/v1\n"));
        assert!(rev2_body.contains("Node-copyfrom-rev: 1\n"));
        assert!(rev2_body.contains("Node-copyfrom-path: trunk\n"));
        assert!(!rev2_body.contains("Node-path: branches/v1/file.txt\n"));

        let rev3_body = &out[rev3_start..];
        assert!(rev3_body.contains("Node-path: branches/v1/file.txt\n"));
        assert!(rev3_body.contains("Node-action: change\n"));
        assert!(rev3_body.contains("Text-content-length:"));
    }

    #[tokio::test]
    async fn replace_of_a_never_existing_path_downgrades_to_add() {
        use super::fake_session::ScriptedOp;

        let dir = tempfile::tempdir().unwrap();

        let rev1 = LogEntry {
            revision: 1,
            author: Some("jrandom".into()),
            ..Default::default()
        };

        let mut rev2 = LogEntry {
            revision: 2,
            author: Some("jrandom".into()),
            ..Default::default()
        };
        rev2
            .changed_paths
            .insert("a/b/c".into(), super::fake_session::changed_path_replace());

        let session = FakeSession::new("aaaaaaaa-0000-0000-0000-000000000000")
            .with_log(LogEntry { revision: 0, ..Default::default() })
            .with_log(rev1)
            .with_log(rev2)
            .with_op(2, ScriptedOp::AddDir { path: "a/b/c" });

        let mut buf = Vec::new();
        let mut writer = dumpstream::Writer::new(&mut buf, FormatVersion::V2);
        let mut dw = DumpWriter::open(options(dir.path().to_path_buf(), 2)).unwrap();
        dw.run(&session, &mut writer).await.unwrap();
        drop(writer);

        let out = String::from_utf8(buf).unwrap();
        let rev2_start = out.find("Revision-number: 2\n").unwrap();
        let rev2_body = &out[rev2_start..];

        assert!(rev2_body.contains("Node-path: a/b/c\n"));
        assert!(rev2_body.contains("Node-action: add\n"));
        assert!(!rev2_body.contains("Node-action: replace\n"));
        assert!(!rev2_body.contains("Node-action: delete\n"));
    }

    #[tokio::test]
    async fn deltas_mode_suppresses_content_on_md5_matching_copy() {
        use super::fake_session::ScriptedOp;

        let dir = tempfile::tempdir().unwrap();

        let mut rev1 = LogEntry {
            revision: 1,
            author: Some("jrandom".into()),
            ..Default::default()
        };
        rev1.changed_paths.insert("Y".into(), super::fake_session::changed_path_add());

        let mut rev2 = LogEntry {
            revision: 2,
            author: Some("jrandom".into()),
            ..Default::default()
        };
        rev2.changed_paths.insert("X".into(), super::fake_session::changed_path_copy("Y", 1));

        let session = FakeSession::new("aaaaaaaa-0000-0000-0000-000000000000")
            .with_log(LogEntry { revision: 0, ..Default::default() })
            .with_log(rev1)
            .with_log(rev2)
            .with_add(1, "Y", b"hello\n")
            .with_op(
                2,
                ScriptedOp::AddFileCopy {
                    path: "X",
                    from_path: "Y",
                    from_rev: 1,
                    content: b"hello\n",
                },
            );

        let mut opts = options(dir.path().to_path_buf(), 2);
        opts.use_deltas = true;
        opts.dump_format = 3;

        let mut buf = Vec::new();
        let mut writer = dumpstream::Writer::new(&mut buf, FormatVersion::V3);
        let mut dw = DumpWriter::open(opts).unwrap();
        dw.run(&session, &mut writer).await.unwrap();
        drop(writer);

        let out = String::from_utf8(buf).unwrap();
        let rev2_start = out.find("Revision-number: 2\n").unwrap();
        let rev2_body = &out[rev2_start..];

        assert!(rev2_body.contains("Node-path: X\n"));
        assert!(rev2_body.contains("Node-copyfrom-rev: 1\n"));
        assert!(rev2_body.contains("Node-copyfrom-path: Y\n"));
        assert!(!rev2_body.contains("Text-delta:"));
        assert!(!rev2_body.contains("Text-content-length:"));
    }

    #[tokio::test]
    async fn copy_from_outside_the_prefix_is_materialised_as_plain_adds() {
        use super::fake_session::ScriptedOp;

        let dir = tempfile::tempdir().unwrap();

        let mut rev5 = LogEntry {
            revision: 5,
            author: Some("jrandom".into()),
            ..Default::default()
        };
        rev5.changed_paths.insert("trunk/x".into(), super::fake_session::changed_path_copy("vendor/x", 4));

        let session = FakeSession::new("aaaaaaaa-0000-0000-0000-000000000000").with_log(rev5).with_op(
            5,
            ScriptedOp::AddDirCopyWithChildren {
                path: "x",
                from_path: "vendor/x",
                from_rev: 4,
                children: &[("x/a.txt", b"aaa\n"), ("x/b.txt", b"bbb\n")],
            },
        );

        let mut opts = options(dir.path().to_path_buf(), 5);
        opts.session_prefix = "trunk".to_string();
        opts.start = 5;

        let mut buf = Vec::new();
        let mut writer = dumpstream::Writer::new(&mut buf, FormatVersion::V2);
        let mut dw = DumpWriter::open(opts).unwrap();
        dw.run(&session, &mut writer).await.unwrap();
        drop(writer);

        let out = String::from_utf8(buf).unwrap();
        let rev_start = out.find("Revision-number: 0\n").unwrap();
        let rev_body = &out[rev_start..];

        assert!(rev_body.contains("Node-path: x\n"));
        assert!(rev_body.contains("Node-path: x/a.txt\n"));
        assert!(rev_body.contains("Node-path: x/b.txt\n"));
        assert_eq!(rev_body.matches("Node-action: add\n").count(), 3);
        assert!(!rev_body.contains("Node-copyfrom"));
    }
}
