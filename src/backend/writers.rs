// loganyapp - backend/writers.rs
//
// Destinations for activated appenders. Each kind becomes a `BoxMakeWriter`
// the fmt layer asks for once per formatted record:
//
//   screen  stderr or stdout
//   file    one append-mode handle behind a mutex
//   dir     a new file per record, oldest pruned beyond `histories`
//   syslog  syslog(3) with the record's priority (unix only)

use crate::core::model::OutputKind;
use crate::util::constants;
use crate::util::error::{BackendError, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter};

/// Open the destination of one appender.
pub fn make_writer(appender: &str, kind: &OutputKind) -> Result<BoxMakeWriter> {
    match kind {
        OutputKind::Screen { stderr: true, .. } => Ok(BoxMakeWriter::new(io::stderr)),
        OutputKind::Screen { stderr: false, .. } => Ok(BoxMakeWriter::new(io::stdout)),
        OutputKind::File { path, .. } => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| BackendError::Open {
                    appender: appender.to_string(),
                    path: path.clone(),
                    source,
                })?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        OutputKind::Dir {
            path, histories, ..
        } => {
            if !path.is_dir() {
                return Err(BackendError::Open {
                    appender: appender.to_string(),
                    path: path.clone(),
                    source: io::Error::new(io::ErrorKind::NotFound, "directory does not exist"),
                }
                .into());
            }
            Ok(BoxMakeWriter::new(DirSink::new(path.clone(), *histories)))
        }
        OutputKind::Syslog { ident, facility } => syslog_writer(appender, ident, facility),
    }
}

// =============================================================================
// Directory sink
// =============================================================================

/// Writes every record to its own file named
/// `<YYYY-MM-DD-HH:MM:SS>.pid-<pid>.<seq>`.
#[derive(Debug)]
pub struct DirSink {
    dir: PathBuf,
    /// Record files kept; 0 keeps all.
    histories: u64,
    seq: AtomicU64,
    /// Record files believed to be in `dir`; refreshed by each prune.
    count: AtomicU64,
}

impl DirSink {
    pub fn new(dir: PathBuf, histories: u64) -> Self {
        let existing = record_keys(&dir).map(|r| r.len() as u64).unwrap_or(0);
        Self {
            dir,
            histories,
            seq: AtomicU64::new(0),
            count: AtomicU64::new(existing),
        }
    }

    fn next_path(&self) -> PathBuf {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let stamp = chrono::Local::now().format(constants::DIR_RECORD_TIMESTAMP_FORMAT);
        self.dir
            .join(format!("{stamp}.pid-{}.{seq}", std::process::id()))
    }

    /// Count a newly written record and prune once the count passes
    /// `histories`.
    fn record_written(&self) -> io::Result<usize> {
        let count = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        if self.histories == 0 || count <= self.histories {
            return Ok(0);
        }
        self.prune()
    }

    /// Delete the oldest record files beyond `histories`.
    pub fn prune(&self) -> io::Result<usize> {
        if self.histories == 0 {
            return Ok(0);
        }
        let mut records = record_keys(&self.dir)?;
        let keep = usize::try_from(self.histories).unwrap_or(usize::MAX);
        if records.len() <= keep {
            self.count.store(records.len() as u64, Ordering::Relaxed);
            return Ok(0);
        }
        records.sort();
        let excess = records.len() - keep;
        for (_, path) in records.iter().take(excess) {
            std::fs::remove_file(path)?;
        }
        self.count.store(keep as u64, Ordering::Relaxed);
        Ok(excess)
    }
}

fn record_keys(dir: &Path) -> io::Result<Vec<(RecordKey, PathBuf)>> {
    Ok(std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            Some((RecordKey::parse(&name)?, entry.path()))
        })
        .collect())
}

/// Sort key of a record file name: timestamp, pid, sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RecordKey {
    stamp: String,
    pid: u32,
    seq: u64,
}

impl RecordKey {
    fn parse(name: &str) -> Option<Self> {
        let (rest, seq) = name.rsplit_once('.')?;
        let (stamp, pid) = rest.rsplit_once(".pid-")?;
        Some(Self {
            stamp: stamp.to_string(),
            pid: pid.parse().ok()?,
            seq: seq.parse().ok()?,
        })
    }
}

/// One record's file, created on first write.
#[derive(Debug)]
pub struct RecordFile<'a> {
    sink: &'a DirSink,
    file: Option<File>,
}

impl Write for RecordFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = match self.file {
            Some(ref mut file) => file,
            None => self.file.insert(
                OpenOptions::new()
                    .create_new(true)
                    .write(true)
                    .open(self.sink.next_path())?,
            ),
        };
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file {
            Some(ref mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for RecordFile<'_> {
    fn drop(&mut self) {
        if self.file.take().is_some() {
            // Nowhere to report a failure from inside the logging path.
            let _ = self.sink.record_written();
        }
    }
}

impl<'a> MakeWriter<'a> for DirSink {
    type Writer = RecordFile<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RecordFile {
            sink: self,
            file: None,
        }
    }
}

// =============================================================================
// Syslog
// =============================================================================

#[cfg(unix)]
fn syslog_writer(_appender: &str, ident: &str, facility: &str) -> Result<BoxMakeWriter> {
    Ok(BoxMakeWriter::new(syslog::SyslogSink::open(ident, facility)))
}

#[cfg(not(unix))]
fn syslog_writer(appender: &str, _ident: &str, _facility: &str) -> Result<BoxMakeWriter> {
    Err(BackendError::Unsupported {
        appender: appender.to_string(),
        reason: "syslog is only available on unix platforms".to_string(),
    }
    .into())
}

#[cfg(unix)]
mod syslog {
    use std::ffi::CString;
    use std::io::{self, Write};
    use std::sync::OnceLock;
    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::writer::MakeWriter;

    const FORMAT: &[u8] = b"%s\0";

    /// Facility name to its syslog(3) code. Names are validated upstream.
    pub(super) fn facility_code(name: &str) -> libc::c_int {
        match name {
            "kern" => libc::LOG_KERN,
            "user" => libc::LOG_USER,
            "mail" => libc::LOG_MAIL,
            "auth" => libc::LOG_AUTH,
            "syslog" => libc::LOG_SYSLOG,
            "lpr" => libc::LOG_LPR,
            "news" => libc::LOG_NEWS,
            "uucp" => libc::LOG_UUCP,
            "cron" => libc::LOG_CRON,
            "local0" => libc::LOG_LOCAL0,
            "local1" => libc::LOG_LOCAL1,
            "local2" => libc::LOG_LOCAL2,
            "local3" => libc::LOG_LOCAL3,
            "local4" => libc::LOG_LOCAL4,
            "local5" => libc::LOG_LOCAL5,
            "local6" => libc::LOG_LOCAL6,
            "local7" => libc::LOG_LOCAL7,
            _ => libc::LOG_DAEMON,
        }
    }

    pub(super) fn priority(level: &Level) -> libc::c_int {
        match *level {
            Level::ERROR => libc::LOG_ERR,
            Level::WARN => libc::LOG_WARNING,
            Level::INFO => libc::LOG_INFO,
            Level::DEBUG | Level::TRACE => libc::LOG_DEBUG,
        }
    }

    #[derive(Debug)]
    pub struct SyslogSink {
        facility: libc::c_int,
    }

    impl SyslogSink {
        /// Open the process-wide syslog connection. syslog(3) keeps a
        /// single ident per process, so the first syslog appender's ident
        /// is used by all of them; the facility is sent with every record.
        pub fn open(ident: &str, facility: &str) -> Self {
            static IDENT: OnceLock<CString> = OnceLock::new();
            let ident = IDENT.get_or_init(|| {
                CString::new(ident.replace('\0', "")).unwrap_or_default()
            });
            let facility = facility_code(facility);
            // SAFETY: the ident pointer lives in a static for the rest of
            // the process, as openlog(3) requires.
            unsafe {
                libc::openlog(ident.as_ptr(), 0, facility);
            }
            tracing::debug!(facility, "Syslog opened");
            Self { facility }
        }
    }

    /// One record, sent to syslog when dropped.
    #[derive(Debug)]
    pub struct SyslogRecord {
        priority: libc::c_int,
        buf: Vec<u8>,
    }

    impl Write for SyslogRecord {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for SyslogRecord {
        fn drop(&mut self) {
            while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                self.buf.pop();
            }
            if self.buf.is_empty() {
                return;
            }
            self.buf.retain(|b| *b != 0);
            let Ok(message) = CString::new(std::mem::take(&mut self.buf)) else {
                return;
            };
            // SAFETY: both strings are NUL-terminated and "%s" keeps the
            // message from being read as a format string.
            unsafe {
                libc::syslog(self.priority, FORMAT.as_ptr().cast(), message.as_ptr());
            }
        }
    }

    impl<'a> MakeWriter<'a> for SyslogSink {
        type Writer = SyslogRecord;

        fn make_writer(&'a self) -> Self::Writer {
            SyslogRecord {
                priority: self.facility | libc::LOG_INFO,
                buf: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            SyslogRecord {
                priority: self.facility | priority(meta.level()),
                buf: Vec::new(),
            }
        }
    }
}

/// Whether `path` holds a directory-sink record file.
pub fn is_record_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(RecordKey::parse)
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records_in(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| is_record_file(p))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_record_key_parse() {
        let key = RecordKey::parse("2024-03-05-07:08:09.pid-1234.17").unwrap();
        assert_eq!(key.pid, 1234);
        assert_eq!(key.seq, 17);
        assert_eq!(key.stamp, "2024-03-05-07:08:09");
        assert!(RecordKey::parse("notes.txt").is_none());
    }

    #[test]
    fn test_record_keys_order_by_numeric_seq() {
        let a = RecordKey::parse("2024-03-05-07:08:09.pid-1.9").unwrap();
        let b = RecordKey::parse("2024-03-05-07:08:09.pid-1.10").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_dir_sink_writes_one_file_per_record() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirSink::new(tmp.path().to_path_buf(), 0);
        for msg in ["one\n", "two\n"] {
            let mut w = sink.make_writer();
            w.write_all(msg.as_bytes()).unwrap();
        }
        let files = records_in(tmp.path());
        assert_eq!(files.len(), 2);
        let mut contents: Vec<String> = files
            .iter()
            .map(|f| std::fs::read_to_string(f).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, vec!["one\n", "two\n"]);
    }

    #[test]
    fn test_dir_sink_prunes_beyond_histories() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("keep.txt"), b"unrelated").unwrap();
        let sink = DirSink::new(tmp.path().to_path_buf(), 3);
        for i in 0..5 {
            let mut w = sink.make_writer();
            writeln!(w, "record {i}").unwrap();
        }
        let files = records_in(tmp.path());
        assert_eq!(files.len(), 3);
        let mut contents: Vec<String> = files
            .iter()
            .map(|f| std::fs::read_to_string(f).unwrap())
            .collect();
        contents.sort();
        assert_eq!(contents, vec!["record 2\n", "record 3\n", "record 4\n"]);
        assert!(tmp.path().join("keep.txt").exists());
    }

    #[test]
    fn test_dir_sink_prunes_only_past_histories() {
        let tmp = tempfile::tempdir().unwrap();
        let old = tmp.path().join("2000-01-01-00-00-00.pid-1.0");
        std::fs::write(&old, b"old\n").unwrap();
        let sink = DirSink::new(tmp.path().to_path_buf(), 2);
        assert_eq!(sink.count.load(Ordering::Relaxed), 1);

        // Written behind the sink's back; not seen until the next prune.
        std::fs::write(tmp.path().join("2000-01-01-00-00-01.pid-1.0"), b"x\n").unwrap();
        writeln!(sink.make_writer(), "first").unwrap();
        assert_eq!(sink.count.load(Ordering::Relaxed), 2);
        assert_eq!(records_in(tmp.path()).len(), 3);

        writeln!(sink.make_writer(), "second").unwrap();
        assert_eq!(sink.count.load(Ordering::Relaxed), 2);
        let files = records_in(tmp.path());
        assert_eq!(files.len(), 2);
        assert!(!old.exists());
    }

    #[test]
    fn test_record_names_are_portable() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirSink::new(tmp.path().to_path_buf(), 0);
        let path = sink.next_path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(RecordKey::parse(name).is_some(), "{name}");
        assert!(!name.contains(['/', '\\', '<', '>', '"', '|', '?', '*']));
        if cfg!(windows) {
            assert!(!name.contains(':'), "{name}");
        }
    }

    #[test]
    fn test_empty_record_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirSink::new(tmp.path().to_path_buf(), 3);
        drop(sink.make_writer());
        assert!(records_in(tmp.path()).is_empty());
    }

    #[test]
    fn test_file_writer_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("app.log");
        std::fs::write(&path, "existing\n").unwrap();
        let kind = OutputKind::File {
            path: path.clone(),
            max_size: 0,
            max_age: 0,
            histories: 0,
        };
        let writer = make_writer("FILE0", &kind).unwrap();
        writer.make_writer().write_all(b"appended\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "existing\nappended\n"
        );
    }

    #[test]
    fn test_missing_dir_fails_to_open() {
        let tmp = tempfile::tempdir().unwrap();
        let kind = OutputKind::Dir {
            path: tmp.path().join("absent"),
            max_size: 0,
            max_age: 0,
            histories: 10,
        };
        assert!(make_writer("DIR0", &kind).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_syslog_codes() {
        assert_eq!(syslog::facility_code("local3"), libc::LOG_LOCAL3);
        assert_eq!(syslog::facility_code("daemon"), libc::LOG_DAEMON);
        assert_eq!(syslog::priority(&tracing::Level::WARN), libc::LOG_WARNING);
    }
}
