use std::os::unix::fs::MetadataExt;

use redo_metrics::scoped_metric;

use crate::{
    handler::{Builder, Handler, HandlerError},
    stamp::Stamp,
};

/// Treats a target as a filesystem path, stamping it from `stat(2)`
/// metadata. Install this last in the handler chain as the catch-all
/// (`spec.md` §4.3.1): it accepts every target, so anything more specific
/// must be tried first.
///
/// `rebuild_impl` is deliberately unimplemented here — `FileHandler` on its
/// own models a *source* file, which is observed but never produced. A
/// derived-file handler that actually regenerates its output should be
/// installed ahead of this one in the chain.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileHandler;

impl Handler for FileHandler {
    fn can_handle(&self, _target: &str) -> bool {
        true
    }

    fn stamp(&self, target: &str) -> Stamp {
        scoped_metric!("file_handler_stamp");
        match std::fs::metadata(target) {
            Ok(meta) => format_stamp(&meta),
            Err(_) => String::new(),
        }
    }

    fn rebuild_impl(&self, target: &str, _builder: &mut Builder<'_>) -> Result<(), HandlerError> {
        Err(anyhow::anyhow!(
            "FileHandler cannot rebuild {:?}; it only observes source files. \
             Install a derived-file handler ahead of it in the chain.",
            target
        ))
    }
}

/// Formats the canonical stamp string: `mode ino dev uid gid size mtime_ns
/// ctime_ns`, in that fixed order, separated by single spaces. Link count
/// and atime are deliberately excluded — neither indicates the file's
/// content or metadata actually changed (`spec.md` §4.3.1).
fn format_stamp(meta: &std::fs::Metadata) -> Stamp {
    let mtime_ns = meta.mtime() as i128 * 1_000_000_000 + meta.mtime_nsec() as i128;
    let ctime_ns = meta.ctime() as i128 * 1_000_000_000 + meta.ctime_nsec() as i128;
    format!(
        "{} {} {} {} {} {} {} {}",
        meta.mode(),
        meta.ino(),
        meta.dev(),
        meta.uid(),
        meta.gid(),
        meta.size(),
        mtime_ns,
        ctime_ns,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_stamps_empty() {
        let handler = FileHandler;
        assert_eq!(handler.stamp("/nonexistent/path/does/not/exist"), "");
    }

    #[test]
    fn existing_file_stamps_nonempty_and_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();

        let handler = FileHandler;
        let s1 = handler.stamp(path.to_str().unwrap());
        let s2 = handler.stamp(path.to_str().unwrap());
        assert!(!s1.is_empty());
        assert_eq!(s1, s2);
        assert_eq!(s1.split(' ').count(), 8);
    }

    #[test]
    fn changed_content_changes_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();
        let handler = FileHandler;
        let before = handler.stamp(path.to_str().unwrap());

        std::thread::sleep(std::time::Duration::from_millis(10));
        std::fs::write(&path, b"hello, world, this is longer").unwrap();
        let after = handler.stamp(path.to_str().unwrap());

        assert_ne!(before, after);
    }
}
