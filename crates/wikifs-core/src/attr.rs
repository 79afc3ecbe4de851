// File attributes reported to the host.

use std::time::SystemTime;

pub const DIR_PERM: u16 = 0o755;
pub const FILE_PERM: u16 = 0o644;
/// Open buffers are read-write for everyone, like scratch files.
pub const BUFFER_PERM: u16 = 0o666;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    RegularFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileAttr {
    pub kind: FileKind,
    pub perm: u16,
    pub size: u64,
    pub nlink: u32,
    pub mtime: SystemTime,
}

impl FileAttr {
    pub fn directory(perm: u16, mtime: SystemTime) -> Self {
        Self {
            kind: FileKind::Directory,
            perm,
            size: 0,
            nlink: 2,
            mtime,
        }
    }

    pub fn file(perm: u16, size: u64, mtime: SystemTime) -> Self {
        Self {
            kind: FileKind::RegularFile,
            perm,
            size,
            nlink: 1,
            mtime,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}
