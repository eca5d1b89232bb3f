use crate::mach::{Error, FileSystem};
use encoding_rs::GBK;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

type Result<T> = std::result::Result<T, Error>;

const HANDLES: usize = 8;

struct Handle {
    file: File,
    eof: bool,
}

/// ## Rooted host file system
///
/// Programs see `root` as the whole disk. Paths that would climb out of it
/// are refused. Up to eight files may be open at once; handles are 1 to 8
/// and 0 means the open failed.

pub struct HostFiles {
    root: PathBuf,
    cwd: PathBuf,
    handles: Vec<Option<Handle>>,
}

impl HostFiles {
    pub fn new(root: &Path) -> Result<HostFiles> {
        let root = root.canonicalize()?;
        Ok(HostFiles {
            root,
            cwd: PathBuf::new(),
            handles: (0..HANDLES).map(|_| None).collect(),
        })
    }

    /// The working directory relative to the root.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolves a program path, given in GB2312, against the working
    /// directory, staying inside the root.
    fn resolve(&self, name: &[u8]) -> Option<PathBuf> {
        let (name, _) = GBK.decode_without_bom_handling(name);
        let name = name.replace('\\', "/");
        let mut rel = if name.starts_with('/') {
            PathBuf::new()
        } else {
            self.cwd.clone()
        };
        for component in Path::new(&name).components() {
            match component {
                Component::Normal(part) => rel.push(part),
                Component::ParentDir => {
                    if !rel.pop() {
                        return None;
                    }
                }
                _ => {}
            }
        }
        Some(rel)
    }

    fn handle(&mut self, fp: i32) -> Option<&mut Handle> {
        if fp < 1 {
            return None;
        }
        self.handles.get_mut(fp as usize - 1)?.as_mut()
    }

    fn options(mode: &[u8]) -> Option<OpenOptions> {
        let mode: Vec<u8> = mode.iter().copied().filter(|&b| b != b'b').collect();
        let mut options = OpenOptions::new();
        match mode.as_slice() {
            b"r" => options.read(true),
            b"r+" => options.read(true).write(true),
            b"w" => options.write(true).create(true).truncate(true),
            b"w+" => options.read(true).write(true).create(true).truncate(true),
            b"a" => options.append(true).create(true),
            b"a+" => options.read(true).append(true).create(true),
            _ => return None,
        };
        Some(options)
    }
}

impl FileSystem for HostFiles {
    fn open(&mut self, name: &[u8], mode: &[u8]) -> i32 {
        let slot = match self.handles.iter().position(Option::is_none) {
            Some(slot) => slot,
            None => return 0,
        };
        let (path, options) = match (self.resolve(name), HostFiles::options(mode)) {
            (Some(path), Some(options)) => (path, options),
            _ => return 0,
        };
        match options.open(self.root.join(&path)) {
            Ok(file) => {
                debug!(path = %path.display(), fp = slot + 1, "open");
                self.handles[slot] = Some(Handle { file, eof: false });
                slot as i32 + 1
            }
            Err(_) => 0,
        }
    }

    fn close(&mut self, fp: i32) {
        if fp >= 1 {
            if let Some(slot) = self.handles.get_mut(fp as usize - 1) {
                *slot = None;
            }
        }
    }

    fn read(&mut self, fp: i32, buf: &mut [u8]) -> i32 {
        let handle = match self.handle(fp) {
            Some(handle) => handle,
            None => return 0,
        };
        let mut total = 0;
        while total < buf.len() {
            match handle.file.read(&mut buf[total..]) {
                Ok(0) => {
                    handle.eof = true;
                    break;
                }
                Ok(n) => total += n,
                Err(_) => break,
            }
        }
        total as i32
    }

    fn write(&mut self, fp: i32, buf: &[u8]) -> i32 {
        match self.handle(fp) {
            Some(handle) => match handle.file.write_all(buf) {
                Ok(()) => buf.len() as i32,
                Err(_) => 0,
            },
            None => 0,
        }
    }

    fn seek(&mut self, fp: i32, offset: i32, base: i32) -> i32 {
        let from = match base {
            0 => SeekFrom::Start(offset.max(0) as u64),
            1 => SeekFrom::Current(offset as i64),
            2 => SeekFrom::End(offset as i64),
            _ => return -1,
        };
        match self.handle(fp) {
            Some(handle) => match handle.file.seek(from) {
                Ok(pos) => {
                    handle.eof = false;
                    pos as i32
                }
                Err(_) => -1,
            },
            None => -1,
        }
    }

    fn tell(&mut self, fp: i32) -> i32 {
        match self.handle(fp) {
            Some(handle) => handle.file.stream_position().map(|pos| pos as i32).unwrap_or(-1),
            None => -1,
        }
    }

    fn eof(&mut self, fp: i32) -> bool {
        self.handle(fp).map(|handle| handle.eof).unwrap_or(true)
    }

    fn rewind(&mut self, fp: i32) {
        if let Some(handle) = self.handle(fp) {
            if handle.file.seek(SeekFrom::Start(0)).is_ok() {
                handle.eof = false;
            }
        }
    }

    fn getc(&mut self, fp: i32) -> i32 {
        let mut byte = [0u8];
        match self.read(fp, &mut byte) {
            1 => byte[0] as i32,
            _ => -1,
        }
    }

    fn putc(&mut self, c: i32, fp: i32) -> i32 {
        match self.write(fp, &[c as u8]) {
            1 => c & 0xff,
            _ => -1,
        }
    }

    fn change_dir(&mut self, name: &[u8]) -> bool {
        match self.resolve(name) {
            Some(path) if self.root.join(&path).is_dir() => {
                self.cwd = path;
                true
            }
            _ => false,
        }
    }

    fn make_dir(&mut self, name: &[u8]) -> bool {
        match self.resolve(name) {
            Some(path) => fs::create_dir(self.root.join(path)).is_ok(),
            None => false,
        }
    }

    fn delete_file(&mut self, name: &[u8]) -> bool {
        match self.resolve(name) {
            Some(path) => fs::remove_file(self.root.join(path)).is_ok(),
            None => false,
        }
    }

    fn file_count(&mut self) -> usize {
        self.list_files(0, usize::MAX).len()
    }

    /// Entries sorted by name.
    fn list_files(&mut self, start: usize, num: usize) -> Vec<String> {
        let dir = self.root.join(&self.cwd);
        let mut names: Vec<String> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => vec![],
        };
        names.sort();
        names.into_iter().skip(start).take(num).collect()
    }

    fn dispose(&mut self) {
        self.handles.iter_mut().for_each(|slot| *slot = None);
    }
}
