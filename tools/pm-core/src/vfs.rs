//! A tiny read-only file system laid out in 16KiB ROM pages.
//!
//! ```text
//! base page, offset 0:
//!   [u8; 4]   magic, NUL padded
//!   u16       file count
//!   entry * count:
//!     [u8; 14]  name, NUL padded
//!     u16       page
//!     u16       size
//!     u16       offset within page
//! file contents follow, sorted by name
//! ```
//!
//! All integers are little-endian. A file never straddles a page; when it
//! would, it starts at offset 0 of the next page instead. The console maps a
//! single page into its slot and reads the file in place.

use std::collections::BTreeMap;

use log::{debug, trace};

use crate::error::{Error, Result};

pub const PAGE_SIZE: usize = 1 << 14;
/// Banks 0 and 1 hold the base program.
pub const DEFAULT_BASE_PAGE: u16 = 2;
pub const DEFAULT_MAGIC: &str = "rsc";

pub const MAGIC_LEN: usize = 4;
pub const HEADER_LEN: usize = MAGIC_LEN + 2;
pub const NAME_LEN: usize = 14;
pub const ENTRY_LEN: usize = NAME_LEN + 6;

/// Whether `len` bytes written at `cursor` stay inside a page of `page_size`.
pub const fn fits(cursor: usize, len: usize, page_size: usize) -> bool {
    cursor + len <= page_size
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub page: u16,
    pub offset: u16,
    pub size: u16,
}

impl FileEntry {
    fn encode(&self) -> [u8; ENTRY_LEN] {
        let mut out = [0u8; ENTRY_LEN];
        out[..self.name.len()].copy_from_slice(self.name.as_bytes());
        out[14..16].copy_from_slice(&self.page.to_le_bytes());
        out[16..18].copy_from_slice(&self.size.to_le_bytes());
        out[18..20].copy_from_slice(&self.offset.to_le_bytes());
        out
    }

    fn decode(raw: &[u8]) -> Self {
        let name_end = raw[..NAME_LEN].iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        let word = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);
        Self {
            name: String::from_utf8_lossy(&raw[..name_end]).into_owned(),
            page: word(14),
            size: word(16),
            offset: word(18),
        }
    }
}

/// Cursor state threaded through [`place`].
#[derive(Debug, Clone, Copy)]
struct Cursor {
    page: usize,
    offset: usize,
}

/// Decides where each file goes, in the order given.
///
/// `start` is the first free byte of the base page, right after the header
/// and entry table. Returns the placed entries and the number of pages used.
/// Names longer than [`NAME_LEN`] are rejected here, so every entry that
/// comes back fits its table slot.
pub fn place<'a>(
    files: impl IntoIterator<Item = (&'a str, usize)>,
    base_page: u16,
    start: usize,
) -> Result<(Vec<FileEntry>, usize)> {
    let initial = (
        Vec::new(),
        Cursor {
            page: 0,
            offset: start,
        },
    );

    let (entries, last) = files.into_iter().try_fold(initial, |(mut entries, cursor), (name, len)| {
        if name.len() > NAME_LEN {
            return Err(Error::unsupported(
                format!("file name {name:?} length"),
                name.len(),
                NAME_LEN,
            ));
        }
        if len > PAGE_SIZE {
            return Err(Error::unsupported(format!("file {name:?}"), len, PAGE_SIZE));
        }
        let at = if fits(cursor.offset, len, PAGE_SIZE) {
            cursor
        } else {
            trace!("{name} does not fit page {}, moving on", cursor.page);
            Cursor {
                page: cursor.page + 1,
                offset: 0,
            }
        };

        let page = base_page as usize + at.page;
        entries.push(FileEntry {
            name: name.to_string(),
            page: u16::try_from(page)
                .map_err(|_| Error::unsupported("page number", page, u16::MAX as usize))?,
            offset: at.offset as u16,
            size: len as u16,
        });

        Ok((
            entries,
            Cursor {
                page: at.page,
                offset: at.offset + len,
            },
        ))
    })?;

    Ok((entries, last.page + 1))
}

/// Builds resource images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsBuilder {
    magic: [u8; MAGIC_LEN],
    base_page: u16,
}

impl Default for VfsBuilder {
    fn default() -> Self {
        Self {
            magic: *b"rsc\0",
            base_page: DEFAULT_BASE_PAGE,
        }
    }
}

impl VfsBuilder {
    pub fn new(magic: &str, base_page: u16) -> Result<Self> {
        if magic.len() > MAGIC_LEN {
            return Err(Error::unsupported("magic tag length", magic.len(), MAGIC_LEN));
        }
        let mut tag = [0u8; MAGIC_LEN];
        tag[..magic.len()].copy_from_slice(magic.as_bytes());
        Ok(Self {
            magic: tag,
            base_page,
        })
    }

    pub fn base_page(&self) -> u16 {
        self.base_page
    }

    /// Lays `files` out into a page-aligned image. Input order does not
    /// matter; files are always stored sorted by name.
    pub fn build<K, V>(&self, files: impl IntoIterator<Item = (K, V)>) -> Result<Vec<u8>>
    where
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let mut given = 0;
        let sorted: BTreeMap<String, V> = files
            .into_iter()
            .inspect(|_| given += 1)
            .map(|(name, data)| (name.as_ref().to_string(), data))
            .collect();
        if sorted.len() != given {
            return Err(Error::malformed("two files share a name"));
        }

        let count = u16::try_from(sorted.len())
            .map_err(|_| Error::unsupported("file count", sorted.len(), u16::MAX as usize))?;
        let table_end = HEADER_LEN + ENTRY_LEN * sorted.len();
        if table_end > PAGE_SIZE {
            return Err(Error::unsupported("file table size", table_end, PAGE_SIZE));
        }

        let (entries, pages) = place(
            sorted.iter().map(|(name, data)| (name.as_str(), data.as_ref().len())),
            self.base_page,
            table_end,
        )?;

        let mut image = vec![0u8; pages * PAGE_SIZE];
        image[..MAGIC_LEN].copy_from_slice(&self.magic);
        image[MAGIC_LEN..HEADER_LEN].copy_from_slice(&count.to_le_bytes());

        for (i, (entry, data)) in entries.iter().zip(sorted.values()).enumerate() {
            let slot = HEADER_LEN + i * ENTRY_LEN;
            image[slot..slot + ENTRY_LEN].copy_from_slice(&entry.encode());

            let start = (entry.page - self.base_page) as usize * PAGE_SIZE + entry.offset as usize;
            image[start..start + data.as_ref().len()].copy_from_slice(data.as_ref());

            debug!(
                "{:<16}page {} @{:04X}..{:04X}",
                entry.name,
                entry.page,
                entry.offset,
                entry.offset as usize + entry.size as usize
            );
        }

        Ok(image)
    }
}

/// Read access to a built image, the way the base program looks files up.
#[derive(Debug, Clone)]
pub struct ResourceImage<'a> {
    bytes: &'a [u8],
    base_page: u16,
    magic: [u8; MAGIC_LEN],
    entries: Vec<FileEntry>,
}

impl<'a> ResourceImage<'a> {
    pub fn parse(bytes: &'a [u8], base_page: u16) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::MalformedImage("shorter than the header".to_string()));
        }
        let mut magic = [0u8; MAGIC_LEN];
        magic.copy_from_slice(&bytes[..MAGIC_LEN]);
        let count = u16::from_le_bytes([bytes[4], bytes[5]]) as usize;

        let table_end = HEADER_LEN + count * ENTRY_LEN;
        let table = bytes.get(HEADER_LEN..table_end).ok_or_else(|| {
            Error::MalformedImage(format!("entry table for {count} files is truncated"))
        })?;
        let entries = table.chunks_exact(ENTRY_LEN).map(FileEntry::decode).collect();

        Ok(Self {
            bytes,
            base_page,
            magic,
            entries,
        })
    }

    /// The magic tag with its padding stripped.
    pub fn magic(&self) -> &[u8] {
        let end = self.magic.iter().position(|&b| b == 0).unwrap_or(MAGIC_LEN);
        &self.magic[..end]
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Entries are sorted by name, so this is a binary search.
    pub fn find(&self, name: &str) -> Option<&FileEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn read(&self, entry: &FileEntry) -> Result<&'a [u8]> {
        let page = entry.page.checked_sub(self.base_page).ok_or_else(|| {
            Error::MalformedImage(format!(
                "{} lives on page {}, below the base page",
                entry.name, entry.page
            ))
        })?;
        let start = page as usize * PAGE_SIZE + entry.offset as usize;
        self.bytes.get(start..start + entry.size as usize).ok_or_else(|| {
            Error::MalformedImage(format!("{} runs past the end of the image", entry.name))
        })
    }

    pub fn read_file(&self, name: &str) -> Option<&'a [u8]> {
        self.find(name).and_then(|e| self.read(e).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_is_inclusive_of_the_page_end() {
        assert!(fits(0, PAGE_SIZE, PAGE_SIZE));
        assert!(fits(100, PAGE_SIZE - 100, PAGE_SIZE));
        assert!(!fits(101, PAGE_SIZE - 100, PAGE_SIZE));
        assert!(fits(PAGE_SIZE, 0, PAGE_SIZE));
    }

    #[test]
    fn entries_are_sorted_by_name() {
        let image = VfsBuilder::default()
            .build([("b.txt", vec![1u8, 2]), ("a.txt", vec![3u8])])
            .unwrap();

        let parsed = ResourceImage::parse(&image, DEFAULT_BASE_PAGE).unwrap();
        let names: Vec<_> = parsed.entries().iter().map(|e| e.name.as_str()).collect();
        let sizes: Vec<_> = parsed.entries().iter().map(|e| e.size).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
        assert_eq!(sizes, [1, 2]);
    }

    #[test]
    fn header_and_first_file_layout() {
        let image = VfsBuilder::default().build([("a.txt", [9u8, 8, 7])]).unwrap();
        assert_eq!(image.len(), PAGE_SIZE);
        assert_eq!(image[..6], *b"rsc\0\x01\0");
        assert_eq!(&image[6..11], b"a.txt");
        assert_eq!(image[11..20], [0; 9]);
        // page 2, size 3, offset 26
        assert_eq!(image[20..26], [2, 0, 3, 0, 26, 0]);
        assert_eq!(image[26..29], [9, 8, 7]);
    }

    #[test]
    fn overflowing_file_moves_to_next_page() {
        let big = vec![0xAAu8; PAGE_SIZE - 100];
        let image = VfsBuilder::default()
            .build([("a", big.clone()), ("b", vec![0xBB; 200])])
            .unwrap();
        assert_eq!(image.len(), 2 * PAGE_SIZE);

        let parsed = ResourceImage::parse(&image, DEFAULT_BASE_PAGE).unwrap();
        let b = parsed.find("b").unwrap();
        assert_eq!((b.page, b.offset), (DEFAULT_BASE_PAGE + 1, 0));
        assert_eq!(parsed.read_file("b").unwrap(), &[0xBB; 200][..]);
        assert_eq!(parsed.read_file("a").unwrap(), &big[..]);
    }

    #[test]
    fn oversized_file_is_rejected() {
        let err = VfsBuilder::default()
            .build([("huge", vec![0u8; PAGE_SIZE + 1])])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedSize { value, .. } if value == PAGE_SIZE + 1));
    }

    #[test]
    fn long_names_are_rejected() {
        let err = VfsBuilder::default()
            .build([("fifteen-chars.x", [0u8])])
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedSize { value: 15, max: 14, .. }));
    }

    #[test]
    fn placement_rejects_names_that_overflow_the_slot() {
        let err = place([("ok.bin", 4), ("fifteen-chars.x", 4)], 2, HEADER_LEN).unwrap_err();
        assert!(matches!(err, Error::UnsupportedSize { value: 15, max: NAME_LEN, .. }));

        let (entries, _) = place([("fourteen-chars", 4)], 2, HEADER_LEN).unwrap();
        assert_eq!(entries[0].encode()[..NAME_LEN], *b"fourteen-chars");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = VfsBuilder::default()
            .build(vec![("a", vec![1u8]), ("a", vec![2u8])])
            .unwrap_err();
        assert!(matches!(err, Error::MalformedProject(_)));
    }

    #[test]
    fn magic_is_limited_to_four_bytes() {
        assert!(VfsBuilder::new("PMRS", 2).is_ok());
        assert!(VfsBuilder::new("PMRES", 2).is_err());
    }

    #[test]
    fn empty_pages_between_files_are_kept() {
        let (entries, pages) = place(
            [("a", PAGE_SIZE), ("b", PAGE_SIZE), ("c", 1)],
            5,
            HEADER_LEN + 3 * ENTRY_LEN,
        )
        .unwrap();
        let placed: Vec<_> = entries.iter().map(|e| (e.page, e.offset)).collect();
        // the header page keeps nothing but the table
        assert_eq!(placed, [(6, 0), (7, 0), (8, 0)]);
        assert_eq!(pages, 4);
    }
}
