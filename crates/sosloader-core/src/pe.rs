//! PE image identity (COFF timestamp and `SizeOfImage`).
//!
//! These two values are what a minidump records for every loaded module, so
//! comparing them against an installed binary tells whether the installed
//! file is the exact build the dump was taken with.

use std::fs;
use std::path::Path;

use object::read::pe::{ImageNtHeaders, ImageOptionalHeader, PeFile};
use object::{pe, FileKind, LittleEndian};

/// Timestamp and image size of a PE file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeIdentity
{
    pub time_stamp: u32,
    pub size_of_image: u32,
}

impl PeIdentity
{
    /// Parse the identity from in-memory PE bytes.
    ///
    /// Returns `None` if the data is not a PE32 or PE32+ image.
    #[must_use]
    pub fn parse(data: &[u8]) -> Option<Self>
    {
        match FileKind::parse(data).ok()? {
            FileKind::Pe32 => identity_of::<pe::ImageNtHeaders32>(data),
            FileKind::Pe64 => identity_of::<pe::ImageNtHeaders64>(data),
            _ => None,
        }
    }

    /// Read the identity of a PE file on disk.
    ///
    /// Missing, unreadable and non-PE files all yield `None`.
    #[must_use]
    pub fn read(path: &Path) -> Option<Self>
    {
        let data = fs::read(path).ok()?;
        Self::parse(&data)
    }
}

fn identity_of<Pe: ImageNtHeaders>(data: &[u8]) -> Option<PeIdentity>
{
    let file = PeFile::<Pe>::parse(data).ok()?;
    let headers = file.nt_headers();
    Some(PeIdentity {
        time_stamp: headers.file_header().time_date_stamp.get(LittleEndian),
        size_of_image: headers.optional_header().size_of_image(),
    })
}
