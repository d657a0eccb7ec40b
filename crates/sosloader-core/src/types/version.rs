//! Runtime build version.

use std::fmt;

/// Version of a managed runtime build
///
/// Read from the runtime module's fixed file info in the dump and never
/// modified afterwards. Ordering is lexicographic over the four components,
/// which matches how runtime builds are ordered.
///
/// ## Example
///
/// ```rust
/// use sosloader_core::types::RuntimeVersion;
///
/// let version = RuntimeVersion::new(4, 0, 30319, 0);
/// assert_eq!(version.to_string(), "4.0.30319.0");
/// assert!(version > RuntimeVersion::new(2, 0, 50727, 8009));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RuntimeVersion
{
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
    pub patch: u32,
}

impl RuntimeVersion
{
    #[must_use]
    pub const fn new(major: u32, minor: u32, revision: u32, patch: u32) -> Self
    {
        Self {
            major,
            minor,
            revision,
            patch,
        }
    }

    /// Decode a version from the two halves of a `VS_FIXEDFILEINFO` file version.
    ///
    /// `hi` carries major/minor and `lo` carries revision/patch, 16 bits each.
    ///
    /// ```rust
    /// use sosloader_core::types::RuntimeVersion;
    ///
    /// let version = RuntimeVersion::from_file_version(0x0004_0000, 0x766f_4808);
    /// assert_eq!(version, RuntimeVersion::new(4, 0, 30319, 18440));
    /// ```
    #[must_use]
    pub const fn from_file_version(hi: u32, lo: u32) -> Self
    {
        Self::new(hi >> 16, hi & 0xffff, lo >> 16, lo & 0xffff)
    }

    /// Version string used inside symbol-store file names.
    ///
    /// Same as [`Display`](fmt::Display) except the patch is zero-padded to two
    /// digits, e.g. `4.0.30319.00`.
    #[must_use]
    pub fn file_name_component(&self) -> String
    {
        format!("{}.{}.{}.{:02}", self.major, self.minor, self.revision, self.patch)
    }
}

impl fmt::Display for RuntimeVersion
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.revision, self.patch)
    }
}
