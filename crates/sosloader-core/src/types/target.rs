//! Architecture, platform and dump target types.

use std::fmt;
use std::path::PathBuf;

/// CPU architecture of a dumped process (or of this process)
///
/// ## Supported Architectures
///
/// - **X86**: 32-bit x86
/// - **Amd64**: 64-bit x86 (Intel/AMD processors)
/// - **Arm**: 32-bit ARM
/// - **Arm64**: 64-bit ARM
/// - **Unknown**: Anything else the dump reports
///
/// ## Tags
///
/// Symbol-store file names use two spellings:
///
/// - The target tag ([`Display`](fmt::Display)): `X86`, `Amd64`, `Arm`, `Arm64`
/// - The pointer-width tag ([`Architecture::pointer_width_tag`]): `x86` for 32-bit, `amd64` for 64-bit
///
/// ## Example
///
/// ```rust
/// use sosloader_core::types::Architecture;
///
/// assert_eq!(Architecture::Amd64.to_string(), "Amd64");
/// assert_eq!(Architecture::Amd64.pointer_width_tag(), Some("amd64"));
/// assert_eq!(Architecture::X86.pointer_width(), Some(32));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture
{
    /// 32-bit x86
    X86,
    /// 64-bit x86 (Intel/AMD)
    Amd64,
    /// 32-bit ARM
    Arm,
    /// 64-bit ARM
    Arm64,
    /// Any other architecture
    ///
    /// The `&'static str` contains the architecture name as reported by the source.
    Unknown(&'static str),
}

impl Architecture
{
    /// Get the architecture of the currently running sosloader binary
    ///
    /// This uses `#[cfg(target_arch = "...")]` to determine the architecture
    /// at compile time. The architecture gate compares it against the dump.
    ///
    /// ```rust
    /// use sosloader_core::types::Architecture;
    ///
    /// let arch = Architecture::current();
    /// // On a 64-bit Intel build: Architecture::Amd64
    /// # let _ = arch;
    /// ```
    #[must_use]
    pub const fn current() -> Self
    {
        #[cfg(target_arch = "x86")]
        {
            Architecture::X86
        }

        #[cfg(target_arch = "x86_64")]
        {
            Architecture::Amd64
        }

        #[cfg(target_arch = "arm")]
        {
            Architecture::Arm
        }

        #[cfg(target_arch = "aarch64")]
        {
            Architecture::Arm64
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "arm", target_arch = "aarch64")))]
        {
            Architecture::Unknown(std::env::consts::ARCH)
        }
    }

    /// Pointer width in bits, `None` for unknown architectures.
    #[must_use]
    pub const fn pointer_width(self) -> Option<u32>
    {
        match self {
            Architecture::X86 | Architecture::Arm => Some(32),
            Architecture::Amd64 | Architecture::Arm64 => Some(64),
            Architecture::Unknown(_) => None,
        }
    }

    /// Pointer-width tag used for the tool's own architecture in SOS and DAC file names.
    #[must_use]
    pub const fn pointer_width_tag(self) -> Option<&'static str>
    {
        match self.pointer_width() {
            Some(32) => Some("x86"),
            Some(_) => Some("amd64"),
            None => None,
        }
    }

    /// Whether a debugger built for `self` can load extensions for a `target` dump.
    #[must_use]
    pub fn matches_pointer_width(self, target: Architecture) -> bool
    {
        match (self.pointer_width(), target.pointer_width()) {
            (Some(own), Some(other)) => own == other,
            _ => false,
        }
    }
}

impl fmt::Display for Architecture
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Architecture::X86 => write!(f, "X86"),
            Architecture::Amd64 => write!(f, "Amd64"),
            Architecture::Arm => write!(f, "Arm"),
            Architecture::Arm64 => write!(f, "Arm64"),
            Architecture::Unknown(name) => write!(f, "{name}"),
        }
    }
}

/// Operating system the dump was captured on
///
/// Informational only. The tool services the Windows .NET Framework, the only
/// runtime whose SOS and DAC builds symbol servers publish, so dumps from other
/// systems never yield a runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetPlatform
{
    #[default]
    Windows,
    Linux,
    MacOs,
}

impl fmt::Display for TargetPlatform
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            TargetPlatform::Windows => write!(f, "windows"),
            TargetPlatform::Linux => write!(f, "linux"),
            TargetPlatform::MacOs => write!(f, "macos"),
        }
    }
}

/// Properties of the crash dump itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor
{
    /// Architecture of the dumped process
    pub architecture: Architecture,
    /// OS the dump was captured on
    pub platform: TargetPlatform,
    /// Path of the dump file
    pub dump_path: PathBuf,
}

impl TargetDescriptor
{
    /// Create a Windows target descriptor.
    #[must_use]
    pub fn new(architecture: Architecture, dump_path: impl Into<PathBuf>) -> Self
    {
        Self {
            architecture,
            platform: TargetPlatform::Windows,
            dump_path: dump_path.into(),
        }
    }

    #[must_use]
    pub fn with_platform(mut self, platform: TargetPlatform) -> Self
    {
        self.platform = platform;
        self
    }
}
