//! Name-based channel lookup.
//!
//! Models refer to channels by logical name ("input", "table_out", ...).
//! A [`ChannelRegistry`] maps those names to concrete addresses and opens
//! endpoints for them. Registries are explicit values built from code, the
//! environment or a JSON file; nothing is global.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use cisio_format::FormatDescriptor;
use cisio_transport::{MessageSink, MessageSource};
use tracing::debug;

use crate::array::{ArrayInput, ArrayOutput};
use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::file::{create_sink, resolve_format, FileMode, FileSource, Framing};
use crate::line::{LineInput, LineOutput};
use crate::row::{RowInput, RowOutput};

/// Prefix of environment variables read by [`ChannelRegistry::from_env`].
pub const ENV_PREFIX: &str = "CISIO_CHANNEL_";

pub type DynLineInput = LineInput<Box<dyn MessageSource>>;
pub type DynLineOutput = LineOutput<Box<dyn MessageSink>>;
pub type DynRowInput = RowInput<Box<dyn MessageSource>>;
pub type DynRowOutput = RowOutput<Box<dyn MessageSink>>;
pub type DynArrayInput = ArrayInput<Box<dyn MessageSource>>;
pub type DynArrayOutput = ArrayOutput<Box<dyn MessageSink>>;

/// Where a channel lives.
///
/// Written as `unix:<path>`, `file:<path>` or `append:<path>`. Inputs bind
/// Unix sockets and read files from the start; outputs connect to Unix
/// sockets and truncate or append to files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAddress {
    Unix(PathBuf),
    File(PathBuf),
    Append(PathBuf),
}

impl ChannelAddress {
    pub fn path(&self) -> &Path {
        match self {
            ChannelAddress::Unix(path) | ChannelAddress::File(path) | ChannelAddress::Append(path) => {
                path
            }
        }
    }
}

impl FromStr for ChannelAddress {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self> {
        let (scheme, path) = s
            .split_once(':')
            .ok_or_else(|| ChannelError::Config(format!("address {s:?} has no scheme")))?;
        if path.is_empty() {
            return Err(ChannelError::Config(format!("address {s:?} has no path")));
        }
        let path = PathBuf::from(path);
        match scheme {
            "unix" => Ok(ChannelAddress::Unix(path)),
            "file" => Ok(ChannelAddress::File(path)),
            "append" => Ok(ChannelAddress::Append(path)),
            other => Err(ChannelError::Config(format!(
                "unknown address scheme {other:?} (expected unix, file or append)"
            ))),
        }
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self {
            ChannelAddress::Unix(_) => "unix",
            ChannelAddress::File(_) => "file",
            ChannelAddress::Append(_) => "append",
        };
        write!(f, "{scheme}:{}", self.path().display())
    }
}

/// Explicit map from channel names to addresses.
#[derive(Debug, Clone, Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, ChannelAddress>,
    config: ChannelConfig,
}

impl ChannelRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: ChannelConfig) -> Self {
        Self {
            channels: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Add or replace a channel.
    pub fn register(&mut self, name: impl Into<String>, address: ChannelAddress) {
        self.channels.insert(name.into(), address);
    }

    pub fn resolve(&self, name: &str) -> Result<&ChannelAddress> {
        self.channels
            .get(name)
            .ok_or_else(|| ChannelError::UnknownChannel(name.to_string()))
    }

    /// Registered names with their addresses, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChannelAddress)> {
        self.channels.iter().map(|(name, addr)| (name.as_str(), addr))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Build from `CISIO_CHANNEL_<NAME>=<address>` variables. `<NAME>` is
    /// lower-cased: `CISIO_CHANNEL_TABLE_OUT` registers `table_out`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Same as [`ChannelRegistry::from_env`] over an explicit variable list.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut registry = Self::new();
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            registry.register(name.to_ascii_lowercase(), value.as_ref().parse()?);
        }
        debug!(channels = registry.len(), "channel registry loaded from environment");
        Ok(registry)
    }

    /// Build from a JSON object of `name -> address` strings.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: BTreeMap<String, String> = serde_json::from_str(json)
            .map_err(|err| ChannelError::Config(format!("invalid channel map: {err}")))?;
        let mut registry = Self::new();
        for (name, address) in entries {
            registry.register(name, address.parse()?);
        }
        Ok(registry)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            ChannelError::Config(format!("failed reading {}: {err}", path.display()))
        })?;
        let registry = Self::from_json(&json)?;
        debug!(path = %path.display(), channels = registry.len(), "channel registry loaded");
        Ok(registry)
    }

    /// Replace the config used for endpoints opened from now on.
    pub fn set_config(&mut self, config: ChannelConfig) {
        self.config = config;
    }

    fn open_source(&self, address: &ChannelAddress, framing: Framing) -> Result<OpenedSource> {
        match address {
            #[cfg(unix)]
            ChannelAddress::Unix(path) => Ok(OpenedSource::Socket(
                crate::socket::SocketSource::bind(path, &self.config)?,
            )),
            #[cfg(not(unix))]
            ChannelAddress::Unix(_) => Err(ChannelError::Config(
                "unix socket channels are not supported on this platform".to_string(),
            )),
            ChannelAddress::File(path) | ChannelAddress::Append(path) => Ok(OpenedSource::File(
                FileSource::open_with_config(path, framing, &self.config)?,
            )),
        }
    }

    fn open_sink(
        &self,
        address: &ChannelAddress,
        format: Option<&FormatDescriptor>,
    ) -> Result<Box<dyn MessageSink>> {
        match address {
            #[cfg(unix)]
            ChannelAddress::Unix(path) => Ok(Box::new(crate::socket::SocketSink::connect(
                path,
                &self.config,
            )?)),
            #[cfg(not(unix))]
            ChannelAddress::Unix(_) => Err(ChannelError::Config(
                "unix socket channels are not supported on this platform".to_string(),
            )),
            ChannelAddress::File(path) => Ok(Box::new(create_sink(
                path,
                FileMode::Truncate,
                format,
                &self.config,
            )?)),
            ChannelAddress::Append(path) => Ok(Box::new(create_sink(
                path,
                FileMode::Append,
                format,
                &self.config,
            )?)),
        }
    }

    pub fn open_line_input(&self, name: &str) -> Result<DynLineInput> {
        let source = self.open_source(self.resolve(name)?, Framing::Line)?;
        Ok(LineInput::with_config(name, source.boxed(), &self.config))
    }

    pub fn open_line_output(&self, name: &str) -> Result<DynLineOutput> {
        let sink = self.open_sink(self.resolve(name)?, None)?;
        Ok(LineOutput::with_config(name, sink, &self.config))
    }

    /// Open a row input. File channels may omit `format` when the file
    /// carries a format header.
    pub fn open_row_input(
        &self,
        name: &str,
        format: Option<FormatDescriptor>,
    ) -> Result<DynRowInput> {
        let source = self.open_source(self.resolve(name)?, Framing::Record)?;
        let format = source.resolve_format(format, name)?;
        Ok(RowInput::with_config(name, source.boxed(), format, &self.config))
    }

    pub fn open_row_output(&self, name: &str, format: FormatDescriptor) -> Result<DynRowOutput> {
        let address = self.resolve(name)?;
        let sink = self.open_sink(address, Some(&format))?;
        let mut output = RowOutput::with_config(name, sink, format, &self.config);
        output.comment_prefix = self.file_comment_prefix(address);
        Ok(output)
    }

    /// Open an array input. File channels may omit `format` when the file
    /// carries a format header.
    pub fn open_array_input(
        &self,
        name: &str,
        format: Option<FormatDescriptor>,
    ) -> Result<DynArrayInput> {
        let source = self.open_source(self.resolve(name)?, Framing::Table)?;
        let format = source.resolve_format(format, name)?;
        Ok(ArrayInput::with_config(name, source.boxed(), format, &self.config))
    }

    pub fn open_array_output(
        &self,
        name: &str,
        format: FormatDescriptor,
    ) -> Result<DynArrayOutput> {
        let address = self.resolve(name)?;
        let sink = self.open_sink(address, Some(&format))?;
        let mut output = ArrayOutput::with_config(name, sink, format, &self.config);
        output.comment_prefix = self.file_comment_prefix(address);
        Ok(output)
    }

    /// File outputs refuse records that a file input would skip.
    fn file_comment_prefix(&self, address: &ChannelAddress) -> Option<String> {
        match address {
            ChannelAddress::File(_) | ChannelAddress::Append(_) => {
                Some(self.config.comment_prefix.clone())
            }
            ChannelAddress::Unix(_) => None,
        }
    }
}

enum OpenedSource {
    #[cfg(unix)]
    Socket(crate::socket::SocketSource),
    File(FileSource),
}

impl OpenedSource {
    fn resolve_format(
        &self,
        format: Option<FormatDescriptor>,
        name: &str,
    ) -> Result<FormatDescriptor> {
        match (self, format) {
            (_, Some(format)) => Ok(format),
            (OpenedSource::File(source), None) => resolve_format(source, None, name),
            #[cfg(unix)]
            (OpenedSource::Socket(_), None) => Err(ChannelError::MissingFormat(name.to_string())),
        }
    }

    fn boxed(self) -> Box<dyn MessageSource> {
        match self {
            #[cfg(unix)]
            OpenedSource::Socket(source) => Box::new(source),
            OpenedSource::File(source) => Box::new(source),
        }
    }
}
