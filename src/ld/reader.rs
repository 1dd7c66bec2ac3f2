//! LD file reader: the top-level document object.
//!
//! An [`LdReader`] owns the whole file as an immutable byte buffer together
//! with the parsed header and the ordered channel list, and provides channel
//! lookup plus the row-aligned tabular view used for export.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use paddock::LdReader;
//!
//! fn summarize() -> paddock::Result<()> {
//!     let reader = LdReader::open("session.ld")?;
//!     println!("{} channels captured {}", reader.channel_count(), reader.header().datetime);
//!
//!     let rpm = reader.channel_by_name("Engine RPM")?;
//!     println!("{} samples at {} Hz", rpm.samples()?.len(), rpm.frequency_hz);
//!     Ok(())
//! }
//! ```
//!
//! ## Performance Notes
//!
//! - File data is loaded into memory at construction time; the handle is
//!   released before parsing continues
//! - Channel metadata is parsed eagerly, sample blocks lazily on first access
//! - The tabular view decodes every channel once; repeated calls reuse the
//!   per-channel caches

use crate::ld::chain;
use crate::ld::channel::{Channel, ChannelLayout};
use crate::ld::format::LdHeader;
use crate::{LdError, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A parsed LD document: header plus ordered channel list.
pub struct LdReader {
    data: Arc<Vec<u8>>,
    path: PathBuf,
    layout: ChannelLayout,
    header: LdHeader,
    channels: Vec<Channel>,
    chain_fault: Option<LdError>,
}

impl LdReader {
    /// Open an LD file with the default channel record layout.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_layout(path, ChannelLayout::default())
    }

    /// Open an LD file, specifying the channel record layout explicitly for
    /// captures written by older firmware.
    pub fn open_with_layout<P: AsRef<Path>>(path: P, layout: ChannelLayout) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut file =
            File::open(&path).map_err(|e| LdError::file_error(path_buf.clone(), e))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(|e| LdError::file_error(path_buf.clone(), e))?;
        drop(file);

        Self::from_parts(data, path_buf, layout)
    }

    /// Create a reader from an in-memory buffer.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_layout(data, ChannelLayout::default())
    }

    /// Create a reader from an in-memory buffer with an explicit layout.
    pub fn from_bytes_with_layout(data: &[u8], layout: ChannelLayout) -> Result<Self> {
        Self::from_parts(data.to_vec(), PathBuf::from("<memory>"), layout)
    }

    fn from_parts(data: Vec<u8>, path: PathBuf, layout: ChannelLayout) -> Result<Self> {
        let data = Arc::new(data);
        let header = LdHeader::parse(&data)?;
        let chain = chain::walk(&data, header.meta_ptr, layout);

        debug!(
            path = %path.display(),
            channels = chain.channels.len(),
            complete = chain.fault.is_none(),
            "parsed LD document"
        );

        Ok(Self {
            data,
            path,
            layout,
            header,
            channels: chain.channels,
            chain_fault: chain.fault,
        })
    }

    /// The parsed file header.
    pub fn header(&self) -> &LdHeader {
        &self.header
    }

    /// Channels in linked-list traversal order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Number of channels gathered from the metadata chain.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channel names in traversal order. Names are not guaranteed unique.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(|channel| channel.name.as_str())
    }

    /// The channel record layout this document was parsed with.
    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// The path this reader was opened from, `<memory>` for buffers.
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    /// The fault that stopped chain traversal early, if any.
    ///
    /// `None` means the chain was walked to its terminating null pointer.
    /// `Some` means [`channels`](Self::channels) holds everything gathered
    /// before a cycle or an unreadable record stopped the walk.
    pub fn chain_fault(&self) -> Option<&LdError> {
        self.chain_fault.as_ref()
    }

    /// Look up a channel by position in traversal order.
    pub fn channel(&self, index: usize) -> Result<&Channel> {
        self.channels.get(index).ok_or_else(|| LdError::Parse {
            context: "channel index".to_string(),
            details: format!("index {} out of range (0..{})", index, self.channels.len()),
        })
    }

    /// Look up a channel by name, requiring exactly one match.
    ///
    /// Duplicate channel names exist in real captures; picking one silently
    /// would hide that, so zero and multiple matches both fail with
    /// [`LdError::ChannelLookup`]. Positional lookup via
    /// [`channel`](Self::channel) always works.
    pub fn channel_by_name(&self, name: &str) -> Result<&Channel> {
        let mut matching = self.channels.iter().filter(|channel| channel.name == name);
        match (matching.next(), matching.next()) {
            (Some(channel), None) => Ok(channel),
            (None, _) => Err(LdError::channel_lookup(name, 0)),
            (Some(_), Some(_)) => Err(LdError::channel_lookup(name, 2 + matching.count())),
        }
    }

    /// Materialize the document as name-keyed, row-aligned columns.
    ///
    /// Channels with unsupported encodings are skipped with a diagnostic but
    /// remain in [`channels`](Self::channels). Columns shorter than the
    /// longest successful channel are padded with NaN so every column has
    /// equal length. When duplicate names survive decoding, the later
    /// channel wins the key.
    pub fn to_table(&self) -> Result<HashMap<String, Vec<f64>>> {
        let mut columns: HashMap<String, Vec<f64>> = HashMap::with_capacity(self.channels.len());

        for channel in &self.channels {
            match channel.samples() {
                Ok(samples) => {
                    if columns.contains_key(&channel.name) {
                        warn!(
                            channel = %channel.name,
                            meta_offset = channel.meta_offset,
                            "duplicate channel name in table, later channel wins"
                        );
                    }
                    columns.insert(channel.name.clone(), samples.to_vec());
                }
                Err(err) => {
                    warn!(
                        channel = %channel.name,
                        meta_offset = channel.meta_offset,
                        error = %err,
                        "skipping channel in tabular view"
                    );
                }
            }
        }

        if columns.is_empty() {
            return Err(LdError::EmptyDocument);
        }

        let row_count = columns.values().map(Vec::len).max().unwrap_or(0);
        for column in columns.values_mut() {
            column.resize(row_count, f64::NAN);
        }

        debug!(columns = columns.len(), rows = row_count, "materialized tabular view");
        Ok(columns)
    }
}

impl std::fmt::Debug for LdReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdReader")
            .field("path", &self.path)
            .field("layout", &self.layout)
            .field("file_len", &self.data.len())
            .field("channels", &self.channels.len())
            .field("chain_fault", &self.chain_fault)
            .finish()
    }
}
