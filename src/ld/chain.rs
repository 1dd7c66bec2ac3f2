//! Channel metadata chain traversal.
//!
//! Channel records form a singly linked list threaded through the file by
//! absolute offsets; offset 0 terminates the chain. The reference captures
//! this decoder was built against contain well-formed chains, but corrupted
//! files have been seen with pointers that loop, so traversal tracks visited
//! offsets and stops rather than spinning forever.

use crate::LdError;
use crate::ld::channel::{Channel, ChannelLayout};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of walking the metadata chain: the channels gathered in traversal
/// order, plus the fault that stopped traversal early, if any.
///
/// A fault never discards work: channels parsed before the fault are
/// retained so callers can still use the partial document while being able
/// to tell it apart from a complete one.
#[derive(Debug)]
pub(crate) struct ChannelChain {
    pub channels: Vec<Channel>,
    pub fault: Option<LdError>,
}

/// Walk the chain starting at `head_offset` (0 = no channels).
pub(crate) fn walk(data: &Arc<Vec<u8>>, head_offset: u32, layout: ChannelLayout) -> ChannelChain {
    let mut channels: Vec<Channel> = Vec::new();
    let mut visited: HashSet<u32> = HashSet::new();
    let mut offset = head_offset;

    while offset != 0 {
        if !visited.insert(offset) {
            warn!(
                offset,
                gathered = channels.len(),
                "channel chain revisits an offset, stopping traversal"
            );
            let gathered = channels.len();
            return ChannelChain {
                channels,
                fault: Some(LdError::CorruptChannelChain { offset, gathered }),
            };
        }

        match Channel::parse(data, offset, layout) {
            Ok(channel) => {
                offset = channel.next_offset;
                channels.push(channel);
            }
            Err(err) => {
                warn!(
                    offset,
                    gathered = channels.len(),
                    error = %err,
                    "channel record unreadable, chain truncated"
                );
                return ChannelChain { channels, fault: Some(err) };
            }
        }
    }

    debug!(count = channels.len(), "walked channel chain");
    ChannelChain { channels, fault: None }
}
