//! Reaction protocol
//!
//! No gate: every click adds one to the displayed count and broadcasts the
//! resulting total. Receivers replace their count with that total.

use confession_core::{BroadcastEvent, Emoji, PostId};

use crate::error::{ClientError, ClientResult};
use crate::state::AggregationState;

/// Apply one click locally and build the event to broadcast
pub fn react(state: &mut AggregationState, post_id: PostId, emoji: Emoji) -> ClientResult<BroadcastEvent> {
    if !state.feed().contains(post_id) {
        return Err(ClientError::UnknownPost(post_id));
    }
    let count = state.increment_reaction(post_id, emoji);
    Ok(BroadcastEvent::reaction(post_id, emoji, count))
}
