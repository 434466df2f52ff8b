//! Job workers.

mod feed_insert;

pub use feed_insert::{FeedInsertContext, feed_insert_worker, spawn_feed_insert_worker};
