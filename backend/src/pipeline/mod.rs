//! The bulk-send pipeline.
//!
//! Template → [`placeholders`] → [`mapping`] (against the columns from
//! [`ingest`]) → [`render`] for previews and [`dispatch`] for delivery.
//! [`session`] holds the pieces together for one send screen.

pub mod dispatch;
pub mod ingest;
pub mod mapping;
pub mod placeholders;
pub mod render;
pub mod session;
