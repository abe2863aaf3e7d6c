//! Sources of authoritative remaining-time snapshots.
//!
//! The portal exposes two endpoints with the same countdown shape: the
//! public exam countdown and the admin user statistics. Both sit behind
//! [`RemainingTimeProvider`] and neither is treated as the primary source.

use std::future::Future;
use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::models::CountdownSnapshot;

pub trait RemainingTimeProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn fetch_snapshot(&self) -> impl Future<Output = Result<CountdownSnapshot, ApiError>> + Send;
}

impl<P: RemainingTimeProvider> RemainingTimeProvider for Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fetch_snapshot(&self) -> impl Future<Output = Result<CountdownSnapshot, ApiError>> + Send {
        (**self).fetch_snapshot()
    }
}

/// Public countdown to the start of an exam.
#[derive(Clone)]
pub struct ExamCountdownProvider {
    client: ApiClient,
    exam_id: u32,
}

impl ExamCountdownProvider {
    pub fn new(client: ApiClient, exam_id: u32) -> Self {
        Self { client, exam_id }
    }
}

impl RemainingTimeProvider for ExamCountdownProvider {
    fn name(&self) -> &'static str {
        "exam_countdown"
    }

    async fn fetch_snapshot(&self) -> Result<CountdownSnapshot, ApiError> {
        self.client.fetch_countdown(self.exam_id).await
    }
}

/// Admin statistics; requires an authenticated admin session.
#[derive(Clone)]
pub struct UserStatsProvider {
    client: ApiClient,
}

impl UserStatsProvider {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl RemainingTimeProvider for UserStatsProvider {
    fn name(&self) -> &'static str {
        "user_stats"
    }

    async fn fetch_snapshot(&self) -> Result<CountdownSnapshot, ApiError> {
        self.client.fetch_user_stats().await
    }
}
